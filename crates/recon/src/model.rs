use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::config::{DuplicatePolicy, ToleranceConfig};
use crate::grid::{cell_ref, Grid};

/// Label given to data columns that no section covers.
pub const STANDALONE: &str = "Standalone";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One loaded source: its name and width-normalized grid.
#[derive(Debug, Clone)]
pub struct SourceInput {
    pub name: String,
    pub grid: Grid,
}

/// Ordered sources; the first is the baseline.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub sources: Vec<SourceInput>,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One numeric-looking data cell with its full label path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub source: String,
    pub section: String,
    pub group_path: Vec<String>,
    pub channel: String,
    pub metric: String,
    pub period: String,
    pub value_text: String,
    /// `None` when the cell is numeric-shaped but fails to parse.
    pub value_num: Option<f64>,
    pub row: usize,
    pub col: usize,
    pub cell: String,
}

impl Record {
    pub fn provenance(&self) -> Provenance {
        Provenance::new(&self.source, self.row, self.col)
    }
}

/// Display labels of a key, in the casing of the record that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Labels {
    pub section: String,
    pub group_path: Vec<String>,
    pub channel: String,
    pub metric: String,
    pub period: String,
}

impl Labels {
    pub fn of(record: &Record) -> Self {
        Self {
            section: record.section.clone(),
            group_path: record.group_path.clone(),
            channel: record.channel.clone(),
            metric: record.metric.clone(),
            period: record.period.clone(),
        }
    }
}

/// Normalized comparison key. Ordering drives every report's row order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CompositeKey {
    pub section: String,
    pub group_path: Vec<String>,
    pub channel: String,
    pub metric: String,
    pub period: String,
}

impl std::fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.section)?;
        for part in &self.group_path {
            write!(f, " / {part}")?;
        }
        write!(f, " | {} | {} | {}", self.channel, self.metric, self.period)
    }
}

/// Where a value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub source: String,
    pub row: usize,
    pub col: usize,
    pub cell: String,
}

impl Provenance {
    pub fn new(source: &str, row: usize, col: usize) -> Self {
        Self {
            source: source.to_string(),
            row,
            col,
            cell: cell_ref(row, col),
        }
    }
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    HeaderDetection,
    CellParse,
    DuplicateKey,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HeaderDetection => write!(f, "header_detection"),
            Self::CellParse => write!(f, "cell_parse"),
            Self::DuplicateKey => write!(f, "duplicate_key"),
        }
    }
}

/// Non-fatal heuristic miss, counted and reported next to the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<usize>,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Layout + extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockInfo {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
    /// Rows of the block read as label tiers.
    pub label_rows: Vec<usize>,
    /// First data row of the block.
    pub data_start: usize,
    pub records: usize,
}

/// A contiguous column run owned by one section label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunInfo {
    pub label: String,
    pub first: usize,
    pub last: usize,
    pub blocks: Vec<BlockInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LayoutInfo {
    pub section_row: Option<usize>,
    pub header_rows: usize,
    pub runs: Vec<RunInfo>,
}

/// Record stream of one source plus the layout that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub source: String,
    pub layout: LayoutInfo,
    pub records: Vec<Record>,
    pub warnings: Vec<Warning>,
}

// ---------------------------------------------------------------------------
// Indexing
// ---------------------------------------------------------------------------

/// An extra same-key occurrence within one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateKey {
    pub source: String,
    pub key: CompositeKey,
    pub kept: Provenance,
    pub kept_value: String,
    pub discarded: Provenance,
    pub discarded_value: String,
}

/// Key → canonical record for one source.
#[derive(Debug, Clone)]
pub struct SourceIndex {
    pub source: String,
    pub entries: BTreeMap<CompositeKey, Record>,
    pub duplicates: Vec<DuplicateKey>,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceValue {
    pub source: String,
    pub present: bool,
    pub value_num: Option<f64>,
    pub value_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell: Option<String>,
}

/// Per key, one value slot per source (placeholder when absent).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedEntry {
    pub key: CompositeKey,
    pub labels: Labels,
    pub values: Vec<SourceValue>,
}

impl AggregatedEntry {
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.present).count()
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    Numeric,
    Text,
}

impl std::fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric => write!(f, "numeric"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// Numeric difference; `NotANumber` when one side failed to parse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delta {
    Value(f64),
    NotANumber,
}

impl Serialize for Delta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_f64(*v),
            Self::NotANumber => serializer.serialize_str("NaN"),
        }
    }
}

impl std::fmt::Display for Delta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v:.2}"),
            Self::NotANumber => write!(f, "NaN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    pub key: CompositeKey,
    pub labels: Labels,
    pub kind: MismatchKind,
    /// The baseline, or the first source holding the key when the baseline
    /// lacks it.
    pub reference: Provenance,
    pub other: Provenance,
    pub v1: String,
    pub v2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<Delta>,
    /// Integer parts differ.
    pub major: bool,
}

/// `keys(present_in) - keys(absent_from)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingKeys {
    pub present_in: String,
    pub absent_from: String,
    pub keys: Vec<CompositeKey>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub records: usize,
    pub keys: usize,
    /// Keys held by some other source but not this one.
    pub missing: usize,
    pub duplicates: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconSummary {
    pub total_keys: usize,
    pub shared_keys: usize,
    pub comparisons: usize,
    pub matched: usize,
    pub mismatches: usize,
    pub numeric_mismatches: usize,
    pub text_mismatches: usize,
    pub major_mismatches: usize,
    pub duplicates: usize,
    pub warning_counts: BTreeMap<String, usize>,
    pub sources: Vec<SourceSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub mismatches: Vec<Mismatch>,
    pub missing: Vec<MissingKeys>,
    pub duplicates: Vec<DuplicateKey>,
    pub warnings: Vec<Warning>,
    pub entries: Vec<AggregatedEntry>,
}

impl ReconResult {
    /// Any mismatch or any key missing from some source.
    pub fn has_differences(&self) -> bool {
        !self.mismatches.is_empty() || self.missing.iter().any(|m| !m.keys.is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub baseline: String,
    pub sources: Vec<String>,
    pub tolerance: ToleranceConfig,
    pub duplicate_policy: DuplicatePolicy,
}
