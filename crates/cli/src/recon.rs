//! `gridrecon compare | extract | validate`: load report grids, reconcile,
//! write results.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use gridrecon_io::load_grid;
use gridrecon_recon::grid::{cell_ref, col_to_letter};
use gridrecon_recon::model::Extraction;
use gridrecon_recon::{
    extract, run, DuplicatePolicy, LayoutConfig, ReconConfig, ReconError, ReconInput, ReconResult,
    SourceInput, TolerancePolicy,
};

use crate::exit_codes::{recon_exit_code, EXIT_DIFFS, EXIT_DUPLICATE, EXIT_INVALID_CONFIG, EXIT_LOAD};
use crate::{report, CliError, LayoutArgs};

pub struct CompareOptions {
    pub files: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub names: Vec<String>,
    pub sheet: Option<String>,
    pub layout: LayoutArgs,
    pub tolerance: Option<f64>,
    pub policy: Option<TolerancePolicy>,
    pub keep_last: bool,
    pub strict_duplicates: bool,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub html: Option<PathBuf>,
    pub quiet: bool,
}

/// A source resolved to a file on disk.
#[derive(Debug, Clone, PartialEq)]
struct SourceSpec {
    name: String,
    path: PathBuf,
    sheet: Option<String>,
}

fn recon_err(err: ReconError) -> CliError {
    CliError::new(recon_exit_code(&err), err.to_string())
}

fn write_err(path: &Path, err: std::io::Error) -> CliError {
    CliError::new(EXIT_LOAD, format!("cannot write {}: {err}", path.display()))
}

fn read_config(path: &Path) -> Result<ReconConfig, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::new(EXIT_INVALID_CONFIG, format!("cannot read config {}: {e}", path.display()))
    })?;
    ReconConfig::from_toml(&text).map_err(|e| CliError::new(EXIT_INVALID_CONFIG, e.to_string()))
}

impl LayoutArgs {
    /// Field-wise override: only flags actually given replace config values.
    fn apply(&self, layout: &mut LayoutConfig) {
        if let Some(row) = self.section_row {
            layout.section_row = Some(row);
        }
        if let Some(rows) = self.header_rows {
            layout.header_rows = Some(rows);
        }
        if let Some(sep) = self.min_blank_sep {
            layout.min_blank_sep = sep;
        }
        if let Some(scan) = self.max_header_scan {
            layout.max_header_scan = scan;
        }
        if self.no_date_window {
            layout.date_windows = false;
        }
        if self.no_standalone {
            layout.standalone = false;
        }
    }
}

fn default_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Sources come from the command line when files are given, else from the
/// config (paths relative to the config file).
fn resolve_sources(
    opts: &CompareOptions,
    config: &ReconConfig,
    config_dir: &Path,
) -> Result<Vec<SourceSpec>, CliError> {
    let specs: Vec<SourceSpec> = if !opts.files.is_empty() {
        if !opts.names.is_empty() && opts.names.len() != opts.files.len() {
            return Err(CliError::args(format!(
                "got {} --name value(s) for {} file(s)",
                opts.names.len(),
                opts.files.len()
            )));
        }
        opts.files
            .iter()
            .enumerate()
            .map(|(i, path)| SourceSpec {
                name: opts.names.get(i).cloned().unwrap_or_else(|| default_name(path)),
                path: path.clone(),
                sheet: opts.sheet.clone(),
            })
            .collect()
    } else if !config.sources.is_empty() {
        if !opts.names.is_empty() {
            return Err(CliError::args("--name only applies to files given on the command line"));
        }
        config
            .sources
            .iter()
            .map(|s| SourceSpec {
                name: s.name.clone(),
                path: config_dir.join(&s.file),
                sheet: s.sheet.clone().or_else(|| opts.sheet.clone()),
            })
            .collect()
    } else {
        return Err(CliError::args("no input files")
            .with_hint("pass two or more report files, or a config with [[sources]]"));
    };

    if specs.len() < 2 {
        return Err(CliError::args(format!(
            "at least 2 sources are required, found {}",
            specs.len()
        )));
    }

    let mut seen = BTreeSet::new();
    for spec in &specs {
        if !seen.insert(spec.name.as_str()) {
            return Err(CliError::args(format!("duplicate source name: '{}'", spec.name))
                .with_hint("use --name once per file to tell the sources apart"));
        }
    }

    Ok(specs)
}

fn load_source(spec: &SourceSpec) -> Result<SourceInput, CliError> {
    let grid = load_grid(&spec.path, spec.sheet.as_deref())
        .map_err(|e| CliError::new(EXIT_LOAD, e.to_string()))?;
    Ok(SourceInput {
        name: spec.name.clone(),
        grid,
    })
}

// ---------------------------------------------------------------------------
// compare
// ---------------------------------------------------------------------------

pub fn cmd_compare(opts: CompareOptions) -> Result<(), CliError> {
    let (mut config, config_dir) = match &opts.config {
        Some(path) => {
            let config = read_config(path)?;
            let dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
            (config, dir)
        }
        None => (ReconConfig::default(), PathBuf::from(".")),
    };

    opts.layout.apply(&mut config.layout);
    if let Some(threshold) = opts.tolerance {
        config.tolerance.threshold = threshold;
    }
    if let Some(policy) = opts.policy {
        config.tolerance.policy = policy;
    }
    if opts.keep_last {
        config.duplicates.policy = DuplicatePolicy::KeepLast;
    }
    config
        .validate()
        .map_err(|e| CliError::args(e.to_string()))?;

    let specs = resolve_sources(&opts, &config, &config_dir)?;
    let sources = specs.iter().map(load_source).collect::<Result<Vec<_>, _>>()?;
    let input = ReconInput { sources };

    let result = run(&config, &input).map_err(recon_err)?;

    let json_str = serde_json::to_string_pretty(&result)
        .map_err(|e| CliError::new(EXIT_LOAD, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = opts.output {
        std::fs::write(path, &json_str).map_err(|e| write_err(path, e))?;
        if !opts.quiet {
            eprintln!("wrote {}", path.display());
        }
    }

    if let Some(ref path) = opts.html {
        std::fs::write(path, report::render_html(&result)).map_err(|e| write_err(path, e))?;
        if !opts.quiet {
            eprintln!("wrote {}", path.display());
        }
    }

    if opts.json {
        println!("{json_str}");
    }

    if !opts.quiet {
        eprintln!("{}", summary_line(&result));
        if !result.summary.warning_counts.is_empty() {
            eprintln!("{}", warning_line(&result));
        }
    }

    if opts.strict_duplicates && result.summary.duplicates > 0 {
        return Err(CliError::new(
            EXIT_DUPLICATE,
            format!(
                "{} duplicate key(s) found (--strict-duplicates)",
                result.summary.duplicates
            ),
        ));
    }

    if result.has_differences() {
        return Err(CliError::new(EXIT_DIFFS, "differences found"));
    }

    Ok(())
}

/// One-line human summary for stderr.
fn summary_line(result: &ReconResult) -> String {
    let s = &result.summary;
    let missing: Vec<String> = s
        .sources
        .iter()
        .map(|src| format!("{}={}", src.name, src.missing))
        .collect();
    format!(
        "{} keys — {} matched, {} mismatched ({} numeric, {} text), missing: {}, duplicates: {}",
        s.total_keys,
        s.matched,
        s.mismatches,
        s.numeric_mismatches,
        s.text_mismatches,
        missing.join(", "),
        s.duplicates,
    )
}

fn warning_line(result: &ReconResult) -> String {
    let counts: Vec<String> = result
        .summary
        .warning_counts
        .iter()
        .map(|(kind, n)| format!("{kind}={n}"))
        .collect();
    format!("warnings: {}", counts.join(", "))
}

// ---------------------------------------------------------------------------
// extract
// ---------------------------------------------------------------------------

pub fn cmd_extract(
    file: PathBuf,
    sheet: Option<String>,
    layout_args: LayoutArgs,
    json: bool,
) -> Result<(), CliError> {
    let mut layout = LayoutConfig::default();
    layout_args.apply(&mut layout);
    let config = ReconConfig {
        layout,
        ..ReconConfig::default()
    };
    config
        .validate()
        .map_err(|e| CliError::args(e.to_string()))?;

    let spec = SourceSpec {
        name: default_name(&file),
        path: file,
        sheet,
    };
    let source = load_source(&spec)?;
    let extraction = extract(&source.name, &source.grid, &config.layout).map_err(recon_err)?;

    if json {
        let json_str = serde_json::to_string_pretty(&extraction)
            .map_err(|e| CliError::new(EXIT_LOAD, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        print!("{}", describe_extraction(&extraction, source.grid.height(), source.grid.width()));
    }
    Ok(())
}

/// Plain-text layout report: header, sections, blocks, then records.
fn describe_extraction(ex: &Extraction, height: usize, width: usize) -> String {
    let mut out = String::new();
    let layout = &ex.layout;
    let section_row = match layout.section_row {
        Some(r) => format!("row {}", r + 1),
        None => "none".to_string(),
    };
    out.push_str(&format!(
        "{}: {height} row(s) x {width} col(s), {} header row(s), section row: {section_row}\n",
        ex.source, layout.header_rows
    ));

    for section in &layout.runs {
        out.push_str(&format!(
            "section '{}' {}:{}\n",
            section.label,
            col_to_letter(section.first),
            col_to_letter(section.last),
        ));
        for block in &section.blocks {
            let label_rows: Vec<String> = block.label_rows.iter().map(|r| (r + 1).to_string()).collect();
            out.push_str(&format!(
                "  block {}:{}  label rows [{}]  data from row {}  {} record(s)\n",
                cell_ref(block.top, block.left),
                cell_ref(block.bottom, block.right),
                label_rows.join(", "),
                block.data_start + 1,
                block.records,
            ));
        }
    }

    out.push_str(&format!("records: {}\n", ex.records.len()));
    for r in &ex.records {
        let mut path = r.section.clone();
        for part in &r.group_path {
            path.push_str(" / ");
            path.push_str(part);
        }
        out.push_str(&format!(
            "  {:<6} {path} | {} | {} | {} = {}\n",
            r.cell, r.channel, r.metric, r.period, r.value_text
        ));
    }

    if !ex.warnings.is_empty() {
        out.push_str(&format!("warnings: {}\n", ex.warnings.len()));
        for w in &ex.warnings {
            out.push_str(&format!("  [{}] {}\n", w.kind, w.message));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    eprintln!(
        "valid: '{}' with {} source(s), tolerance {} {}, duplicates {}",
        config.name,
        config.sources.len(),
        config.tolerance.policy,
        config.tolerance.threshold,
        config.duplicates.policy,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::EXIT_USAGE;

    fn opts(files: &[&str], names: &[&str]) -> CompareOptions {
        CompareOptions {
            files: files.iter().map(PathBuf::from).collect(),
            config: None,
            names: names.iter().map(|s| s.to_string()).collect(),
            sheet: None,
            layout: LayoutArgs::default(),
            tolerance: None,
            policy: None,
            keep_last: false,
            strict_duplicates: false,
            json: false,
            output: None,
            html: None,
            quiet: true,
        }
    }

    #[test]
    fn names_default_to_file_stems() {
        let specs = resolve_sources(&opts(&["in/v1.csv", "in/v2.xlsx"], &[]), &ReconConfig::default(), Path::new("."))
            .unwrap();
        assert_eq!(specs[0].name, "v1");
        assert_eq!(specs[1].name, "v2");
    }

    #[test]
    fn name_count_must_match_files() {
        let err = resolve_sources(&opts(&["a.csv", "b.csv"], &["x"]), &ReconConfig::default(), Path::new("."))
            .unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
    }

    #[test]
    fn colliding_stems_need_names() {
        let err = resolve_sources(&opts(&["q3/r.csv", "q4/r.csv"], &[]), &ReconConfig::default(), Path::new("."))
            .unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert!(err.hint.is_some());
    }

    #[test]
    fn single_file_is_usage_error() {
        let err = resolve_sources(&opts(&["a.csv"], &[]), &ReconConfig::default(), Path::new(".")).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
    }

    #[test]
    fn config_sources_resolve_relative_to_config() {
        let config = ReconConfig::from_toml(
            r#"
[[sources]]
name = "v1"
file = "v1.xlsx"
sheet = "Rates"

[[sources]]
name = "v2"
file = "v2.xlsx"
"#,
        )
        .unwrap();
        let mut o = opts(&[], &[]);
        o.sheet = Some("Summary".into());
        let specs = resolve_sources(&o, &config, Path::new("cfg")).unwrap();
        assert_eq!(specs[0].path, Path::new("cfg").join("v1.xlsx"));
        assert_eq!(specs[0].sheet.as_deref(), Some("Rates"));
        assert_eq!(specs[1].sheet.as_deref(), Some("Summary"));
    }

    #[test]
    fn layout_flags_override_field_wise() {
        let mut layout = LayoutConfig {
            min_blank_sep: 3,
            ..LayoutConfig::default()
        };
        let args = LayoutArgs {
            section_row: Some(1),
            no_standalone: true,
            ..LayoutArgs::default()
        };
        args.apply(&mut layout);
        assert_eq!(layout.section_row, Some(1));
        assert_eq!(layout.min_blank_sep, 3);
        assert!(!layout.standalone);
        assert!(layout.date_windows);
    }
}
