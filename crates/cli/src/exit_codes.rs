//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success, no differences                                  |
//! | 1    | Differences found (mismatches or missing keys)           |
//! | 2    | CLI usage error (bad args, wrong number of names)        |
//! | 3    | Duplicate keys found and `--strict-duplicates` given     |
//! | 4    | Invalid or unreadable config                             |
//! | 5    | Input file could not be loaded, or output not written    |
//! | 6    | Structural grid error (ragged rows, section row range)   |
//!
//! Like `diff(1)`, exit 1 means "inputs differ".

use gridrecon_recon::ReconError;

/// Success - no differences.
pub const EXIT_SUCCESS: u8 = 0;

/// Reconciliation found mismatches or missing keys.
pub const EXIT_DIFFS: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Duplicate keys found and `--strict-duplicates` was given.
pub const EXIT_DUPLICATE: u8 = 3;

/// Config could not be read, parsed or validated.
pub const EXIT_INVALID_CONFIG: u8 = 4;

/// Input load/parse error, or an output file could not be written.
pub const EXIT_LOAD: u8 = 5;

/// Grid is structurally unusable for extraction.
pub const EXIT_STRUCTURE: u8 = 6;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::DuplicateSource(_) => EXIT_INVALID_CONFIG,
        ReconError::NotEnoughSources { .. } => EXIT_USAGE,
        ReconError::RaggedRow { .. } | ReconError::SectionRowOutOfRange { .. } => EXIT_STRUCTURE,
    }
}
