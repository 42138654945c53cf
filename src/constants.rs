//! Application constants for the COMSOL transcoder
//!
//! Layout markers of the COMSOL text export, output naming conventions and
//! presentation defaults used across the crate.

// =============================================================================
// Export Layout
// =============================================================================

/// Number of metadata lines preceding the descriptor line
pub const PREAMBLE_LINES: usize = 8;

/// Comment glyph that prefixes every header line of an export
pub const COMMENT_MARKER: &str = "%";

/// Marker that introduces a parameter block in the descriptor line
pub const PARAMETER_MARKER: char = '@';

/// Separator between several `name=value` pairs of one parameter block
pub const PARAMETER_PAIR_SEPARATOR: char = ',';

/// Separator between a parameter name and its value
pub const PARAMETER_VALUE_SEPARATOR: char = '=';

/// Literal rewrites applied to the descriptor line, in order
pub const DESCRIPTOR_REWRITES: &[(&str, &str)] = &[(" (", "("), ("@ ", "@"), (", ", ",")];

// =============================================================================
// Output
// =============================================================================

/// Prefix of generated CSV files
pub const DEFAULT_OUTPUT_PREFIX: &str = "parsed_";

/// Extension of generated CSV files
pub const DEFAULT_OUTPUT_EXTENSION: &str = "csv";

/// Output directory used when none is given on the command line
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Field delimiter of generated CSV files
pub const CSV_DELIMITER: &str = ",";

/// Extension of COMSOL text exports picked up from input directories
pub const INPUT_EXTENSION: &str = "txt";

// =============================================================================
// I/O Tuning
// =============================================================================

/// Block size used when counting lines ahead of transcoding
pub const LINE_COUNT_BLOCK_SIZE: usize = 64 * 1024;

/// Capacity of the buffered output writer
pub const OUTPUT_BUFFER_SIZE: usize = 256 * 1024;

/// Progress bar advances in steps of this many lines
pub const PROGRESS_UPDATE_INTERVAL: u64 = 1_000;

// =============================================================================
// Presentation
// =============================================================================

/// Separator written to the run log when a run closes
pub const RUN_LOG_SEPARATOR: &str = "__________";

/// Progress bar template for per-file line progress
pub const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({percent}%) {msg}";

/// Progress bar characters
pub const PROGRESS_CHARS: &str = "#>-";
