/// Dataset name constants to ensure consistency across the codebase
/// These constants define the dataset identifiers used by the CLI, the
/// conversion pipeline, and the raw data directory layout.

// Dataset identifiers (used in CLI and output paths)
pub const HUNDRED_LC_DATASET: &str = "100LC";
pub const TEDDI_SAMPLE_DATASET: &str = "TeDDi_sample";

// Source CSV file names shared by both database exports
pub const LANGUAGE_CSV: &str = "language.csv";
pub const CORPUS_CSV: &str = "corpus.csv";
pub const FILE_CSV: &str = "file.csv";
pub const LINE_CSV: &str = "line.csv";

// Subdirectory of a dataset checkout that holds the CSV exports
pub const DATABASE_DIR: &str = "Database";

/// Get all supported dataset identifiers
pub fn get_supported_datasets() -> Vec<&'static str> {
    vec![HUNDRED_LC_DATASET, TEDDI_SAMPLE_DATASET]
}
