use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Column '{column}' missing from source row for {table}")]
    MissingColumn { table: String, column: String },

    #[error("Unresolved reference: no row in {table} with {column} = '{key}'")]
    UnresolvedReference {
        table: String,
        column: String,
        key: String,
    },

    #[error("Download failed: {0}")]
    Download(String),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
