use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{table} is missing required column `{column}`")]
    MissingColumn { table: String, column: String },

    #[error("Alias index is empty: no roster entities and no alias rows")]
    EmptyAliasTable,

    #[error("Invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl PulseError {
    /// True for failures that must abort a run before anything is written.
    pub fn is_fatal_config(&self) -> bool {
        matches!(
            self,
            PulseError::Config(_) | PulseError::MissingColumn { .. } | PulseError::EmptyAliasTable
        )
    }
}
