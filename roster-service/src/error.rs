use thiserror::Error;

// Roster Service Error
#[derive(Debug, Error)]
pub enum RosterServiceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal invariant breached: {0}")]
    InvariantBreach(String),

    #[error("Config Error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization Error: {0}")]
    Serialization(#[from] serde_json::Error),
}
