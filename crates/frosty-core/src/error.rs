use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown dashboard mode: {0}")]
    UnknownMode(String),

    #[error("unknown report: {0}")]
    UnknownReport(String),
}
