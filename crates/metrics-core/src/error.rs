use thiserror::Error;

/// Errors surfaced by the wire-format and signing primitives shared between the agent and
/// the server. Handlers translate these into HTTP status codes; the agent logs them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("unknown metric type '{0}'")]
    UnknownKind(String),

    #[error("value '{0}' is not a valid number")]
    InvalidNumber(String),

    #[error("value '{0}' is too large to convert to int64")]
    IntegerOverflow(String),

    #[error("json decode failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("gzip failure: {0}")]
    Compression(#[from] std::io::Error),
}
