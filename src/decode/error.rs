use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Response body is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Failed to parse JSON response")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse XML response")]
    Xml(#[from] roxmltree::Error),

    #[error("JSON response has no '{0}' array")]
    MissingNamespace(String),

    #[error("Could not find header row (looked for '{0}')")]
    MissingHeader(String),

    #[error("Failed to parse delimited response")]
    Csv(#[from] csv::Error),

    #[error("Failed to open zip archive")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to read zip archive member")]
    Io(#[from] std::io::Error),

    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),
}
