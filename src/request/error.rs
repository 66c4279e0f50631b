use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerializeError {
    /// Structured values need a service-specific serializer.
    #[error("Cannot serialize complex parameters with the default serializer: {params}")]
    UnsupportedComplexParams { params: String },

    #[error("{name} must be set to build a request for {service}")]
    MissingValue { service: String, name: String },

    #[error("Failed to encode parameters as JSON")]
    Json(#[from] serde_json::Error),
}
