use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid item id: {0:?}")]
    InvalidItemId(String),

    #[error("invalid property id: {0:?}")]
    InvalidPropertyId(String),

    #[error("invalid system id: {0:?}")]
    InvalidSystemId(String),

    #[error("unknown property name: {0}")]
    UnknownProperty(String),

    #[error("mapping {field} -> {property} uses a {kind:?} value but the property holds {datatype:?}")]
    SchemaMismatch {
        field: String,
        property: String,
        kind: crate::ValueKind,
        datatype: crate::DataType,
    },

    #[error("config file not found: {0}")]
    ConfigNotFound(std::path::PathBuf),

    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}
