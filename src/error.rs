use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid model {field}: {reason}")]
    InvalidIdentity { field: &'static str, reason: String },
}
