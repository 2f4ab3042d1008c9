pub mod error;
pub mod model;

pub use error::RegistryError;
pub use model::{AnyModel, ModelId, ModelRegistry, global};
