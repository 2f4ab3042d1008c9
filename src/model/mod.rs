mod registry;
mod types;

pub use registry::{AnyModel, ModelRegistry, global};
pub use types::ModelId;
