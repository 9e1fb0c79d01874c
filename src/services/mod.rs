pub mod file_service;
pub mod validation_service;

pub use file_service::OverwritePolicy;
pub use validation_service::{ValidationError, ValidationService};
