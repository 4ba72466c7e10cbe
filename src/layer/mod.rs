//! Tower Layer implementations for A2A protocol

pub mod validation;

pub use validation::{validate_id, A2AValidationLayer, A2AValidationService};
