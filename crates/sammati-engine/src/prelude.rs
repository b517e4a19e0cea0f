//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sammati_engine::prelude::*;` to import all essential types.

pub use crate::{ValidationReason, ValidationRequest, ValidationResult, validate};
