//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sammati_store::prelude::*;` to import all essential types.

// Errors
pub use crate::{StoreError, StoreResult};

// Store and views
pub use crate::{ConsentSnapshot, ConsentStore};

// Transitions
pub use crate::{ConsentTransition, LifecycleFact};
