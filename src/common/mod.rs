//! Common types, traits, and error definitions for batch_informed_trees
//!
//! This module provides the foundational building blocks used across
//! the planner: geometric types, the cost/objective interface, and the
//! collaborator traits the search core is written against.

pub mod types;
pub mod traits;
pub mod objective;
pub mod error;

pub use types::*;
pub use traits::*;
pub use objective::*;
pub use error::*;
