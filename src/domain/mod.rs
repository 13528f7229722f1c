//! Domain layer types and invariants.

pub mod definitions;
pub mod error;
pub mod listings;
pub mod sections;
