//! Domain layer containing entities and business objects.

pub mod entities;

pub use entities::*;
