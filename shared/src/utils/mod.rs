//! Utility helpers

pub mod email;
