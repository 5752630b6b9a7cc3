//! The demo's plugins and the extensions they contribute.

pub mod greeting;
pub mod welcome;
