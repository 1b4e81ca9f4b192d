// Suma shared type definitions
// Each submodule defines types used across the application.

pub mod assistant;
pub mod errors;
pub mod navigation;
pub mod settings;
pub mod tab;
