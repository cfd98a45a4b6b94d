// Course tabs shared type definitions
// Each submodule defines types used across the crate.

pub mod course;
pub mod delta;
pub mod errors;
pub mod policy;
pub mod settings;
pub mod tab;
