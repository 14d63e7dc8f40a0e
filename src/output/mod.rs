//! Output formatting module
//!
//! Handles different output formats: table, JSON, YAML

mod common;
mod environments;
mod plan;
mod profile;

pub use environments::output_environments;
pub use plan::output_login_plan;
pub use profile::{output_context, output_profile};
