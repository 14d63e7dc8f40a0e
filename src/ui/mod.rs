//! UI utilities for terminal output
//!
//! This module provides user interface components like progress spinners
//! and password prompts.

mod prompt;
mod spinner;

pub use prompt::prompt_password;
pub use spinner::{clear_spinner, create_spinner, finish_spinner};
