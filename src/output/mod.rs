//! Output formatting for batch reports.
//!
//! This module handles rendering analysis results:
//! - [`csv`] - CSV output formatting
//! - [`terminal`] - Terminal output with colors

mod csv;
mod terminal;

pub use csv::render_csv;
pub use terminal::{format_field, render_terminal, severity_tag};
