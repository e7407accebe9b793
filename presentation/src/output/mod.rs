//! Terminal output: the live turn display and text formatting helpers.

pub mod console;
pub mod format;
