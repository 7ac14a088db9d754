//! Report Renderers
//!
//! Turn report values into display form. Display rounding happens here,
//! never in the calculators.
//!
//! - `json`: structured output with rounded figures and unit suffixes
//! - `text`: plain-text tables for the CLI

pub mod json;
pub mod text;
