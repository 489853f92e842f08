//! Chemical composition extraction
//!
//! Maps free text such as `"Bi2S3"` or `"bismuth and sulfur"` to a set of element
//! symbols, but only when the whole string reads as a formula.

mod elements;
mod parser;

pub use elements::{is_element_symbol, ALTERNATE_NAMES, ELEMENTS};
pub use parser::parse_composition;
