#![forbid(unsafe_code)]

//! Terminal frontend for the visit kiosk.

pub mod code_text;
pub mod labels;
pub mod screen;
pub mod terminal;
