//! Email classification and extraction.

pub mod classify;
pub mod identity;
mod parser;
pub mod patterns;

pub use classify::{classify, Signals};
pub use parser::EmailParser;
