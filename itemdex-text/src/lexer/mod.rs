//! Brace-aware scanner over C-like source text

pub mod scanner;
pub mod token;

pub use scanner::*;
pub use token::*;
