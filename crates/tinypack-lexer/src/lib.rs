//! Tokenizer for the JavaScript accepted by tinypack.

pub mod token;
pub mod lexer;

// Re-export all public types from modules
pub use token::{Token, TokenKind};
pub use lexer::Lexer;
