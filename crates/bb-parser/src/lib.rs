//! Lexer and tree builder for bbcode markup.
//!
//! Malformed markup is never an error here: anything that does not lex as a
//! tag is text, and tags that never find their partner stay in the tree as
//! unmatched nodes for the renderer to decide on.

pub mod lexer;
mod scanner;
pub mod token;
pub mod tree;

pub use lexer::Lexer;
pub use token::{ClosingTagData, OpeningTagData, Token};
pub use tree::{BBCodeNode, NodeId, Tree};

const OPEN: char = '[';
const CLOSE: char = ']';
const SLASH: char = '/';
const EQUAL: char = '=';
const BACKSLASH: char = '\\';
