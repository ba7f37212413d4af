//! Compile bbcode markup into sanitized html.
//!
//! ```
//! assert_eq!(
//!     bb_compiler::compile("[url=http://example.com]site[/url]"),
//!     r#"<a href="http://example.com/">site</a>"#
//! );
//! ```
//!
//! Use a [Compiler] to change options or the set of supported tags.

use std::sync::OnceLock;

mod compiler;
mod options;
mod registry;
pub mod rules;

pub use compiler::Compiler;
pub use options::{CompilerOptions, ConfigError};
pub use registry::{RuleContext, TagRegistry, TagRule};

static DEFAULT_COMPILER: OnceLock<Compiler> = OnceLock::new();

/// Compile `input` with default options and the built-in tags.
pub fn compile(input: &str) -> String {
    DEFAULT_COMPILER
        .get_or_init(Compiler::default)
        .compile(input)
}
