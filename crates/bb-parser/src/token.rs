use serde::Serialize;
use std::collections::HashMap;

/// All types of tokens.
///
/// Tokens are units of bbcode markup, produced by [Lexer](crate::Lexer) in
/// document order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Token {
    /// Plain text.
    Text(String),

    /// Tag head.
    ///
    /// `[$name]`, `[$name=$value]` or `[$name=$value $arg=$arg_value ...]`
    OpeningTag(OpeningTagData),

    /// Tag tail.
    ///
    /// `[/$name]`
    ClosingTag(ClosingTagData),
}

impl Token {
    /// Get the source text this token was lexed from.
    ///
    /// Text tokens return their content, tags return the exact bracketed
    /// source.
    pub fn raw(&self) -> &str {
        match self {
            Token::Text(text) => text.as_str(),
            Token::OpeningTag(tag) => tag.raw.as_str(),
            Token::ClosingTag(tag) => tag.raw.as_str(),
        }
    }
}

/// Tag head.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OpeningTagData {
    /// Tag name as written, tag names are matched ignoring ascii case.
    pub name: String,

    /// Value right after the name, `[url=$value]`.
    ///
    /// Empty when the tag has no value.
    pub value: String,

    /// Named arguments after the primary name, `[quote name=$value]`.
    ///
    /// Keys are case sensitive. A repeated key keeps the last value.
    pub args: HashMap<String, String>,

    /// The original source text of the whole tag, brackets included.
    pub raw: String,
}

impl OpeningTagData {
    /// Get a named argument, treating an empty value as absent.
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args
            .get(key)
            .map(String::as_str)
            .filter(|x| !x.is_empty())
    }
}

/// Tag tail.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClosingTagData {
    /// Tag name as written.
    pub name: String,

    /// The original source text, brackets included.
    pub raw: String,
}

impl ClosingTagData {
    /// Check whether this tag closes an opening tag named `name`.
    pub fn closes(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}
