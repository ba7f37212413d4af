use std::collections::HashMap;

use tracing::trace;

use crate::scanner::Scanner;
use crate::token::{ClosingTagData, OpeningTagData, Token};
use crate::{BACKSLASH, CLOSE, EQUAL, OPEN, SLASH};

/// Lexer states.
///
/// Each state scans forward until it either produces a token or hands over
/// to another state. Tag states that hit something unexpected go back to
/// [State::Text] without moving `start`, so the partial tag stays in the
/// pending text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Plain text, looking for the next `[`.
    Text,

    /// Right after `[`.
    OpenBracket,

    /// After `[/`.
    ClosingTag,

    /// Name of the primary tag name or of an argument.
    TagName,

    /// After `=`.
    TagValue,

    /// Inside a value quoted with the given character.
    QuotedValue(char),

    /// Between `name=value` pairs.
    TagArgs,

    /// Input exhausted.
    Done,
}

/// Tag head under construction.
#[derive(Debug, Default)]
struct PendingHead {
    /// The first `name=value` pair, which becomes the tag name and value.
    primary: Option<(String, String)>,

    /// Every pair after the first one.
    args: HashMap<String, String>,

    /// Name of the pair currently being scanned.
    attr_name: String,

    /// Value of the pair currently being scanned.
    attr_value: String,
}

impl PendingHead {
    /// Finish the current `name=value` pair.
    fn commit(&mut self) {
        let name = std::mem::take(&mut self.attr_name);
        let value = std::mem::take(&mut self.attr_value);
        if self.primary.is_none() {
            self.primary = Some((name, value));
        } else {
            self.args.insert(name, value);
        }
    }
}

/// Pull based bbcode lexer.
///
/// Iterate over it to get the [Token]s of the input. Lexing never fails:
/// anything that does not form a complete tag is produced as
/// [Token::Text].
///
/// ```
/// use bb_parser::{Lexer, Token};
///
/// let tokens = Lexer::new("[b]hi[/b]").collect::<Vec<_>>();
/// assert_eq!(tokens.len(), 3);
/// assert!(matches!(tokens[1], Token::Text(ref x) if x == "hi"));
/// ```
pub struct Lexer<'a> {
    /// Inner scanner.
    source: Scanner<'a>,

    /// Start position of current constructing token.
    ///
    /// While a tag is being scanned this is the position of its `[`.
    start: usize,

    state: State,

    head: PendingHead,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            source: Scanner::new(input),
            start: 0,
            state: State::Text,
            head: PendingHead::default(),
        }
    }

    /// Run one state.
    fn step(&mut self) -> Option<Token> {
        match self.state {
            State::Text => self.lex_text(),
            State::OpenBracket => self.lex_open_bracket(),
            State::ClosingTag => self.lex_closing_tag(),
            State::TagName => self.lex_tag_name(),
            State::TagValue => self.lex_tag_value(),
            State::QuotedValue(quote) => self.lex_quoted_value(quote),
            State::TagArgs => self.lex_tag_args(),
            State::Done => None,
        }
    }

    fn lex_text(&mut self) -> Option<Token> {
        while let Some(ch) = self.source.curr() {
            if ch == OPEN {
                // Reach the point where may have a tag ahead.
                let text = self.collect_text();
                self.source.bump();
                self.state = State::OpenBracket;
                return text;
            }
            self.source.bump();
        }

        self.state = State::Done;
        self.collect_text()
    }

    fn lex_open_bracket(&mut self) -> Option<Token> {
        let mut closing = false;

        while let Some(ch) = self.source.curr() {
            match ch {
                '\n' | OPEN | CLOSE => break,
                ' ' | '\t' | '\r' => {
                    self.source.bump();
                }
                SLASH if !closing => {
                    closing = true;
                    self.source.bump();
                }
                _ => {
                    self.state = if closing {
                        State::ClosingTag
                    } else {
                        self.head = PendingHead::default();
                        State::TagName
                    };
                    return None;
                }
            }
        }

        self.fallback("no tag name after bracket");
        None
    }

    fn lex_closing_tag(&mut self) -> Option<Token> {
        let name_start = self.source.position();
        let mut name_end = name_start;
        let mut blank_seen = false;

        while let Some(ch) = self.source.curr() {
            match ch {
                OPEN => break,
                CLOSE => {
                    self.source.bump();
                    let name = self.source.slice(name_start, name_end).to_owned();
                    let raw = self.collect_raw();
                    return Some(Token::ClosingTag(ClosingTagData { name, raw }));
                }
                ch if is_blank(ch) => {
                    blank_seen = true;
                    self.source.bump();
                }
                // `[/b x]` is not a closing tag.
                _ if blank_seen => break,
                _ => {
                    self.source.bump();
                    name_end = self.source.position();
                }
            }
        }

        self.fallback("invalid closing tag");
        None
    }

    fn lex_tag_name(&mut self) -> Option<Token> {
        self.head.attr_value.clear();
        let name_start = self.source.position();
        let mut name_end = name_start;
        let mut blank_seen = false;

        while let Some(ch) = self.source.curr() {
            match ch {
                OPEN => break,
                CLOSE => {
                    self.head.attr_name = self.source.slice(name_start, name_end).to_owned();
                    self.state = State::TagArgs;
                    return None;
                }
                // Also after blanks, `[img = foo]` has a value.
                EQUAL => {
                    self.head.attr_name = self.source.slice(name_start, name_end).to_owned();
                    self.source.bump();
                    self.state = State::TagValue;
                    return None;
                }
                ch if is_blank(ch) => {
                    blank_seen = true;
                    self.source.bump();
                }
                _ if blank_seen => {
                    self.head.attr_name = self.source.slice(name_start, name_end).to_owned();
                    self.state = State::TagArgs;
                    return None;
                }
                _ => {
                    self.source.bump();
                    name_end = self.source.position();
                }
            }
        }

        self.fallback("unterminated tag name");
        None
    }

    fn lex_tag_value(&mut self) -> Option<Token> {
        while self.source.curr().is_some_and(is_blank) {
            self.source.bump();
        }

        if let Some(quote @ ('"' | '\'')) = self.source.curr() {
            self.source.bump();
            self.state = State::QuotedValue(quote);
            return None;
        }

        let value_start = self.source.position();
        while let Some(ch) = self.source.curr() {
            match ch {
                OPEN => break,
                ch if ch == CLOSE || is_blank(ch) => {
                    self.head.attr_value = self
                        .source
                        .slice(value_start, self.source.position())
                        .to_owned();
                    self.state = State::TagArgs;
                    return None;
                }
                _ => {
                    self.source.bump();
                }
            }
        }

        self.fallback("unterminated tag value");
        None
    }

    fn lex_quoted_value(&mut self, quote: char) -> Option<Token> {
        let value_start = self.source.position();
        let mut value = String::new();
        let mut escaped = false;

        while let Some(ch) = self.source.bump() {
            if escaped {
                value.push(if ch == 'n' { '\n' } else { ch });
                escaped = false;
                continue;
            }

            match ch {
                BACKSLASH => escaped = true,
                // Quoted values never span lines.
                '\n' => break,
                ch if ch == quote => {
                    self.head.attr_value = value;
                    self.state = State::TagArgs;
                    return None;
                }
                ch => value.push(ch),
            }
        }

        // Rescan everything after the quote as text.
        self.source.set_position(value_start);
        self.fallback("unterminated quoted value");
        None
    }

    fn lex_tag_args(&mut self) -> Option<Token> {
        self.head.commit();

        while let Some(ch) = self.source.curr() {
            match ch {
                OPEN => break,
                CLOSE => {
                    self.source.bump();
                    return Some(self.collect_head());
                }
                ch if is_blank(ch) => {
                    self.source.bump();
                }
                _ => {
                    self.state = State::TagName;
                    return None;
                }
            }
        }

        self.fallback("unterminated tag arguments");
        None
    }

    /// Give up the tag in progress.
    ///
    /// Everything from its `[` up to the current position stays in the
    /// pending text.
    fn fallback(&mut self, reason: &'static str) {
        trace!("tag at {} degraded to text: {reason}", self.start);
        self.state = State::Text;
    }

    /// Consume chars between `start` and the current position as plain text.
    ///
    /// Returns `None` if there is nothing pending.
    fn collect_text(&mut self) -> Option<Token> {
        let end = self.source.position();
        if end == self.start {
            return None;
        }
        let text = self.source.slice(self.start, end).to_owned();
        self.start = end;
        Some(Token::Text(text))
    }

    /// Take the source of the tag that just ended and move back to text.
    ///
    /// The caller shall ensure the current position is right after `]`:
    ///
    /// ```console
    /// [ n a m e ]
    /// |           |
    /// |           |-> self.source.position
    /// |-> self.start
    /// ```
    fn collect_raw(&mut self) -> String {
        let end = self.source.position();
        let raw = self.source.slice(self.start, end).to_owned();
        self.start = end;
        self.state = State::Text;
        raw
    }

    fn collect_head(&mut self) -> Token {
        let head = std::mem::take(&mut self.head);
        let (name, value) = head.primary.unwrap_or_default();
        let raw = self.collect_raw();
        Token::OpeningTag(OpeningTagData {
            name,
            value,
            args: head.args,
            raw,
        })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        while self.state != State::Done {
            if let Some(token) = self.step() {
                trace!("lexed {token:?}");
                return Some(token);
            }
        }
        None
    }
}

fn is_blank(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::Lexer;
    use crate::{OpeningTagData, Token};

    /// Normalized form of an opening tag: values unquoted, arguments sorted.
    fn normalize(tag: &OpeningTagData) -> String {
        let mut out = format!("[{}", tag.name);
        if !tag.value.is_empty() {
            out.push('=');
            out.push_str(&tag.value);
        }
        let mut args = tag.args.iter().collect::<Vec<_>>();
        args.sort();
        for (key, value) in args {
            out.push(' ');
            out.push_str(key);
            if !value.is_empty() {
                out.push('=');
                out.push_str(value);
            }
        }
        out.push(']');
        out
    }

    /// Print tokens in a compact form: text as is, opening tags normalized,
    /// closing tags as `[/name]`.
    fn lex(input: &str) -> Vec<String> {
        Lexer::new(input)
            .map(|token| match token {
                Token::Text(text) => text,
                Token::OpeningTag(tag) => normalize(&tag),
                Token::ClosingTag(tag) => format!("[/{}]", tag.name),
            })
            .collect()
    }

    #[rstest]
    #[case("", &[])]
    #[case("plain text", &["plain text"])]
    #[case("[url]a[/url]", &["[url]", "a", "[/url]"])]
    #[case("[img][/img]", &["[img]", "[/img]"])]
    #[case("[img = foo]bar[/img]", &["[img=foo]", "bar", "[/img]"])]
    #[case("[quote name=Someguy]hello[/quote]", &["[quote name=Someguy]", "hello", "[/quote]"])]
    #[case("[b]", &["[b]"])]
    #[case("blank[b][/b]", &["blank", "[b]", "[/b]"])]
    #[case("[b][/b]blank", &["[b]", "[/b]", "blank"])]
    #[case("[not a tag][/not]", &["[not a tag]", "[/not]"])]
    #[case("the quick brown[/b][/code]", &["the quick brown", "[/b]", "[/code]"])]
    #[case("[ b][\ti]brown[/i][/b=hello]", &["[b]", "[i]", "brown", "[/i]", "[/b=hello]"])]
    #[case("[b [herp@#$%]]brown[/b]", &["[b ", "[herp@#$%]", "]brown", "[/b]"])]
    #[case("[b=hello a=hi\tq]brown[/b]", &["[b=hello a=hi q]", "brown", "[/b]"])]
    #[case("[b]hi[", &["[b]", "hi", "["])]
    #[case("[b hi=derp", &["[b hi=derp"])]
    #[case("[b]]", &["[b]", "]"])]
    #[case("a [ b", &["a ", "[ b"])]
    #[case("[\nb]", &["[\nb]"])]
    #[case("[]", &["[]"])]
    #[case("[/]", &["[/]"])]
    #[case("[/b x]", &["[/b x]"])]
    #[case("[/b ]", &["[/b]"])]
    #[case("[/ b]", &["[/b]"])]
    #[case("[[b]]", &["[", "[b]", "]"])]
    fn token_stream(#[case] input: &str, #[case] expected: &[&str]) {
        assert_eq!(lex(input), expected);
    }

    #[rstest]
    #[case("[img = 'fo\"o']bar[/img]", &["[img=fo\"o]", "bar", "[/img]"])]
    #[case("[img = \"foo'\"]bar[/img]", &["[img=foo']", "bar", "[/img]"])]
    #[case("[img = \"\\\"'foo\"]bar[/img]", &["[img=\"'foo]", "bar", "[/img]"])]
    #[case("[quote name='Someguy']hello[/quote]", &["[quote name=Someguy]", "hello", "[/quote]"])]
    #[case("[quote=\"a\\nb\"]", &["[quote=a\nb]"])]
    #[case("[url=\"a[b]\"]x[/url]", &["[url=a[b]]", "x", "[/url]"])]
    #[case("[url=\"a\nb\"]x[/url]", &["[url=\"a\nb\"]x", "[/url]"])]
    #[case("[url='abc", &["[url='abc"])]
    #[case("[url='ab[b]", &["[url='ab", "[b]"])]
    fn quoted_values(#[case] input: &str, #[case] expected: &[&str]) {
        assert_eq!(lex(input), expected);
    }

    #[test]
    fn opening_tag_fields() {
        let tokens = Lexer::new("[Quote=Bob  name='Some guy' id=1 id=2 flag]").collect::<Vec<_>>();
        let [Token::OpeningTag(tag)] = tokens.as_slice() else {
            panic!("expected a single opening tag, got {tokens:?}");
        };

        assert_eq!(tag.name, "Quote");
        assert_eq!(tag.value, "Bob");
        assert_eq!(tag.args.len(), 3);
        assert_eq!(tag.args["name"], "Some guy");
        assert_eq!(tag.args["id"], "2");
        assert_eq!(tag.args["flag"], "");
        assert_eq!(tag.arg("flag"), None);
        assert_eq!(tag.raw, "[Quote=Bob  name='Some guy' id=1 id=2 flag]");
    }

    #[test]
    fn closing_tag_keeps_raw() {
        let tokens = Lexer::new("[/ B ]").collect::<Vec<_>>();
        let [Token::ClosingTag(tag)] = tokens.as_slice() else {
            panic!("expected a single closing tag, got {tokens:?}");
        };
        assert_eq!(tag.name, "B");
        assert!(tag.closes("b"));
        assert_eq!(tag.raw, "[/ B ]");
    }

    #[test]
    fn multibyte_text() {
        assert_eq!(lex("日本[b]語[/b]。"), ["日本", "[b]", "語", "[/b]", "。"]);
        assert_eq!(lex("[color='赤]x"), ["[color='赤]x"]);
    }

    #[rstest]
    #[case("[")]
    #[case("]]]][[[[")]
    #[case("[b=\"")]
    #[case("[b='\\")]
    #[case("[b x='y")]
    #[case("[/")]
    #[case("[[[/]]]")]
    #[case("[b=\n]")]
    fn malformed_input_keeps_every_char(#[case] input: &str) {
        let joined = Lexer::new(input)
            .map(|x| x.raw().to_owned())
            .collect::<String>();
        assert_eq!(joined, input);
    }

    #[test]
    fn tokens_serialize() {
        let token = Lexer::new("[/b]").next().unwrap();
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, r#"{"kind":"closing_tag","data":{"name":"b","raw":"[/b]"}}"#);
    }
}
