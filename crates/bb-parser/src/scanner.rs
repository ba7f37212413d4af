/// Scanner on a string.
///
/// Provides the cursor operations the lexer needs.
///
/// Positions are byte offsets into the source. Every delimiter the lexer
/// stops on is ASCII, so positions recorded at delimiters are always valid
/// slice boundaries.
pub(crate) struct Scanner<'a> {
    /// Source text.
    source: &'a str,

    /// Current position.
    position: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(source: &'a str) -> Scanner<'a> {
        Self {
            source,
            position: 0,
        }
    }

    /// Get character at the current position.
    pub fn curr(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    /// Move the position forward and return the character walked through.
    ///
    /// Return `None` if already finished.
    pub fn bump(&mut self) -> Option<char> {
        let ch = self.curr()?;
        self.position += ch.len_utf8();
        Some(ch)
    }

    /// Get the text from [start] to [end], excluding end pos.
    ///
    /// The caller must ensure both positions are char boundaries.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.source[start..end]
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Jump back to a previously recorded position.
    pub fn set_position(&mut self, position: usize) {
        debug_assert!(position <= self.source.len());
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::Scanner;

    #[test]
    fn steps_over_multibyte_chars() {
        let mut scanner = Scanner::new("a好[");
        assert_eq!(scanner.bump(), Some('a'));
        assert_eq!(scanner.bump(), Some('好'));
        assert_eq!(scanner.position(), 4);
        assert_eq!(scanner.curr(), Some('['));
        assert_eq!(scanner.slice(0, 4), "a好");
        assert_eq!(scanner.bump(), Some('['));
        assert_eq!(scanner.curr(), None);
        assert_eq!(scanner.bump(), None);
    }

    #[test]
    fn set_position_rewinds() {
        let mut scanner = Scanner::new("abc");
        scanner.bump();
        scanner.bump();
        scanner.set_position(1);
        assert_eq!(scanner.curr(), Some('b'));
        assert_eq!(scanner.slice(1, 3), "bc");
    }
}
