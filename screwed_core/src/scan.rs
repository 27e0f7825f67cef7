//! Character scanner shared by the small text grammars in this crate
//! (dimensions, stack expressions, thread designations).

use crate::errors::CalcError;

pub(crate) struct Scanner<'a> {
    input: &'a str,
    chars: Vec<char>,
    position: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            position: 0,
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).copied()
    }

    pub(crate) fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    pub(crate) fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.position += 1;
        }
    }

    pub(crate) fn is_at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.peek().is_none()
    }

    /// Consume `c` if it is next (after whitespace).
    pub(crate) fn eat(&mut self, c: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(c) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    /// Consume any one of `options` if it is next (after whitespace).
    pub(crate) fn eat_any(&mut self, options: &[char]) -> Option<char> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if options.contains(&c) => {
                self.position += 1;
                Some(c)
            }
            _ => None,
        }
    }

    /// Consume `word` case-insensitively, without skipping whitespace first.
    pub(crate) fn eat_word(&mut self, word: &str) -> bool {
        let len = word.chars().count();
        let matches = word
            .chars()
            .enumerate()
            .all(|(i, w)| matches!(self.peek_at(i), Some(c) if c.eq_ignore_ascii_case(&w)));
        if matches {
            self.position += len;
        }
        matches
    }

    /// Read an unsigned decimal number. Both `.` and `,` are accepted as the
    /// decimal separator.
    pub(crate) fn unsigned_number(&mut self) -> Option<f64> {
        let start = self.position;
        let mut text = String::new();
        let mut has_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if (c == '.' || c == ',') && !has_dot && matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()) {
                has_dot = true;
                text.push('.');
            } else {
                break;
            }
            self.position += 1;
        }
        match text.parse::<f64>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.position = start;
                None
            }
        }
    }

    /// Read an optionally signed decimal number, after whitespace.
    pub(crate) fn signed_number(&mut self) -> Option<f64> {
        self.skip_whitespace();
        let start = self.position;
        let sign = match self.peek() {
            Some('+') => {
                self.position += 1;
                1.0
            }
            Some('-') | Some('\u{2212}') => {
                self.position += 1;
                -1.0
            }
            _ => 1.0,
        };
        self.skip_whitespace();
        match self.unsigned_number() {
            Some(value) => Some(sign * value),
            None => {
                self.position = start;
                None
            }
        }
    }

    /// Read an unsigned integer.
    pub(crate) fn integer(&mut self) -> Option<u64> {
        let start = self.position;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.position += 1;
        }
        let digits: String = self.chars[start..self.position].iter().collect();
        digits.parse().ok()
    }

    pub(crate) fn error(&self, reason: impl Into<String>) -> CalcError {
        CalcError::parse(self.input, self.position, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_with_comma_separator() {
        let mut s = Scanner::new("2,5 x");
        assert_eq!(s.unsigned_number(), Some(2.5));
        assert!(s.eat('x'));
        assert!(s.is_at_end());
    }

    #[test]
    fn test_signed_number_restores_on_failure() {
        let mut s = Scanner::new("-x");
        assert_eq!(s.signed_number(), None);
        assert_eq!(s.position(), 0);
    }

    #[test]
    fn test_trailing_dot_is_not_consumed() {
        let mut s = Scanner::new("12.");
        assert_eq!(s.unsigned_number(), Some(12.0));
        assert_eq!(s.peek(), Some('.'));
    }
}
