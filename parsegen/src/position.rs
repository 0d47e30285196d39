use std::rc::Rc;

/// Keep track of a position within a str, updating on successful operations.
#[derive(Debug, Clone)]
pub struct Position<'a> {
    input: &'a str,
    idx: usize,
    /// Byte offsets of every newline in the input, shared between copies.
    newlines: Rc<[usize]>,
}

impl<'a> Position<'a> {
    pub fn new(input: &'a str) -> Self {
        let newlines = input
            .bytes()
            .enumerate()
            .filter(|&(_, b)| b == b'\n')
            .map(|(i, _)| i)
            .collect();
        Position {
            input,
            idx: 0,
            newlines,
        }
    }

    pub fn idx(&self) -> usize {
        self.idx
    }

    /// Input from the current index onwards.
    pub fn rest(&self) -> &'a str {
        &self.input[self.idx..]
    }

    /// Zero-based line of the current index.
    pub fn line(&self) -> usize {
        self.newlines.partition_point(|&nl| nl < self.idx)
    }

    /// Check if a string matches the input after skipping whitespace. The
    /// index will be updated on match.
    pub fn match_literal(&mut self, s: &str) -> bool {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        if trimmed.starts_with(s) {
            self.idx += rest.len() - trimmed.len() + s.len();
            true
        } else {
            false
        }
    }

    /// Move current index forward some amount. Fails if that would leave the
    /// input or split a character.
    pub fn advance(&mut self, n: usize) -> bool {
        match self.idx.checked_add(n) {
            Some(end) if end <= self.input.len() && self.input.is_char_boundary(end) => {
                self.idx = end;
                true
            }
            _ => false,
        }
    }

    /// Whether only whitespace remains.
    pub fn is_exhausted(&self) -> bool {
        self.rest().trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_match_literal_simple() {
        let tests = vec![
            ("", 0, "", true),
            ("hello", 0, "world", false),
            ("hello", 0, "hello", true),
            ("hello", 0, "ello", false),
            ("hello", 1, "ello", true),
            ("  \n\thello", 0, "hello", true),
            ("he llo", 0, "hello", false),
        ];
        for test in tests {
            let mut c = Position::new(test.0);
            assert!(c.advance(test.1));
            let got = c.match_literal(test.2);
            assert_eq!(got, test.3, "test case: {:?}", test);
        }
    }

    #[test]
    fn position_match_literal_idx_multiple() {
        let mut c = Position::new("he llo");
        let got1 = c.match_literal("he");
        let got2 = c.match_literal("llo");
        assert!(got1);
        assert!(got2, "cursor: {:?}", c);
        assert_eq!(c.idx(), 6);
        assert!(c.is_exhausted());
    }

    #[test]
    fn position_advance() {
        let mut c = Position::new("añb");
        assert!(c.advance(1));
        assert!(!c.advance(1), "split a character");
        assert!(c.advance(2));
        assert_eq!(c.rest(), "b");
        assert!(!c.advance(2));
        assert!(!c.advance(usize::MAX));
        assert!(c.advance(1));
        assert!(c.is_exhausted());
        assert!(!c.advance(usize::MAX));
    }

    #[test]
    fn position_line() {
        let mut c = Position::new("a\nb\n\nc");
        assert_eq!(c.line(), 0);
        assert!(c.advance(2));
        assert_eq!(c.line(), 1);
        assert!(c.advance(1));
        assert_eq!(c.line(), 1);
        assert!(c.advance(1));
        assert_eq!(c.line(), 2);
        assert!(c.advance(1));
        assert_eq!(c.line(), 3);

        let c = Position::new("");
        assert_eq!(c.line(), 0);
    }
}
