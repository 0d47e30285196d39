use thiserror::Error;

/// Errors produced while parsing input. Every error carries the zero-based
/// line it occurred on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: expected \"{expected}\"")]
    Expected { line: usize, expected: String },
    #[error("line {line}: lex({hook}): {message}")]
    Lex {
        line: usize,
        hook: String,
        message: String,
    },
    #[error("line {line}: {message}")]
    Custom { line: usize, message: String },
    #[error("line {line}: unexpected trailing input")]
    TrailingInput { line: usize },
    #[error("line {line}: {production} matched without binding a value")]
    Unbound { line: usize, production: String },
}

impl ParseError {
    /// An error with a free-form message, for use in error handlers.
    pub fn custom(line: usize, message: impl Into<String>) -> Self {
        ParseError::Custom {
            line,
            message: message.into(),
        }
    }

    pub fn line(&self) -> usize {
        match self {
            ParseError::Expected { line, .. }
            | ParseError::Lex { line, .. }
            | ParseError::Custom { line, .. }
            | ParseError::TrailingInput { line }
            | ParseError::Unbound { line, .. } => *line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let tests = vec![
            (
                ParseError::Expected {
                    line: 3,
                    expected: "let".to_owned(),
                },
                "line 3: expected \"let\"",
            ),
            (
                ParseError::Lex {
                    line: 0,
                    hook: "number".to_owned(),
                    message: "no digits".to_owned(),
                },
                "line 0: lex(number): no digits",
            ),
            (ParseError::custom(1, "bad block"), "line 1: bad block"),
            (
                ParseError::TrailingInput { line: 2 },
                "line 2: unexpected trailing input",
            ),
        ];
        for (err, expected) in tests {
            assert_eq!(err.to_string(), expected);
        }
    }
}
