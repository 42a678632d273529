use thiserror::Error;

use crate::errors::{AthError, AthErrorKind, Result};

use super::clause::Clause;

/// Grammar-level parse failure
///
/// Always terminal: a filter that does not parse aborts the whole query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty filter expression")]
    Empty,
    #[error("expected AND/OR connector at byte {0}")]
    ExpectedConnector(usize),
    #[error("expected field name at byte {0}")]
    ExpectedField(usize),
    #[error("expected comparison operator at byte {0}")]
    ExpectedOperator(usize),
    #[error("expected quoted value at byte {0}")]
    ExpectedValue(usize),
    #[error("unterminated quoted value starting at byte {0}")]
    UnterminatedValue(usize),
    #[error("character '{1}' at byte {0} is not allowed")]
    IllegalCharacter(usize, char),
    #[error("unbalanced parentheses")]
    UnbalancedParens,
}

const OPERATORS: [&str; 7] = [">=", "<=", "!=", "=", ">", "<", "~"];
const CONNECTORS: [&str; 4] = ["AND", "OR", "&&", "||"];

/// Parse a filter expression into its ordered clause sequence
///
/// Grammar failures surface as `ERR_INVALID_FILTER`.
pub fn parse_filter(input: &str) -> Result<Vec<Clause>> {
    Parser::new(input).parse().map_err(|e| {
        tracing::debug!(error = %e, "filter rejected by grammar");
        AthError::new(AthErrorKind::InvalidFilter)
            .with_op("filter_parse")
            .with_message(e.to_string())
    })
}

fn is_term_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '-' | '_' | '.' | ',' | '/' | ':' | '&')
        || c.is_whitespace()
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> std::result::Result<Vec<Clause>, ParseError> {
        let mut clauses: Vec<Clause> = Vec::new();
        let mut depth: i64 = 0;

        loop {
            self.skip_space();
            let connector = if clauses.is_empty() {
                if self.at_end() {
                    return Err(ParseError::Empty);
                }
                None
            } else {
                if self.at_end() {
                    break;
                }
                Some(self.connector()?)
            };

            self.skip_space();
            let lparens = self.paren_run('(');
            self.skip_space();
            let field = self.field()?;
            let operator = self.operator()?;
            self.skip_space();
            let value = self.quoted_value()?;
            self.skip_space();
            let rparens = self.paren_run(')');

            depth += lparens as i64 - rparens as i64;
            if depth < 0 {
                return Err(ParseError::UnbalancedParens);
            }

            clauses.push(Clause {
                lparens,
                field,
                operator,
                value,
                connector,
                rparens,
            });
        }

        if depth != 0 {
            return Err(ParseError::UnbalancedParens);
        }
        Ok(clauses)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn byte_pos(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|&(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn skip_space(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// Consume a run of the given paren char, allowing interior whitespace
    fn paren_run(&mut self, paren: char) -> usize {
        let mut count = 0;
        loop {
            match self.peek() {
                Some(c) if c == paren => {
                    count += 1;
                    self.pos += 1;
                }
                Some(c) if c.is_whitespace() => {
                    // only skip if more parens follow
                    let mark = self.pos;
                    self.skip_space();
                    if self.peek() != Some(paren) {
                        self.pos = mark;
                        break;
                    }
                }
                _ => break,
            }
        }
        count
    }

    fn literal(&mut self, token: &str) -> bool {
        let remaining: String = self
            .chars
            .iter()
            .skip(self.pos)
            .take(token.chars().count())
            .map(|&(_, c)| c)
            .collect();
        if remaining == token {
            self.pos += token.chars().count();
            true
        } else {
            false
        }
    }

    fn connector(&mut self) -> std::result::Result<String, ParseError> {
        for token in CONNECTORS {
            if self.literal(token) {
                return Ok(token.to_string());
            }
        }
        Err(ParseError::ExpectedConnector(self.byte_pos()))
    }

    fn operator(&mut self) -> std::result::Result<String, ParseError> {
        for token in OPERATORS {
            if self.literal(token) {
                return Ok(token.to_string());
            }
        }
        Err(ParseError::ExpectedOperator(self.byte_pos()))
    }

    fn field(&mut self) -> std::result::Result<String, ParseError> {
        let start = self.byte_pos();
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if is_term_char(c) {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        let trimmed = out.trim();
        if trimmed.is_empty() {
            return Err(ParseError::ExpectedField(start));
        }
        Ok(trimmed.to_string())
    }

    fn quoted_value(&mut self) -> std::result::Result<String, ParseError> {
        let start = self.byte_pos();
        match self.peek() {
            Some('\'') | Some('"') => self.pos += 1,
            _ => return Err(ParseError::ExpectedValue(start)),
        }
        let mut out = String::new();
        loop {
            match self.peek() {
                Some('\'') | Some('"') => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some(c) if is_term_char(c) => {
                    out.push(c);
                    self.pos += 1;
                }
                Some(c) => return Err(ParseError::IllegalCharacter(self.byte_pos(), c)),
                None => return Err(ParseError::UnterminatedValue(start)),
            }
        }
    }
}
