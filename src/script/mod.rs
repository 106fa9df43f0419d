//! Splitting SQL text into statements.
//!
//! An embedded engine produces several rowsets from one statement execution when the SQL
//! holds several `;`-separated statements. Both adapters compile such a script one
//! statement at a time, so the text is split here and every statement's placeholders are
//! counted to hand each one its share of the caller's parameters.
//!
//! The scanner skips quoted strings, quoted identifiers and comments, and keeps the body
//! of `CREATE TRIGGER ... BEGIN ... END` together.

use std::collections::HashMap;
use std::sync::Arc;

mod parsers;
mod scanner;

use parsers::{
    is_block_comment_end, is_block_comment_start, is_ident_start, is_line_comment_start,
    is_named_param_start,
};
use scanner::{State, scan_digits, scan_ident};

use crate::error::SqlConnectorError;
use crate::types::RowValues;

/// One statement of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStatement {
    pub sql: String,
    /// Highest parameter index used by the statement.
    pub param_count: usize,
}

/// A parsed SQL script: one or more statements.
#[derive(Debug, Clone)]
pub struct Script {
    source: Arc<str>,
    statements: Arc<Vec<ScriptStatement>>,
}

impl Script {
    /// Split `sql` into statements.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ExecutionError` if the text holds no statement at all.
    pub fn parse(sql: &str) -> Result<Self, SqlConnectorError> {
        let statements = split_statements(sql);
        if statements.is_empty() {
            return Err(SqlConnectorError::ExecutionError(
                "empty SQL statement".to_string(),
            ));
        }
        Ok(Self {
            source: Arc::from(sql),
            statements: Arc::new(statements),
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn statements(&self) -> &[ScriptStatement] {
        &self.statements
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    #[must_use]
    pub fn param_count(&self) -> usize {
        self.statements.iter().map(|s| s.param_count).sum()
    }

    /// Hand every statement its consecutive slice of `params`.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ParameterError` when the number of parameters does not
    /// match the number of placeholders in the script.
    pub fn distribute<'a>(
        &self,
        params: &'a [RowValues],
    ) -> Result<Vec<&'a [RowValues]>, SqlConnectorError> {
        let expected = self.param_count();
        if expected != params.len() {
            return Err(SqlConnectorError::ParameterError(format!(
                "statement expects {expected} parameters, {} supplied",
                params.len()
            )));
        }

        let mut rest = params;
        let mut slices = Vec::with_capacity(self.statements.len());
        for stmt in self.statements.iter() {
            let (head, tail) = rest.split_at(stmt.param_count);
            slices.push(head);
            rest = tail;
        }
        Ok(slices)
    }
}

#[derive(Default)]
struct Pending {
    max_index: usize,
    named: HashMap<String, usize>,
    has_content: bool,
    words: usize,
    leading_temp: bool,
    in_trigger: bool,
    first_is_create: bool,
    // Last two tokens seen, uppercased words or single punctuation bytes.
    prev_token: Option<String>,
    last_token: Option<String>,
}

impl Pending {
    fn note_token(&mut self, token: String) {
        self.has_content = true;
        self.prev_token = self.last_token.replace(token);
    }

    fn note_word(&mut self, word: &str) {
        let upper = word.to_ascii_uppercase();
        self.words += 1;
        match self.words {
            1 => self.first_is_create = upper == "CREATE",
            2 if self.first_is_create => {
                self.leading_temp = matches!(upper.as_str(), "TEMP" | "TEMPORARY");
                self.in_trigger = upper == "TRIGGER";
            }
            3 if self.leading_temp => self.in_trigger = upper == "TRIGGER",
            _ => {}
        }
        self.note_token(upper);
    }

    fn note_symbol(&mut self, b: u8) {
        self.note_token(char::from(b).to_string());
    }

    /// A trigger body holds `;`-terminated statements; it only closes at `; END ;`.
    fn ends_at_semicolon(&self) -> bool {
        !self.in_trigger
            || (self.last_token.as_deref() == Some("END")
                && self.prev_token.as_deref() == Some(";"))
    }
}

fn split_statements(sql: &str) -> Vec<ScriptStatement> {
    let bytes = sql.as_bytes();
    let mut out = Vec::new();
    let mut state = State::Normal;
    let mut pending = Pending::default();
    let mut start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => {
                    state = State::SingleQuoted;
                    pending.note_symbol(b);
                }
                b'"' => {
                    state = State::DoubleQuoted;
                    pending.note_symbol(b);
                }
                b'`' => {
                    state = State::Backticked;
                    pending.note_symbol(b);
                }
                b'[' => {
                    state = State::Bracketed;
                    pending.note_symbol(b);
                }
                _ if is_line_comment_start(bytes, idx) => {
                    state = State::LineComment;
                    idx += 1;
                }
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment;
                    idx += 1;
                }
                b';' if pending.ends_at_semicolon() => {
                    push_statement(&mut out, &sql[start..idx], &pending);
                    pending = Pending::default();
                    start = idx + 1;
                }
                b'?' => {
                    pending.note_symbol(b);
                    if let Some((digits_end, digits)) = scan_digits(bytes, idx + 1) {
                        let n = digits.parse::<usize>().unwrap_or(0);
                        pending.max_index = pending.max_index.max(n);
                        idx = digits_end - 1;
                    } else {
                        pending.max_index += 1;
                    }
                }
                _ if is_named_param_start(bytes, idx) => {
                    pending.note_symbol(b);
                    let (end, name) = scan_ident(bytes, idx + 1);
                    if !pending.named.contains_key(name) {
                        pending.max_index += 1;
                        pending.named.insert(name.to_string(), pending.max_index);
                    }
                    idx = end - 1;
                }
                _ if is_ident_start(b) => {
                    let (end, word) = scan_ident(bytes, idx);
                    pending.note_word(word);
                    idx = end - 1;
                }
                _ if !b.is_ascii_whitespace() => pending.note_symbol(b),
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Backticked => {
                if b == b'`' {
                    state = State::Normal;
                }
            }
            State::Bracketed => {
                if b == b']' {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if is_block_comment_end(bytes, idx) {
                    state = State::Normal;
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    push_statement(&mut out, &sql[start.min(sql.len())..], &pending);
    out
}

fn push_statement(out: &mut Vec<ScriptStatement>, text: &str, pending: &Pending) {
    if pending.has_content {
        out.push(ScriptStatement {
            sql: text.trim().to_string(),
            param_count: pending.max_index,
        });
    }
}
