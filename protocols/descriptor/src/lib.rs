// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2023 Takashi Sakamoto

#![doc = include_str!("../README.md")]

pub mod parser;
pub mod registry;

/// The value bound to a name in descriptor file.
#[derive(Debug, Clone, PartialEq)]
pub enum Setting {
    /// Signed integer, expressed in decimal or hexadecimal form.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean, expressed by bare `true` or `false`.
    Bool(bool),
    /// Text, with one layer of surrounding double quotes stripped.
    Str(String),
    /// Parenthesized sequence of values delimited by comma.
    List(Vec<Setting>),
    /// Brace-delimited sequence of nested bindings.
    Group(Vec<(String, Setting)>),
}

impl Setting {
    pub fn as_int(&self) -> Option<i64> {
        if let Setting::Int(val) = self {
            Some(*val)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Setting::Str(text) = self {
            Some(text.as_str())
        } else {
            None
        }
    }

    pub fn as_list(&self) -> Option<&[Setting]> {
        if let Setting::List(entries) = self {
            Some(entries.as_slice())
        } else {
            None
        }
    }

    pub fn as_group(&self) -> Option<&[(String, Setting)]> {
        if let Setting::Group(bindings) = self {
            Some(bindings.as_slice())
        } else {
            None
        }
    }
}

/// The cause of failure to parse descriptor file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The input terminated in the middle of a production.
    UnexpectedEnd,
    /// A double-quoted token is not terminated before end of line.
    UnterminatedString,
    /// The token is not valid at its position.
    UnexpectedToken(String),
    /// A specific token was required but another one appeared.
    ExpectedToken(&'static str, String),
}

/// Failure to parse descriptor file, with position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The line at which the failure was detected, counted from 1.
    pub line: usize,
    /// The column at which the failure was detected, counted from 1.
    pub column: usize,
    /// The cause of failure.
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(line: usize, column: usize, kind: ParseErrorKind) -> Self {
        ParseError { line, column, kind }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let msg = match &self.kind {
            ParseErrorKind::UnexpectedEnd => "unexpected end of input".to_string(),
            ParseErrorKind::UnterminatedString => "unterminated string".to_string(),
            ParseErrorKind::UnexpectedToken(token) => {
                format!("unexpected token `{}`", token)
            }
            ParseErrorKind::ExpectedToken(expected, found) => {
                format!("expected `{}`, found `{}`", expected, found)
            }
        };

        write!(f, "{}:{}: {}", self.line, self.column, msg)
    }
}

impl std::error::Error for ParseError {}
