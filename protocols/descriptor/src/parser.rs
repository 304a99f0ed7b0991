// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2023 Takashi Sakamoto

//! Lexer and parser for the descriptor file format.
//!
//! The file is a sequence of bindings. A binding is a name, `=` or `:`, a value, and a
//! terminating `;`. A value is a scalar token, a parenthesized comma-separated list of values,
//! or a brace-delimited sequence of nested bindings. Whitespace and the characters
//! `{` `}` `(` `)` `,` `;` `=` `:` are token boundaries. `#` and `//` begin a comment which
//! runs to the end of line. Any other run of characters is a single token; one layer of
//! surrounding double quotes is stripped, with `\"` and `\\` escapes honored inside.

use super::*;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Equal,
    Colon,
    Semicolon,
    Comma,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Word { text: String, quoted: bool },
}

impl Token {
    fn literal(&self) -> String {
        match self {
            Token::Equal => "=".to_string(),
            Token::Colon => ":".to_string(),
            Token::Semicolon => ";".to_string(),
            Token::Comma => ",".to_string(),
            Token::OpenBrace => "{".to_string(),
            Token::CloseBrace => "}".to_string(),
            Token::OpenParen => "(".to_string(),
            Token::CloseParen => ")".to_string(),
            Token::Word { text, .. } => text.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
    column: usize,
}

fn is_boundary(ch: char) -> bool {
    ch.is_whitespace()
        || ch == '{'
        || ch == '}'
        || ch == '('
        || ch == ')'
        || ch == ','
        || ch == ';'
        || ch == '='
        || ch == ':'
        || ch == '"'
        || ch == '#'
}

fn tokenize(input: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line = 1;
    let mut column = 1;

    while let Some(ch) = chars.next() {
        let (tok_line, tok_column) = (line, column);

        if ch == '\n' {
            line += 1;
            column = 1;
            continue;
        }
        column += 1;

        if ch.is_whitespace() {
            continue;
        }

        if ch == '#' {
            while let Some(&c) = chars.peek() {
                if c == '\n' {
                    break;
                }
                chars.next();
                column += 1;
            }
            continue;
        }

        if ch == '/' && chars.peek() == Some(&'/') {
            while let Some(&c) = chars.peek() {
                if c == '\n' {
                    break;
                }
                chars.next();
                column += 1;
            }
            continue;
        }

        let token = match ch {
            '=' => Token::Equal,
            ':' => Token::Colon,
            ';' => Token::Semicolon,
            ',' => Token::Comma,
            '{' => Token::OpenBrace,
            '}' => Token::CloseBrace,
            '(' => Token::OpenParen,
            ')' => Token::CloseParen,
            '"' => {
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('"') => {
                            column += 1;
                            break;
                        }
                        Some('\\') => {
                            column += 1;
                            match chars.next() {
                                Some(escaped) => {
                                    column += 1;
                                    text.push(escaped);
                                }
                                None => {
                                    let kind = ParseErrorKind::UnterminatedString;
                                    Err(ParseError::new(tok_line, tok_column, kind))?
                                }
                            }
                        }
                        Some('\n') | None => {
                            let kind = ParseErrorKind::UnterminatedString;
                            Err(ParseError::new(tok_line, tok_column, kind))?
                        }
                        Some(c) => {
                            column += 1;
                            text.push(c);
                        }
                    }
                }
                Token::Word { text, quoted: true }
            }
            _ => {
                let mut text = String::new();
                text.push(ch);
                while let Some(&c) = chars.peek() {
                    if is_boundary(c) {
                        break;
                    }
                    chars.next();
                    column += 1;
                    text.push(c);
                }
                Token::Word {
                    text,
                    quoted: false,
                }
            }
        };

        tokens.push(Spanned {
            token,
            line: tok_line,
            column: tok_column,
        });
    }

    Ok(tokens)
}

fn scalar(text: String, quoted: bool) -> Setting {
    if quoted {
        return Setting::Str(text);
    }

    match text.as_str() {
        "true" => return Setting::Bool(true),
        "false" => return Setting::Bool(false),
        _ => (),
    }

    let (digits, negative) = if let Some(stripped) = text.strip_prefix('-') {
        (stripped, true)
    } else {
        (text.as_str(), false)
    };

    let parsed = if digits.starts_with("0x") || digits.starts_with("0X") {
        i64::from_str_radix(&digits[2..], 16).ok()
    } else {
        digits.parse::<i64>().ok()
    };
    if let Some(val) = parsed {
        return Setting::Int(if negative { -val } else { val });
    }

    if let Ok(val) = text.parse::<f64>() {
        return Setting::Float(val);
    }

    Setting::Str(text)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Spanned> {
        let entry = self.tokens.get(self.pos).cloned();
        if entry.is_some() {
            self.pos += 1;
        }
        entry
    }

    // Position of end of input, approximated by the last token.
    fn end_error(&self) -> ParseError {
        let (line, column) = self
            .tokens
            .last()
            .map(|entry| (entry.line, entry.column))
            .unwrap_or((1, 1));
        ParseError::new(line, column, ParseErrorKind::UnexpectedEnd)
    }

    fn expect(&mut self, token: Token, literal: &'static str) -> Result<(), ParseError> {
        match self.consume() {
            Some(entry) => {
                if entry.token == token {
                    Ok(())
                } else {
                    let kind = ParseErrorKind::ExpectedToken(literal, entry.token.literal());
                    Err(ParseError::new(entry.line, entry.column, kind))
                }
            }
            None => Err(self.end_error()),
        }
    }

    fn binding(&mut self) -> Result<(String, Setting), ParseError> {
        let name = match self.consume() {
            Some(Spanned {
                token: Token::Word { text, .. },
                ..
            }) => text,
            Some(entry) => {
                let kind = ParseErrorKind::UnexpectedToken(entry.token.literal());
                Err(ParseError::new(entry.line, entry.column, kind))?
            }
            None => Err(self.end_error())?,
        };

        match self.consume() {
            Some(Spanned {
                token: Token::Equal,
                ..
            })
            | Some(Spanned {
                token: Token::Colon,
                ..
            }) => (),
            Some(entry) => {
                let kind = ParseErrorKind::ExpectedToken("=", entry.token.literal());
                Err(ParseError::new(entry.line, entry.column, kind))?
            }
            None => Err(self.end_error())?,
        }

        let value = self.value()?;
        self.expect(Token::Semicolon, ";")?;

        Ok((name, value))
    }

    fn value(&mut self) -> Result<Setting, ParseError> {
        match self.peek() {
            Some(Spanned {
                token: Token::OpenParen,
                ..
            }) => self.list(),
            Some(Spanned {
                token: Token::OpenBrace,
                ..
            }) => self.group(),
            Some(Spanned {
                token: Token::Word { .. },
                ..
            }) => {
                if let Some(Spanned {
                    token: Token::Word { text, quoted },
                    ..
                }) = self.consume()
                {
                    Ok(scalar(text, quoted))
                } else {
                    unreachable!()
                }
            }
            Some(entry) => {
                let kind = ParseErrorKind::UnexpectedToken(entry.token.literal());
                Err(ParseError::new(entry.line, entry.column, kind))
            }
            None => Err(self.end_error()),
        }
    }

    fn list(&mut self) -> Result<Setting, ParseError> {
        self.expect(Token::OpenParen, "(")?;

        let mut entries = Vec::new();

        if let Some(Spanned {
            token: Token::CloseParen,
            ..
        }) = self.peek()
        {
            self.consume();
            return Ok(Setting::List(entries));
        }

        loop {
            entries.push(self.value()?);

            match self.consume() {
                Some(Spanned {
                    token: Token::Comma,
                    ..
                }) => continue,
                Some(Spanned {
                    token: Token::CloseParen,
                    ..
                }) => break,
                Some(entry) => {
                    let kind = ParseErrorKind::ExpectedToken(")", entry.token.literal());
                    Err(ParseError::new(entry.line, entry.column, kind))?
                }
                None => Err(self.end_error())?,
            }
        }

        Ok(Setting::List(entries))
    }

    fn group(&mut self) -> Result<Setting, ParseError> {
        self.expect(Token::OpenBrace, "{")?;

        let mut bindings = Vec::new();

        loop {
            match self.peek() {
                Some(Spanned {
                    token: Token::CloseBrace,
                    ..
                }) => {
                    self.consume();
                    break;
                }
                Some(_) => bindings.push(self.binding()?),
                None => Err(self.end_error())?,
            }
        }

        Ok(Setting::Group(bindings))
    }
}

/// Parse the whole input into a sequence of top-level bindings.
pub fn parse_str(input: &str) -> Result<Vec<(String, Setting)>, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };

    let mut bindings = Vec::new();
    while parser.peek().is_some() {
        bindings.push(parser.binding()?);
    }

    Ok(bindings)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scalar_bindings() {
        let bindings = parse_str("alpha = 10;\nbeta: 0x1f;\ngamma = -4;\n").unwrap();
        assert_eq!(
            bindings,
            vec![
                ("alpha".to_string(), Setting::Int(10)),
                ("beta".to_string(), Setting::Int(0x1f)),
                ("gamma".to_string(), Setting::Int(-4)),
            ]
        );
    }

    #[test]
    fn scalar_typing() {
        let bindings =
            parse_str("a = 1.5;\nb = true;\nc = false;\nd = \"0x10\";\ne = bare-word;\n").unwrap();
        assert_eq!(bindings[0].1, Setting::Float(1.5));
        assert_eq!(bindings[1].1, Setting::Bool(true));
        assert_eq!(bindings[2].1, Setting::Bool(false));
        // Quotes defeat numeric interpretation.
        assert_eq!(bindings[3].1, Setting::Str("0x10".to_string()));
        assert_eq!(bindings[4].1, Setting::Str("bare-word".to_string()));
    }

    #[test]
    fn quoted_escapes() {
        let bindings = parse_str(r#"name = "say \"hi\" to \\";"#).unwrap();
        assert_eq!(bindings[0].1, Setting::Str(r#"say "hi" to \"#.to_string()));
    }

    #[test]
    fn comments() {
        let input = "# leading comment\nalpha = 1; // trailing\n// whole line\nbeta = 2;\n";
        let bindings = parse_str(input).unwrap();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[1].0, "beta");
    }

    #[test]
    fn nested_list_and_group() {
        let input = "devices = ( { id = 1; tags = (a, b); }, { id = 2; } );";
        let bindings = parse_str(input).unwrap();
        let entries = bindings[0].1.as_list().unwrap();
        assert_eq!(entries.len(), 2);
        let group = entries[0].as_group().unwrap();
        assert_eq!(group[0], ("id".to_string(), Setting::Int(1)));
        assert_eq!(
            group[1].1,
            Setting::List(vec![
                Setting::Str("a".to_string()),
                Setting::Str("b".to_string())
            ])
        );
    }

    #[test]
    fn empty_list() {
        let bindings = parse_str("nothing = ();").unwrap();
        assert_eq!(bindings[0].1, Setting::List(Vec::new()));
    }

    #[test]
    fn error_position_missing_semicolon() {
        let err = parse_str("alpha = 1;\nbeta = 2 }\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 10);
        assert_eq!(
            err.kind,
            ParseErrorKind::ExpectedToken(";", "}".to_string())
        );
    }

    #[test]
    fn error_position_unterminated_string() {
        let err = parse_str("alpha = \"oops\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 9);
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
    }

    #[test]
    fn error_unexpected_end() {
        let err = parse_str("alpha = { id = 1;").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEnd);
    }

    #[test]
    fn error_value_in_name_position() {
        let err = parse_str("= 3;").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 1);
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken("=".to_string()));
    }
}
