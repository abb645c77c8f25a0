//! Search-query translation into the FTS5 MATCH dialect.
//!
//! The accepted syntax is: bare terms (implicit AND), `OR` / `NOT` / `AND`
//! operators, `"quoted phrases"`, and trailing-`*` prefix matching. Terms
//! are re-quoted on the way out so FTS5 punctuation rules can never turn
//! user input into an engine-level syntax error; anything structurally
//! invalid is rejected here as an input error instead.

use crate::error::StoreError;

#[derive(Debug, PartialEq)]
enum Token {
    /// A term or phrase; `prefix` marks a trailing `*`.
    Text { text: String, prefix: bool },
    And,
    Or,
    Not,
}

impl Token {
    fn is_operator(&self) -> bool {
        matches!(self, Token::And | Token::Or | Token::Not)
    }
}

/// Translate a user query into an FTS5 MATCH expression.
pub fn translate(input: &str) -> Result<String, StoreError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(StoreError::InvalidQuery("empty query".to_string()));
    }

    for (i, token) in tokens.iter().enumerate() {
        if token.is_operator() {
            let dangling = i == 0 || i == tokens.len() - 1;
            if dangling || tokens[i - 1].is_operator() {
                return Err(StoreError::InvalidQuery(format!(
                    "misplaced operator in query: {input}"
                )));
            }
        }
    }

    let rendered: Vec<String> = tokens
        .iter()
        .map(|token| match token {
            Token::Text { text, prefix } => {
                let escaped = text.replace('"', "\"\"");
                if *prefix {
                    format!("\"{escaped}\"*")
                } else {
                    format!("\"{escaped}\"")
                }
            }
            Token::And => "AND".to_string(),
            Token::Or => "OR".to_string(),
            Token::Not => "NOT".to_string(),
        })
        .collect();

    Ok(rendered.join(" "))
}

fn tokenize(input: &str) -> Result<Vec<Token>, StoreError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '"' {
            chars.next();
            let mut phrase = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '"' {
                    closed = true;
                    break;
                }
                phrase.push(ch);
            }
            if !closed {
                return Err(StoreError::InvalidQuery(format!(
                    "unterminated phrase in query: {input}"
                )));
            }
            let prefix = chars.peek() == Some(&'*');
            if prefix {
                chars.next();
            }
            if phrase.trim().is_empty() {
                return Err(StoreError::InvalidQuery("empty phrase".to_string()));
            }
            tokens.push(Token::Text {
                text: phrase,
                prefix,
            });
            continue;
        }

        let mut word = String::new();
        while let Some(&ch) = chars.peek() {
            if ch.is_whitespace() || ch == '"' {
                break;
            }
            word.push(ch);
            chars.next();
        }

        match word.as_str() {
            "AND" => tokens.push(Token::And),
            "OR" => tokens.push(Token::Or),
            "NOT" => tokens.push(Token::Not),
            _ => {
                let prefix = word.ends_with('*');
                let text = word.trim_end_matches('*').to_string();
                if text.is_empty() {
                    return Err(StoreError::InvalidQuery(format!(
                        "bare wildcard in query: {input}"
                    )));
                }
                tokens.push(Token::Text { text, prefix });
            }
        }
    }

    Ok(tokens)
}
