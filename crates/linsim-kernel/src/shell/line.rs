//! Splitting a command line into words.
//!
//! Whitespace separates words. Single quotes are literal, double quotes
//! allow `$` expansion, a backslash escapes the next character. `$NAME`,
//! `${NAME}` and `$?` are expanded through the supplied lookup; a leading
//! `~` becomes `$HOME`.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("unexpected EOF while looking for matching `{0}'")]
    UnterminatedQuote(char),

    #[error("${{{0}: bad substitution")]
    BadSubstitution(String),
}

/// Split `line` into words, expanding variables via `lookup`.
pub fn split<F>(line: &str, lookup: F) -> Result<Vec<String>, LineError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut words = Vec::new();
    let mut word: Option<String> = None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if let Some(done) = word.take() {
                    words.push(done);
                }
            }
            '\'' => {
                let buf = word.get_or_insert_with(String::new);
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => buf.push(ch),
                        None => return Err(LineError::UnterminatedQuote('\'')),
                    }
                }
            }
            '"' => {
                let buf = word.get_or_insert_with(String::new);
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.peek() {
                            Some(&next @ ('"' | '\\' | '$')) => {
                                buf.push(next);
                                chars.next();
                            }
                            _ => buf.push('\\'),
                        },
                        Some('$') => expand(&mut chars, &lookup, buf)?,
                        Some(ch) => buf.push(ch),
                        None => return Err(LineError::UnterminatedQuote('"')),
                    }
                }
            }
            '\\' => {
                if let Some(next) = chars.next() {
                    word.get_or_insert_with(String::new).push(next);
                }
            }
            '$' => expand(&mut chars, &lookup, word.get_or_insert_with(String::new))?,
            '~' if word.is_none() && chars.peek().is_none_or(|&n| n == '/' || n.is_whitespace()) => {
                let home = lookup("HOME").unwrap_or_else(|| "~".to_string());
                word = Some(home);
            }
            ch => word.get_or_insert_with(String::new).push(ch),
        }
    }
    if let Some(done) = word {
        words.push(done);
    }
    Ok(words)
}

fn expand<F>(chars: &mut Peekable<Chars<'_>>, lookup: &F, buf: &mut String) -> Result<(), LineError>
where
    F: Fn(&str) -> Option<String>,
{
    match chars.peek().copied() {
        Some('?') => {
            chars.next();
            buf.push_str(&lookup("?").unwrap_or_default());
        }
        Some('{') => {
            chars.next();
            let mut name = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(ch) => name.push(ch),
                    None => return Err(LineError::BadSubstitution(name)),
                }
            }
            if !is_name(&name) && name != "?" {
                return Err(LineError::BadSubstitution(name));
            }
            buf.push_str(&lookup(&name).unwrap_or_default());
        }
        Some(ch) if ch == '_' || ch.is_ascii_alphabetic() => {
            let mut name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch == '_' || ch.is_ascii_alphanumeric() {
                    name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            buf.push_str(&lookup(&name).unwrap_or_default());
        }
        _ => buf.push('$'),
    }
    Ok(())
}

fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
