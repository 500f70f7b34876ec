//! Dependency Analyzer
//!
//! Finds the attributes a computation reads off its receiver by scanning the
//! tokens of its source body. The body usually comes from `stringify!` in the
//! [`nodes!`](crate::nodes) macro, but any Rust expression text works.
//!
//! # Rule
//!
//! A read is the token sequence `<receiver> . <ident>`, where the receiver is
//! not itself a field or path segment (`other.this.x` and `m::this.x` do not
//! count). Method calls and field accesses are treated alike. Comments and
//! literals are skipped. Tuple indices like `this.0` are not names.
//!
//! This is purely syntactic: aliases (`let s = &*this; s.x`) are not followed
//! and every occurrence is reported, duplicates included.

use thiserror::Error;

/// Why a body could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("computation body is empty")]
    Empty,

    #[error("'{0}' is not a valid receiver identifier")]
    InvalidReceiver(String),

    #[error("unterminated {0}")]
    Unterminated(&'static str),

    #[error("unexpected '{found}' at byte {offset}")]
    Unbalanced { found: char, offset: usize },

    #[error("unclosed '{0}'")]
    Unclosed(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'s> {
    Ident(&'s str),
    Punct(char),
    /// Literals and lifetimes. Only their position matters.
    Other,
}

/// List every attribute read off `receiver` in `source`, in source order.
pub fn analyze(receiver: &str, source: &str) -> Result<Vec<String>, AnalysisError> {
    if !is_identifier(receiver) {
        return Err(AnalysisError::InvalidReceiver(receiver.to_string()));
    }

    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(AnalysisError::Empty);
    }

    let mut reads = Vec::new();
    for (i, window) in tokens.windows(3).enumerate() {
        let [Token::Ident(recv), Token::Punct('.'), Token::Ident(name)] = window else {
            continue;
        };
        if *recv != receiver || is_nested(&tokens[..i]) {
            continue;
        }
        reads.push((*name).to_string());
    }
    Ok(reads)
}

/// Whether the token right before a receiver makes it a field or path segment.
fn is_nested(before: &[Token<'_>]) -> bool {
    match before {
        [.., Token::Punct(':'), Token::Punct(':')] => true,
        [.., Token::Punct('.')] => true,
        _ => false,
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => chars.all(|c| c == '_' || c.is_alphanumeric()),
        _ => false,
    }
}

fn tokenize(source: &str) -> Result<Vec<Token<'_>>, AnalysisError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let at = |i: usize| chars.get(i).map(|&(_, c)| c);
    let offset = |i: usize| chars.get(i).map_or(source.len(), |&(o, _)| o);

    let mut tokens = Vec::new();
    let mut open: Vec<char> = Vec::new();
    let mut i = 0;

    while let Some(c) = at(i) {
        match c {
            c if c.is_whitespace() => i += 1,

            '/' if at(i + 1) == Some('/') => {
                while at(i).is_some_and(|c| c != '\n') {
                    i += 1;
                }
            }

            '/' if at(i + 1) == Some('*') => {
                let mut depth = 0usize;
                loop {
                    match (at(i), at(i + 1)) {
                        (Some('/'), Some('*')) => {
                            depth += 1;
                            i += 2;
                        }
                        (Some('*'), Some('/')) => {
                            depth -= 1;
                            i += 2;
                            if depth == 0 {
                                break;
                            }
                        }
                        (Some(_), _) => i += 1,
                        (None, _) => return Err(AnalysisError::Unterminated("block comment")),
                    }
                }
            }

            '"' => {
                i = skip_string(&chars, i + 1)?;
                tokens.push(Token::Other);
            }

            '\'' => {
                i = skip_quote(&chars, i)?;
                tokens.push(Token::Other);
            }

            c if c.is_ascii_digit() => {
                i += 1;
                while let Some(c) = at(i) {
                    let fraction = c == '.' && at(i + 1).is_some_and(|n| n.is_ascii_digit());
                    if c == '_' || c.is_alphanumeric() || fraction {
                        i += 1;
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Other);
            }

            c if c == '_' || c.is_alphabetic() => {
                let start = i;
                while at(i).is_some_and(|c| c == '_' || c.is_alphanumeric()) {
                    i += 1;
                }
                let ident = &source[offset(start)..offset(i)];
                match (ident, at(i)) {
                    // Raw identifier: `r#type` reads as `type`
                    ("r", Some('#')) if at(i + 1).is_some_and(|c| c == '_' || c.is_alphabetic()) => {
                        let start = i + 1;
                        i = start;
                        while at(i).is_some_and(|c| c == '_' || c.is_alphanumeric()) {
                            i += 1;
                        }
                        tokens.push(Token::Ident(&source[offset(start)..offset(i)]));
                    }
                    ("r" | "br", Some('"' | '#')) => {
                        i = skip_raw_string(&chars, i)?;
                        tokens.push(Token::Other);
                    }
                    ("b", Some('"')) => {
                        i = skip_string(&chars, i + 1)?;
                        tokens.push(Token::Other);
                    }
                    ("b", Some('\'')) => {
                        i = skip_quote(&chars, i)?;
                        tokens.push(Token::Other);
                    }
                    _ => tokens.push(Token::Ident(ident)),
                }
            }

            '(' | '[' | '{' => {
                open.push(c);
                tokens.push(Token::Punct(c));
                i += 1;
            }

            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if open.pop() != Some(expected) {
                    return Err(AnalysisError::Unbalanced {
                        found: c,
                        offset: offset(i),
                    });
                }
                tokens.push(Token::Punct(c));
                i += 1;
            }

            c => {
                tokens.push(Token::Punct(c));
                i += 1;
            }
        }
    }

    match open.pop() {
        Some(c) => Err(AnalysisError::Unclosed(c)),
        None => Ok(tokens),
    }
}

/// Skip past the closing quote of a string whose body starts at `i`.
fn skip_string(chars: &[(usize, char)], mut i: usize) -> Result<usize, AnalysisError> {
    loop {
        match chars.get(i).map(|&(_, c)| c) {
            Some('\\') => i += 2,
            Some('"') => return Ok(i + 1),
            Some(_) => i += 1,
            None => return Err(AnalysisError::Unterminated("string literal")),
        }
    }
}

/// Skip a raw string; `i` points at the first `#` or `"` after the prefix.
fn skip_raw_string(chars: &[(usize, char)], mut i: usize) -> Result<usize, AnalysisError> {
    let at = |i: usize| chars.get(i).map(|&(_, c)| c);
    let mut hashes = 0;
    while at(i) == Some('#') {
        hashes += 1;
        i += 1;
    }
    if at(i) != Some('"') {
        return Err(AnalysisError::Unterminated("raw string literal"));
    }
    i += 1;
    loop {
        match at(i) {
            Some('"') if (1..=hashes).all(|n| at(i + n) == Some('#')) => return Ok(i + 1 + hashes),
            Some(_) => i += 1,
            None => return Err(AnalysisError::Unterminated("raw string literal")),
        }
    }
}

/// Skip a char literal or a lifetime; `i` points at the opening quote.
fn skip_quote(chars: &[(usize, char)], i: usize) -> Result<usize, AnalysisError> {
    let at = |i: usize| chars.get(i).map(|&(_, c)| c);
    match (at(i + 1), at(i + 2)) {
        (Some('\\'), _) => {
            let mut j = i + 3;
            while let Some(c) = at(j) {
                if c == '\'' {
                    return Ok(j + 1);
                }
                j += 1;
            }
            Err(AnalysisError::Unterminated("character literal"))
        }
        (Some(_), Some('\'')) => Ok(i + 3),
        (Some(c), _) if c == '_' || c.is_alphabetic() => {
            let mut j = i + 1;
            while at(j).is_some_and(|c| c == '_' || c.is_alphanumeric()) {
                j += 1;
            }
            Ok(j)
        }
        _ => Err(AnalysisError::Unterminated("character literal")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_reads_in_order() {
        let reads = analyze("this", "Ok(this.x()? + this.y()?)").unwrap();
        assert_eq!(reads, vec!["x", "y"]);
    }

    #[test]
    fn keeps_duplicates() {
        let reads = analyze("this", "this.x()? * this.x()? - this.rate").unwrap();
        assert_eq!(reads, vec!["x", "x", "rate"]);
    }

    #[test]
    fn handles_stringify_spacing() {
        let reads = analyze("s", "Ok (s . oas () ? + s . spread)").unwrap();
        assert_eq!(reads, vec!["oas", "spread"]);
    }

    #[test]
    fn ignores_other_receivers_and_nested_paths() {
        let source = "other.x + self.y + a.this.z + m::this.w + this.v";
        assert_eq!(analyze("this", source).unwrap(), vec!["v"]);
        assert_eq!(analyze("self", source).unwrap(), vec!["y"]);
    }

    #[test]
    fn skips_comments_and_literals() {
        let source = r##"
            // this.commented
            /* this.block /* this.nested */ */
            let s = "this.quoted \" this.escaped";
            let r = r#"this.raw"#;
            let c = '.';
            let l: &'static str = "x";
            this.real
        "##;
        assert_eq!(analyze("this", source).unwrap(), vec!["real"]);
    }

    #[test]
    fn reads_raw_identifiers() {
        let reads = analyze("this", "Ok(this.r#type()? + 1)").unwrap();
        assert_eq!(reads, vec!["type"]);

        let reads = analyze("this", "{ let r#match = this.x()?; Ok(r#match) }").unwrap();
        assert_eq!(reads, vec!["x"]);

        // Still a raw string when the hashes lead to a quote
        let reads = analyze("this", r###"{ let s = r#"this.inner"#; this.y }"###).unwrap();
        assert_eq!(reads, vec!["y"]);
    }

    #[test]
    fn skips_tuple_indices_and_ranges() {
        let reads = analyze("this", "this.0 + this.1.5 + (this..end).len() + this.pair.0").unwrap();
        assert_eq!(reads, vec!["pair"]);
    }

    #[test]
    fn no_reads_is_not_an_error() {
        assert!(analyze("_this", "Ok(10)").unwrap().is_empty());
    }

    #[test]
    fn rejects_empty_bodies() {
        assert_eq!(analyze("this", "  // nothing here\n"), Err(AnalysisError::Empty));
    }

    #[test]
    fn rejects_unbalanced_delimiters() {
        assert_eq!(analyze("this", "(this.x]"), Err(AnalysisError::Unbalanced { found: ']', offset: 7 }));
        assert_eq!(analyze("this", "{ this.x"), Err(AnalysisError::Unclosed('{')));
    }

    #[test]
    fn rejects_unterminated_literals() {
        assert_eq!(analyze("this", "\"open"), Err(AnalysisError::Unterminated("string literal")));
        assert_eq!(analyze("this", "/* open"), Err(AnalysisError::Unterminated("block comment")));
    }

    #[test]
    fn rejects_invalid_receivers() {
        assert!(matches!(analyze("1x", "1x.y"), Err(AnalysisError::InvalidReceiver(_))));
        assert!(matches!(analyze("", "x"), Err(AnalysisError::InvalidReceiver(_))));
    }
}
