//! Line tokenizer and numeric literal parsing for `.ibs` text.
//!
//! Turns raw file text into [`LogicalLine`]s: comments stripped, `\`
//! continuations joined, and each line classified as a bracketed keyword
//! header or a data row. Numeric fields are parsed with `nom`, including the
//! IBIS scaling suffixes (`1.5mA`, `10pF`, `3.3V`).

use crate::error::{ParseError, ParseResult};
use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while},
    character::complete::{char, one_of},
    combinator::{success, value},
    number::complete::double,
    IResult, Parser,
};
use std::iter::{Enumerate, Peekable};
use std::str::Lines;

/// Comment delimiter used until a `[Comment Char]` keyword changes it.
pub const DEFAULT_COMMENT_CHAR: char = '|';

/// Normalized name of the keyword that changes the comment delimiter.
pub const COMMENT_CHAR_KEYWORD: &str = "comment char";

/// One logical line of input.
#[derive(Clone, Debug, PartialEq)]
pub struct LogicalLine {
    /// 1-based number of the first physical line.
    pub number: usize,
    pub kind: LineKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LineKind {
    /// A `[Keyword] argument` line.
    Header(Header),
    /// Any other non-empty line.
    Data(String),
    /// A line that looked like a header but could not be read as one.
    Malformed(String),
}

/// A bracketed keyword and whatever follows it on the same line.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    /// Keyword as written, without brackets.
    pub name: String,
    /// Lowercase keyword with `_` and whitespace runs folded to one space.
    pub key: String,
    /// Remainder of the line after `]`, trimmed.
    pub argument: String,
}

/// Iterator over the logical lines of an IBIS file.
pub struct Tokenizer<'a> {
    lines: Peekable<Enumerate<Lines<'a>>>,
    comment_char: char,
}

impl<'a> Tokenizer<'a> {
    pub fn new(content: &'a str) -> Self {
        Self::with_comment_char(content, DEFAULT_COMMENT_CHAR)
    }

    pub fn with_comment_char(content: &'a str, comment_char: char) -> Self {
        Self {
            lines: content.lines().enumerate().peekable(),
            comment_char,
        }
    }

    /// Comment delimiter currently in effect.
    pub fn comment_char(&self) -> char {
        self.comment_char
    }

    fn strip_comment<'l>(&self, line: &'l str) -> &'l str {
        match line.find(self.comment_char) {
            Some(idx) => &line[..idx],
            None => line,
        }
    }

    /// Handle `[Comment Char]` before comment stripping, since its argument
    /// may be the current delimiter itself.
    fn comment_char_line(&mut self, number: usize, raw: &str) -> Option<LogicalLine> {
        let raw = raw.trim();
        if !raw.starts_with('[') {
            return None;
        }
        let header = match classify(raw) {
            LineKind::Header(h) if h.key == COMMENT_CHAR_KEYWORD => h,
            _ => return None,
        };

        let kind = match header.argument.chars().next() {
            Some(c) if c.is_ascii_punctuation() && c != '[' && c != ']' => {
                tracing::debug!("Comment character changed to '{}' at line {}", c, number);
                self.comment_char = c;
                LineKind::Header(header)
            }
            _ => LineKind::Malformed(format!(
                "invalid [Comment Char] argument '{}'",
                header.argument
            )),
        };

        Some(LogicalLine { number, kind })
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = LogicalLine;

    fn next(&mut self) -> Option<LogicalLine> {
        loop {
            let (idx, raw) = self.lines.next()?;
            let number = idx + 1;
            let raw = match idx {
                0 => raw.strip_prefix('\u{feff}').unwrap_or(raw),
                _ => raw,
            };

            if let Some(line) = self.comment_char_line(number, raw) {
                return Some(line);
            }

            let mut text = self.strip_comment(raw).trim_end().to_string();
            while text.ends_with('\\') {
                let Some(&(_, next)) = self.lines.peek() else {
                    break;
                };
                let next = self.strip_comment(next).trim();
                // Never absorb a keyword line; the `\` stays as text
                if next.starts_with('[') {
                    break;
                }
                self.lines.next();
                text.pop();
                text.truncate(text.trim_end().len());
                text.push(' ');
                text.push_str(next);
                text.truncate(text.trim_end().len());
            }

            let text = text.trim();
            if text.is_empty() {
                continue;
            }

            return Some(LogicalLine {
                number,
                kind: classify(text),
            });
        }
    }
}

fn classify(text: &str) -> LineKind {
    let Some(rest) = text.strip_prefix('[') else {
        return LineKind::Data(text.to_string());
    };

    match rest.find(']') {
        Some(end) => {
            let name = rest[..end].trim();
            LineKind::Header(Header {
                name: name.to_string(),
                key: normalize_keyword(name),
                argument: rest[end + 1..].trim().to_string(),
            })
        }
        None => LineKind::Malformed(format!("unterminated keyword '{}'", text)),
    }
}

/// Fold a keyword to its canonical spelling: `Voltage_Range` -> `voltage range`.
pub fn normalize_keyword(name: &str) -> String {
    name.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A numeric table column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Field {
    Value(f64),
    /// The `NA` marker.
    NotApplicable,
}

impl Field {
    pub fn value(self) -> Option<f64> {
        match self {
            Field::Value(v) => Some(v),
            Field::NotApplicable => None,
        }
    }
}

/// Parse a column that may hold `NA`.
pub fn parse_field(token: &str) -> ParseResult<Field> {
    if token.eq_ignore_ascii_case("na") {
        return Ok(Field::NotApplicable);
    }
    parse_number(token).map(Field::Value)
}

/// Parse a number with an optional scaling suffix and unit, e.g. `-20.5mA`.
pub fn parse_number(token: &str) -> ParseResult<f64> {
    let (rest, value) = number_with_suffix(token)?;

    if !rest.is_empty() {
        return Err(ParseError::invalid_value(
            token,
            format!("unexpected trailing characters '{}'", rest),
        ));
    }
    if !value.is_finite() {
        return Err(ParseError::invalid_value(token, "value is not finite"));
    }

    Ok(value)
}

fn number_with_suffix(input: &str) -> IResult<&str, f64> {
    let (input, mantissa) = double(input)?;
    let (input, scale) = scale_suffix(input)?;
    // Unit letters (V, A, Ohm, F, H, s) carry no scale
    let (input, _) = take_while(|c: char| c.is_alphabetic()).parse(input)?;
    Ok((input, mantissa * scale))
}

/// IBIS scaling factors. `M` is mega and `m` is milli; `meg` is accepted in
/// any case for SPICE-style files.
fn scale_suffix(input: &str) -> IResult<&str, f64> {
    alt((
        value(1e6, tag_no_case("meg")),
        value(1e12, char('T')),
        value(1e9, char('G')),
        value(1e6, char('M')),
        value(1e3, one_of("kK")),
        value(1e-3, char('m')),
        value(1e-6, one_of("uµ")),
        value(1e-9, char('n')),
        value(1e-12, char('p')),
        value(1e-15, char('f')),
        success(1.0),
    ))
    .parse(input)
}

/// Split a data row into whitespace-separated columns.
pub fn split_fields(row: &str) -> Vec<&str> {
    row.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * b.abs().max(1.0)
    }

    fn lines(text: &str) -> Vec<LogicalLine> {
        Tokenizer::new(text).collect()
    }

    #[test]
    fn test_parse_number_with_suffix() {
        assert!(close(parse_number("1.5m").unwrap(), 1.5e-3));
        assert!(close(parse_number("100n").unwrap(), 100e-9));
        assert!(close(parse_number("3.3").unwrap(), 3.3));
        assert!(close(parse_number("10k").unwrap(), 10e3));
        assert!(close(parse_number("2.2u").unwrap(), 2.2e-6));
        assert!(close(parse_number("4p").unwrap(), 4e-12));
        assert!(close(parse_number("1G").unwrap(), 1e9));
    }

    #[test]
    fn test_mega_versus_milli() {
        assert!(close(parse_number("2M").unwrap(), 2e6));
        assert!(close(parse_number("2m").unwrap(), 2e-3));
        assert!(close(parse_number("2meg").unwrap(), 2e6));
        assert!(close(parse_number("2MEG").unwrap(), 2e6));
    }

    #[test]
    fn test_units_are_ignored() {
        assert!(close(parse_number("3.3V").unwrap(), 3.3));
        assert!(close(parse_number("-20.0mA").unwrap(), -20e-3));
        assert!(close(parse_number("1.5nH").unwrap(), 1.5e-9));
        assert!(close(parse_number("25C").unwrap(), 25.0));
        assert!(close(parse_number("1.0e-3A").unwrap(), 1e-3));
    }

    #[test]
    fn test_malformed_numbers() {
        assert!(parse_number("abc").is_err());
        assert!(parse_number("1.2.3").is_err());
        assert!(parse_number("5V/ns").is_err());
        assert!(parse_number("").is_err());
        assert!(parse_number("inf").is_err());
    }

    #[test]
    fn test_not_applicable_field() {
        assert_eq!(parse_field("NA").unwrap(), Field::NotApplicable);
        assert_eq!(parse_field("na").unwrap(), Field::NotApplicable);
        assert_eq!(parse_field("1").unwrap(), Field::Value(1.0));
    }

    #[test]
    fn test_normalize_keyword() {
        assert_eq!(normalize_keyword("Voltage_Range"), "voltage range");
        assert_eq!(normalize_keyword("  Temperature   Range "), "temperature range");
        assert_eq!(normalize_keyword("GND_Clamp"), "gnd clamp");
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let out = lines("| full comment\n\n   \nModel_type Output | trailing\n");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].number, 4);
        assert_eq!(out[0].kind, LineKind::Data("Model_type Output".to_string()));
    }

    #[test]
    fn test_header_with_argument() {
        let out = lines("[Model]   DQ_40ohm   | comment\n");
        match &out[0].kind {
            LineKind::Header(h) => {
                assert_eq!(h.name, "Model");
                assert_eq!(h.key, "model");
                assert_eq!(h.argument, "DQ_40ohm");
            }
            other => panic!("expected header, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_header() {
        let out = lines("[Model DQ\n");
        assert!(matches!(out[0].kind, LineKind::Malformed(_)));
    }

    #[test]
    fn test_continuation_lines_are_joined() {
        let out = lines("1.0 \\\n  2.0 \\ | note\n 3.0 4.0\nnext\n");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].number, 1);
        assert_eq!(out[0].kind, LineKind::Data("1.0 2.0 3.0 4.0".to_string()));
        assert_eq!(out[1].number, 4);
    }

    #[test]
    fn test_continuation_stops_at_header() {
        let out = lines("[Source] C:\\models\\\n[Component] CHIP\n");
        assert_eq!(out.len(), 2);
        match &out[0].kind {
            LineKind::Header(h) => assert_eq!(h.argument, "C:\\models\\"),
            other => panic!("expected header, got {:?}", other),
        }
        assert!(matches!(out[1].kind, LineKind::Header(ref h) if h.key == "component"));
        assert_eq!(out[1].number, 2);
    }

    #[test]
    fn test_trailing_backslash_at_end_of_input_is_kept() {
        let out = lines("[Notes] ends here\\");
        assert!(matches!(out[0].kind, LineKind::Header(ref h) if h.argument == "ends here\\"));
    }

    #[test]
    fn test_byte_order_mark_is_stripped() {
        let out = lines("\u{feff}[Component] CHIP\n");
        match &out[0].kind {
            LineKind::Header(h) => {
                assert_eq!(h.key, "component");
                assert_eq!(h.argument, "CHIP");
            }
            other => panic!("expected header, got {:?}", other),
        }
    }

    #[test]
    fn test_comment_char_switch() {
        let text = "[Comment Char] #_char\n| not a comment anymore\n1.0 # comment\n";
        let mut tok = Tokenizer::new(text);
        let first = tok.next().unwrap();
        assert!(matches!(first.kind, LineKind::Header(ref h) if h.key == COMMENT_CHAR_KEYWORD));
        assert_eq!(tok.comment_char(), '#');
        assert_eq!(
            tok.next().unwrap().kind,
            LineKind::Data("| not a comment anymore".to_string())
        );
        assert_eq!(tok.next().unwrap().kind, LineKind::Data("1.0".to_string()));
    }

    #[test]
    fn test_comment_char_can_be_reset_to_current() {
        let mut tok = Tokenizer::new("[Comment Char] |_char\n");
        assert!(matches!(tok.next().unwrap().kind, LineKind::Header(_)));
        assert_eq!(tok.comment_char(), '|');
    }

    #[test]
    fn test_invalid_comment_char() {
        let mut tok = Tokenizer::new("[Comment Char] x_char\n");
        assert!(matches!(tok.next().unwrap().kind, LineKind::Malformed(_)));
        assert_eq!(tok.comment_char(), DEFAULT_COMMENT_CHAR);
    }
}
