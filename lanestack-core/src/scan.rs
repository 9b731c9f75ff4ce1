//! Match-text scanner
//!
//! Stateless extraction primitives over one match's reformatted report text.
//! The text is wrapped ad hoc by the producing tool, so everything here works
//! on raw character offsets rather than a line-oriented grammar: tokens after
//! markers, the last token of the last qualifying line, and concatenation of
//! wrapped alignment rows bounded by the second "Score" line.

use thiserror::Error;

use crate::types::Flavor;

/// Errors raised while scanning a match text. Per-item: callers catch these
/// at the row boundary, count them, and continue with the next row.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("required token not found: '{0}'")]
    TokenNotFound(String),

    #[error("token '{0}' does not occur past the 'Score' marker")]
    TokenBeforeScore(String),

    #[error("malformed alignment line: '{0}'")]
    MalformedLine(String),

    #[error("invalid number '{value}' after '{key}'")]
    InvalidNumber { key: String, value: String },

    #[error("matches with Strand = Minus / Minus are not supported")]
    MinusMinusStrand,
}

/// Returns the prefix of `text` up to (excluding) the second occurrence of
/// `marker`, or the whole text if the marker occurs once or not at all.
///
/// Used to keep only the first local-alignment block when a report contains
/// several back to back.
pub fn truncate_before_second_occurrence<'a>(text: &'a str, marker: &str) -> &'a str {
    let Some(first) = text.find(marker) else {
        return text;
    };
    match text[first + 1..].find(marker) {
        Some(offset) => &text[..first + 1 + offset],
        None => text,
    }
}

/// Returns the first whitespace-delimited token following the first
/// occurrence of `key`, falling back to `alias`.
pub fn grab_next<'a>(text: &'a str, key: &str, alias: &str) -> Option<&'a str> {
    let rest = find_after(text, key, alias)?;
    rest.split_whitespace().next()
}

/// Returns the next three whitespace-delimited tokens following the first
/// occurrence of `key` (falling back to `alias`), or `None` if fewer than
/// three tokens remain.
pub fn grab_next3<'a>(text: &'a str, key: &str, alias: &str) -> Option<[&'a str; 3]> {
    let rest = find_after(text, key, alias)?;
    let mut tokens = rest.split_whitespace();
    Some([tokens.next()?, tokens.next()?, tokens.next()?])
}

fn find_after<'a>(text: &'a str, key: &str, alias: &str) -> Option<&'a str> {
    if let Some(pos) = text.find(key) {
        return Some(&text[pos + key.len()..]);
    }
    text.find(alias).map(|pos| &text[pos + alias.len()..])
}

/// Returns the last whitespace-delimited token of the line holding the last
/// occurrence of `key`, requiring that occurrence to lie past the first
/// "Score" marker.
pub fn grab_last_in_line_passed_score<'a>(text: &'a str, key: &str) -> Result<&'a str, ScanError> {
    let score_pos = text
        .find("Score")
        .ok_or_else(|| ScanError::TokenNotFound("Score".to_string()))?;
    let key_pos = text
        .rfind(key)
        .ok_or_else(|| ScanError::TokenNotFound(key.to_string()))?;
    if key_pos < score_pos {
        return Err(ScanError::TokenBeforeScore(key.to_string()));
    }
    let line_end = text[key_pos..]
        .find('\n')
        .map(|offset| key_pos + offset)
        .unwrap_or(text.len());
    text[key_pos..line_end]
        .split_whitespace()
        .last()
        .ok_or_else(|| ScanError::TokenNotFound(key.to_string()))
}

/// Concatenates the aligned query row from all wrapped "Query" lines of the
/// first local-alignment block (bounded by the second "Score" line).
pub fn grab_query_string(text: &str) -> Result<String, ScanError> {
    grab_aligned_string(text, "Query")
}

/// Concatenates the aligned subject row from all wrapped "Sbjct" lines of the
/// first local-alignment block (bounded by the second "Score" line).
pub fn grab_subject_string(text: &str) -> Result<String, ScanError> {
    grab_aligned_string(text, "Sbjct")
}

fn grab_aligned_string(text: &str, prefix: &str) -> Result<String, ScanError> {
    let mut result = String::new();
    let mut passed_score = false;
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with("Score") {
            if passed_score {
                break;
            }
            passed_score = true;
        }
        if line.starts_with(prefix) {
            // wrapped rows look like "Query: 61 ACGT...TT 120"
            let piece = line
                .split_whitespace()
                .nth(2)
                .ok_or_else(|| ScanError::MalformedLine(line.to_string()))?;
            result.push_str(piece);
        }
    }
    Ok(result)
}

/// Strips the reference header from a match text, keeping the "Length"
/// statement if present, otherwise everything from "Score" on. Texts with
/// neither marker at a positive offset pass through unchanged.
pub fn remove_reference_header(text: &str) -> &str {
    let index = text.find("Length").or_else(|| text.find("Score"));
    match index {
        Some(pos) if pos > 0 => &text[pos..],
        _ => text,
    }
}

/// Guesses the alignment flavor of a match text: a "Frame" marker means
/// translated-nucleotide, a "Strand" marker means nucleotide, anything else
/// with a "Query" line is protein.
pub fn guess_flavor(text: &str) -> Flavor {
    if !text.contains("Query") {
        return Flavor::Unknown;
    }
    if text.contains("Frame=") || text.contains("Frame =") {
        return Flavor::TranslatedNucleotide;
    }
    if text.contains("Strand=") || text.contains("Strand =") {
        return Flavor::Nucleotide;
    }
    Flavor::Protein
}

/// Token after `key` (or `alias`) parsed as an integer. An absent or
/// unparseable token yields 0, so callers can apply their own defaults for
/// optional markers such as "Length =".
pub fn grab_next_int(text: &str, key: &str, alias: &str) -> i64 {
    grab_next(text, key, alias)
        .and_then(parse_int_prefix)
        .unwrap_or(0)
}

/// Last token of the last `key` line past "Score", parsed as an integer.
/// Unlike [`grab_next_int`], the token is required.
pub fn grab_last_int_passed_score(text: &str, key: &str) -> Result<i64, ScanError> {
    let token = grab_last_in_line_passed_score(text, key)?;
    parse_int_prefix(token).ok_or_else(|| ScanError::InvalidNumber {
        key: key.to_string(),
        value: token.to_string(),
    })
}

/// Parses the leading `[+-]?digits` prefix of a token, tolerating trailing
/// punctuation such as the comma in "Expect = 2e-58,".
fn parse_int_prefix(token: &str) -> Option<i64> {
    let mut end = 0;
    for (i, ch) in token.char_indices() {
        if ch.is_ascii_digit() || (i == 0 && (ch == '-' || ch == '+')) {
            end = i + ch.len_utf8();
        } else {
            break;
        }
    }
    token[..end].parse().ok()
}
