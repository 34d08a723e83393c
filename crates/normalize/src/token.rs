//! Character folding and tokenization.
//!
//! Folding lowercases, applies compatibility decomposition (NFKD) and drops
//! combining marks, so "Café", "CAFE" and "ｃａｆé" all fold to "cafe".
//! Tokenizing then splits on whitespace and separator punctuation. Periods
//! and apostrophes are deleted in place ("St." → "st", "Mary's" → "marys")
//! and hyphens survive only between other characters.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase, decompose and strip diacritics.
///
/// Lowercasing runs again after decomposition because compatibility forms can
/// decompose to capitals (`ℌ` → `H`).
pub fn fold_characters(input: &str) -> String {
    input
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Split folded text into bare tokens.
///
/// Produces only non-empty tokens made of alphanumerics and internal hyphens.
pub fn tokenize(folded: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in folded.chars() {
        if ch.is_alphanumeric() || ch == '-' {
            current.push(ch);
        } else if is_elided(ch) {
            continue;
        } else {
            flush(&mut current, &mut tokens);
        }
    }
    flush(&mut current, &mut tokens);
    tokens
}

/// Fold then tokenize in one call.
pub fn fold_and_tokenize(input: &str) -> Vec<String> {
    tokenize(&fold_characters(input))
}

fn is_elided(ch: char) -> bool {
    matches!(ch, '.' | '\'' | '\u{2019}' | '\u{02BC}' | '`')
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    let trimmed = current.trim_matches('-');
    // A run of hyphens inside a token ("a--b") collapses to one.
    let mut token = String::with_capacity(trimmed.len());
    let mut last_hyphen = false;
    for ch in trimmed.chars() {
        if ch == '-' {
            if !last_hyphen {
                token.push(ch);
            }
            last_hyphen = true;
        } else {
            token.push(ch);
            last_hyphen = false;
        }
    }
    if !token.is_empty() {
        tokens.push(token);
    }
    current.clear();
}
