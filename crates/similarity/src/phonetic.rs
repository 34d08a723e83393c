//! Token-wise American Soundex.

use crate::ratio::ratio;

/// Soundex key of the ASCII letters in `token` (`"hospital"` → `"H213"`).
/// Returns `None` when the token has no ASCII letters.
pub fn soundex(token: &str) -> Option<String> {
    let mut letters = token
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase());
    let first = letters.next()?;

    let mut key = String::with_capacity(4);
    key.push(first.to_ascii_uppercase());
    let mut last = code(first);
    for c in letters {
        let digit = code(c);
        match digit {
            // h and w do not separate equal codes
            Some('h') => continue,
            Some('0') => last = None,
            Some(d) => {
                if last != Some(d) {
                    key.push(d);
                    if key.len() == 4 {
                        break;
                    }
                }
                last = Some(d);
            }
            None => {}
        }
    }
    while key.len() < 4 {
        key.push('0');
    }
    Some(key)
}

fn code(c: char) -> Option<char> {
    match c {
        'b' | 'f' | 'p' | 'v' => Some('1'),
        'c' | 'g' | 'j' | 'k' | 'q' | 's' | 'x' | 'z' => Some('2'),
        'd' | 't' => Some('3'),
        'l' => Some('4'),
        'm' | 'n' => Some('5'),
        'r' => Some('6'),
        'h' | 'w' => Some('h'),
        'a' | 'e' | 'i' | 'o' | 'u' | 'y' => Some('0'),
        _ => None,
    }
}

/// Space-joined phonetic keys for a token sequence. Tokens without ASCII
/// letters (numbers, other scripts) contribute themselves.
pub fn phonetic_key(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|t| soundex(t).unwrap_or_else(|| t.clone()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ratio of the two phonetic keys. Arguments are always passed as `(a, b)`.
pub fn phonetic_similarity(a: &[String], b: &[String]) -> f64 {
    ratio(&phonetic_key(a), &phonetic_key(b))
}
