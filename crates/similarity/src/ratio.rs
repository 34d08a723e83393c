//! Edit-distance based string ratios, all scaled to `[0, 100]`.

use std::collections::BTreeSet;

use strsim::normalized_levenshtein;

/// Normalized Levenshtein similarity. Two empty strings score 0, not 100:
/// absence of a name is never evidence of a match.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    normalized_levenshtein(a, b) * 100.0
}

/// Best [`ratio`] of the shorter string against every equal-length character
/// window of the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short_len = short.chars().count();
    let long_chars: Vec<char> = long.chars().collect();
    if short_len == 0 {
        return 0.0;
    }
    if short_len == long_chars.len() {
        return ratio(short, long);
    }

    let mut best = 0.0_f64;
    let mut window = String::with_capacity(long.len());
    for start in 0..=(long_chars.len() - short_len) {
        window.clear();
        window.extend(&long_chars[start..start + short_len]);
        let score = ratio(short, &window);
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

/// [`ratio`] over the lexicographically sorted tokens of both sides.
pub fn token_sort_ratio(a: &[String], b: &[String]) -> f64 {
    ratio(&sorted_join(a), &sorted_join(b))
}

/// Set-based ratio tolerant of repeated and extra tokens.
///
/// If the token sets intersect and either side is a subset of the other the
/// score is 100. Otherwise the sorted intersection is compared against each
/// side's intersection-plus-remainder and the best ratio wins.
pub fn token_set_ratio(a: &[String], b: &[String]) -> f64 {
    let set_a: BTreeSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: BTreeSet<&str> = b.iter().map(String::as_str).collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let common: Vec<&str> = set_a.intersection(&set_b).copied().collect();
    let only_a: Vec<&str> = set_a.difference(&set_b).copied().collect();
    let only_b: Vec<&str> = set_b.difference(&set_a).copied().collect();

    if !common.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let sect = common.join(" ");
    let rest_a = only_a.join(" ");
    let rest_b = only_b.join(" ");
    if sect.is_empty() {
        return ratio(&rest_a, &rest_b);
    }

    let combined_a = format!("{sect} {rest_a}");
    let combined_b = format!("{sect} {rest_b}");
    ratio(&sect, &combined_a)
        .max(ratio(&sect, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

fn sorted_join(tokens: &[String]) -> String {
    let mut sorted: Vec<&str> = tokens.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(" ")
}
