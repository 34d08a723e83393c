use std::collections::{HashMap, HashSet};

use crate::config::NormalizeConfig;
use crate::error::NormalizeError;
use crate::name::{NormalizedName, RawName};
use crate::token::fold_and_tokenize;

/// A compiled, immutable normalization pipeline.
///
/// Built once from a [`NormalizeConfig`] and then shared (it is `Send + Sync`)
/// across every worker that needs canonical names.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: NormalizeConfig,
    abbreviations: HashMap<Vec<String>, Vec<String>>,
    longest_key: usize,
    suffixes: HashSet<String>,
    stopwords: HashSet<String>,
}

impl Normalizer {
    /// Validate and compile the dictionaries in `cfg`.
    ///
    /// Every dictionary entry is run through the same character folding as
    /// input names, so `"St."` and `"st"` are the same key. An expansion may
    /// not contain a token that appears in any abbreviation key; rewriting
    /// could otherwise cycle.
    pub fn new(cfg: &NormalizeConfig) -> Result<Self, NormalizeError> {
        if cfg.version == 0 {
            return Err(NormalizeError::InvalidConfig(
                "config version must be >= 1".into(),
            ));
        }

        let suffixes = compile_single_tokens("suffixes", &cfg.suffixes)?;
        let stopwords = compile_single_tokens("stopwords", &cfg.stopwords)?;

        let mut abbreviations: HashMap<Vec<String>, Vec<String>> = HashMap::new();
        for (key, expansion) in &cfg.abbreviations {
            let key_tokens = fold_and_tokenize(key);
            if key_tokens.is_empty() {
                return Err(NormalizeError::InvalidAbbreviation {
                    key: key.clone(),
                    reason: "key normalizes to nothing".into(),
                });
            }
            let expansion_tokens = fold_and_tokenize(expansion);
            if expansion_tokens.is_empty() {
                return Err(NormalizeError::InvalidAbbreviation {
                    key: key.clone(),
                    reason: "expansion normalizes to nothing".into(),
                });
            }
            if abbreviations
                .get(&key_tokens)
                .is_some_and(|existing| existing != &expansion_tokens)
            {
                return Err(NormalizeError::InvalidAbbreviation {
                    key: key.clone(),
                    reason: "collides with another key after normalization".into(),
                });
            }
            abbreviations.insert(key_tokens, expansion_tokens);
        }

        let key_tokens: HashSet<&str> = abbreviations
            .keys()
            .flat_map(|k| k.iter().map(String::as_str))
            .collect();
        for (key, expansion) in &abbreviations {
            if let Some(tok) = expansion.iter().find(|t| key_tokens.contains(t.as_str())) {
                return Err(NormalizeError::InvalidAbbreviation {
                    key: key.join(" "),
                    reason: format!("expansion token `{tok}` is itself an abbreviation key token"),
                });
            }
        }

        let longest_key = abbreviations.keys().map(Vec::len).max().unwrap_or(0);

        Ok(Self {
            config: cfg.clone(),
            abbreviations,
            longest_key,
            suffixes,
            stopwords,
        })
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    pub fn version(&self) -> u32 {
        self.config.version
    }

    /// Produce the canonical form of `input`. Never fails; input with no
    /// usable characters yields an empty name.
    pub fn normalize(&self, input: &str) -> NormalizedName {
        let tokens = fold_and_tokenize(input);
        if tokens.is_empty() {
            return NormalizedName::empty();
        }
        NormalizedName::from_tokens(self.rewrite(tokens))
    }

    pub fn normalize_raw(&self, raw: &RawName) -> NormalizedName {
        self.normalize(&raw.text)
    }

    /// Byte input from untrusted feeds; invalid UTF-8 yields an empty name.
    pub fn normalize_bytes(&self, input: &[u8]) -> NormalizedName {
        match std::str::from_utf8(input) {
            Ok(text) => self.normalize(text),
            Err(_) => NormalizedName::empty(),
        }
    }

    /// Apply expansion, suffix stripping and stopword removal until nothing
    /// changes. Expansions never introduce key tokens and the other two
    /// passes only remove tokens, so the loop terminates.
    fn rewrite(&self, mut tokens: Vec<String>) -> Vec<String> {
        loop {
            let expanded = self.expand(&tokens);
            let stripped = self.strip_suffixes(expanded);
            let filtered: Vec<String> = stripped
                .into_iter()
                .filter(|t| !self.stopwords.contains(t))
                .collect();
            if filtered == tokens {
                return filtered;
            }
            tokens = filtered;
        }
    }

    fn expand(&self, tokens: &[String]) -> Vec<String> {
        if self.abbreviations.is_empty() {
            return tokens.to_vec();
        }
        let mut out = Vec::with_capacity(tokens.len());
        let mut i = 0;
        'outer: while i < tokens.len() {
            let max = self.longest_key.min(tokens.len() - i);
            for len in (1..=max).rev() {
                if let Some(expansion) = self.abbreviations.get(&tokens[i..i + len]) {
                    out.extend(expansion.iter().cloned());
                    i += len;
                    continue 'outer;
                }
            }
            out.push(tokens[i].clone());
            i += 1;
        }
        out
    }

    fn strip_suffixes(&self, mut tokens: Vec<String>) -> Vec<String> {
        while tokens.len() > 1
            && tokens
                .last()
                .is_some_and(|last| self.suffixes.contains(last))
        {
            tokens.pop();
        }
        tokens
    }
}

fn compile_single_tokens(
    list: &'static str,
    entries: &[String],
) -> Result<HashSet<String>, NormalizeError> {
    let mut set = HashSet::with_capacity(entries.len());
    for entry in entries {
        let mut tokens = fold_and_tokenize(entry);
        if tokens.len() != 1 {
            return Err(NormalizeError::InvalidEntry {
                list,
                entry: entry.clone(),
            });
        }
        set.extend(tokens.pop());
    }
    Ok(set)
}
