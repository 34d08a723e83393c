use std::fmt;

use serde::{Deserialize, Serialize};

/// Caller-supplied name text plus optional context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RawName {
    pub text: String,
    /// Free-form hint forwarded to adjudicators (city, specialty, ledger...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl RawName {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: None,
            source_id: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }
}

impl From<&str> for RawName {
    fn from(value: &str) -> Self {
        RawName::new(value)
    }
}

/// Output of the normalizer: an ordered token sequence.
///
/// Tokens contain only lowercase alphanumerics and internal hyphens, so the
/// space-joined `text` round-trips through [`NormalizedName::from_tokens`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct NormalizedName {
    text: String,
    tokens: Vec<String>,
}

impl NormalizedName {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_tokens(tokens: Vec<String>) -> Self {
        let text = tokens.join(" ");
        Self { text, tokens }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn first_token(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Tokens in lexicographic order, for order-independent comparison.
    pub fn sorted_tokens(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.tokens.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted
    }

    pub fn sorted_text(&self) -> String {
        self.sorted_tokens().join(" ")
    }
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for NormalizedName {
    fn as_ref(&self) -> &str {
        &self.text
    }
}
