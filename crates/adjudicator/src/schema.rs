//! Validation of raw adjudicator responses.
//!
//! Required shape:
//!
//! ```json
//! { "confidence": 0-100, "sameEntity": true, "rationale": "...",
//!   "evidence": [{ "source": "...", "url": "...", "excerpt": "..." }] }
//! ```
//!
//! `same_entity` is accepted as an alias of `sameEntity`; `evidence` is
//! optional. Anything else is [`AdjudicatorError::Malformed`].

use serde_json::{Map, Value};

use crate::error::AdjudicatorError;
use crate::types::{Evidence, Verdict};

pub fn validate_response(raw: &Value) -> Result<Verdict, AdjudicatorError> {
    let fail = |reason: &str| AdjudicatorError::malformed(reason, &raw.to_string());

    let obj = raw.as_object().ok_or_else(|| fail("response is not an object"))?;

    let confidence = match obj.get("confidence") {
        Some(Value::Number(n)) => n
            .as_u64()
            .filter(|c| *c <= 100)
            .ok_or_else(|| fail("confidence must be an integer in 0..=100"))?,
        Some(_) => return Err(fail("confidence must be an integer in 0..=100")),
        None => return Err(fail("missing confidence")),
    };

    let same_entity = match obj.get("sameEntity").or_else(|| obj.get("same_entity")) {
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(fail("sameEntity must be a boolean")),
        None => return Err(fail("missing sameEntity")),
    };

    let rationale = match obj.get("rationale") {
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(fail("rationale must be a string")),
        None => return Err(fail("missing rationale")),
    };

    let evidence = match obj.get("evidence") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_object().and_then(parse_evidence))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| fail("evidence entries need string source, url and excerpt"))?,
        Some(_) => return Err(fail("evidence must be an array")),
    };

    Ok(Verdict {
        confidence: confidence as u8,
        same_entity,
        rationale,
        evidence,
    })
}

fn parse_evidence(obj: &Map<String, Value>) -> Option<Evidence> {
    let field = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
    Some(Evidence {
        source: field("source")?,
        url: field("url")?,
        excerpt: field("excerpt")?,
    })
}
