//! Turns a model's free-form reply into a validated [`RecommendationResult`].
//!
//! The reply is untrusted. The first balanced JSON object in the text that carries a
//! `recommendations` array is extracted with a string-aware brace scan, every field is read tolerantly with explicit defaults, and
//! any recommended product that is not in the catalog is dropped.

use serde_json::{Map, Value};
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::AdvisorError;
use crate::model::{Recommendation, RecommendationResult};

pub const DEFAULT_SUMMARY: &str = "Product recommendations based on your query";
pub const MAX_MATCH_SCORE: u8 = 10;

pub fn parse_response(
    raw_text: &str,
    original_query: &str,
    catalog: &Catalog,
) -> Result<RecommendationResult, AdvisorError> {
    let mut saw_object = false;
    let mut reply = None;
    for mut object in json_objects(raw_text) {
        saw_object = true;
        if let Some(Value::Array(candidates)) = object.remove("recommendations") {
            reply = Some((candidates, object));
            break;
        }
    }
    let Some((candidates, root)) = reply else {
        let message = if saw_object {
            "response has no recommendations array"
        } else {
            "no JSON object found in model response"
        };
        return Err(AdvisorError::MalformedResponse(message.to_string()));
    };

    let offered = candidates.len();
    let recommendations: Vec<Recommendation> = candidates
        .iter()
        .filter_map(|candidate| validate_candidate(candidate, catalog))
        .collect();
    debug!(
        offered,
        kept = recommendations.len(),
        "validated model recommendations against catalog"
    );

    let summary = root
        .get("summary")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SUMMARY)
        .to_string();

    Ok(RecommendationResult {
        total_matches: recommendations.len(),
        recommendations,
        user_query: original_query.to_string(),
        summary,
    })
}

/// Returns the first `{...}` span in `text` that is brace-balanced and parses as a JSON
/// object. Candidates are tried left to right.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    json_objects(text).next()
}

/// Every brace-balanced span of `text` that parses as a JSON object, in order of its
/// opening brace. Nested objects are yielded after their parent.
pub fn json_objects(text: &str) -> impl Iterator<Item = Map<String, Value>> + '_ {
    let bytes = text.as_bytes();
    let mut from = 0;
    std::iter::from_fn(move || {
        while let Some(offset) = text[from..].find('{') {
            let open = from + offset;
            from = open + 1;
            if let Some(close) = matching_brace(bytes, open) {
                if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text[open..=close]) {
                    return Some(map);
                }
            }
        }
        None
    })
}

// Braces inside string literals don't count. All delimiters are ASCII, so byte offsets
// always land on char boundaries.
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn validate_candidate(candidate: &Value, catalog: &Catalog) -> Option<Recommendation> {
    let product = candidate.get("product")?;
    let brand = product.get("brand")?.as_str()?;
    let product_name = product.get("product_name")?.as_str()?;
    let price = product.get("price")?.as_f64()?;

    let Some(entry) = catalog.find(brand, product_name, price) else {
        debug!(brand, product_name, price, "dropping recommendation outside the catalog");
        return None;
    };

    Some(Recommendation {
        product: entry.clone(),
        reasoning: candidate
            .get("reasoning")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        match_score: match_score(candidate.get("matchScore")),
        pros: string_list(candidate.get("pros")),
        cons: string_list(candidate.get("cons")),
    })
}

fn match_score(value: Option<&Value>) -> u8 {
    value
        .and_then(Value::as_f64)
        .filter(|score| score.is_finite())
        .map(|score| score.round().clamp(0.0, MAX_MATCH_SCORE as f64) as u8)
        .unwrap_or(0)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
