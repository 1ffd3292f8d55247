//! Cart share codes: base64 of a JSON array of `{ "id", "v", "q" }` triples.
//!
//! Only the catalog product id, the variant id and the quantity travel in a
//! code. Names and prices are resolved against the live catalog on load.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ProductId, VariantId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SharedLine {
    pub id: ProductId,
    #[serde(default)]
    pub v: Option<VariantId>,
    pub q: u32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShareCodeError {
    #[error("share code is not valid base64")]
    InvalidBase64,
    #[error("share code is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("share code payload is not an array")]
    NotAnArray,
    #[error("share code entry {index} is invalid: {reason}")]
    InvalidEntry { index: usize, reason: String },
}

pub fn encode(lines: &[SharedLine]) -> String {
    // Vec of plain structs always serializes
    let json = serde_json::to_string(lines).unwrap_or_else(|_| "[]".to_string());
    STANDARD.encode(json)
}

pub fn decode(code: &str) -> Result<Vec<SharedLine>, ShareCodeError> {
    let bytes = STANDARD.decode(code.trim()).map_err(|_| ShareCodeError::InvalidBase64)?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| ShareCodeError::InvalidJson(e.to_string()))?;
    let entries = value.as_array().ok_or(ShareCodeError::NotAnArray)?;

    entries.iter().enumerate().map(|(index, entry)| {
        let line: SharedLine = serde_json::from_value(entry.clone())
            .map_err(|e| ShareCodeError::InvalidEntry { index, reason: e.to_string() })?;
        if line.id.is_empty() {
            return Err(ShareCodeError::InvalidEntry { index, reason: "empty product id".into() });
        }
        if line.q == 0 {
            return Err(ShareCodeError::InvalidEntry { index, reason: "quantity must be positive".into() });
        }
        Ok(line)
    }).collect()
}

#[cfg(test)]
pub(crate) fn encode_raw(payload: &str) -> String { STANDARD.encode(payload) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_accepts_missing_variant() {
        let code = encode_raw(r#"[{"id":"p1","q":2},{"id":"p2","v":"mint","q":1}]"#);
        let lines = decode(&code).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].v, None);
        assert_eq!(lines[1].v, Some(VariantId::from("mint")));
    }

    #[test]
    fn test_encode_embeds_only_ids_and_quantity() {
        let code = encode(&[SharedLine { id: "p1".into(), v: None, q: 3 }]);
        let json = String::from_utf8(STANDARD.decode(code).unwrap()).unwrap();
        assert_eq!(json, r#"[{"id":"p1","v":null,"q":3}]"#);
    }

    #[test]
    fn test_decode_rejections() {
        assert_eq!(decode("***"), Err(ShareCodeError::InvalidBase64));
        assert!(matches!(decode(&encode_raw("nope")), Err(ShareCodeError::InvalidJson(_))));
        assert_eq!(decode(&encode_raw(r#"{"id":"p1","q":1}"#)), Err(ShareCodeError::NotAnArray));
        assert!(matches!(decode(&encode_raw(r#"[{"id":"","q":1}]"#)), Err(ShareCodeError::InvalidEntry { index: 0, .. })));
        assert!(matches!(decode(&encode_raw(r#"[{"id":"p1","q":1},{"id":"p2","q":0}]"#)), Err(ShareCodeError::InvalidEntry { index: 1, .. })));
        assert!(matches!(decode(&encode_raw(r#"[{"id":"p1","q":-2}]"#)), Err(ShareCodeError::InvalidEntry { .. })));
    }
}
