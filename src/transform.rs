//! Record transformation between export shape and submit shape.
//!
//! Export payloads carry flat records: bare enum tag strings, textual
//! principal encodings, plain optional fields. The target service's write
//! API wants tagged unions (`{"Vault": {}}`), binary principals, and
//! zero-or-one-element sequences for optionals. The rewrite rules are
//! declared per job as a [`RecordSchema`] and applied here; everything in
//! this module is pure and does no I/O.

use crate::utils::errors::{MigrationError, Result};
use serde_json::{json, Map, Value};

/// Rewrite rule for one named field of a record.
#[derive(Debug, Clone)]
pub enum FieldRule {
    /// Bare variant string out of a closed set, e.g. `"System"`, becomes the
    /// single-key object `{"System": {}}`.
    Tag(Vec<&'static str>),

    /// Dashed base-32 principal text decoded to its canonical byte form.
    Principal,

    /// Optional value wrapped as a zero-or-one-element array.
    Optional,

    /// Field missing from the export shape but required by the submit shape;
    /// filled with the given default.
    Backfill(Value),

    /// Array of sub-records, each rewritten with the nested schema.
    Nested(RecordSchema),
}

/// Ordered set of field rules for one job's records.
#[derive(Debug, Clone, Default)]
pub struct RecordSchema {
    fields: Vec<(String, FieldRule)>,
}

impl RecordSchema {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn field(mut self, name: &str, rule: FieldRule) -> Self {
        self.fields.push((name.to_string(), rule));
        self
    }
}

/// Rewrite a single export-shaped record into its submit shape.
///
/// Fields not named by the schema pass through untouched. A record that is
/// not a JSON object, or whose field violates its rule, is a hard error:
/// partial application would corrupt referential integrity for later ranges.
pub fn transform_record(record: &Value, schema: &RecordSchema) -> Result<Value> {
    let object = record.as_object().ok_or_else(|| MigrationError::Transform {
        field: "<record>".into(),
        reason: "expected a JSON object".into(),
    })?;

    let mut out: Map<String, Value> = object.clone();

    for (name, rule) in &schema.fields {
        let current = object.get(name);
        let rewritten = apply_rule(name, rule, current)?;
        out.insert(name.clone(), rewritten);
    }

    Ok(Value::Object(out))
}

/// Parse a chunk payload as a JSON array of records and rewrite each one.
pub fn transform_payload(payload: &[u8], schema: &RecordSchema) -> Result<Vec<Value>> {
    let records: Vec<Value> = serde_json::from_slice(payload)?;
    records
        .iter()
        .map(|record| transform_record(record, schema))
        .collect()
}

fn apply_rule(name: &str, rule: &FieldRule, value: Option<&Value>) -> Result<Value> {
    let err = |reason: String| MigrationError::Transform {
        field: name.to_string(),
        reason,
    };

    match rule {
        FieldRule::Tag(variants) => {
            let tag = value
                .and_then(Value::as_str)
                .ok_or_else(|| err("expected a bare tag string".into()))?;
            if !variants.contains(&tag) {
                return Err(err(format!("unknown variant '{tag}'")));
            }
            Ok(json!({ tag: {} }))
        }
        FieldRule::Principal => {
            let text = value
                .and_then(Value::as_str)
                .ok_or_else(|| err("expected a textual principal".into()))?;
            let bytes = decode_principal(text).map_err(err)?;
            Ok(Value::Array(bytes.into_iter().map(|b| json!(b)).collect()))
        }
        FieldRule::Optional => match value {
            None | Some(Value::Null) => Ok(json!([])),
            Some(v) => Ok(json!([v.clone()])),
        },
        FieldRule::Backfill(default) => match value {
            None | Some(Value::Null) => Ok(default.clone()),
            Some(v) => Ok(v.clone()),
        },
        FieldRule::Nested(sub_schema) => {
            let items = value
                .and_then(Value::as_array)
                .ok_or_else(|| err("expected an array of sub-records".into()))?;
            let rewritten = items
                .iter()
                .map(|item| transform_record(item, sub_schema))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Array(rewritten))
        }
    }
}

const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Decode dashed base-32 principal text to its canonical byte form.
///
/// The decoded string is `crc32(bytes) ++ bytes` with a big-endian checksum;
/// the checksum is verified and stripped.
pub fn decode_principal(text: &str) -> std::result::Result<Vec<u8>, String> {
    let compact: String = text
        .chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();

    let mut buffer = 0u64;
    let mut bits = 0u32;
    let mut decoded = Vec::with_capacity(compact.len() * 5 / 8);
    for c in compact.bytes() {
        let index = BASE32_ALPHABET
            .iter()
            .position(|&a| a == c)
            .ok_or_else(|| format!("invalid base32 character '{}'", c as char))?;
        buffer = (buffer << 5) | index as u64;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            decoded.push((buffer >> bits) as u8);
        }
    }

    if decoded.len() < 4 {
        return Err("principal too short".into());
    }
    let (checksum, body) = decoded.split_at(4);
    let expected = crc32(body).to_be_bytes();
    if checksum != expected {
        return Err("principal checksum mismatch".into());
    }
    Ok(body.to_vec())
}

/// Render canonical principal bytes as dashed base-32 text.
pub fn principal_to_text(bytes: &[u8]) -> String {
    let mut data = crc32(bytes).to_be_bytes().to_vec();
    data.extend_from_slice(bytes);

    let mut buffer = 0u64;
    let mut bits = 0u32;
    let mut encoded = Vec::new();
    for &b in &data {
        buffer = (buffer << 8) | b as u64;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            encoded.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize]);
        }
    }
    if bits > 0 {
        encoded.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize]);
    }

    encoded
        .chunks(5)
        .map(|group| std::str::from_utf8(group).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("-")
}

/// CRC-32 (IEEE), bitwise.
fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}
