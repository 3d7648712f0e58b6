use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::models::document::Document;

/// One decoded page of a scroll. `scroll_id` supersedes whatever cursor the
/// reader held before; `dropped` carries a message per malformed hit so the
/// reader can report them without aborting the page.
#[derive(Debug)]
pub struct ScrollPage {
    pub scroll_id: String,
    pub total_hits: u64,
    pub docs: Vec<Document>,
    pub dropped: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawScrollResponse {
    #[serde(rename = "_scroll_id")]
    scroll_id: String,
    hits: RawHits,
}

#[derive(Debug, Deserialize)]
struct RawHits {
    #[serde(default)]
    total: TotalHits,
    #[serde(default)]
    hits: Vec<Value>,
}

// Old servers report `"total": 123`, newer ones `"total": {"value": 123}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Legacy(u64),
    Object { value: u64 },
}

impl Default for TotalHits {
    fn default() -> Self {
        TotalHits::Legacy(0)
    }
}

impl TotalHits {
    fn value(&self) -> u64 {
        match self {
            TotalHits::Legacy(value) => *value,
            TotalHits::Object { value } => *value,
        }
    }
}

impl ScrollPage {
    pub fn parse(body: &str) -> Result<Self> {
        let raw: RawScrollResponse = serde_json::from_str(body)?;
        let mut docs = Vec::with_capacity(raw.hits.hits.len());
        let mut dropped = Vec::new();

        for hit in raw.hits.hits {
            match hit_to_document(&hit) {
                Ok(doc) => docs.push(doc),
                Err(reason) => dropped.push(reason),
            }
        }

        Ok(Self {
            scroll_id: raw.scroll_id,
            total_hits: raw.hits.total.value(),
            docs,
            dropped,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty() && self.dropped.is_empty()
    }
}

fn hit_to_document(hit: &Value) -> std::result::Result<Document, String> {
    let index = required_str(hit, "_index")?;
    let doc_type = required_str(hit, "_type")?;
    let id = required_str(hit, "_id")?;
    let source = hit
        .get("_source")
        .and_then(Value::as_object)
        .ok_or_else(|| format!("hit {id} has no _source object"))?;

    Ok(Document {
        index,
        doc_type,
        id,
        source: source.clone(),
    })
}

fn required_str(hit: &Value, field: &str) -> std::result::Result<String, String> {
    match hit.get(field).and_then(Value::as_str) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(format!("hit is missing {field}: {hit}")),
    }
}
