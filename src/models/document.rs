use serde::Serialize;
use serde_json::{Map, Value};

/// One source document pulled from a scroll page. The `source` payload is
/// copied verbatim; the pipeline never looks inside it.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(skip)]
    pub source: Map<String, Value>,
}

impl Document {
    /// `_index`, `_type` and `_id` must all be non-empty before the document
    /// is allowed anywhere near a bulk buffer.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.index.is_empty() {
            return Err(format!("document {:?} has an empty _index", self.id));
        }
        if self.doc_type.is_empty() {
            return Err(format!("document {:?} has an empty _type", self.id));
        }
        if self.id.is_empty() {
            return Err(format!(
                "document in index {:?} has an empty _id",
                self.index
            ));
        }
        Ok(())
    }
}
