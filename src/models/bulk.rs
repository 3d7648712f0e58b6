use serde_json::json;

use crate::error::Result;
use crate::models::document::Document;

/// Upper bound on a single `_bulk` request body. Matches the destination's
/// default http request limits with headroom.
pub const MAX_BULK_BYTES: usize = 100_000_000;

/// Encode one document as a two-line bulk record: the `create` action line
/// followed by the untouched `_source` payload, each newline-terminated.
pub fn encode_record(doc: &Document) -> Result<Vec<u8>> {
    let mut record = serde_json::to_vec(&json!({ "create": doc }))?;
    record.push(b'\n');
    record.extend_from_slice(&serde_json::to_vec(&doc.source)?);
    record.push(b'\n');
    Ok(record)
}

/// Accumulates encoded bulk records for a single worker. Each worker owns
/// exactly one buffer, so appends never contend; only the flush itself is
/// serialized across the pool.
#[derive(Debug)]
pub struct BulkBuffer {
    buf: Vec<u8>,
    max_bytes: usize,
    docs: u64,
}

impl BulkBuffer {
    pub fn new() -> Self {
        Self::with_max_bytes(MAX_BULK_BYTES)
    }

    pub fn with_max_bytes(max_bytes: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_bytes,
            docs: 0,
        }
    }

    /// True when appending `incoming_len` more bytes would push the request
    /// body past the ceiling, i.e. the buffer must be flushed first.
    pub fn wants_flush(&self, incoming_len: usize) -> bool {
        self.buf.len() + incoming_len > self.max_bytes
    }

    pub fn push_record(&mut self, record: &[u8]) {
        self.buf.extend_from_slice(record);
        self.docs += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn docs(&self) -> u64 {
        self.docs
    }

    /// Hand the accumulated body over for a flush and reset the buffer. The
    /// last record already carries the trailing newline the bulk API wants.
    pub fn take_payload(&mut self) -> (Vec<u8>, u64) {
        let docs = self.docs;
        self.docs = 0;
        (std::mem::take(&mut self.buf), docs)
    }
}

impl Default for BulkBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn doc(id: &str) -> Document {
        let mut source = Map::new();
        source.insert("field".to_string(), serde_json::json!("value"));
        Document {
            index: "logs".to_string(),
            doc_type: "entry".to_string(),
            id: id.to_string(),
            source,
        }
    }

    #[test]
    fn record_is_exactly_two_lines() {
        let record = encode_record(&doc("1")).unwrap();
        let text = String::from_utf8(record).unwrap();
        let lines: Vec<&str> = text.trim_end().split('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(text.ends_with('\n'));

        let action: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(action["create"]["_index"], "logs");
        assert_eq!(action["create"]["_type"], "entry");
        assert_eq!(action["create"]["_id"], "1");

        let source: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(source["field"], "value");
    }

    #[test]
    fn source_payload_is_copied_verbatim_without_metadata() {
        let record = encode_record(&doc("1")).unwrap();
        let text = String::from_utf8(record).unwrap();
        let source_line = text.trim_end().split('\n').nth(1).unwrap();
        assert!(!source_line.contains("_index"));
        assert!(!source_line.contains("_id"));
    }

    #[test]
    fn flush_triggers_before_the_ceiling_is_crossed() {
        let record = encode_record(&doc("1")).unwrap();
        let mut buffer = BulkBuffer::with_max_bytes(record.len() * 2);

        assert!(!buffer.wants_flush(record.len()));
        buffer.push_record(&record);
        assert!(!buffer.wants_flush(record.len()));
        buffer.push_record(&record);
        // a third record would exceed the ceiling, so a flush is due first
        assert!(buffer.wants_flush(record.len()));
        assert_eq!(buffer.docs(), 2);
    }

    #[test]
    fn take_payload_resets_the_buffer() {
        let record = encode_record(&doc("1")).unwrap();
        let mut buffer = BulkBuffer::new();
        buffer.push_record(&record);

        let (payload, docs) = buffer.take_payload();
        assert_eq!(docs, 1);
        assert_eq!(payload, record);
        assert!(buffer.is_empty());
        assert_eq!(buffer.docs(), 0);
    }
}
