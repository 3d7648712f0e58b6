use serde_json::{json, Value};

/// Canonical shard/replica counts. ES transports these as strings in both
/// the settings listing and the index-creation body, so they stay strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    pub number_of_shards: String,
    pub number_of_replicas: String,
}

/// A resolved source index: its name, the mapping body to replay on the
/// destination, and normalized settings. Built once by the resolver, passed
/// by value through each transformation pass, consumed by the provisioner.
#[derive(Debug, Clone)]
pub struct IndexDefinition {
    pub name: String,
    pub mappings: Value,
    pub settings: Option<IndexSettings>,
}

impl IndexDefinition {
    /// Body for `POST /{index}` on the destination.
    pub fn creation_body(&self) -> Value {
        let mut body = self.mappings.clone();
        if let (Some(settings), Some(obj)) = (&self.settings, body.as_object_mut()) {
            obj.insert(
                "settings".to_string(),
                json!({
                    "index": {
                        "number_of_shards": settings.number_of_shards,
                        "number_of_replicas": settings.number_of_replicas,
                    }
                }),
            );
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_body_nests_settings_under_index() {
        let def = IndexDefinition {
            name: "logs".to_string(),
            mappings: json!({"mappings": {"properties": {}}}),
            settings: Some(IndexSettings {
                number_of_shards: "5".to_string(),
                number_of_replicas: "0".to_string(),
            }),
        };
        let body = def.creation_body();
        assert_eq!(body["settings"]["index"]["number_of_shards"], "5");
        assert_eq!(body["settings"]["index"]["number_of_replicas"], "0");
        assert!(body["mappings"].is_object());
    }

    #[test]
    fn creation_body_without_settings_is_just_the_mappings() {
        let def = IndexDefinition {
            name: "logs".to_string(),
            mappings: json!({"mappings": {}}),
            settings: None,
        };
        assert_eq!(def.creation_body(), json!({"mappings": {}}));
    }
}
