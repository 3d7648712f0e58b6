use serde_json::Value;

use crate::error::{MigrateError, Result};
use crate::models::index_meta::{IndexDefinition, IndexSettings};

/// Reconcile one index's raw settings document into canonical counts.
///
/// Two historical shapes exist: a nested `"index"` object holding
/// `number_of_shards`/`number_of_replicas`, and a flattened form with dotted
/// `"index.number_of_shards"` keys. Shape is detected by the presence of the
/// nested `"index"` key; neither shape present is a named, typed failure
/// rather than a silent default.
pub fn normalize(index_name: &str, raw: &Value) -> Result<IndexSettings> {
    let settings = raw.get("settings").unwrap_or(raw);

    if let Some(nested) = settings.get("index").filter(|v| v.is_object()) {
        if let (Some(shards), Some(replicas)) = (
            count_value(nested.get("number_of_shards")),
            count_value(nested.get("number_of_replicas")),
        ) {
            return Ok(IndexSettings {
                number_of_shards: shards,
                number_of_replicas: replicas,
            });
        }
    }

    if let (Some(shards), Some(replicas)) = (
        count_value(settings.get("index.number_of_shards")),
        count_value(settings.get("index.number_of_replicas")),
    ) {
        return Ok(IndexSettings {
            number_of_shards: shards,
            number_of_replicas: replicas,
        });
    }

    Err(MigrateError::MissingSettings {
        index: index_name.to_string(),
    })
}

// Counts arrive as strings from old servers and numbers from newer ones.
fn count_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Attach normalized settings from the `_all/_settings` listing to each
/// resolved definition. An index absent from the listing is fatal.
pub fn attach(
    definitions: Vec<IndexDefinition>,
    all_settings: &Value,
) -> Result<Vec<IndexDefinition>> {
    definitions
        .into_iter()
        .map(|mut def| {
            let raw = all_settings
                .get(&def.name)
                .ok_or_else(|| MigrateError::MissingSettings {
                    index: def.name.clone(),
                })?;
            def.settings = Some(normalize(&def.name, raw)?);
            Ok(def)
        })
        .collect()
}

/// Replicas are forced to `"0"` for the bulk load unless replication was
/// explicitly requested; replicating while loading churns the destination.
pub fn force_replicas(definitions: Vec<IndexDefinition>, replicate: bool) -> Vec<IndexDefinition> {
    if replicate {
        return definitions;
    }
    definitions
        .into_iter()
        .map(|mut def| {
            if let Some(settings) = def.settings.as_mut() {
                settings.number_of_replicas = "0".to_string();
            }
            def
        })
        .collect()
}

/// An explicit `--shards` override beats whatever the source reported.
pub fn override_shards(
    definitions: Vec<IndexDefinition>,
    shards: Option<u64>,
) -> Vec<IndexDefinition> {
    let Some(shards) = shards else {
        return definitions;
    };
    definitions
        .into_iter()
        .map(|mut def| {
            if let Some(settings) = def.settings.as_mut() {
                settings.number_of_shards = shards.to_string();
            }
            def
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn def(name: &str, shards: &str, replicas: &str) -> IndexDefinition {
        IndexDefinition {
            name: name.to_string(),
            mappings: json!({"mappings": {}}),
            settings: Some(IndexSettings {
                number_of_shards: shards.to_string(),
                number_of_replicas: replicas.to_string(),
            }),
        }
    }

    #[test]
    fn normalizes_new_style_settings() {
        let raw = json!({
            "settings": {"index": {"number_of_shards": "5", "number_of_replicas": "2"}}
        });
        let settings = normalize("logs", &raw).unwrap();
        assert_eq!(settings.number_of_shards, "5");
        assert_eq!(settings.number_of_replicas, "2");
    }

    #[test]
    fn normalizes_legacy_dotted_settings() {
        let raw = json!({
            "settings": {"index.number_of_shards": "5", "index.number_of_replicas": "1"}
        });
        let settings = normalize("logs", &raw).unwrap();
        assert_eq!(settings.number_of_shards, "5");
        assert_eq!(settings.number_of_replicas, "1");
    }

    #[test]
    fn numeric_counts_are_accepted() {
        let raw = json!({
            "settings": {"index": {"number_of_shards": 3, "number_of_replicas": 1}}
        });
        let settings = normalize("logs", &raw).unwrap();
        assert_eq!(settings.number_of_shards, "3");
    }

    #[test]
    fn missing_both_shapes_names_the_index() {
        let raw = json!({"settings": {"analysis": {}}});
        let err = normalize("logs-2015", &raw).unwrap_err();
        assert!(err.to_string().contains("logs-2015"));
    }

    #[test]
    fn replicas_forced_to_zero_unless_replication_requested() {
        let out = force_replicas(vec![def("a", "5", "2")], false);
        assert_eq!(out[0].settings.as_ref().unwrap().number_of_replicas, "0");

        let out = force_replicas(vec![def("a", "5", "2")], true);
        assert_eq!(out[0].settings.as_ref().unwrap().number_of_replicas, "2");
    }

    #[test]
    fn shard_override_beats_source_settings() {
        let out = override_shards(vec![def("a", "5", "0")], Some(12));
        assert_eq!(out[0].settings.as_ref().unwrap().number_of_shards, "12");

        let out = override_shards(vec![def("a", "5", "0")], None);
        assert_eq!(out[0].settings.as_ref().unwrap().number_of_shards, "5");
    }

    #[test]
    fn attach_fails_when_index_is_missing_from_listing() {
        let defs = vec![IndexDefinition {
            name: "absent".to_string(),
            mappings: json!({"mappings": {}}),
            settings: None,
        }];
        let all_settings = json!({"other": {"settings": {"index": {}}}});
        assert!(attach(defs, &all_settings).is_err());
    }

    #[test]
    fn attach_normalizes_each_index() {
        let defs = vec![IndexDefinition {
            name: "logs".to_string(),
            mappings: json!({"mappings": {}}),
            settings: None,
        }];
        let all_settings = json!({
            "logs": {"settings": {"index": {"number_of_shards": "2", "number_of_replicas": "1"}}}
        });
        let out = attach(defs, &all_settings).unwrap();
        assert_eq!(out[0].settings.as_ref().unwrap().number_of_shards, "2");
    }
}
