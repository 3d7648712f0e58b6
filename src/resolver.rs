use serde_json::{json, Value};

use crate::error::{MigrateError, Result};
use crate::es_client::EsClient;
use crate::models::index_meta::IndexDefinition;

/// Output of index discovery: the surviving definitions plus the concrete
/// pattern the scroll phase must use. When the request was `_all` the
/// pattern is pinned to exactly the resolved names, so indexes created on
/// the source after this point are not picked up.
#[derive(Debug)]
pub struct ResolvedIndexes {
    pub definitions: Vec<IndexDefinition>,
    pub scroll_pattern: String,
}

/// Name policy, applied in order: leading `_` is always internal and
/// excluded; leading `.` is excluded unless the caller asked for all names.
pub fn keep_index_name(name: &str, include_dot_names: bool) -> bool {
    if name.starts_with('_') {
        return false;
    }
    if name.starts_with('.') && !include_dot_names {
        return false;
    }
    true
}

/// Older servers return the mapping body directly instead of nesting it
/// under `"mappings"`; wrap it so the creation body is uniform.
pub fn wrap_legacy_mapping(body: Value) -> Value {
    if body.get("mappings").is_some() {
        body
    } else {
        json!({ "mappings": body })
    }
}

/// Discover source indexes matching `pattern` and turn them into
/// definitions. Network failure or an undecodable listing is fatal for the
/// run; there is no partial resolution.
pub async fn resolve(
    client: &EsClient,
    pattern: &str,
    include_dot_names: bool,
) -> Result<ResolvedIndexes> {
    let listing = client.get_mappings(pattern).await?;
    let listing = listing
        .as_object()
        .ok_or_else(|| MigrateError::Resolve(format!("mapping listing is not an object: {listing}")))?;

    let mut definitions = Vec::new();
    for (name, body) in listing {
        if !keep_index_name(name, include_dot_names) {
            continue;
        }
        definitions.push(IndexDefinition {
            name: name.clone(),
            mappings: wrap_legacy_mapping(body.clone()),
            settings: None,
        });
    }

    // Pin `_all` to the concrete surviving names so later stages never
    // re-expand the wildcard.
    let scroll_pattern = if pattern == "_all" {
        definitions
            .iter()
            .map(|def| def.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    } else {
        pattern.to_string()
    };

    Ok(ResolvedIndexes {
        definitions,
        scroll_pattern,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underscore_names_are_always_excluded() {
        assert!(!keep_index_name("_kibana", false));
        assert!(!keep_index_name("_kibana", true));
    }

    #[test]
    fn dot_names_depend_on_include_all() {
        assert!(!keep_index_name(".marvel-2024", false));
        assert!(keep_index_name(".marvel-2024", true));
    }

    #[test]
    fn plain_names_are_kept() {
        assert!(keep_index_name("logs-2015", false));
    }

    #[test]
    fn legacy_mapping_body_gets_wrapped() {
        let legacy = json!({"entry": {"properties": {}}});
        let wrapped = wrap_legacy_mapping(legacy.clone());
        assert_eq!(wrapped["mappings"], legacy);

        let modern = json!({"mappings": {"properties": {}}});
        assert_eq!(wrap_legacy_mapping(modern.clone()), modern);
    }
}
