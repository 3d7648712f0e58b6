use semver::Version as Semver;
use serde::Deserialize;

/// Banner returned by `GET /` on a cluster node. Logged at startup for both
/// endpoints so a run records exactly which versions it talked to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerInfo {
    #[serde(rename = "name")]
    hostname: String,
    #[serde(rename = "cluster_name")]
    cluster: String,
    version: Version,
}

#[derive(Debug, Deserialize, Clone)]
struct Version {
    number: String,
    #[serde(default)]
    lucene_version: Option<String>,
}

impl ServerInfo {
    pub fn get_hostname(&self) -> &str {
        &self.hostname
    }
    pub fn get_cluster(&self) -> &str {
        &self.cluster
    }
    pub fn get_version(&self) -> &str {
        &self.version.number
    }
    pub fn get_lucene_version(&self) -> Option<&str> {
        self.version.lucene_version.as_deref()
    }
    pub fn get_version_major(&self) -> Option<u64> {
        Semver::parse(&self.version.number).ok().map(|v| v.major)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_banner() {
        let body = r#"{
            "name": "node-1",
            "cluster_name": "es-prod",
            "version": {"number": "1.7.5", "lucene_version": "4.10.4"}
        }"#;
        let info: ServerInfo = serde_json::from_str(body).unwrap();
        assert_eq!(info.get_cluster(), "es-prod");
        assert_eq!(info.get_version(), "1.7.5");
        assert_eq!(info.get_version_major(), Some(1));
        assert_eq!(info.get_lucene_version(), Some("4.10.4"));
    }
}
