use serde::Deserialize;

/// Response body of `GET /_cluster/health`. Polled on demand by the
/// readiness gate and never cached beyond one decision.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterHealth {
    pub cluster_name: String,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Green,
    Yellow,
    Red,
}

impl HealthStatus {
    /// Readiness policy: red never passes, green always does, yellow passes
    /// unless the caller insists on green. An unreachable cluster never gets
    /// this far; the gate retries the poll instead.
    pub fn is_acceptable(self, require_green: bool) -> bool {
        match self {
            HealthStatus::Green => true,
            HealthStatus::Yellow => !require_green,
            HealthStatus::Red => false,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            HealthStatus::Green => "green",
            HealthStatus::Yellow => "yellow",
            HealthStatus::Red => "red",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn red_is_never_acceptable() {
        assert!(!HealthStatus::Red.is_acceptable(false));
        assert!(!HealthStatus::Red.is_acceptable(true));
    }

    #[test]
    fn green_is_always_acceptable() {
        assert!(HealthStatus::Green.is_acceptable(false));
        assert!(HealthStatus::Green.is_acceptable(true));
    }

    #[test]
    fn yellow_depends_on_require_green() {
        assert!(HealthStatus::Yellow.is_acceptable(false));
        assert!(!HealthStatus::Yellow.is_acceptable(true));
    }

    #[test]
    fn deserializes_health_body() {
        let health: ClusterHealth =
            serde_json::from_str(r#"{"cluster_name": "es-prod", "status": "yellow"}"#).unwrap();
        assert_eq!(health.cluster_name, "es-prod");
        assert_eq!(health.status, HealthStatus::Yellow);
    }
}
