use serde::{Deserialize, Serialize};

/// Name reported by `GET /health`.
pub const SERVICE_NAME: &str = "chatwire";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// The process is up but the store cannot be queried.
    Unavailable,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub service: String,
}

impl HealthReport {
    pub fn new(status: HealthStatus) -> Self {
        Self {
            status,
            service: SERVICE_NAME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_report_wire_shape() {
        assert_eq!(
            serde_json::to_value(HealthReport::new(HealthStatus::Healthy)).unwrap(),
            json!({ "status": "healthy", "service": "chatwire" })
        );
        assert_eq!(
            serde_json::to_value(HealthReport::new(HealthStatus::Unavailable)).unwrap()["status"],
            "unavailable"
        );
    }
}
