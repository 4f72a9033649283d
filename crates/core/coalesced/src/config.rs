use std::time::Duration;

use batchgate_result::{create_error, Result};

/// Default debounce window
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(100);

#[derive(Clone, PartialEq, Eq, Debug)]
/// Config values for [`Coalescer`](crate::Coalescer).
pub struct CoalescerConfig {
    /// How long a group waits for another enrollment before dispatching
    pub window: Duration,
    /// Endpoint keys eligible for coalescing
    pub endpoints: Vec<String>,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            endpoints: Vec::new(),
        }
    }
}

impl CoalescerConfig {
    /// Reject a zero window or blank endpoint entries and normalise the rest
    pub fn validate(mut self) -> Result<Self> {
        if self.window.is_zero() {
            return Err(create_error!(InvalidConfiguration {
                error: "debounce window must be positive".to_string()
            }));
        }

        if self.endpoints.iter().any(|endpoint| endpoint.trim().is_empty()) {
            return Err(create_error!(InvalidConfiguration {
                error: "endpoint allow-list contains an empty entry".to_string()
            }));
        }

        self.endpoints = self
            .endpoints
            .iter()
            .map(|endpoint| normalize_endpoint(endpoint))
            .collect();
        self.endpoints.dedup();

        Ok(self)
    }
}

/// Reduce a target to the key used for grouping.
///
/// Drops the query string, forces a leading slash and strips trailing
/// slashes, so `file-batch-api/?x=1` and `/file-batch-api` share a group.
pub fn normalize_endpoint(target: &str) -> String {
    let path = target.trim();
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_end_matches('/');

    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use batchgate_result::ErrorType;

    use super::{normalize_endpoint, CoalescerConfig};

    #[test]
    fn normalizes_targets() {
        assert_eq!(normalize_endpoint("/file-batch-api"), "/file-batch-api");
        assert_eq!(normalize_endpoint("file-batch-api/"), "/file-batch-api");
        assert_eq!(normalize_endpoint(" /file-batch-api?ids=a "), "/file-batch-api");
        assert_eq!(normalize_endpoint("/"), "/");
        assert_eq!(normalize_endpoint(""), "/");
    }

    #[test]
    fn rejects_zero_window() {
        let error = CoalescerConfig {
            window: Duration::ZERO,
            endpoints: vec!["/a".to_string()],
        }
        .validate()
        .unwrap_err();

        assert!(matches!(error.error_type, ErrorType::InvalidConfiguration { .. }));
    }

    #[test]
    fn rejects_blank_endpoint() {
        let error = CoalescerConfig {
            endpoints: vec!["/a".to_string(), "  ".to_string()],
            ..Default::default()
        }
        .validate()
        .unwrap_err();

        assert!(matches!(error.error_type, ErrorType::InvalidConfiguration { .. }));
    }

    #[test]
    fn normalizes_allow_list() {
        let config = CoalescerConfig {
            endpoints: vec!["file-batch-api".to_string(), "/file-batch-api/".to_string()],
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert_eq!(config.endpoints, vec!["/file-batch-api"]);
    }
}
