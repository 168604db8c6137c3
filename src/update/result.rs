use chrono::{DateTime, Utc};

/// Final outcome of an update attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Outcome {
    Success,
    Failure,
}

/// Record of a finished update attempt, as written by the updater.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct UpdateResult {
    pub(crate) outcome: Outcome,
    /// Human-readable error details, only meaningful on failure.
    #[serde(default)]
    pub(crate) diagnostic: Option<String>,
    /// Completion time, as recorded by the updater. Informational, and
    /// absent from records written by older updaters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) timestamp: Option<DateTime<Utc>>,
}

impl UpdateResult {
    pub(crate) fn success() -> Self {
        Self {
            outcome: Outcome::Success,
            diagnostic: None,
            timestamp: Some(Utc::now()),
        }
    }

    pub(crate) fn failure<S: Into<String>>(diagnostic: S) -> Self {
        Self {
            outcome: Outcome::Failure,
            diagnostic: Some(diagnostic.into()),
            timestamp: Some(Utc::now()),
        }
    }

    pub(crate) fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_carries_diagnostic() {
        let res = UpdateResult::failure("disk full");
        assert!(!res.is_success());
        assert_eq!(res.diagnostic.as_ref().map(String::as_str), Some("disk full"));

        let res = UpdateResult::success();
        assert!(res.is_success());
        assert_eq!(res.diagnostic, None);
    }

    #[test]
    fn outcome_wire_format() {
        let json = serde_json::to_value(&UpdateResult::failure("boom")).unwrap();
        assert_eq!(json["outcome"], "failure");
        assert_eq!(json["diagnostic"], "boom");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn missing_diagnostic_is_accepted() {
        let input = r#"{"outcome": "success", "timestamp": "2024-03-01T10:00:00Z"}"#;
        let res: UpdateResult = serde_json::from_str(input).unwrap();
        assert_eq!(res.outcome, Outcome::Success);
        assert_eq!(res.diagnostic, None);
        assert!(res.timestamp.is_some());
    }

    #[test]
    fn missing_timestamp_is_accepted() {
        let input = r#"{"outcome": "failure", "diagnostic": "signature mismatch"}"#;
        let res: UpdateResult = serde_json::from_str(input).unwrap();
        assert_eq!(res.outcome, Outcome::Failure);
        assert_eq!(res.diagnostic.as_ref().map(String::as_str), Some("signature mismatch"));
        assert_eq!(res.timestamp, None);

        let json = serde_json::to_value(&res).unwrap();
        assert!(json.get("timestamp").is_none());
    }
}
