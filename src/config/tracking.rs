use super::traits::{invalid, ConfigSection};
use crate::error::CounterfactualError;
use serde::{Deserialize, Serialize};

/// Tracked activity whose original placement counterfactuals must move.
///
/// A candidate is penalised when its decoded trace keeps `activity_name` at
/// `position` (0-based within the trace) or drops the activity altogether.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityTracking {
    pub activity_name: Option<String>,
    pub position: Option<usize>,
    pub penalty: f64,
}

impl ActivityTracking {
    pub fn is_enabled(&self) -> bool {
        self.activity_name.is_some() && self.penalty != 0.0
    }

    /// Penalty owed by a trace whose tracked activity sits at `found`
    pub fn penalty_for(&self, found: Option<usize>) -> f64 {
        if !self.is_enabled() {
            return 0.0;
        }
        match found {
            None => self.penalty,
            Some(pos) if Some(pos) == self.position => self.penalty,
            Some(_) => 0.0,
        }
    }
}

impl ConfigSection for ActivityTracking {
    fn section_name() -> &'static str {
        "tracking"
    }

    fn validate(&self) -> Result<(), CounterfactualError> {
        if !self.penalty.is_finite() || self.penalty < 0.0 {
            return Err(invalid(
                Self::section_name(),
                format!("penalty must be a non-negative number, got {}", self.penalty),
            ));
        }
        if self.activity_name.as_deref() == Some("") {
            return Err(invalid(Self::section_name(), "activity_name must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalty_applies_at_origin_or_when_missing() {
        let tracking = ActivityTracking {
            activity_name: Some("approve".to_string()),
            position: Some(2),
            penalty: 0.3,
        };
        assert_eq!(tracking.penalty_for(Some(2)), 0.3);
        assert_eq!(tracking.penalty_for(None), 0.3);
        assert_eq!(tracking.penalty_for(Some(0)), 0.0);
    }

    #[test]
    fn test_disabled_tracking_never_penalises() {
        let tracking = ActivityTracking::default();
        assert_eq!(tracking.penalty_for(None), 0.0);
    }
}
