use super::event_log::EventLog;
use crate::error::Result;
use crate::types::TraceState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Arity class of a declarative template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateKind {
    /// Single activity, no count (`Init`)
    Unary,
    /// Single activity with a count (`Existence2`, `Absence1`, `Exactly3`)
    Cardinality(u32),
    /// Activation and target (`Response`, `Precedence`)
    Binary,
}

/// One constraint of a loaded declarative model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub template: String,
    pub kind: TemplateKind,
    /// `"a"` for unary templates, `"a, b"` for binary ones
    pub attributes: String,
}

impl Constraint {
    pub fn unary(template: &str, activity: &str) -> Self {
        Self {
            template: template.to_string(),
            kind: TemplateKind::Unary,
            attributes: activity.to_string(),
        }
    }

    pub fn cardinality(template: &str, count: u32, activity: &str) -> Self {
        Self {
            template: template.to_string(),
            kind: TemplateKind::Cardinality(count),
            attributes: activity.to_string(),
        }
    }

    pub fn binary(template: &str, activation: &str, target: &str) -> Self {
        Self {
            template: template.to_string(),
            kind: TemplateKind::Binary,
            attributes: format!("{}, {}", activation, target),
        }
    }

    pub fn supports_cardinality(&self) -> bool {
        matches!(self.kind, TemplateKind::Cardinality(_))
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.kind, TemplateKind::Binary)
    }

    /// Model-level identifier, without any cardinality count: `Existence[a]`
    pub fn id(&self) -> String {
        format!("{}[{}]", self.template, self.attributes)
    }

    /// Identifier used in check reports: `Existence2[a]`, `Response[a, b]`
    pub fn result_id(&self) -> String {
        match self.kind {
            TemplateKind::Cardinality(n) => format!("{}{}[{}]", self.template, n, self.attributes),
            _ => self.id(),
        }
    }

    /// `(activation, target)` of a binary constraint
    pub fn binary_activities(&self) -> Option<(String, String)> {
        if !self.is_binary() {
            return None;
        }
        let (activation, target) = self.attributes.split_once(',')?;
        Some((activation.trim().to_string(), target.trim().to_string()))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.result_id())
    }
}

/// Per case id, the state of every evaluated constraint (keyed by result id)
pub type CheckReport = BTreeMap<String, BTreeMap<String, TraceState>>;

/// Declarative conformance checker the search consults once per generation.
///
/// Implementations own the loaded model. `set_constraints` replaces the
/// working model; `load` replaces the log that `check` evaluates.
pub trait ConformanceChecker {
    fn constraints(&self) -> &[Constraint];

    fn set_constraints(&mut self, constraints: Vec<Constraint>);

    fn load(&mut self, log: &EventLog) -> Result<()>;

    fn check(&self, consider_vacuity: bool) -> Result<CheckReport>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_ids() {
        let existence = Constraint::cardinality("Existence", 2, "approve");
        assert_eq!(existence.id(), "Existence[approve]");
        assert_eq!(existence.result_id(), "Existence2[approve]");
        assert!(existence.supports_cardinality());

        let response = Constraint::binary("Response", "apply", "review");
        assert_eq!(response.result_id(), "Response[apply, review]");
        assert_eq!(
            response.binary_activities(),
            Some(("apply".to_string(), "review".to_string()))
        );
        assert!(Constraint::unary("Init", "apply").binary_activities().is_none());
    }

    #[test]
    fn test_binary_activities_trim_padding() {
        let c = Constraint {
            template: "Precedence".to_string(),
            kind: TemplateKind::Binary,
            attributes: "  submit form ,approve ".to_string(),
        };
        assert_eq!(
            c.binary_activities(),
            Some(("submit form".to_string(), "approve".to_string()))
        );
    }
}
