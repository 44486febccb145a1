use crate::config::DesiredClass;
use crate::error::{CounterfactualError, Result};
use crate::types::{ModelKind, Prediction};

/// Model output for one candidate
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Scores(Vec<f64>),
    Value(f64),
}

impl Response {
    /// Index of the first maximal score
    pub fn argmax(&self) -> Option<usize> {
        match self {
            Self::Scores(scores) => scores
                .iter()
                .enumerate()
                .fold(None, |best: Option<(usize, f64)>, (i, &s)| match best {
                    Some((_, b)) if b >= s => best,
                    _ => Some((i, s)),
                })
                .map(|(i, _)| i),
            Self::Value(_) => None,
        }
    }

    pub fn prediction(&self) -> Prediction {
        match self {
            Self::Scores(_) => Prediction::Class(self.argmax().unwrap_or(0)),
            Self::Value(v) => Prediction::Value(*v),
        }
    }
}

/// What a counterfactual must achieve
#[derive(Debug, Clone, PartialEq)]
pub enum DesiredOutcome {
    Class { class: usize, min_score: Option<f64> },
    Range { lo: f64, hi: f64 },
}

impl DesiredOutcome {
    /// Resolve the configured target against the query's own response
    pub fn resolve(
        kind: ModelKind,
        desired_class: DesiredClass,
        desired_range: Option<[f64; 2]>,
        stopping_threshold: Option<f64>,
        query: &Response,
    ) -> Result<Self> {
        match (kind, query) {
            (ModelKind::Classifier, Response::Scores(scores)) => {
                let num_classes = scores.len();
                let class = match desired_class {
                    DesiredClass::Opposite if num_classes == 2 => 1 - query.argmax().unwrap_or(0),
                    DesiredClass::Opposite => {
                        return Err(CounterfactualError::Configuration(format!(
                            "desired_class 'opposite' needs a binary classifier, model has {} classes",
                            num_classes
                        )));
                    }
                    DesiredClass::Class(c) if c < num_classes => c,
                    DesiredClass::Class(c) => {
                        return Err(CounterfactualError::Configuration(format!(
                            "desired_class {} is out of range for {} classes",
                            c, num_classes
                        )));
                    }
                };
                Ok(Self::Class { class, min_score: stopping_threshold })
            }
            (ModelKind::Regressor, Response::Value(_)) => match desired_range {
                Some([lo, hi]) => Ok(Self::Range { lo, hi }),
                None => Err(CounterfactualError::Configuration(
                    "desired_range is required for regression models".to_string(),
                )),
            },
            _ => Err(CounterfactualError::Model(format!(
                "{:?} model produced a mismatched response",
                kind
            ))),
        }
    }

    /// Hinge loss towards the desired class or range
    pub fn yloss(&self, response: &Response) -> f64 {
        match (self, response) {
            (Self::Class { class, .. }, Response::Scores(scores)) => {
                let desired = scores.get(*class).copied().unwrap_or(f64::NEG_INFINITY);
                let rival = scores
                    .iter()
                    .enumerate()
                    .filter(|(c, _)| c != class)
                    .map(|(_, s)| *s)
                    .fold(f64::NEG_INFINITY, f64::max);
                (rival - desired).max(0.0)
            }
            (Self::Range { lo, hi }, Response::Value(v)) => {
                if *lo <= *v && *v <= *hi {
                    0.0
                } else {
                    (v - lo).abs().min((v - hi).abs())
                }
            }
            _ => f64::INFINITY,
        }
    }

    /// Validity predicate; a desired class tied with the top score counts as the arg-max
    pub fn is_satisfied(&self, response: &Response) -> bool {
        match (self, response) {
            (Self::Class { class, min_score }, Response::Scores(scores)) => {
                let Some(&desired) = scores.get(*class) else {
                    return false;
                };
                let top = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                desired == top && min_score.map_or(true, |m| desired >= m)
            }
            (Self::Range { lo, hi }, Response::Value(v)) => *lo <= *v && *v <= *hi,
            _ => false,
        }
    }

    /// Predicted class (tie-broken towards the desired class) or value
    pub fn prediction(&self, response: &Response) -> Prediction {
        match (self, response) {
            (Self::Class { class, .. }, Response::Scores(scores)) => {
                let top = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                if scores.get(*class) == Some(&top) {
                    Prediction::Class(*class)
                } else {
                    response.prediction()
                }
            }
            _ => response.prediction(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(c: usize) -> DesiredOutcome {
        DesiredOutcome::Class { class: c, min_score: None }
    }

    #[test]
    fn test_tie_counts_as_desired_class() {
        let tied = Response::Scores(vec![0.0, 0.5, 0.5]);
        assert!(class(2).is_satisfied(&tied));
        assert!(class(1).is_satisfied(&tied));
        assert!(!class(0).is_satisfied(&tied));
        assert_eq!(class(2).prediction(&tied), Prediction::Class(2));
        assert_eq!(tied.argmax(), Some(1));
        assert_eq!(class(2).yloss(&tied), 0.0);
    }

    #[test]
    fn test_hinge_loss() {
        let r = Response::Scores(vec![0.7, 0.2, 0.1]);
        assert!((class(1).yloss(&r) - 0.5).abs() < 1e-12);
        assert_eq!(class(0).yloss(&r), 0.0);
    }

    #[test]
    fn test_min_score() {
        let outcome = DesiredOutcome::Class { class: 1, min_score: Some(0.75) };
        assert!(!outcome.is_satisfied(&Response::Scores(vec![0.4, 0.6])));
        assert!(outcome.is_satisfied(&Response::Scores(vec![0.2, 0.8])));
    }

    #[test]
    fn test_regression_range() {
        let outcome = DesiredOutcome::Range { lo: 10.0, hi: 20.0 };
        assert!(outcome.is_satisfied(&Response::Value(10.0)));
        assert!(outcome.is_satisfied(&Response::Value(20.0)));
        assert!(!outcome.is_satisfied(&Response::Value(21.0)));
        assert_eq!(outcome.yloss(&Response::Value(23.0)), 3.0);
        assert_eq!(outcome.yloss(&Response::Value(4.0)), 6.0);
        assert_eq!(outcome.yloss(&Response::Value(15.0)), 0.0);
    }

    #[test]
    fn test_resolve_opposite() {
        let query = Response::Scores(vec![0.9, 0.1]);
        let outcome =
            DesiredOutcome::resolve(ModelKind::Classifier, DesiredClass::Opposite, None, None, &query).unwrap();
        assert_eq!(outcome, class(1));

        let multi = Response::Scores(vec![0.2, 0.3, 0.5]);
        assert!(DesiredOutcome::resolve(ModelKind::Classifier, DesiredClass::Opposite, None, None, &multi).is_err());
        assert!(DesiredOutcome::resolve(ModelKind::Regressor, DesiredClass::Opposite, None, None, &Response::Value(1.0)).is_err());
    }
}
