use super::checker::{CheckReport, ConformanceChecker, Constraint};
use super::event_log::EventLog;
use crate::config::ActivityTracking;
use crate::data::{Encoder, FeatureSchema};
use crate::error::{CounterfactualError, Result};
use crate::types::TraceState;
use std::collections::BTreeSet;

/// Templates whose report ids carry a count suffix
const CARDINALITY_TEMPLATES: [&str; 3] = ["Exactly", "Existence", "Absence"];

/// Activities the (filtered) declarative model talks about
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConformanceContext {
    pub activations: BTreeSet<String>,
    pub targets: BTreeSet<String>,
    pub activities: BTreeSet<String>,
}

impl ConformanceContext {
    /// Cardinality templates contribute activations, binary templates an
    /// activation and a target. Targets that are also activations are dropped.
    pub fn from_constraints(constraints: &[Constraint]) -> Self {
        let mut activations = BTreeSet::new();
        let mut targets = BTreeSet::new();
        for constraint in constraints {
            if constraint.supports_cardinality() {
                activations.insert(constraint.attributes.trim().to_string());
            } else if let Some((activation, target)) = constraint.binary_activities() {
                activations.insert(activation);
                targets.insert(target);
            }
        }
        targets.retain(|t| !activations.contains(t));
        let activities = activations.union(&targets).cloned().collect();

        Self {
            activations,
            targets,
            activities,
        }
    }
}

/// `Existence2[a]` -> `Existence[a]`; likewise `Exactly` and `Absence` with counts 1-3
pub fn strip_cardinality(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut rest = id;
    'scan: while !rest.is_empty() {
        for template in CARDINALITY_TEMPLATES {
            if let Some(after) = rest.strip_prefix(template) {
                out.push_str(template);
                let mut chars = after.chars();
                rest = match chars.next() {
                    Some('1'..='3') => chars.as_str(),
                    _ => after,
                };
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

/// Turns encoded individuals into traces and scores them against the checker
pub struct ConformanceScorer<'a> {
    schema: &'a FeatureSchema,
    encoder: &'a dyn Encoder,
    tracking: &'a ActivityTracking,
}

impl<'a> ConformanceScorer<'a> {
    pub fn new(schema: &'a FeatureSchema, encoder: &'a dyn Encoder, tracking: &'a ActivityTracking) -> Self {
        Self {
            schema,
            encoder,
            tracking,
        }
    }

    /// Decoded sequence features of one individual, in step order
    pub fn sequence(&self, individual: &[f64]) -> Result<Vec<String>> {
        self.schema.check_arity(individual)?;
        self.schema
            .sequence_indexes()
            .iter()
            .map(|&idx| Ok(self.encoder.decode_value(idx, individual[idx])?.activity()))
            .collect()
    }

    pub fn build_log(&self, population: &[Vec<f64>]) -> Result<EventLog> {
        let sequences = population
            .iter()
            .map(|individual| self.sequence(individual))
            .collect::<Result<Vec<_>>>()?;
        EventLog::from_sequences(&sequences)
    }

    /// Fraction of non-violated constraints per individual, minus the
    /// position penalty of the tracked activity. Not clamped.
    pub fn score(&self, checker: &mut dyn ConformanceChecker, population: &[Vec<f64>]) -> Result<Vec<f64>> {
        if population.is_empty() {
            return Ok(Vec::new());
        }
        let log = self.build_log(population)?;
        checker.load(&log)?;
        let report = checker.check(false)?;

        let tracked = self.tracking.activity_name.as_deref();
        log.traces()
            .iter()
            .map(|trace| {
                let states = report.get(&trace.case_id).ok_or_else(|| {
                    CounterfactualError::Conformance(format!(
                        "Checker returned no result for case {}",
                        trace.case_id
                    ))
                })?;
                let raw = satisfaction_ratio(states.values());
                let penalty = match tracked {
                    Some(activity) => self.tracking.penalty_for(trace.position_of(activity)),
                    None => 0.0,
                };
                log::trace!(
                    "case {}: raw conformance {:.3}, penalty {}",
                    trace.case_id,
                    raw,
                    penalty
                );
                Ok(raw - penalty)
            })
            .collect()
    }

    /// Keep only model constraints the query itself satisfies; returns the
    /// number kept.
    pub fn filter_model(&self, checker: &mut dyn ConformanceChecker, query: &[f64]) -> Result<usize> {
        let log = self.build_log(&[query.to_vec()])?;
        checker.load(&log)?;
        let report = checker.check(false)?;
        let satisfied = satisfied_ids(&report);

        let before = checker.constraints().len();
        let kept: Vec<Constraint> = checker
            .constraints()
            .iter()
            .filter(|c| satisfied.contains(&c.id()))
            .cloned()
            .collect();
        let count = kept.len();
        checker.set_constraints(kept);

        log::info!(
            "Declarative model filtered to {} of {} constraints satisfied by the query",
            count,
            before
        );
        Ok(count)
    }
}

fn satisfaction_ratio<'s>(states: impl ExactSizeIterator<Item = &'s TraceState>) -> f64 {
    let total = states.len();
    if total == 0 {
        return 1.0;
    }
    let kept = states.filter(|s| !s.is_violated()).count();
    kept as f64 / total as f64
}

fn satisfied_ids(report: &CheckReport) -> BTreeSet<String> {
    report
        .values()
        .flat_map(|states| states.iter())
        .filter(|(_, state)| **state == TraceState::Satisfied)
        .map(|(id, _)| strip_cardinality(id))
        .collect()
}
