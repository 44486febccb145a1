use super::individual::Individual;
use crate::config::MatingPolicy;
use crate::data::FeatureRange;
use crate::engines::context::SearchContext;
use crate::error::Result;
use rand::Rng;
use std::collections::BTreeSet;

/// Share of genes inherited from the first parent
const PARENT1_PROB: f64 = 0.40;
/// Cumulative share inherited from either parent; the rest mutates
const PARENTS_PROB: f64 = 0.80;

/// Plain uniform crossover: per feature, 40% parent 1, 40% parent 2, 20% mutation
pub fn crossover<R: Rng>(ctx: &SearchContext<'_>, parent1: &[f64], parent2: &[f64], rng: &mut R) -> Individual {
    (0..parent1.len())
        .map(|idx| {
            let prob = rng.gen::<f64>();
            inherit(ctx, idx, prob, parent1, parent2, rng)
        })
        .collect()
}

fn inherit<R: Rng>(
    ctx: &SearchContext<'_>,
    idx: usize,
    prob: f64,
    parent1: &[f64],
    parent2: &[f64],
    rng: &mut R,
) -> f64 {
    if prob < PARENT1_PROB {
        parent1[idx]
    } else if prob < PARENTS_PROB {
        parent2[idx]
    } else {
        ctx.mutate_feature(idx, rng)
    }
}

/// Breeds one offspring per call under the configured policy
pub struct MatingEngine<'c> {
    ctx: &'c SearchContext<'c>,
    policy: MatingPolicy,
    /// Decoded query activity per schema feature (sequence features only)
    query_labels: Vec<Option<String>>,
}

impl<'c> MatingEngine<'c> {
    pub fn new(ctx: &'c SearchContext<'c>, policy: MatingPolicy) -> Result<Self> {
        let mut query_labels = vec![None; ctx.query.len()];
        for &idx in ctx.schema().sequence_indexes() {
            query_labels[idx] = Some(ctx.encoder.decode_value(idx, ctx.query[idx])?.activity());
        }
        Ok(Self {
            ctx,
            policy,
            query_labels,
        })
    }

    pub fn policy(&self) -> MatingPolicy {
        self.policy
    }

    pub fn mate<R: Rng>(&self, parent1: &[f64], parent2: &[f64], rng: &mut R) -> Result<Individual> {
        let conformance = &self.ctx.conformance;
        match self.policy {
            MatingPolicy::Plain => Ok(crossover(self.ctx, parent1, parent2, rng)),
            MatingPolicy::SequenceAwareA => self.sequence_aware(parent1, parent2, &conformance.activities, rng),
            MatingPolicy::SequenceAwareB => self.sequence_aware(parent1, parent2, &conformance.activations, rng),
        }
    }

    /// Sequence positions where the query shows a model activity are copied
    /// from the query. Other sequence positions take a parent's activity
    /// outside `excluded`, falling back to a random such level. Remaining
    /// features follow the plain probabilities with one draw per offspring.
    fn sequence_aware<R: Rng>(
        &self,
        parent1: &[f64],
        parent2: &[f64],
        excluded: &BTreeSet<String>,
        rng: &mut R,
    ) -> Result<Individual> {
        let ctx = self.ctx;
        let activities = &ctx.conformance.activities;
        let prob = rng.gen::<f64>();

        let mut child = Vec::with_capacity(parent1.len());
        for idx in 0..parent1.len() {
            let value = match &self.query_labels[idx] {
                Some(query_label) if activities.contains(query_label) => ctx.query[idx],
                Some(_) if !ctx.varying[idx] => ctx.query[idx],
                Some(_) => {
                    let label1 = ctx.encoder.decode_value(idx, parent1[idx])?.activity();
                    let label2 = ctx.encoder.decode_value(idx, parent2[idx])?.activity();
                    if !excluded.contains(&label1) {
                        parent1[idx]
                    } else if !excluded.contains(&label2) {
                        parent2[idx]
                    } else {
                        self.random_level(idx, excluded, rng)?
                    }
                }
                None => inherit(ctx, idx, prob, parent1, parent2, rng),
            };
            child.push(value);
        }
        Ok(child)
    }

    /// Permitted level whose activity is outside `excluded`; the query's level if none is
    fn random_level<R: Rng>(&self, idx: usize, excluded: &BTreeSet<String>, rng: &mut R) -> Result<f64> {
        let ctx = self.ctx;
        let mut pool = Vec::new();
        if let FeatureRange::Categorical(levels) = ctx.ranges.get(idx) {
            for &code in levels {
                let label = ctx.encoder.decode_value(idx, code)?.activity();
                if !excluded.contains(&label) {
                    pool.push(code);
                }
            }
        }
        if pool.is_empty() {
            log::debug!(
                "No level of '{}' avoids the model activities, keeping the query's",
                ctx.schema().name(idx)
            );
            return Ok(ctx.query[idx]);
        }
        Ok(pool[rng.gen_range(0..pool.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::testing::{Fixture, APPLY, APPROVE, PAD, REVIEW};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_plain_crossover_draws_from_parents_or_ranges() {
        let fixture = Fixture::new();
        let ctx = fixture.context();
        let engine = MatingEngine::new(&ctx, MatingPolicy::Plain).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let p1 = vec![25.0, 60000.0, APPLY, REVIEW];
        let p2 = vec![25.0, 80000.0, REVIEW, APPROVE];

        let mut from_parents = 0;
        for _ in 0..200 {
            let child = engine.mate(&p1, &p2, &mut rng).unwrap();
            assert_eq!(child[0], 25.0);
            for idx in 1..4 {
                assert!(ctx.ranges.get(idx).contains(child[idx]));
                if child[idx] == p1[idx] || child[idx] == p2[idx] {
                    from_parents += 1;
                }
            }
        }
        // about 80% of genes come from a parent
        assert!(from_parents > 400);
    }

    #[test]
    fn test_seeds_query_activities() {
        let fixture = Fixture::new();
        let ctx = fixture.context();
        // activities: {apply, review}; query prefix_1 = apply, prefix_2 = review
        let engine = MatingEngine::new(&ctx, MatingPolicy::SequenceAwareA).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let p1 = vec![25.0, 60000.0, APPROVE, PAD];
        let p2 = vec![25.0, 80000.0, PAD, APPROVE];
        for _ in 0..20 {
            let child = engine.mate(&p1, &p2, &mut rng).unwrap();
            assert_eq!(child[2], APPLY);
            assert_eq!(child[3], REVIEW);
        }
    }

    #[test]
    fn test_unseeded_positions_avoid_excluded_activities() {
        let fixture = Fixture::new();
        let mut ctx = fixture.context();
        // query shows no model activity at either step
        ctx.query = vec![25.0, 30000.0, APPROVE, PAD];
        let engine = MatingEngine::new(&ctx, MatingPolicy::SequenceAwareA).unwrap();
        let mut rng = StdRng::seed_from_u64(9);

        // parent 1 uses an excluded activity, parent 2 does not
        let child = engine
            .mate(&[25.0, 1.0, APPLY, REVIEW], &[25.0, 2.0, PAD, APPROVE], &mut rng)
            .unwrap();
        assert_eq!(child[2], PAD);
        assert_eq!(child[3], APPROVE);

        // both parents excluded: a random level outside {apply, review}
        for _ in 0..20 {
            let child = engine
                .mate(&[25.0, 1.0, APPLY, REVIEW], &[25.0, 2.0, REVIEW, APPLY], &mut rng)
                .unwrap();
            assert!(child[2] == PAD || child[2] == APPROVE);
            assert!(child[3] == PAD || child[3] == APPROVE);
        }
    }

    #[test]
    fn test_relaxed_policy_admits_targets() {
        let fixture = Fixture::new();
        let mut ctx = fixture.context();
        // activations: {apply}, targets: {review}
        ctx.query = vec![25.0, 30000.0, APPROVE, PAD];
        let strict = MatingEngine::new(&ctx, MatingPolicy::SequenceAwareA).unwrap();
        let relaxed = MatingEngine::new(&ctx, MatingPolicy::SequenceAwareB).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let p1 = [25.0, 1.0, REVIEW, REVIEW];
        let p2 = [25.0, 2.0, APPLY, APPLY];

        let child = relaxed.mate(&p1, &p2, &mut rng).unwrap();
        assert_eq!(child[2], REVIEW);
        assert_eq!(child[3], REVIEW);

        let child = strict.mate(&p1, &p2, &mut rng).unwrap();
        assert_ne!(child[2], REVIEW);
        assert_ne!(child[3], REVIEW);
    }

    #[test]
    fn test_non_sequence_features_share_one_draw() {
        let fixture = Fixture::new();
        let mut ctx = fixture.context();
        ctx.varying = vec![true, true, true, true];
        let engine = MatingEngine::new(&ctx, MatingPolicy::SequenceAwareB).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let p1 = [30.0, 60000.0, APPLY, REVIEW];
        let p2 = [40.0, 80000.0, APPLY, REVIEW];
        for _ in 0..50 {
            let child = engine.mate(&p1, &p2, &mut rng).unwrap();
            let both_p1 = child[0] == p1[0] && child[1] == p1[1];
            let both_p2 = child[0] == p2[0] && child[1] == p2[1];
            let mutated = child[0] != p1[0] && child[0] != p2[0];
            assert!(both_p1 || both_p2 || mutated);
        }
    }
}
