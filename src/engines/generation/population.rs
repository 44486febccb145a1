use super::individual::Individual;
use std::collections::HashSet;

/// Bit pattern used for exact-equality checks; `-0.0` and `0.0` compare equal
pub(crate) fn value_key(individual: &[f64]) -> Vec<u64> {
    individual
        .iter()
        .map(|v| if *v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() })
        .collect()
}

/// Drop exact duplicates, keeping first occurrences in order
pub fn dedup(population: Vec<Individual>) -> Vec<Individual> {
    let mut seen = HashSet::with_capacity(population.len());
    population
        .into_iter()
        .filter(|individual| seen.insert(value_key(individual)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let population = vec![
            vec![1.0, 2.0],
            vec![3.0, 4.0],
            vec![1.0, 2.0],
            vec![0.0, -0.0],
            vec![-0.0, 0.0],
        ];
        let unique = dedup(population);
        assert_eq!(unique, vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![0.0, -0.0]]);
    }

    proptest! {
        #[test]
        fn dedup_is_idempotent(
            population in prop::collection::vec(prop::collection::vec(0u8..4, 3), 0..40)
        ) {
            let population: Vec<Individual> = population
                .into_iter()
                .map(|row| row.into_iter().map(f64::from).collect())
                .collect();
            let once = dedup(population.clone());
            let twice = dedup(once.clone());
            prop_assert_eq!(&once, &twice);
            prop_assert!(once.len() <= population.len());
            for individual in &population {
                prop_assert!(once.iter().any(|kept| kept == individual));
            }
        }
    }
}
