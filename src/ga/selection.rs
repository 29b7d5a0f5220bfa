//! Parent selection.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::population::Individual;

/// Parent selection strategy of the single-objective GA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// k-way tournament on fitness.
    Tournament,
    /// Fitness-proportional on the distance to the worst member.
    Roulette,
}

/// k-way tournament: the lowest fitness among `size` random draws.
///
/// Returns the index of the winner. `individuals` must be non-empty.
pub fn tournament<R: Rng>(individuals: &[Individual], size: usize, rng: &mut R) -> usize {
    let n = individuals.len();
    let mut best = rng.random_range(0..n);
    for _ in 1..size.max(1) {
        let candidate = rng.random_range(0..n);
        if individuals[candidate].fitness < individuals[best].fitness {
            best = candidate;
        }
    }
    best
}

/// Roulette wheel where weight = worst fitness - fitness (plus a small floor
/// so that a flat population degrades to uniform choice).
pub fn roulette<R: Rng>(individuals: &[Individual], rng: &mut R) -> usize {
    let worst = individuals
        .iter()
        .map(|i| i.fitness)
        .filter(|f| f.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    let weight = |ind: &Individual| {
        if ind.fitness.is_finite() {
            worst - ind.fitness + 1e-12
        } else {
            1e-12
        }
    };
    let total: f64 = individuals.iter().map(weight).sum();
    let mut pick = rng.random::<f64>() * total;
    for (i, ind) in individuals.iter().enumerate() {
        pick -= weight(ind);
        if pick <= 0.0 {
            return i;
        }
    }
    individuals.len() - 1
}

/// Binary tournament on (rank ascending, crowding distance descending).
pub fn crowded_tournament<R: Rng>(individuals: &[Individual], rng: &mut R) -> usize {
    let n = individuals.len();
    let a = rng.random_range(0..n);
    let b = rng.random_range(0..n);
    if crowded_less(&individuals[b], &individuals[a]) {
        b
    } else {
        a
    }
}

/// Crowded-comparison operator: `a` is preferred over `b`.
pub fn crowded_less(a: &Individual, b: &Individual) -> bool {
    a.rank < b.rank || (a.rank == b.rank && a.crowding_distance > b.crowding_distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::chromosome::Chromosome;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn individuals(fitness: &[f64]) -> Vec<Individual> {
        fitness
            .iter()
            .map(|&f| {
                let mut ind = Individual::new(Chromosome::new(vec![0], vec![0]));
                ind.fitness = f;
                ind
            })
            .collect()
    }

    #[test]
    fn test_tournament_full_pressure() {
        let pop = individuals(&[5.0, 1.0, 3.0]);
        let mut rng = SmallRng::seed_from_u64(42);
        // With many draws the best member almost surely appears.
        for _ in 0..20 {
            assert_eq!(tournament(&pop, 64, &mut rng), 1);
        }
    }

    #[test]
    fn test_roulette_prefers_fitter() {
        let pop = individuals(&[10.0, 0.0]);
        let mut rng = SmallRng::seed_from_u64(42);
        let wins = (0..200).filter(|_| roulette(&pop, &mut rng) == 1).count();
        assert!(wins > 190);
    }

    #[test]
    fn test_roulette_flat_population() {
        let pop = individuals(&[2.0, 2.0, 2.0]);
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..50 {
            assert!(roulette(&pop, &mut rng) < 3);
        }
    }

    #[test]
    fn test_crowded_comparison() {
        let mut pop = individuals(&[0.0, 0.0]);
        pop[0].rank = 0;
        pop[0].crowding_distance = 0.5;
        pop[1].rank = 1;
        pop[1].crowding_distance = f64::INFINITY;
        assert!(crowded_less(&pop[0], &pop[1]));
        pop[1].rank = 0;
        assert!(crowded_less(&pop[1], &pop[0]));

        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..20 {
            let w = crowded_tournament(&pop, &mut rng);
            assert!(w < 2);
        }
    }
}
