//! OS/MS dual-vector chromosome for flexible flow shops.
//!
//! # Encoding
//!
//! The chromosome consists of two vectors of length = operation count:
//! - **OS**: Permutation of operation indices. Only the order each gene
//!   belongs to matters: the k-th gene of order *i* is stage *k* of *i*.
//! - **MS**: Indexed by operation. Each element is a position in the
//!   operation's eligible machine list.
//!
//! Every permutation decodes to a feasible schedule, so crossover and
//! mutation only need to keep OS a permutation and MS in range.
//!
//! # Reference
//! Bierwirth (1995), "A generalized permutation approach to JSSP";
//! Zhang et al. (2011), "An effective GA for the flexible JSSP"

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::Schedule;
use crate::problem::ProblemModel;
use crate::scheduler::{decode, decode_balanced, candidates_at, MachineChooser};

/// OS/MS dual-vector chromosome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chromosome {
    /// Operation sequence.
    pub os: Vec<usize>,
    /// Machine selection (eligible position per operation).
    pub ms: Vec<usize>,
}

impl Chromosome {
    /// Creates a chromosome from raw vectors.
    pub fn new(os: Vec<usize>, ms: Vec<usize>) -> Self {
        Self { os, ms }
    }

    /// Random OS permutation and uniformly drawn MS.
    pub fn random<R: Rng>(model: &ProblemModel, rng: &mut R) -> Self {
        let os = random_sequence(model, rng);
        let ms = (0..model.operation_count())
            .map(|op| random_machine(model, op, rng))
            .collect();
        Self { os, ms }
    }

    /// Random OS permutation with load-balanced MS.
    pub fn with_load_balancing<R: Rng>(
        model: &ProblemModel,
        chooser: &dyn MachineChooser,
        rng: &mut R,
    ) -> Self {
        let os = random_sequence(model, rng);
        Self::from_sequence(os, model, chooser)
    }

    /// Given OS with MS picked by `chooser` during decoding.
    pub fn from_sequence(os: Vec<usize>, model: &ProblemModel, chooser: &dyn MachineChooser) -> Self {
        let ms = decode_balanced(&os, model, chooser);
        Self { os, ms }
    }

    /// Decodes into a schedule.
    pub fn decode(&self, model: &ProblemModel) -> Schedule {
        decode(&self.os, &self.ms, model)
    }

    /// Whether OS is a permutation of all operations and every MS gene is
    /// within its eligible list.
    pub fn is_valid(&self, model: &ProblemModel) -> bool {
        let n = model.operation_count();
        if self.os.len() != n || self.ms.len() != n {
            return false;
        }
        let mut seen = vec![false; n];
        for &gene in &self.os {
            match seen.get_mut(gene) {
                Some(s) if !*s => *s = true,
                _ => return false,
            }
        }
        self.ms.iter().enumerate().all(|(op, &k)| {
            k < model.eligible_machines(model.operation(op).stage).len()
        })
    }

    /// Number of genes per vector.
    pub fn len(&self) -> usize {
        self.os.len()
    }

    /// Whether the chromosome is empty.
    pub fn is_empty(&self) -> bool {
        self.os.is_empty()
    }
}

fn random_sequence<R: Rng>(model: &ProblemModel, rng: &mut R) -> Vec<usize> {
    let mut os: Vec<usize> = (0..model.operation_count()).collect();
    os.shuffle(rng);
    os
}

fn random_machine<R: Rng>(model: &ProblemModel, op: usize, rng: &mut R) -> usize {
    let eligible = model.eligible_machines(model.operation(op).stage).len();
    if eligible <= 1 {
        0
    } else {
        rng.random_range(0..eligible)
    }
}

// ======================== OS crossover ========================

/// Performs POX (Precedence Operation Crossover) on OS.
///
/// Selects a random subset of orders, keeps their genes at parent 1's
/// positions and fills the remaining positions with parent 2's other
/// genes in parent 2's order (and vice versa).
///
/// # Reference
/// Bierwirth et al. (1996)
pub fn pox_crossover<R: Rng>(
    p1: &[usize],
    p2: &[usize],
    model: &ProblemModel,
    rng: &mut R,
) -> (Vec<usize>, Vec<usize>) {
    let orders = model.order_count();
    if orders < 2 || p1.len() != p2.len() {
        return (p1.to_vec(), p2.to_vec());
    }

    let set_size = rng.random_range(1..orders);
    let mut ids: Vec<usize> = (0..orders).collect();
    ids.shuffle(rng);
    let mut selected = vec![false; orders];
    for &o in &ids[..set_size] {
        selected[o] = true;
    }
    let is_selected = |gene: usize| selected[model.operation(gene).order];

    (
        pox_build_child(p1, p2, &is_selected),
        pox_build_child(p2, p1, &is_selected),
    )
}

fn pox_build_child(template: &[usize], donor: &[usize], selected: &dyn Fn(usize) -> bool) -> Vec<usize> {
    let mut donor_iter = donor.iter().copied().filter(|&g| !selected(g));
    template
        .iter()
        .map(|&g| {
            if selected(g) {
                g
            } else {
                donor_iter.next().unwrap_or(g)
            }
        })
        .collect()
}

/// Performs OX (Order Crossover) on OS.
///
/// Copies a random slice from one parent and fills the remaining
/// positions, starting after the slice and wrapping around, with the other
/// parent's genes in its order.
///
/// # Reference
/// Davis (1985), "Applying adaptive algorithms to epistatic domains"
pub fn ox_crossover<R: Rng>(p1: &[usize], p2: &[usize], rng: &mut R) -> (Vec<usize>, Vec<usize>) {
    let len = p1.len();
    if len < 2 || p2.len() != len {
        return (p1.to_vec(), p2.to_vec());
    }
    let mut i = rng.random_range(0..len);
    let mut j = rng.random_range(0..len);
    if i > j {
        std::mem::swap(&mut i, &mut j);
    }
    (ox_build_child(p1, p2, i, j), ox_build_child(p2, p1, i, j))
}

fn ox_build_child(template: &[usize], donor: &[usize], i: usize, j: usize) -> Vec<usize> {
    let len = template.len();
    let max_gene = template.iter().chain(donor).copied().max().unwrap_or(0);
    let mut in_slice = vec![false; max_gene + 1];
    for &g in &template[i..=j] {
        in_slice[g] = true;
    }

    let mut child = template.to_vec();
    let mut fill = (0..len)
        .map(|k| donor[(j + 1 + k) % len])
        .filter(|&g| !in_slice[g]);
    for k in 0..len - (j - i + 1) {
        let pos = (j + 1 + k) % len;
        if let Some(g) = fill.next() {
            child[pos] = g;
        }
    }
    child
}

// ======================== MS crossover ========================

/// Uniform crossover on MS: each gene from either parent with equal chance.
pub fn uniform_ms_crossover<R: Rng>(p1: &[usize], p2: &[usize], rng: &mut R) -> (Vec<usize>, Vec<usize>) {
    let mut c1 = p1.to_vec();
    let mut c2 = p2.to_vec();
    for (a, b) in c1.iter_mut().zip(c2.iter_mut()) {
        if rng.random_bool(0.5) {
            std::mem::swap(a, b);
        }
    }
    (c1, c2)
}

/// One-point crossover on MS.
pub fn one_point_ms_crossover<R: Rng>(p1: &[usize], p2: &[usize], rng: &mut R) -> (Vec<usize>, Vec<usize>) {
    let len = p1.len().min(p2.len());
    if len < 2 {
        return (p1.to_vec(), p2.to_vec());
    }
    let split = rng.random_range(1..len);
    let mut c1 = p1[..split].to_vec();
    c1.extend_from_slice(&p2[split..]);
    let mut c2 = p2[..split].to_vec();
    c2.extend_from_slice(&p1[split..]);
    (c1, c2)
}

// ======================== Mutation operators ========================

/// Swap mutation: exchanges two random positions in OS.
pub fn swap_mutation<R: Rng>(os: &mut [usize], rng: &mut R) {
    let len = os.len();
    if len < 2 {
        return;
    }
    let i = rng.random_range(0..len);
    let j = rng.random_range(0..len);
    os.swap(i, j);
}

/// Insert mutation: removes an element and reinserts it at a random position.
pub fn insert_mutation<R: Rng>(os: &mut Vec<usize>, rng: &mut R) {
    let len = os.len();
    if len < 2 {
        return;
    }
    let from = rng.random_range(0..len);
    let to = rng.random_range(0..len);
    let item = os.remove(from);
    os.insert(to, item);
}

/// Invert mutation: reverses a random segment of OS.
pub fn invert_mutation<R: Rng>(os: &mut [usize], rng: &mut R) {
    let len = os.len();
    if len < 2 {
        return;
    }
    let mut i = rng.random_range(0..len);
    let mut j = rng.random_range(0..len);
    if i > j {
        std::mem::swap(&mut i, &mut j);
    }
    os[i..=j].reverse();
}

/// MS redraw: moves one random operation to a different eligible machine.
///
/// No-op when the chosen operation has a single eligible machine.
pub fn ms_redraw_mutation<R: Rng>(ms: &mut [usize], model: &ProblemModel, rng: &mut R) {
    if ms.is_empty() {
        return;
    }
    let op = rng.random_range(0..ms.len());
    let eligible = model.eligible_machines(model.operation(op).stage).len();
    if eligible < 2 {
        return;
    }
    let current = ms[op] % eligible;
    let shift = rng.random_range(1..eligible);
    ms[op] = (current + shift) % eligible;
}

/// Load-balanced MS mutation: reassigns one random operation to the machine
/// `chooser` prefers given the schedule state just before it.
pub fn ms_balanced_mutation<R: Rng>(
    chromosome: &mut Chromosome,
    model: &ProblemModel,
    chooser: &dyn MachineChooser,
    rng: &mut R,
) {
    if chromosome.ms.is_empty() {
        return;
    }
    let op = rng.random_range(0..chromosome.ms.len());
    let candidates = candidates_at(&chromosome.os, &chromosome.ms, model, op);
    if candidates.is_empty() {
        return;
    }
    let choice = chooser.choose(&candidates).min(candidates.len() - 1);
    chromosome.ms[op] = candidates[choice].eligible_index;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Machine, Order, ProcessPlan, ProcessTime};
    use crate::scheduler::LeastLoaded;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    /// 4 orders × 2 stages; stage 0 has 3 machines, stage 1 has 1.
    fn model() -> ProblemModel {
        let orders = (0..4)
            .map(|i| Order::new(format!("O{i}"), "P", 1 + i as u32, 1.0))
            .collect();
        let plan = ProcessPlan::new()
            .with_entry(ProcessTime::new("Dispensing", "DISP", 600.0))
            .with_entry(ProcessTime::new("Assembly", "BLU", 900.0));
        let machines = vec![
            Machine::new("D1", "DISP"),
            Machine::new("D2", "DISP"),
            Machine::new("D3", "DISP"),
            Machine::new("B1", "BLU"),
        ];
        ProblemModel::new(orders, plan, machines).unwrap()
    }

    fn is_permutation(os: &[usize], n: usize) -> bool {
        let mut sorted = os.to_vec();
        sorted.sort_unstable();
        sorted == (0..n).collect::<Vec<_>>()
    }

    #[test]
    fn test_random_chromosome() {
        let m = model();
        let mut rng = SmallRng::seed_from_u64(42);
        let ch = Chromosome::random(&m, &mut rng);
        assert_eq!(ch.len(), 8);
        assert!(ch.is_valid(&m));
        // stage 1 has one machine
        assert!(ch.ms.iter().skip(1).step_by(2).all(|&k| k == 0));
    }

    #[test]
    fn test_load_balanced_chromosome() {
        let m = model();
        let mut rng = SmallRng::seed_from_u64(42);
        let ch = Chromosome::with_load_balancing(&m, &LeastLoaded::default(), &mut rng);
        assert!(ch.is_valid(&m));
        assert!(ch.decode(&m).violations(&m).is_empty());
    }

    #[test]
    fn test_invalid_chromosome() {
        let m = model();
        assert!(!Chromosome::new(vec![0, 1], vec![0, 0]).is_valid(&m));
        let dup = Chromosome::new(vec![0, 0, 2, 3, 4, 5, 6, 7], vec![0; 8]);
        assert!(!dup.is_valid(&m));
        let out_of_range = Chromosome::new((0..8).collect(), vec![3, 0, 0, 0, 0, 0, 0, 0]);
        assert!(!out_of_range.is_valid(&m));
    }

    #[test]
    fn test_pox_keeps_permutation() {
        let m = model();
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..50 {
            let p1 = Chromosome::random(&m, &mut rng);
            let p2 = Chromosome::random(&m, &mut rng);
            let (c1, c2) = pox_crossover(&p1.os, &p2.os, &m, &mut rng);
            assert!(is_permutation(&c1, 8));
            assert!(is_permutation(&c2, 8));
        }
    }

    #[test]
    fn test_pox_preserves_selected_positions() {
        let m = model();
        let mut rng = SmallRng::seed_from_u64(7);
        let p1: Vec<usize> = (0..8).collect();
        let p2: Vec<usize> = (0..8).rev().collect();
        let (c1, _) = pox_crossover(&p1, &p2, &m, &mut rng);
        // genes that stayed in place in c1 belong to whole orders
        for order in 0..4 {
            let kept = [2 * order, 2 * order + 1]
                .iter()
                .filter(|&&g| c1[g] == g)
                .count();
            assert!(kept == 0 || kept == 2 || c1 == p1);
        }
    }

    #[test]
    fn test_ox_keeps_permutation() {
        let mut rng = SmallRng::seed_from_u64(42);
        let p1: Vec<usize> = (0..10).collect();
        let mut p2 = p1.clone();
        p2.shuffle(&mut rng);
        for _ in 0..50 {
            let (c1, c2) = ox_crossover(&p1, &p2, &mut rng);
            assert!(is_permutation(&c1, 10));
            assert!(is_permutation(&c2, 10));
        }
    }

    #[test]
    fn test_ms_crossovers() {
        let mut rng = SmallRng::seed_from_u64(42);
        let p1 = vec![0; 6];
        let p2 = vec![1; 6];
        let (c1, c2) = uniform_ms_crossover(&p1, &p2, &mut rng);
        for k in 0..6 {
            assert_eq!(c1[k] + c2[k], 1);
        }
        let (c1, _) = one_point_ms_crossover(&p1, &p2, &mut rng);
        assert_eq!(c1[0], 0);
        assert_eq!(c1[5], 1);
    }

    #[test]
    fn test_os_mutations_keep_permutation() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut os: Vec<usize> = (0..8).collect();
        for _ in 0..100 {
            swap_mutation(&mut os, &mut rng);
            insert_mutation(&mut os, &mut rng);
            invert_mutation(&mut os, &mut rng);
        }
        assert!(is_permutation(&os, 8));
    }

    #[test]
    fn test_ms_redraw_changes_machine() {
        let m = model();
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..50 {
            let mut ms = vec![0; 8];
            ms_redraw_mutation(&mut ms, &m, &mut rng);
            let changed: Vec<usize> = (0..8).filter(|&op| ms[op] != 0).collect();
            // only stage-0 operations have alternatives
            assert!(changed.len() <= 1);
            assert!(changed.iter().all(|op| op % 2 == 0 && ms[*op] < 3));
        }
    }

    #[test]
    fn test_ms_balanced_mutation_stays_valid() {
        let m = model();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut ch = Chromosome::random(&m, &mut rng);
        for _ in 0..20 {
            ms_balanced_mutation(&mut ch, &m, &LeastLoaded::default(), &mut rng);
        }
        assert!(ch.is_valid(&m));
    }
}
