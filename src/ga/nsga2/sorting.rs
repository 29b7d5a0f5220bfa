//! Pareto dominance, fast non-dominated sorting and crowding distance.
//!
//! # Reference
//! Deb et al. (2002), "A fast and elitist multiobjective genetic algorithm:
//! NSGA-II"

/// Whether `a` Pareto-dominates `b` (all objectives minimized).
///
/// `a` is no worse in every objective and strictly better in at least one.
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    let mut strictly_better = false;
    for (x, y) in a.iter().zip(b) {
        if x > y {
            return false;
        }
        if x < y {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Splits objective vectors into non-dominated fronts.
///
/// Front 0 holds the non-dominated points; every point of front *k+1* is
/// dominated by some point of front *k*. Indices within a front are in
/// ascending order.
pub fn fast_non_dominated_sort(objectives: &[Vec<f64>]) -> Vec<Vec<usize>> {
    let n = objectives.len();
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count = vec![0usize; n];
    let mut fronts: Vec<Vec<usize>> = Vec::new();
    let mut current = Vec::new();

    for p in 0..n {
        for q in (p + 1)..n {
            if dominates(&objectives[p], &objectives[q]) {
                dominated_by[p].push(q);
                domination_count[q] += 1;
            } else if dominates(&objectives[q], &objectives[p]) {
                dominated_by[q].push(p);
                domination_count[p] += 1;
            }
        }
    }
    for (p, &count) in domination_count.iter().enumerate() {
        if count == 0 {
            current.push(p);
        }
    }

    while !current.is_empty() {
        let mut next = Vec::new();
        for &p in &current {
            for &q in &dominated_by[p] {
                domination_count[q] -= 1;
                if domination_count[q] == 0 {
                    next.push(q);
                }
            }
        }
        next.sort_unstable();
        fronts.push(current);
        current = next;
    }
    fronts
}

/// Crowding distance of each member of one front, in `front` order.
///
/// Boundary points of every objective get infinite distance; interior
/// points accumulate the normalized gap between their neighbours.
pub fn crowding_distance(objectives: &[Vec<f64>], front: &[usize]) -> Vec<f64> {
    let len = front.len();
    if len <= 2 {
        return vec![f64::INFINITY; len];
    }
    let mut distance = vec![0.0; len];
    let dims = objectives[front[0]].len();
    let mut order: Vec<usize> = (0..len).collect();

    for m in 0..dims {
        order.sort_by(|&a, &b| {
            objectives[front[a]][m]
                .total_cmp(&objectives[front[b]][m])
                .then(a.cmp(&b))
        });
        let min = objectives[front[order[0]]][m];
        let max = objectives[front[order[len - 1]]][m];
        distance[order[0]] = f64::INFINITY;
        distance[order[len - 1]] = f64::INFINITY;
        let range = max - min;
        if range <= 0.0 {
            continue;
        }
        for w in 1..len - 1 {
            let prev = objectives[front[order[w - 1]]][m];
            let next = objectives[front[order[w + 1]]][m];
            distance[order[w]] += (next - prev) / range;
        }
    }
    distance
}
