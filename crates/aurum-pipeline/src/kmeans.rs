//! Two-cluster k-means over RGB colors.
//!
//! Used by segmentation when the source image carries no transparency
//! information: all pixel colors are partitioned into exactly two
//! clusters, and the larger cluster is assumed to be background.
//!
//! Runs k-means++ seeding with a fixed iteration/precision budget and
//! several random restarts to stabilize the partition, keeping the run
//! with the lowest within-cluster squared error.

use rand::Rng;

/// Maximum iterations per k-means run.
const MAX_ITERS: usize = 50;

/// Convergence threshold on total centroid movement (squared distance).
const EPSILON: f32 = 0.5;

/// Number of random restarts; the best-scoring run wins.
const RESTARTS: usize = 3;

/// Result of a two-cluster partition.
#[derive(Debug, Clone)]
pub struct Partition {
    /// Cluster index (0 or 1) per input color, in input order.
    pub assignments: Vec<u8>,
    /// Number of colors assigned to each cluster.
    pub counts: [usize; 2],
}

impl Partition {
    /// Index of the larger cluster (ties go to cluster 0).
    #[must_use]
    pub const fn larger_cluster(&self) -> u8 {
        if self.counts[0] >= self.counts[1] { 0 } else { 1 }
    }
}

/// Partition `colors` into two clusters.
///
/// A uniform input (all colors identical) degenerates to everything in
/// one cluster; this is accepted behavior, not an error.
#[must_use = "returns the computed partition"]
pub fn partition_two<R: Rng>(colors: &[[f32; 3]], rng: &mut R) -> Partition {
    if colors.is_empty() {
        return Partition {
            assignments: Vec::new(),
            counts: [0, 0],
        };
    }

    let mut best: Option<(f32, Partition)> = None;

    for _ in 0..RESTARTS {
        let (score, partition) = run_once(colors, rng);
        let better = best.as_ref().is_none_or(|(s, _)| score < *s);
        if better {
            best = Some((score, partition));
        }
    }

    // `best` is always Some: RESTARTS >= 1 and colors is non-empty.
    best.map_or_else(
        || Partition {
            assignments: vec![0; colors.len()],
            counts: [colors.len(), 0],
        },
        |(_, partition)| partition,
    )
}

/// One seeded k-means run. Returns (within-cluster SSE, partition).
fn run_once<R: Rng>(colors: &[[f32; 3]], rng: &mut R) -> (f32, Partition) {
    let mut centroids = seed_plus_plus(colors, rng);
    let mut assignments = vec![0u8; colors.len()];

    for _ in 0..MAX_ITERS {
        // Assignment step.
        for (color, slot) in colors.iter().zip(assignments.iter_mut()) {
            let d0 = distance_squared(color, &centroids[0]);
            let d1 = distance_squared(color, &centroids[1]);
            *slot = u8::from(d1 < d0);
        }

        // Update step.
        let mut sums = [[0.0f32; 3]; 2];
        let mut counts = [0usize; 2];
        for (color, &cluster) in colors.iter().zip(assignments.iter()) {
            let c = usize::from(cluster);
            for (sum, component) in sums[c].iter_mut().zip(color.iter()) {
                *sum += component;
            }
            counts[c] += 1;
        }

        let mut movement = 0.0f32;
        for c in 0..2 {
            if counts[c] == 0 {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let n = counts[c] as f32;
            let updated = [sums[c][0] / n, sums[c][1] / n, sums[c][2] / n];
            movement += distance_squared(&centroids[c], &updated);
            centroids[c] = updated;
        }

        if movement < EPSILON {
            break;
        }
    }

    let mut counts = [0usize; 2];
    let mut sse = 0.0f32;
    for (color, &cluster) in colors.iter().zip(assignments.iter()) {
        let c = usize::from(cluster);
        counts[c] += 1;
        sse += distance_squared(color, &centroids[c]);
    }

    (
        sse,
        Partition {
            assignments,
            counts,
        },
    )
}

/// k-means++ seeding for k=2: first centroid uniform, second weighted
/// by squared distance from the first.
fn seed_plus_plus<R: Rng>(colors: &[[f32; 3]], rng: &mut R) -> [[f32; 3]; 2] {
    let first = colors[rng.random_range(0..colors.len())];

    let weights: Vec<f32> = colors
        .iter()
        .map(|c| distance_squared(c, &first))
        .collect();
    let total: f32 = weights.iter().sum();

    if total <= f32::EPSILON {
        // Uniform input: both centroids collapse onto the same color.
        return [first, first];
    }

    let mut target = rng.random::<f32>() * total;
    let mut second = colors[colors.len() - 1];
    for (color, weight) in colors.iter().zip(weights.iter()) {
        target -= weight;
        if target <= 0.0 {
            second = *color;
            break;
        }
    }

    [first, second]
}

fn distance_squared(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr.mul_add(dr, dg.mul_add(dg, db * db))
}
