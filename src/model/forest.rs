//! Isolation forest over a dense feature matrix.
//!
//! Each tree recursively splits a random subsample on a random feature at a
//! uniform threshold between that feature's min and max. Points that end up
//! alone after few splits are outliers. Scores follow Liu et al.:
//! `s(x) = 2^(-E[h(x)] / c(n))`, in (0, 1], higher is more anomalous.

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Expected path length of an unsuccessful BST search over `n` points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug)]
struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    fn grow(data: ArrayView2<f64>, rows: Vec<usize>, depth_limit: usize, rng: &mut StdRng) -> Self {
        Self {
            root: grow_node(data, rows, 0, depth_limit, rng),
        }
    }

    fn path_length(&self, point: ArrayView1<f64>) -> f64 {
        let mut node = &self.root;
        let mut depth = 0usize;
        loop {
            match node {
                Node::Leaf { size } => return depth as f64 + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if point[*feature] <= *threshold { left } else { right };
                    depth += 1;
                }
            }
        }
    }
}

/// Point in `[lo, hi)` at fraction `t` of the way from `lo` to `hi`.
/// Interpolates instead of computing `hi - lo`, which overflows for
/// columns spanning more than `f64::MAX`.
fn split_point(lo: f64, hi: f64, t: f64) -> f64 {
    let x = (lo * (1.0 - t) + hi * t).max(lo);
    if x < hi {
        x
    } else {
        lo
    }
}

fn grow_node(
    data: ArrayView2<f64>,
    rows: Vec<usize>,
    depth: usize,
    depth_limit: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= depth_limit || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    // Only features that still vary inside this partition can split it.
    let splittable: Vec<(usize, f64, f64)> = (0..data.ncols())
        .filter_map(|f| {
            let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                let v = data[[r, f]];
                (lo.min(v), hi.max(v))
            });
            (hi > lo).then_some((f, lo, hi))
        })
        .collect();
    if splittable.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, lo, hi) = splittable[rng.gen_range(0..splittable.len())];
    let threshold = split_point(lo, hi, rng.gen::<f64>());
    let (left, right): (Vec<usize>, Vec<usize>) =
        rows.into_iter().partition(|&r| data[[r, feature]] <= threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow_node(data, left, depth + 1, depth_limit, rng)),
        right: Box::new(grow_node(data, right, depth + 1, depth_limit, rng)),
    }
}

/// A fitted ensemble. Construction is fully determined by `seed`.
#[derive(Debug)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
}

impl IsolationForest {
    /// Fit `n_trees` trees on subsamples of `min(max_samples, rows)` rows each.
    pub fn fit(data: ArrayView2<f64>, n_trees: usize, max_samples: usize, seed: u64) -> Self {
        let n = data.nrows();
        let sample_size = max_samples.max(2).min(n);
        let depth_limit = (sample_size.max(2) as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(seed);

        let trees = (0..n_trees)
            .map(|_| {
                let rows = sample(&mut rng, n, sample_size).into_vec();
                IsolationTree::grow(data, rows, depth_limit, &mut rng)
            })
            .collect();

        Self { trees, sample_size }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean isolation depth of `point` across the ensemble.
    pub fn mean_path_length(&self, point: ArrayView1<f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: f64 = self.trees.iter().map(|t| t.path_length(point)).sum();
        total / self.trees.len() as f64
    }

    /// Anomaly score in (0, 1]; shorter mean paths score higher.
    pub fn score(&self, point: ArrayView1<f64>) -> f64 {
        let norm = average_path_length(self.sample_size);
        if norm == 0.0 {
            return 0.5;
        }
        2f64.powf(-self.mean_path_length(point) / norm)
    }

    pub fn score_rows(&self, data: ArrayView2<f64>) -> Vec<f64> {
        data.outer_iter().map(|row| self.score(row)).collect()
    }
}
