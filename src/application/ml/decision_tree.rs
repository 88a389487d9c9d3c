//! CART regression tree shared by the boosting and extra-trees back-ends.

use crate::domain::errors::ModelError;
use rand::Rng;
use rand::rngs::StdRng;

/// How candidate thresholds are chosen at each node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    /// Every midpoint between consecutive distinct values of every feature.
    Best,
    /// One uniform threshold in `[min, max)` per feature (extremely randomized trees).
    Random,
}

#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub strategy: SplitStrategy,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Sum and sum of squares of a target subset; enough for squared-error impurity.
#[derive(Debug, Clone, Copy, Default)]
struct Moments {
    n: usize,
    sum: f64,
    sum_sq: f64,
}

impl Moments {
    fn of(y: &[f64], indices: &[usize]) -> Self {
        indices.iter().fold(Self::default(), |m, &i| m.add(y[i]))
    }

    fn add(self, v: f64) -> Self {
        Self {
            n: self.n + 1,
            sum: self.sum + v,
            sum_sq: self.sum_sq + v * v,
        }
    }

    fn minus(self, other: Self) -> Self {
        Self {
            n: self.n - other.n,
            sum: self.sum - other.sum,
            sum_sq: self.sum_sq - other.sum_sq,
        }
    }

    fn mean(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.sum / self.n as f64
        }
    }

    /// Sum of squared deviations from the mean.
    fn sse(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        (self.sum_sq - self.sum * self.sum / self.n as f64).max(0.0)
    }
}

const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct RegressionTree {
    params: TreeParams,
    root: Option<Node>,
    n_features: usize,
    importances: Vec<f64>,
}

impl RegressionTree {
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            root: None,
            n_features: 0,
            importances: Vec::new(),
        }
    }

    /// Grows the tree on pre-validated data. `rng` is only consumed by random splits.
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[f64], rng: &mut StdRng) -> Result<(), ModelError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(ModelError::InvalidData(format!(
                "{} rows for {} targets",
                x.len(),
                y.len()
            )));
        }
        self.n_features = x[0].len();
        self.importances = vec![0.0; self.n_features];

        let indices: Vec<usize> = (0..x.len()).collect();
        let root = self.grow(x, y, &indices, 0, rng);
        self.root = Some(root);

        let total: f64 = self.importances.iter().sum();
        if total > 0.0 {
            self.importances.iter_mut().for_each(|v| *v /= total);
        }
        Ok(())
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        let mut node = self.root.as_ref().ok_or(ModelError::NotFitted)?;
        if row.len() != self.n_features {
            return Err(ModelError::InvalidData(format!(
                "expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        loop {
            match node {
                Node::Leaf { value } => return Ok(*value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Impurity-decrease importances normalized to sum to one (all zero for a stump).
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn depth(&self) -> usize {
        fn depth_of(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + depth_of(left).max(depth_of(right)),
            }
        }
        self.root.as_ref().map(depth_of).unwrap_or(0)
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
        depth: usize,
        rng: &mut StdRng,
    ) -> Node {
        let moments = Moments::of(y, indices);
        let leaf = Node::Leaf {
            value: moments.mean(),
        };

        let n = indices.len();
        if depth >= self.params.max_depth
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf.max(1)
            || moments.sse() <= MIN_GAIN
        {
            return leaf;
        }

        let split = match self.params.strategy {
            SplitStrategy::Best => self.best_split(x, y, indices, moments),
            SplitStrategy::Random => self.random_split(x, y, indices, moments, rng),
        };
        let Some(split) = split else {
            return leaf;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[i][split.feature] <= split.threshold);
        self.importances[split.feature] += split.gain;

        let left = self.grow(x, y, &left_idx, depth + 1, rng);
        let right = self.grow(x, y, &right_idx, depth + 1, rng);
        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn best_split(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
        parent: Moments,
    ) -> Option<Split> {
        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent_sse = parent.sse();
        let mut best: Option<Split> = None;
        let mut order = indices.to_vec();

        for feature in 0..self.n_features {
            order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));
            let mut left = Moments::default();
            for pos in 0..order.len() - 1 {
                left = left.add(y[order[pos]]);
                let right = parent.minus(left);
                if left.n < min_leaf || right.n < min_leaf {
                    continue;
                }
                let current = x[order[pos]][feature];
                let next = x[order[pos + 1]][feature];
                if next <= current {
                    continue;
                }
                let gain = parent_sse - left.sse() - right.sse();
                if gain > MIN_GAIN && best.is_none_or(|b| gain > b.gain) {
                    best = Some(Split {
                        feature,
                        threshold: current + (next - current) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }

    fn random_split(
        &self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: &[usize],
        parent: Moments,
        rng: &mut StdRng,
    ) -> Option<Split> {
        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent_sse = parent.sse();
        let mut best: Option<Split> = None;

        for feature in 0..self.n_features {
            let (lo, hi) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                (lo.min(x[i][feature]), hi.max(x[i][feature]))
            });
            if hi <= lo {
                continue;
            }
            let threshold = rng.random_range(lo..hi);

            let mut left = Moments::default();
            for &i in indices {
                if x[i][feature] <= threshold {
                    left = left.add(y[i]);
                }
            }
            let right = parent.minus(left);
            if left.n < min_leaf || right.n < min_leaf {
                continue;
            }
            let gain = parent_sse - left.sse() - right.sse();
            if gain > MIN_GAIN && best.is_none_or(|b| gain > b.gain) {
                best = Some(Split {
                    feature,
                    threshold,
                    gain,
                });
            }
        }
        best
    }
}
