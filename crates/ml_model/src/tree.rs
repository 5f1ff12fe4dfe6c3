//! CART regression tree: variance-reduction splits over a flat node arena.

use serde::{Deserialize, Serialize};

use crate::TrainError;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionTreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for DecisionTreeParams {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf { value: f64 },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree. Nodes live in a flat arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    nodes: Vec<Node>,
}

impl DecisionTreeRegressor {
    /// Fits a tree on a row-major matrix and target vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the training set is empty or misaligned.
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: &DecisionTreeParams) -> Result<Self, TrainError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(TrainError::Degenerate(
                "decision tree needs a non-empty, aligned training set".to_string(),
            ));
        }

        let mut tree = Self { nodes: Vec::new() };
        let indices: Vec<usize> = (0..x.len()).collect();
        tree.build(x, y, indices, 0, params);
        Ok(tree)
    }

    /// Predicts a single row by walking from the root.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    index = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Grows the subtree for `indices`, returning its arena slot.
    fn build(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: Vec<usize>,
        depth: usize,
        params: &DecisionTreeParams,
    ) -> usize {
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64;

        let splittable = depth < params.max_depth
            && indices.len() >= params.min_samples_split
            && indices.len() >= 2 * params.min_samples_leaf;

        let split = if splittable {
            best_split(x, y, &indices, params.min_samples_leaf)
        } else {
            None
        };

        let Some((feature, threshold)) = split else {
            self.nodes.push(Node::Leaf { value: mean });
            return self.nodes.len() - 1;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[i][feature] <= threshold);

        // Reserve the slot before recursing so the root stays at index 0.
        self.nodes.push(Node::Leaf { value: mean });
        let slot = self.nodes.len() - 1;
        let left = self.build(x, y, left_idx, depth + 1, params);
        let right = self.build(x, y, right_idx, depth + 1, params);
        self.nodes[slot] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        slot
    }
}

/// Finds the (feature, threshold) split minimizing the summed squared error
/// of the two children, or `None` when no split improves on the parent.
fn best_split(
    x: &[Vec<f64>],
    y: &[f64],
    indices: &[usize],
    min_samples_leaf: usize,
) -> Option<(usize, f64)> {
    let n = indices.len();
    let columns = x[indices[0]].len();

    let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n as f64;
    if parent_sse <= 1e-12 {
        return None;
    }

    let mut best: Option<(usize, f64, f64)> = None;

    let mut ordered = indices.to_vec();
    for feature in 0..columns {
        ordered.sort_by(|&a, &b| {
            x[a][feature]
                .partial_cmp(&x[b][feature])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for (count, pair) in ordered.windows(2).enumerate() {
            let value = y[pair[0]];
            left_sum += value;
            left_sq += value * value;

            let left_n = count + 1;
            let right_n = n - left_n;
            if left_n < min_samples_leaf || right_n < min_samples_leaf {
                continue;
            }

            let lo = x[pair[0]][feature];
            let hi = x[pair[1]][feature];
            if hi <= lo {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / left_n as f64)
                + (right_sq - right_sum * right_sum / right_n as f64);

            if best.map_or(true, |(.., best_sse)| sse < best_sse) {
                best = Some((feature, (lo + hi) / 2.0, sse));
            }
        }
    }

    best.and_then(|(feature, threshold, sse)| {
        (sse < parent_sse - 1e-12).then_some((feature, threshold))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_a_step_function_exactly() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![f64::from(i)]).collect();
        let y: Vec<f64> = (0..20).map(|i| if i < 10 { 1.0 } else { 5.0 }).collect();

        let tree = DecisionTreeRegressor::fit(&x, &y, &DecisionTreeParams::default()).unwrap();
        assert_eq!(tree.predict_row(&[3.0]), 1.0);
        assert_eq!(tree.predict_row(&[15.0]), 5.0);
    }

    #[test]
    fn constant_target_yields_single_leaf() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![f64::from(i)]).collect();
        let y = vec![7.0; 10];

        let tree = DecisionTreeRegressor::fit(&x, &y, &DecisionTreeParams::default()).unwrap();
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.predict_row(&[99.0]), 7.0);
    }

    #[test]
    fn respects_max_depth() {
        let params = DecisionTreeParams {
            max_depth: 1,
            ..DecisionTreeParams::default()
        };
        let x: Vec<Vec<f64>> = (0..16).map(|i| vec![f64::from(i)]).collect();
        let y: Vec<f64> = (0..16).map(f64::from).collect();

        let tree = DecisionTreeRegressor::fit(&x, &y, &params).unwrap();
        // Depth 1 allows at most one split: three nodes.
        assert!(tree.nodes.len() <= 3);
    }

    #[test]
    fn picks_the_informative_feature() {
        // Feature 1 is noise; feature 0 carries the signal.
        let x: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![f64::from(i), f64::from((i * 7) % 3)])
            .collect();
        let y: Vec<f64> = (0..30).map(|i| if i < 15 { -2.0 } else { 2.0 }).collect();

        let tree = DecisionTreeRegressor::fit(&x, &y, &DecisionTreeParams::default()).unwrap();
        assert_eq!(tree.predict_row(&[0.0, 2.0]), -2.0);
        assert_eq!(tree.predict_row(&[29.0, 0.0]), 2.0);
    }

    #[test]
    fn serializes_round_trip() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![f64::from(i)]).collect();
        let y: Vec<f64> = (0..10).map(|i| f64::from(i % 2)).collect();
        let tree = DecisionTreeRegressor::fit(&x, &y, &DecisionTreeParams::default()).unwrap();

        let json = serde_json::to_string(&tree).unwrap();
        let back: DecisionTreeRegressor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }
}
