//! Tree ensemble predictor (random forest or gradient boosting).
//!
//! Each tree is a flat node array rooted at index 0. A split sends the
//! sample left when `x[feature] <= threshold`, as in scikit-learn.

use serde::{Deserialize, Serialize};

use crate::ports::{check_input, ChurnPredictor, ModelLoadError, PredictorError};

fn default_threshold() -> f64 {
    0.5
}

fn default_learning_rate() -> f64 {
    1.0
}

/// How per-tree outputs combine into p(churn).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Leaves hold p(churn); the ensemble averages them (random forest)
    Average,
    /// Leaves hold log-odds increments; sigmoid of the weighted sum (boosting)
    Boosted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf.
    ///
    /// Children always sit after their parent (checked at load), so the
    /// walk terminates within `nodes.len()` steps.
    fn leaf_value(&self, features: &[f64]) -> Result<f64, PredictorError> {
        let mut index = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = features.get(*feature).ok_or_else(|| {
                        PredictorError::Inference(format!("split on missing feature {feature}"))
                    })?;
                    index = if *x <= *threshold { *left } else { *right };
                }
                None => break,
            }
        }
        Err(PredictorError::Inference(format!(
            "tree walk left the node array at index {index}"
        )))
    }

    fn validate(
        &self,
        tree_index: usize,
        n_features: usize,
        aggregation: Aggregation,
    ) -> Result<(), ModelLoadError> {
        if self.nodes.is_empty() {
            return Err(ModelLoadError::InvalidParameters(format!(
                "tree {tree_index} has no nodes"
            )));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(ModelLoadError::InvalidParameters(format!(
                            "tree {tree_index} node {i} splits on feature {feature} (only {n_features} features)"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ModelLoadError::InvalidParameters(format!(
                            "tree {tree_index} node {i} has a non-finite threshold"
                        )));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(ModelLoadError::InvalidParameters(format!(
                                "tree {tree_index} node {i} has invalid child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(ModelLoadError::InvalidParameters(format!(
                            "tree {tree_index} node {i} has a non-finite leaf value"
                        )));
                    }
                    if aggregation == Aggregation::Average && !(0.0..=1.0).contains(value) {
                        return Err(ModelLoadError::InvalidParameters(format!(
                            "tree {tree_index} node {i} leaf {value} is not a probability"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Fitted tree ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    /// Number of input features the ensemble was fit on
    pub n_features: usize,
    pub aggregation: Aggregation,
    pub trees: Vec<DecisionTree>,
    /// Initial log-odds (boosted only)
    #[serde(default)]
    pub base_score: f64,
    /// Shrinkage applied to each tree (boosted only)
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Decision threshold on p(churn)
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl TreeEnsemble {
    /// Check structure against the expected feature count.
    ///
    /// # Errors
    /// Returns `ModelLoadError` on any inconsistency.
    pub fn validate(&self, n_features: usize) -> Result<(), ModelLoadError> {
        if self.n_features != n_features {
            return Err(ModelLoadError::FeatureCount {
                expected: n_features,
                got: self.n_features,
            });
        }
        if self.trees.is_empty() {
            return Err(ModelLoadError::InvalidParameters(
                "ensemble has no trees".into(),
            ));
        }
        if !self.base_score.is_finite() || !self.learning_rate.is_finite() {
            return Err(ModelLoadError::InvalidParameters(
                "base_score and learning_rate must be finite".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ModelLoadError::InvalidParameters(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, n_features, self.aggregation)?;
        }
        Ok(())
    }

    fn churn_probability(&self, features: &[f64]) -> Result<f64, PredictorError> {
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.leaf_value(features)?;
        }

        let p = match self.aggregation {
            Aggregation::Average => total / self.trees.len() as f64,
            Aggregation::Boosted => {
                let margin = self.base_score + self.learning_rate * total;
                1.0 / (1.0 + (-margin).exp())
            }
        };
        Ok(p)
    }
}

impl ChurnPredictor for TreeEnsemble {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<u8, PredictorError> {
        let [_, p] = self.predict_proba(features)?;
        Ok(u8::from(p >= self.threshold))
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], PredictorError> {
        check_input(features, self.n_features)?;
        let p = self.churn_probability(features)?;
        Ok([1.0 - p, p])
    }

    fn describe(&self) -> String {
        format!(
            "tree ensemble ({:?}, {} trees, {} features)",
            self.aggregation,
            self.trees.len(),
            self.n_features
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// x[0] <= 0.5 ? leaf(a) : leaf(b)
    fn stump(a: f64, b: f64) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: a },
                TreeNode::Leaf { value: b },
            ],
        }
    }

    fn forest() -> TreeEnsemble {
        TreeEnsemble {
            n_features: 2,
            aggregation: Aggregation::Average,
            trees: vec![stump(0.2, 0.8), stump(0.4, 0.6)],
            base_score: 0.0,
            learning_rate: 1.0,
            threshold: 0.5,
        }
    }

    #[test]
    fn test_forest_averages_leaves() {
        let m = forest();
        let [_, low] = m.predict_proba(&[0.0, 9.0]).expect("Should predict");
        let [_, high] = m.predict_proba(&[1.0, 9.0]).expect("Should predict");
        assert!((low - 0.3).abs() < 1e-12);
        assert!((high - 0.7).abs() < 1e-12);
        assert_eq!(m.predict(&[0.0, 0.0]).expect("Should predict"), 0);
        assert_eq!(m.predict(&[1.0, 0.0]).expect("Should predict"), 1);
    }

    #[test]
    fn test_split_goes_left_on_equality() {
        let m = forest();
        let [_, p] = m.predict_proba(&[0.5, 0.0]).expect("Should predict");
        assert!((p - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_boosted_sums_margins() {
        let m = TreeEnsemble {
            aggregation: Aggregation::Boosted,
            trees: vec![stump(-1.0, 1.0), stump(-1.0, 1.0)],
            base_score: 0.0,
            learning_rate: 0.5,
            ..forest()
        };
        // margin = 0.5 * (1 + 1) = 1
        let [_, p] = m.predict_proba(&[1.0, 0.0]).expect("Should predict");
        assert!((p - 1.0 / (1.0 + (-1.0f64).exp())).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_backward_child() {
        let mut m = forest();
        m.trees[0].nodes[0] = TreeNode::Split {
            feature: 0,
            threshold: 0.5,
            left: 0,
            right: 2,
        };
        assert!(matches!(
            m.validate(2),
            Err(ModelLoadError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_feature() {
        let mut m = forest();
        m.trees[1].nodes[0] = TreeNode::Split {
            feature: 7,
            threshold: 0.5,
            left: 1,
            right: 2,
        };
        assert!(m.validate(2).is_err());
        assert!(forest().validate(2).is_ok());
    }

    #[test]
    fn test_validate_rejects_average_leaf_outside_unit_interval() {
        let mut m = forest();
        m.trees[0] = stump(0.2, 3.7);
        assert!(matches!(
            m.validate(2),
            Err(ModelLoadError::InvalidParameters(_))
        ));

        // Boosted leaves are log-odds increments and may exceed 1.
        m.aggregation = Aggregation::Boosted;
        assert!(m.validate(2).is_ok());
    }

    #[test]
    fn test_node_json_shape() {
        let json = r#"{"type": "split", "feature": 3, "threshold": 1.5, "left": 1, "right": 2}"#;
        let node: TreeNode = serde_json::from_str(json).expect("Should parse");
        assert!(matches!(node, TreeNode::Split { feature: 3, .. }));
    }
}
