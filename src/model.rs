//! Serialized prediction pipeline
//!
//! A pipeline is a fitted column transformer (the preprocessor) followed by a
//! regressor. It is trained elsewhere and exported as JSON:
//!
//! ```json
//! {
//!   "features": ["Neighbourhood", "New Route Number/Name", "Routes Completed",
//!                "Doors in Route", "Time Spent", "Stake"],
//!   "preprocessor": {
//!     "transformers": [
//!       { "kind": "one_hot", "columns": ["Neighbourhood", "Stake"],
//!         "categories": [["WOODBEND", "DEVON"], ["X", "Y"]] },
//!       { "kind": "standard_scaler", "columns": ["Time Spent"],
//!         "mean": [60.0], "scale": [20.0] }
//!     ],
//!     "remainder": "drop"
//!   },
//!   "regressor": { "kind": "linear", "coefficients": [...], "intercept": 4.2 }
//! }
//! ```
//!
//! Loading validates the artifact's shape so a bad export fails before any
//! input is looked at.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A single cell of the input frame
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Single-row labeled record fed to the preprocessor
#[derive(Debug, Clone, PartialEq)]
pub struct InputFrame {
    columns: Vec<(String, FieldValue)>,
}

impl InputFrame {
    pub fn new(columns: Vec<(String, FieldValue)>) -> Self {
        Self { columns }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }
}

/// What to do with a category the encoder never saw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    #[default]
    Error,
    Ignore,
}

/// Columns not named by any transformer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remainder {
    #[default]
    Drop,
    Passthrough,
}

/// One fitted stage of the column transformer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transformer {
    OneHot {
        columns: Vec<String>,
        categories: Vec<Vec<String>>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
    StandardScaler {
        columns: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    Passthrough {
        columns: Vec<String>,
    },
}

impl Transformer {
    fn columns(&self) -> &[String] {
        match self {
            Transformer::OneHot { columns, .. }
            | Transformer::StandardScaler { columns, .. }
            | Transformer::Passthrough { columns } => columns,
        }
    }

    fn output_width(&self) -> usize {
        match self {
            Transformer::OneHot { categories, .. } => categories.iter().map(Vec::len).sum(),
            Transformer::StandardScaler { columns, .. } | Transformer::Passthrough { columns } => {
                columns.len()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Transformer::OneHot {
                columns,
                categories,
                ..
            } => {
                if columns.len() != categories.len() {
                    return Err(Error::Model(format!(
                        "one_hot has {} columns but {} category lists",
                        columns.len(),
                        categories.len()
                    )));
                }
            }
            Transformer::StandardScaler {
                columns,
                mean,
                scale,
            } => {
                if mean.len() != columns.len() || scale.len() != columns.len() {
                    return Err(Error::Model(format!(
                        "standard_scaler has {} columns, {} means and {} scales",
                        columns.len(),
                        mean.len(),
                        scale.len()
                    )));
                }
            }
            Transformer::Passthrough { .. } => {}
        }
        Ok(())
    }

    fn transform(&self, frame: &InputFrame, out: &mut Vec<f64>) -> Result<()> {
        match self {
            Transformer::OneHot {
                columns,
                categories,
                handle_unknown,
            } => {
                for (column, cats) in columns.iter().zip(categories) {
                    let value = match lookup(frame, column)? {
                        FieldValue::Text(s) => s,
                        FieldValue::Number(n) => {
                            return Err(Error::input(format!(
                                "column '{}' expects a category, got number {}",
                                column, n
                            )))
                        }
                    };
                    let position = cats.iter().position(|c| c == value);
                    if position.is_none() && *handle_unknown == HandleUnknown::Error {
                        return Err(Error::input(format!(
                            "found unknown category '{}' in column '{}' during transform",
                            value, column
                        )));
                    }
                    out.extend((0..cats.len()).map(|i| if Some(i) == position { 1.0 } else { 0.0 }));
                }
            }
            Transformer::StandardScaler {
                columns,
                mean,
                scale,
            } => {
                for ((column, mean), scale) in columns.iter().zip(mean).zip(scale) {
                    let x = numeric(frame, column)?;
                    // Zero-variance features were fitted with unit scale
                    let scale = if *scale == 0.0 { 1.0 } else { *scale };
                    out.push((x - mean) / scale);
                }
            }
            Transformer::Passthrough { columns } => {
                for column in columns {
                    out.push(numeric(frame, column)?);
                }
            }
        }
        Ok(())
    }
}

fn lookup<'a>(frame: &'a InputFrame, column: &str) -> Result<&'a FieldValue> {
    frame
        .get(column)
        .ok_or_else(|| Error::input(format!("input is missing column '{}'", column)))
}

fn numeric(frame: &InputFrame, column: &str) -> Result<f64> {
    match lookup(frame, column)? {
        FieldValue::Number(n) if n.is_finite() => Ok(*n),
        FieldValue::Number(n) => Err(Error::input(format!(
            "column '{}' has non-finite value {}",
            column, n
        ))),
        FieldValue::Text(s) => Err(Error::input(format!(
            "could not convert string to float: '{}' in column '{}'",
            s, column
        ))),
    }
}

/// Fitted column transformer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub transformers: Vec<Transformer>,
    #[serde(default)]
    pub remainder: Remainder,
}

impl Preprocessor {
    /// Columns handled by `remainder`, in feature order
    fn remainder_columns<'a>(&self, features: &'a [String]) -> Vec<&'a str> {
        let named: HashSet<&str> = self
            .transformers
            .iter()
            .flat_map(|t| t.columns().iter().map(String::as_str))
            .collect();
        features
            .iter()
            .map(String::as_str)
            .filter(|f| !named.contains(f))
            .collect()
    }

    /// Width of the transformed feature vector
    pub fn output_width(&self, features: &[String]) -> usize {
        let named: usize = self.transformers.iter().map(Transformer::output_width).sum();
        match self.remainder {
            Remainder::Drop => named,
            Remainder::Passthrough => named + self.remainder_columns(features).len(),
        }
    }

    /// Turn one labeled row into the regressor's feature vector
    pub fn transform(&self, frame: &InputFrame, features: &[String]) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(self.output_width(features));
        for transformer in &self.transformers {
            transformer.transform(frame, &mut out)?;
        }
        if self.remainder == Remainder::Passthrough {
            for column in self.remainder_columns(features) {
                out.push(numeric(frame, column)?);
            }
        }
        Ok(out)
    }

    /// Categories the encoder knows for a column, if it one-hot encodes it
    pub fn known_categories(&self, column: &str) -> Option<&[String]> {
        self.transformers.iter().find_map(|t| match t {
            Transformer::OneHot {
                columns,
                categories,
                ..
            } => columns
                .iter()
                .position(|c| c == column)
                .map(|i| categories[i].as_slice()),
            _ => None,
        })
    }
}

/// One node of a regression tree; leaves have no split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<Split>,
    pub value: f64,
}

/// Samples with `x[feature] <= threshold` go to `left`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub feature: usize,
    pub threshold: f64,
    pub left: usize,
    pub right: usize,
}

/// A fitted regression tree, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    fn validate(&self, width: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::Model("tree has no nodes".to_string()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(split) = &node.split {
                if split.feature >= width {
                    return Err(Error::Model(format!(
                        "node {} splits on feature {} but only {} features exist",
                        i, split.feature, width
                    )));
                }
                if split.left >= self.nodes.len() || split.right >= self.nodes.len() {
                    return Err(Error::Model(format!("node {} has a child out of range", i)));
                }
            }
        }
        Ok(())
    }

    fn predict(&self, x: &[f64]) -> Result<f64> {
        let mut idx = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..=self.nodes.len() {
            let node = &self.nodes[idx];
            match &node.split {
                None => return Ok(node.value),
                Some(split) => {
                    let value = x.get(split.feature).copied().ok_or_else(|| {
                        Error::input(format!(
                            "X has {} features, but the tree splits on feature {}",
                            x.len(),
                            split.feature
                        ))
                    })?;
                    idx = if value <= split.threshold {
                        split.left
                    } else {
                        split.right
                    };
                }
            }
        }
        Err(Error::Model("tree contains a cycle".to_string()))
    }
}

/// Fitted regression step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    RandomForest {
        trees: Vec<Tree>,
    },
}

impl Regressor {
    fn validate(&self, width: usize) -> Result<()> {
        match self {
            Regressor::Linear { coefficients, .. } => {
                if coefficients.len() != width {
                    return Err(Error::Model(format!(
                        "linear regressor has {} coefficients but the preprocessor emits {} features",
                        coefficients.len(),
                        width
                    )));
                }
            }
            Regressor::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err(Error::Model("random_forest has no trees".to_string()));
                }
                for tree in trees {
                    tree.validate(width)?;
                }
            }
        }
        Ok(())
    }

    /// Predict for each row; the dashboard only ever passes one
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|x| self.predict_one(x)).collect()
    }

    fn predict_one(&self, x: &[f64]) -> Result<f64> {
        match self {
            Regressor::Linear {
                coefficients,
                intercept,
            } => {
                if x.len() != coefficients.len() {
                    return Err(Error::input(format!(
                        "X has {} features, but the regressor expects {}",
                        x.len(),
                        coefficients.len()
                    )));
                }
                Ok(intercept + coefficients.iter().zip(x).map(|(c, v)| c * v).sum::<f64>())
            }
            Regressor::RandomForest { trees } => {
                let mut total = 0.0;
                for tree in trees {
                    total += tree.predict(x)?;
                }
                Ok(total / trees.len() as f64)
            }
        }
    }
}

/// Preprocessor plus regressor, as exported by the training job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Columns the pipeline was fitted on
    pub features: Vec<String>,
    pub preprocessor: Preprocessor,
    pub regressor: Regressor,
}

impl Pipeline {
    /// Read and validate an artifact from disk
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let pipeline = Self::from_json(&contents)?;
        tracing::debug!(path = %path.display(), "loaded model artifact");
        Ok(pipeline)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let pipeline: Pipeline = serde_json::from_str(json)?;
        pipeline.validate()?;
        Ok(pipeline)
    }

    fn validate(&self) -> Result<()> {
        let features: HashSet<&str> = self.features.iter().map(String::as_str).collect();
        if features.len() != self.features.len() {
            return Err(Error::Model("duplicate feature names".to_string()));
        }
        for transformer in &self.preprocessor.transformers {
            transformer.validate()?;
            if let Some(unknown) = transformer
                .columns()
                .iter()
                .find(|c| !features.contains(c.as_str()))
            {
                return Err(Error::Model(format!(
                    "transformer references unknown column '{}'",
                    unknown
                )));
            }
        }
        self.regressor
            .validate(self.preprocessor.output_width(&self.features))
    }

    /// Check that the pipeline was fitted on exactly `expected` columns
    pub fn check_schema(&self, expected: &[&str]) -> Result<()> {
        let have: HashSet<&str> = self.features.iter().map(String::as_str).collect();
        let want: HashSet<&str> = expected.iter().copied().collect();

        let mut missing: Vec<&str> = want.difference(&have).copied().collect();
        let mut extra: Vec<&str> = have.difference(&want).copied().collect();
        if missing.is_empty() && extra.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        extra.sort_unstable();
        Err(Error::Schema(format!(
            "model expects columns not supplied by the form: [{}]; form supplies columns unknown to the model: [{}]",
            extra.join(", "),
            missing.join(", ")
        )))
    }

    /// Run preprocessor then regressor on a single row
    pub fn predict(&self, frame: &InputFrame) -> Result<f64> {
        let transformed = self.preprocessor.transform(frame, &self.features)?;
        let outputs = self.regressor.predict(&[transformed])?;
        outputs
            .first()
            .copied()
            .ok_or_else(|| Error::Model("regressor returned no output".to_string()))
    }
}
