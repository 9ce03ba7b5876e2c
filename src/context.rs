//! Per-process context shared by every request
//!
//! The dataset is read once at startup; the model is not held here because
//! it is re-read on every prediction.

use crate::config::Config;
use crate::dataset::{Dataset, NEIGHBOURHOOD, ROUTE, STAKE};
use crate::error::Result;
use crate::model::Pipeline;
use crate::predict::FEATURE_COLUMNS;

#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    pub dataset: Dataset,
}

impl AppContext {
    /// Load the dataset named by `config`
    pub fn load(config: Config) -> Result<Self> {
        let dataset = Dataset::load(&config.assets.dataset)?;
        Ok(Self { config, dataset })
    }

    /// Compare the dataset and the current model artifact.
    ///
    /// Returns one line per problem: a schema mismatch, or a select option the
    /// model's encoder has never seen (choosing it would be an input error).
    pub fn audit_model(&self) -> Result<Vec<String>> {
        let pipeline = Pipeline::load(&self.config.assets.model)?;
        pipeline.check_schema(&FEATURE_COLUMNS)?;

        let options = &self.dataset.options;
        let mut problems = Vec::new();
        for (column, values) in [
            (NEIGHBOURHOOD, &options.neighbourhoods),
            (STAKE, &options.stakes),
            (ROUTE, &options.routes),
        ] {
            let Some(known) = pipeline.preprocessor.known_categories(column) else {
                continue;
            };
            for value in values {
                if !known.contains(value) {
                    problems.push(format!(
                        "{} '{}' appears in the dataset but not in the model",
                        column, value
                    ));
                }
            }
        }
        Ok(problems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_assets;
    use tempfile::TempDir;

    #[test]
    fn test_load_context() {
        let dir = TempDir::new().unwrap();
        let ctx = AppContext::load(write_assets(dir.path())).unwrap();
        assert_eq!(ctx.dataset.records.len(), 3);
        assert_eq!(ctx.dataset.options.routes, vec!["R1", "R2", "R9"]);
    }

    #[test]
    fn test_audit_reports_unknown_route() {
        let dir = TempDir::new().unwrap();
        let ctx = AppContext::load(write_assets(dir.path())).unwrap();
        let problems = ctx.audit_model().unwrap();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("'R9'"));
    }

    #[test]
    fn test_audit_missing_model() {
        let dir = TempDir::new().unwrap();
        let config = write_assets(dir.path());
        std::fs::remove_file(&config.assets.model).unwrap();
        let ctx = AppContext::load(config).unwrap();
        assert!(ctx.audit_model().is_err());
    }
}
