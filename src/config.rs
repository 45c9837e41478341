//! Configuration for a skillgraph instance
//!
//! ```toml
//! database_path = "career.db"
//!
//! [[career_paths]]
//! from = "Python Developer"
//! to = "Data Engineer"
//!
//! [recommendations]
//! limit = 3
//! min_score_percent = 30.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::GraphError;

/// A curated LEADS_TO pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerPath {
    pub from: String,
    pub to: String,
}

impl CareerPath {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        CareerPath {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Defaults for `top_recommendations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub limit: usize,
    /// Entries must score strictly above this to be recommended
    pub min_score_percent: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        RecommendationConfig {
            limit: 3,
            min_score_percent: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Database location for the sqlitegraph store (`:memory:` for scratch)
    pub database_path: PathBuf,
    /// Static career progression pairs, not derived from the entity store
    pub career_paths: Vec<CareerPath>,
    pub recommendations: RecommendationConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            database_path: PathBuf::from(":memory:"),
            career_paths: vec![
                CareerPath::new("Python Developer", "Data Engineer"),
                CareerPath::new("Data Engineer", "ML Engineer"),
                CareerPath::new("Python Developer", "ML Engineer"),
            ],
            recommendations: RecommendationConfig::default(),
        }
    }
}

impl GraphConfig {
    /// Parse and validate a TOML document; missing keys take defaults
    pub fn from_toml_str(text: &str) -> Result<Self, GraphError> {
        let config: GraphConfig =
            toml::from_str(text).map_err(|e| GraphError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GraphError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), GraphError> {
        if self.recommendations.limit == 0 {
            return Err(GraphError::Config(
                "recommendations.limit must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.recommendations.min_score_percent) {
            return Err(GraphError::Config(format!(
                "recommendations.min_score_percent {} is outside 0..=100",
                self.recommendations.min_score_percent
            )));
        }
        for path in &self.career_paths {
            if path.from.trim().is_empty() || path.to.trim().is_empty() {
                return Err(GraphError::Config(
                    "career_paths entries need non-empty from/to".to_string(),
                ));
            }
            if path.from == path.to {
                return Err(GraphError::Config(format!(
                    "career path '{}' leads to itself",
                    path.from
                )));
            }
        }
        Ok(())
    }
}
