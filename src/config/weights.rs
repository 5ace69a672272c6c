use crate::config::toml_config::JudgeConfig;
use crate::domain::model::{Category, ProjectType, WeightVector};
use crate::utils::error::{JudgeError, Result};
use std::collections::HashMap;

/// Per-type weight tables, validated once at startup and read-only afterwards.
#[derive(Debug)]
pub struct WeightManager {
    painkiller: WeightVector,
    vitamin: WeightVector,
    balanced: WeightVector,
    tolerance: f64,
}

impl WeightManager {
    pub fn from_config(config: &JudgeConfig) -> Result<Self> {
        let tolerance = config.weight_tolerance();
        let overrides = config.weights.as_ref();

        let painkiller = Self::resolve(
            ProjectType::PainKiller,
            default_painkiller(),
            overrides.and_then(|w| w.painkiller.as_ref()),
            tolerance,
        )?;
        let vitamin = Self::resolve(
            ProjectType::Vitamin,
            default_vitamin(),
            overrides.and_then(|w| w.vitamin.as_ref()),
            tolerance,
        )?;
        let balanced = Self::resolve(
            ProjectType::Balanced,
            WeightVector::uniform(),
            overrides.and_then(|w| w.balanced.as_ref()),
            tolerance,
        )?;

        tracing::debug!("📊 Weight tables loaded (tolerance ±{})", tolerance);

        Ok(Self {
            painkiller,
            vitamin,
            balanced,
            tolerance,
        })
    }

    /// Merges operator overrides over the built-in table, logging every change,
    /// then enforces the sum invariant. Violations abort startup.
    fn resolve(
        project_type: ProjectType,
        defaults: WeightVector,
        overrides: Option<&HashMap<String, f64>>,
        tolerance: f64,
    ) -> Result<WeightVector> {
        let vector = match overrides {
            None => defaults,
            Some(table) => {
                let mut merged: HashMap<Category, f64> =
                    defaults.iter().map(|(c, w)| (*c, *w)).collect();
                for (key, value) in table {
                    let category: Category = key.parse()?;
                    let old = defaults.get(category);
                    if (old - value).abs() > f64::EPSILON {
                        tracing::info!(
                            "📊 {} weight override: {} {:.3} -> {:.3}",
                            project_type,
                            category,
                            old,
                            value
                        );
                    }
                    merged.insert(category, *value);
                }
                WeightVector::new(merged)
            }
        };

        if vector.len() != Category::ALL.len() {
            return Err(JudgeError::ConfigError {
                message: format!(
                    "weight table for '{}' covers {} of {} categories",
                    project_type,
                    vector.len(),
                    Category::ALL.len()
                ),
            });
        }
        vector.validate(project_type.as_str(), tolerance)?;
        Ok(vector)
    }

    pub fn weights_for(&self, project_type: ProjectType) -> WeightVector {
        match project_type {
            ProjectType::PainKiller => self.painkiller.clone(),
            ProjectType::Vitamin => self.vitamin.clone(),
            ProjectType::Balanced => self.balanced.clone(),
        }
    }

    /// Defensive re-check before aggregation.
    pub fn validate(&self, vector: &WeightVector, name: &str) -> Result<()> {
        vector.validate(name, self.tolerance)
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Human-readable weight listing, heaviest first, for the audit log.
    pub fn summary(&self, project_type: ProjectType) -> String {
        let vector = match project_type {
            ProjectType::PainKiller => &self.painkiller,
            ProjectType::Vitamin => &self.vitamin,
            ProjectType::Balanced => &self.balanced,
        };
        let mut entries: Vec<(&Category, &f64)> = vector.iter().collect();
        entries.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
        entries
            .iter()
            .map(|(c, w)| format!("{}: {:.3}", c, w))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn default_painkiller() -> WeightVector {
    WeightVector::new(HashMap::from([
        (Category::BusinessValue, 0.20),
        (Category::TechnicalFeasibility, 0.18),
        (Category::CostAnalysis, 0.15),
        (Category::Innovation, 0.09),
        (Category::Accessibility, 0.08),
        (Category::NetworkEffect, 0.08),
        (Category::SocialImpact, 0.07),
        (Category::Sustainability, 0.07),
        (Category::UserEngagement, 0.08),
    ]))
}

fn default_vitamin() -> WeightVector {
    WeightVector::new(HashMap::from([
        (Category::UserEngagement, 0.20),
        (Category::Innovation, 0.18),
        (Category::SocialImpact, 0.15),
        (Category::Accessibility, 0.10),
        (Category::BusinessValue, 0.09),
        (Category::NetworkEffect, 0.08),
        (Category::Sustainability, 0.08),
        (Category::TechnicalFeasibility, 0.07),
        (Category::CostAnalysis, 0.05),
    ]))
}
