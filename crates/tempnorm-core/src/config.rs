// crates/tempnorm-core/src/config.rs

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tempnorm_parser::{AdapterConfig, NumericSetting};

use crate::error::{PipelineError, Result};
use crate::records::ExportFormat;
use crate::standardize::{FillPolicy, FilterConfig};

/// Top-level pipeline file, usually `tempnorm.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(rename = "dataset")]
    pub datasets: Vec<DatasetConfig>,
    #[serde(default)]
    pub matching: Option<MatchingConfig>,
    #[serde(default, rename = "comparison")]
    pub comparisons: Vec<ComparisonConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub formats: Vec<ExportFormat>,
    pub split_by_location: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("export"),
            formats: vec![ExportFormat::Csv],
            split_by_location: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    pub path: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    pub adapter: AdapterConfig,
    #[serde(default)]
    pub filter: Option<FilterSection>,
}

fn default_delimiter() -> char {
    ','
}

impl DatasetConfig {
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                PipelineError::Config(format!(
                    "dataset '{}': delimiter '{}' must be a single ASCII character",
                    self.name, self.delimiter
                ))
            })
    }

    pub fn filter_config(&self) -> Option<FilterConfig> {
        self.filter.as_ref().map(FilterSection::resolve)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPreset {
    #[default]
    Global,
    WarmClimate,
    FillOnly,
}

/// Filter parameters as written in a dataset entry: a preset plus overrides.
///
/// A bound or threshold given as a number replaces the preset's value;
/// `false` switches that check off.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    pub preset: FilterPreset,
    pub low: Option<NumericSetting>,
    pub high: Option<NumericSetting>,
    pub jump_threshold: Option<NumericSetting>,
    pub fill: Option<FillPolicy>,
}

impl FilterSection {
    pub fn resolve(&self) -> FilterConfig {
        let mut config = match self.preset {
            FilterPreset::Global => FilterConfig::global(),
            FilterPreset::WarmClimate => FilterConfig::warm_climate(),
            FilterPreset::FillOnly => FilterConfig::fill_only(FillPolicy::default()),
        };
        if let Some(low) = self.low {
            config.low = low.resolve(config.low);
        }
        if let Some(high) = self.high {
            config.high = high.resolve(config.high);
        }
        if let Some(threshold) = self.jump_threshold {
            config.jump_threshold = threshold.resolve(config.jump_threshold);
        }
        if let Some(fill) = self.fill {
            config.fill = fill;
        }
        config
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingConfig {
    pub reference: String,
    pub candidates: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComparisonConfig {
    pub left: String,
    pub right: String,
}

impl PipelineConfig {
    /// Loads and validates a config file. Relative dataset paths and the
    /// output directory resolve against the file's directory.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&content, base_dir)
    }

    pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<Self> {
        let mut config: PipelineConfig = toml::from_str(content)?;
        for dataset in &mut config.datasets {
            if dataset.path.is_relative() {
                dataset.path = base_dir.join(&dataset.path);
            }
        }
        if config.export.output_dir.is_relative() {
            config.export.output_dir = base_dir.join(&config.export.output_dir);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn dataset(&self, name: &str) -> Option<&DatasetConfig> {
        self.datasets.iter().find(|dataset| dataset.name == name)
    }

    fn require_dataset(&self, name: &str, role: &str) -> Result<&DatasetConfig> {
        self.dataset(name).ok_or_else(|| {
            PipelineError::Config(format!("{role} refers to unknown dataset '{name}'"))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.datasets.is_empty() {
            return Err(PipelineError::Config(
                "no [[dataset]] entries configured".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for dataset in &self.datasets {
            if dataset.name.trim().is_empty() {
                return Err(PipelineError::Config("dataset name must not be empty".to_string()));
            }
            if !names.insert(dataset.name.as_str()) {
                return Err(PipelineError::Config(format!(
                    "dataset '{}' is configured more than once",
                    dataset.name
                )));
            }
            dataset.delimiter_byte()?;
        }

        if let Some(matching) = &self.matching {
            let reference = self.require_dataset(&matching.reference, "matching.reference")?;
            if reference.adapter.adapter().multi_location() {
                return Err(PipelineError::Config(format!(
                    "matching.reference '{}' must be a single-location dataset",
                    matching.reference
                )));
            }
            let candidates = self.require_dataset(&matching.candidates, "matching.candidates")?;
            if !candidates.adapter.adapter().multi_location() {
                return Err(PipelineError::Config(format!(
                    "matching.candidates '{}' must be a multi-location dataset",
                    matching.candidates
                )));
            }
        }

        for comparison in &self.comparisons {
            self.require_dataset(&comparison.left, "comparison.left")?;
            self.require_dataset(&comparison.right, "comparison.right")?;
        }

        Ok(())
    }
}
