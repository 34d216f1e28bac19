//! Calibration sample files
//!
//! Sample files are TOML lists of (raw, reference) pairs:
//!
//! ```toml
//! panel = "xpt2046"
//!
//! [[sample]]
//! raw = { x = 200, y = 200 }
//! reference = { x = 0, y = 0 }
//! ```

use anyhow::{bail, Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tft_calibration::{CalibrationSample, Matrix, PanelProfile};

/// Parsed sample file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleFile {
    /// Panel profile the samples were taken on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel: Option<String>,
    #[serde(rename = "sample", default)]
    pub samples: Vec<CalibrationSample>,
}

impl SampleFile {
    /// Load a sample file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read sample file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Invalid sample file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file: SampleFile = toml::from_str(content)?;
        if file.samples.is_empty() {
            bail!("no [[sample]] entries");
        }
        Ok(file)
    }

    /// Template pre-filled with a profile's nominal corner samples
    pub fn template(profile: &PanelProfile) -> Self {
        Self {
            panel: Some(profile.id.to_string()),
            samples: profile.nominal_samples().to_vec(),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        let body = toml::to_string(self).context("Failed to serialize samples")?;
        Ok(format!(
            "# Calibration samples, generated by tft-calibrate on {}\n\
             # Replace each raw value with the reading measured while touching\n\
             # the reference position on the display.\n\n{}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            body
        ))
    }
}

/// Render a matrix as a TOML document
pub fn matrix_to_toml(matrix: &Matrix) -> Result<String> {
    let body = toml::to_string(matrix).context("Failed to serialize matrix")?;
    Ok(format!(
        "# Calibration matrix, generated by tft-calibrate on {}\n\
         # x' = (an * x + bn * y + cn) / divider\n\
         # y' = (dn * x + en * y + fn) / divider\n\n{}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        body
    ))
}
