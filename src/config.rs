use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// generation parameters, read from a JSON config file.
/// only the two input paths are required; every tuning value falls back to
/// its documented default when missing, so a minimal config stays minimal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// source photograph to reproduce
    pub input: PathBuf,
    /// directory scanned recursively for template images
    pub templates_dir: PathBuf,

    /// optional detail-weighting image; absent = uniform weighting
    #[serde(default)]
    pub detail_image: Option<PathBuf>,

    /// wall-clock budget for the annealing search, in seconds
    #[serde(default = "default_generation_time")]
    pub generation_time: u64,

    /// leaf cell edge length in source pixels (also the thumbnail side)
    #[serde(default = "default_cell_size")]
    pub cell_size: u32,

    /// bound on the brightness correction; shifts clamp to [-v/3, +v]
    #[serde(default = "default_brightness_variation")]
    pub brightness_variation: i32,

    /// quadtree depth: top-level squares span cell_size * 2^(level_count-1)
    #[serde(default = "default_level_count")]
    pub level_count: u32,

    /// diversity score above which a square is subdivided
    #[serde(default = "default_division_threshold")]
    pub division_threshold: f64,

    /// cells closer than this (gap / min cell size) penalize repetition
    #[serde(default = "default_duplicate_distance")]
    pub duplicate_distance: u32,

    /// diagnostic mode: draw only the cell partition, skip the search
    #[serde(default)]
    pub show_division: bool,

    /// result image path; format inferred from the extension
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// integer upscale factor for the result image
    #[serde(default = "default_output_scale")]
    pub output_scale: u32,
}

fn default_generation_time() -> u64 {
    10
}
fn default_cell_size() -> u32 {
    20
}
fn default_brightness_variation() -> i32 {
    200
}
fn default_level_count() -> u32 {
    3
}
fn default_division_threshold() -> f64 {
    10.0
}
fn default_duplicate_distance() -> u32 {
    5
}
fn default_output() -> PathBuf {
    PathBuf::from("out.png")
}
fn default_output_scale() -> u32 {
    1
}

impl Config {
    /// load from a JSON file. a missing or unparsable file is fatal;
    /// individual absent fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let mut cfg: Config = serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        cfg.normalize();
        Ok(cfg)
    }

    /// clamp out-of-range values instead of failing (invalid values fall
    /// back to usable ones, mirroring the missing-value policy)
    pub fn normalize(&mut self) {
        if self.level_count < 1 {
            self.level_count = 1;
        }
        if self.cell_size < 1 {
            self.cell_size = default_cell_size();
        }
        if self.output_scale < 1 {
            self.output_scale = 1;
        }
        if self.brightness_variation < 0 {
            self.brightness_variation = 0;
        }
    }

    /// template thumbnails share the leaf cell resolution
    pub fn thumbnail_size(&self) -> u32 {
        self.cell_size
    }

    /// edge length of a top-level partition square
    pub fn top_cell_size(&self) -> u32 {
        self.cell_size << (self.level_count - 1)
    }
}
