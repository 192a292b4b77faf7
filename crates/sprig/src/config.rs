//! Renderer configuration, loadable from JSON.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "composite": { "max_depth": 250.0 }, "depth_load": "load" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::composite::CompositeSettings;
use crate::error::{Result, SpriteError};

/// Upper bound on sprites per frame.
pub const DEFAULT_MAX_SPRITES: usize = 16 * 1024;

/// What the sprite pass does with the depth attachment before drawing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthLoad {
    /// Keep the depth written by an earlier pass (composite against it).
    #[default]
    Load,
    /// Start from a cleared depth buffer at this value, within `0..=1`.
    Clear(f32),
}

/// Configuration for a [`SpriteRenderer`](crate::render::SpriteRenderer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub composite: CompositeSettings,
    /// Requests beyond this count are dropped by the batcher.
    pub max_sprites: usize,
    pub depth_load: DepthLoad,
    /// Clear color for the color attachment. `None` keeps its contents.
    pub clear_color: Option<[f64; 4]>,
    /// Fill color of the plain-rectangle pipeline.
    pub plain_color: [f32; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            composite: CompositeSettings::default(),
            max_sprites: DEFAULT_MAX_SPRITES,
            depth_load: DepthLoad::Load,
            clear_color: None,
            plain_color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

impl RendererConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: RendererConfig =
            serde_json::from_str(text).map_err(|e| SpriteError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded renderer config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.composite.validate()?;
        if self.max_sprites == 0 {
            return Err(SpriteError::Config("max_sprites must be non-zero".into()));
        }
        if let DepthLoad::Clear(value) = self.depth_load {
            if !(0.0..=1.0).contains(&value) {
                return Err(SpriteError::Config(format!(
                    "depth_load clear value must be within 0..=1, got {value}"
                )));
            }
        }
        Ok(())
    }
}
