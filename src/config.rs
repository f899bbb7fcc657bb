//! Configuration types for omega residuals and the Admin encoder.
//!
//! Configurations are typically loaded from YAML files using [`load_config`].

use crate::error::{AdminError, Result};
use crate::init::OutputChangeScale;
use crate::modules::omega_residual::{as_module, OmegaResidual};
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
/// Settings for a single omega residual connection.
pub struct ResidualConfig {
    /// Total number of residual layers in the network (2n for an n-layer encoder).
    pub num_res_layers: usize,
    /// Desired output change at initialization ("O(1)", "O(logn)"/"default", "O(n)").
    #[serde(default)]
    pub output_change_scale: OutputChangeScale,
    /// Make omega a trainable per-channel vector.
    #[serde(default)]
    pub as_parameter: bool,
    /// Channel dimension; required with `as_parameter`.
    #[serde(default)]
    pub embed_dim: Option<usize>,
}

impl ResidualConfig {
    pub fn new(num_res_layers: usize) -> Self {
        Self {
            num_res_layers,
            output_change_scale: OutputChangeScale::default(),
            as_parameter: false,
            embed_dim: None,
        }
    }

    /// Build the residual module on `device`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<OmegaResidual<B>> {
        as_module(
            self.num_res_layers,
            self.output_change_scale,
            self.as_parameter,
            self.embed_dim,
            device,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
/// Post-LN Transformer encoder hyperparameters.
pub struct EncoderConfig {
    /// Number of encoder layers.
    pub encoder_layers: usize,
    /// Model width.
    pub embed_dim: usize,
    /// Number of attention heads.
    pub num_heads: usize,
    /// Feed-forward hidden size.
    pub feedforward_dim: usize,
    /// LayerNorm epsilon.
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
    /// Omega policy shared by every residual connection.
    #[serde(default)]
    pub output_change_scale: OutputChangeScale,
    /// Make every omega a trainable `[embed_dim]` vector.
    #[serde(default)]
    pub as_parameter: bool,
}

/// Default LayerNorm epsilon when not specified in config.
fn default_layer_norm_eps() -> f64 {
    1e-5
}

impl EncoderConfig {
    /// Residual connections in the whole encoder: attention and FFN per layer.
    pub fn num_res_layers(&self) -> usize {
        2 * self.encoder_layers
    }

    /// Check dimensions before any module is allocated.
    pub fn validate(&self) -> Result<()> {
        if self.encoder_layers == 0 {
            return Err(AdminError::invalid("encoder_layers must be positive"));
        }
        if self.embed_dim == 0 || self.num_heads == 0 || self.feedforward_dim == 0 {
            return Err(AdminError::invalid(
                "embed_dim, num_heads and feedforward_dim must be positive",
            ));
        }
        if self.embed_dim % self.num_heads != 0 {
            return Err(AdminError::invalid(format!(
                "embed_dim {} is not divisible by num_heads {}",
                self.embed_dim, self.num_heads
            )));
        }
        Ok(())
    }
}

/// Top-level configuration.
///
/// # Example YAML
///
/// ```yaml
/// residual:
///   num_res_layers: 12
///   output_change_scale: "O(logn)"
/// encoder:
///   encoder_layers: 6
///   embed_dim: 512
///   num_heads: 8
///   feedforward_dim: 2048
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Standalone residual connection settings.
    pub residual: ResidualConfig,
    /// Optional encoder built around omega residuals.
    #[serde(default)]
    pub encoder: Option<EncoderConfig>,
}

/// Load a configuration from a YAML file.
///
/// # Errors
///
/// Returns an error if the file doesn't exist or contains invalid YAML.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }

    let data = fs::read_to_string(path)?;
    let config: Config = serde_yaml::from_str(&data)?;
    Ok(config)
}
