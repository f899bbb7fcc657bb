//! # admin-burn - Adaptive residual rescaling for deep Transformers
//!
//! Deep post-LN Transformers become unstable because the output of each layer
//! depends heavily on its residual branch. Admin rescales the shortcut of every
//! residual connection, `output = x * omega + f(x)`, with omega initialized so the
//! output change at initialization grows as `O(1)`, `O(log n)` or `O(n)` in the
//! number of residual layers `n`.
//!
//! ## Usage
//!
//! There are three ways to use omega:
//!
//! 1. [`as_module`] returns an [`OmegaResidual`] that computes `x * omega + f_x`.
//! 2. [`as_buffer`] registers a fixed omega on a [`HostNetwork`].
//! 3. [`as_parameter`] registers a trainable `[embed_dim]` omega on a [`HostNetwork`].
//!
//! ```no_run
//! use admin_burn::{as_buffer, as_module, OutputChangeScale, ParamStore};
//! use burn::tensor::Tensor;
//! use burn_ndarray::{NdArray, NdArrayDevice};
//!
//! let device = NdArrayDevice::default();
//! let num_res_layers = 2 * 6; // 6-layer encoder, attention + FFN residuals
//!
//! let residual =
//!     as_module::<NdArray<f32>>(num_res_layers, OutputChangeScale::default(), false, None, &device)
//!         .unwrap();
//! let x = Tensor::<NdArray<f32>, 3>::ones([1, 4, 16], &device);
//! let f_x = Tensor::<NdArray<f32>, 3>::zeros([1, 4, 16], &device);
//! let _y = residual.forward(x.clone(), f_x.clone());
//!
//! let mut network = ParamStore::<NdArray<f32>>::new();
//! as_buffer(&mut network, "attn_omega", num_res_layers, OutputChangeScale::default(), &device)
//!     .unwrap();
//! let omega = network.buffer("attn_omega").unwrap();
//! let _y = x.mul(omega.unsqueeze::<3>()).add(f_x);
//! ```
//!
//! ## Configuration
//!
//! Residual and encoder settings can be loaded from YAML with [`load_config`].

pub mod config;
pub mod error;
pub mod host;
pub mod init;
pub mod modules;

pub use config::{load_config, Config, EncoderConfig, ResidualConfig};
pub use error::{AdminError, Result};
pub use host::{as_buffer, as_parameter, HostNetwork, ParamStore};
pub use init::{calculate_init, calculate_init_str, OutputChangeScale};
pub use modules::encoder::{AdminEncoder, AdminEncoderLayer};
pub use modules::omega_residual::{as_module, Omega, OmegaResidual};
