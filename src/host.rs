//! Attaching omega to a host network by name.
//!
//! Instead of wrapping the residual in an [`OmegaResidual`](crate::OmegaResidual),
//! a network can own omega directly and inline `x * omega + f_x` in its forward
//! pass. [`as_buffer`] and [`as_parameter`] compute omega and register it on any
//! [`HostNetwork`].

use crate::error::{AdminError, Result};
use crate::init::{calculate_init, OutputChangeScale};
use crate::modules::omega_residual::filled;
use burn::module::Param;
use burn::tensor::{backend::Backend, Tensor};
use std::collections::BTreeMap;

/// A network that owns named values.
///
/// Implementors must reject a name that is already taken by either a buffer or a
/// parameter, and leave themselves unchanged when they do. Name syntax is checked
/// by [`as_buffer`] and [`as_parameter`] before registration.
pub trait HostNetwork {
    /// Backend the network's tensors live on.
    type Backend: Backend;

    /// Register a fixed (non-trainable) value under `name`.
    fn register_buffer(&mut self, name: &str, value: Tensor<Self::Backend, 1>) -> Result<()>;
    /// Register a trainable value under `name`.
    fn register_parameter(
        &mut self,
        name: &str,
        value: Param<Tensor<Self::Backend, 1>>,
    ) -> Result<()>;
}

type DeviceOf<N> = <<N as HostNetwork>::Backend as Backend>::Device;

/// Reject names a module attribute cannot carry.
pub fn check_attachment_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AdminError::invalid("attachment name cannot be empty"));
    }
    if name.contains('.') {
        return Err(AdminError::invalid(format!(
            "attachment name cannot contain \".\", got '{name}'"
        )));
    }
    Ok(())
}

/// Calculate omega and register it on `network` as a `[1]` buffer (not trainable).
///
/// The network can then compute `x * omega + f_x` with the registered buffer,
/// which broadcasts over every dimension of `x`.
pub fn as_buffer<N: HostNetwork>(
    network: &mut N,
    buffer_name: &str,
    num_res_layers: usize,
    scale: OutputChangeScale,
    device: &DeviceOf<N>,
) -> Result<()> {
    check_attachment_name(buffer_name)?;
    let omega = calculate_init(num_res_layers, scale)?;
    network.register_buffer(buffer_name, filled(omega as f32, 1, device))?;
    tracing::debug!(name = buffer_name, omega, "registered omega buffer");
    Ok(())
}

/// Calculate omega and register it on `network` as a trainable `[embed_dim]` vector.
pub fn as_parameter<N: HostNetwork>(
    network: &mut N,
    parameter_name: &str,
    num_res_layers: usize,
    embed_dim: usize,
    scale: OutputChangeScale,
    device: &DeviceOf<N>,
) -> Result<()> {
    check_attachment_name(parameter_name)?;
    if embed_dim == 0 {
        return Err(AdminError::invalid("embed_dim must be positive"));
    }
    let omega = calculate_init(num_res_layers, scale)?;
    let vector = Param::from_tensor(filled(omega as f32, embed_dim, device));
    network.register_parameter(parameter_name, vector)?;
    tracing::debug!(name = parameter_name, omega, embed_dim, "registered omega parameter");
    Ok(())
}

/// In-memory [`HostNetwork`] keyed by name.
#[derive(Debug, Clone)]
pub struct ParamStore<B: Backend> {
    buffers: BTreeMap<String, Tensor<B, 1>>,
    parameters: BTreeMap<String, Param<Tensor<B, 1>>>,
}

impl<B: Backend> Default for ParamStore<B> {
    fn default() -> Self {
        Self {
            buffers: BTreeMap::new(),
            parameters: BTreeMap::new(),
        }
    }
}

impl<B: Backend> ParamStore<B> {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a registered buffer.
    pub fn buffer(&self, name: &str) -> Option<Tensor<B, 1>> {
        self.buffers.get(name).cloned()
    }

    /// Look up a registered parameter.
    pub fn parameter(&self, name: &str) -> Option<&Param<Tensor<B, 1>>> {
        self.parameters.get(name)
    }

    /// Value registered under `name`, whether buffer or parameter.
    pub fn get(&self, name: &str) -> Option<Tensor<B, 1>> {
        self.buffer(name)
            .or_else(|| self.parameters.get(name).map(|param| param.val()))
    }

    /// Whether `name` is taken by a buffer or a parameter.
    pub fn contains(&self, name: &str) -> bool {
        self.buffers.contains_key(name) || self.parameters.contains_key(name)
    }

    /// Every registered name, buffers first, each group sorted.
    pub fn names(&self) -> Vec<&str> {
        self.buffers
            .keys()
            .chain(self.parameters.keys())
            .map(String::as_str)
            .collect()
    }

    /// Number of registered buffers and parameters.
    pub fn len(&self) -> usize {
        self.buffers.len() + self.parameters.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_free(&self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(AdminError::invalid(format!("attribute '{name}' already exists")));
        }
        Ok(())
    }
}

impl<B: Backend> HostNetwork for ParamStore<B> {
    type Backend = B;

    fn register_buffer(&mut self, name: &str, value: Tensor<B, 1>) -> Result<()> {
        self.check_free(name)?;
        self.buffers.insert(name.to_string(), value);
        Ok(())
    }

    fn register_parameter(&mut self, name: &str, value: Param<Tensor<B, 1>>) -> Result<()> {
        self.check_free(name)?;
        self.parameters.insert(name.to_string(), value);
        Ok(())
    }
}
