//! Residual connection with a rescaled shortcut branch.
//!
//! [`OmegaResidual`] computes `x * omega + f_x`. When omega is a fixed `1.0`
//! it degrades to the ordinary residual `x + f_x` and skips the multiply.

use crate::error::{AdminError, Result};
use crate::init::{calculate_init, OutputChangeScale};
use burn::module::{Module, Param};
use burn::tensor::{backend::Backend, Tensor, TensorData as BurnTensorData};

/// Storage for omega, selected once at construction.
///
/// Only the `Vector` variant holds a [`Param`]; the fixed variants are constant
/// tensors that optimizers never visit.
#[derive(Module, Debug)]
pub enum Omega<B: Backend> {
    /// Fixed omega of exactly `1.0`; the buffer is kept but never multiplied.
    Identity(Tensor<B, 1>),
    /// Fixed single-element omega broadcast over every dimension.
    Scalar(Tensor<B, 1>),
    /// Trainable per-channel omega broadcast along the last axis.
    Vector(Param<Tensor<B, 1>>),
}

/// Residual module with shortcut connection rescaling.
#[derive(Module, Debug)]
pub struct OmegaResidual<B: Backend> {
    /// Omega storage; its variant decides how [`OmegaResidual::forward`] combines.
    pub omega: Omega<B>,
}

impl<B: Backend> OmegaResidual<B> {
    /// Build a residual module around `init_value`.
    ///
    /// With `as_parameter` the rescalar becomes a trainable vector of length
    /// `embed_dim` (similar to the weight of a layer norm), so `embed_dim` is
    /// required. Otherwise it is a fixed single-element buffer and `embed_dim`
    /// is ignored.
    pub fn new(
        init_value: f64,
        as_parameter: bool,
        embed_dim: Option<usize>,
        device: &B::Device,
    ) -> Result<Self> {
        if !init_value.is_finite() || init_value < 0.0 {
            return Err(AdminError::invalid(format!(
                "omega must be finite and non-negative, got {init_value}"
            )));
        }
        let value = init_value as f32;

        let omega = if as_parameter {
            let dim = match embed_dim {
                Some(dim) if dim > 0 => dim,
                Some(_) => {
                    return Err(AdminError::invalid("embed_dim must be positive"));
                }
                None => {
                    return Err(AdminError::invalid(
                        "embed_dim is required when as_parameter is set as true",
                    ));
                }
            };
            Omega::Vector(Param::from_tensor(filled(value, dim, device)))
        } else if init_value == 1.0 {
            Omega::Identity(filled(value, 1, device))
        } else {
            Omega::Scalar(filled(value, 1, device))
        };

        Ok(Self { omega })
    }

    /// Calculate `x * omega + f_x`. The output has the shape of `x`.
    pub fn forward<const D: usize>(&self, x: Tensor<B, D>, f_x: Tensor<B, D>) -> Tensor<B, D> {
        match &self.omega {
            Omega::Identity(_) => x.add(f_x),
            Omega::Scalar(omega) => x.mul(omega.clone().unsqueeze::<D>()).add(f_x),
            Omega::Vector(omega) => x.mul(omega.val().unsqueeze::<D>()).add(f_x),
        }
    }

    /// Current omega values: `[1]` when fixed, `[embed_dim]` when trainable.
    pub fn omega(&self) -> Tensor<B, 1> {
        match &self.omega {
            Omega::Identity(omega) | Omega::Scalar(omega) => omega.clone(),
            Omega::Vector(omega) => omega.val(),
        }
    }

    /// Whether omega is exposed to the optimizer.
    pub fn is_trainable(&self) -> bool {
        matches!(self.omega, Omega::Vector(_))
    }
}

/// Calculate the omega initialization and return a residual module holding it.
///
/// # Example
///
/// ```no_run
/// use admin_burn::{as_module, OutputChangeScale};
/// use burn::tensor::Tensor;
/// use burn_ndarray::{NdArray, NdArrayDevice};
///
/// let device = NdArrayDevice::default();
/// let encoder_layers = 6;
/// let residual =
///     as_module::<NdArray<f32>>(2 * encoder_layers, OutputChangeScale::default(), false, None, &device)
///         .unwrap();
///
/// let x = Tensor::<NdArray<f32>, 3>::ones([2, 4, 8], &device);
/// let f_x = Tensor::<NdArray<f32>, 3>::zeros([2, 4, 8], &device);
/// let y = residual.forward(x, f_x);
/// assert_eq!(y.dims(), [2, 4, 8]);
/// ```
pub fn as_module<B: Backend>(
    num_res_layers: usize,
    scale: OutputChangeScale,
    as_parameter: bool,
    embed_dim: Option<usize>,
    device: &B::Device,
) -> Result<OmegaResidual<B>> {
    let omega = calculate_init(num_res_layers, scale)?;
    OmegaResidual::new(omega, as_parameter, embed_dim, device)
}

/// A `[len]` tensor with every entry set to `value`.
pub(crate) fn filled<B: Backend>(value: f32, len: usize, device: &B::Device) -> Tensor<B, 1> {
    let data = BurnTensorData::new(vec![value; len], [len]);
    Tensor::<B, 1>::from_data(data, device)
}
