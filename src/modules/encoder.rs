//! Post-LN Transformer encoder stabilized with omega residuals.
//!
//! Each layer has two residual connections (attention and feed-forward), so an
//! encoder with `n` layers has `2 * n` residual layers for the omega formula.

use crate::config::EncoderConfig;
use crate::error::{AdminError, Result};
use crate::modules::omega_residual::{as_module, OmegaResidual};
use burn::module::Module;
use burn::tensor::activation::{relu, softmax};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use burn_nn::{LayerNorm, LayerNormConfig, Linear, LinearConfig};

#[derive(Module, Debug)]
pub struct AdminEncoderLayer<B: Backend> {
    pub num_heads: usize,
    pub head_dim: usize,
    pub qkv: Linear<B>,
    pub out_proj: Linear<B>,
    pub residual_attn: OmegaResidual<B>,
    pub ln_attn: LayerNorm<B>,
    pub ffn_in: Linear<B>,
    pub ffn_out: Linear<B>,
    pub residual_ffn: OmegaResidual<B>,
    pub ln_ffn: LayerNorm<B>,
}

impl<B: Backend> AdminEncoderLayer<B> {
    pub fn new(config: &EncoderConfig, device: &B::Device) -> Result<Self> {
        config.validate()?;
        let d_model = config.embed_dim;
        let num_res_layers = config.num_res_layers();
        let embed_dim = config.as_parameter.then_some(d_model);

        let residual_attn = as_module(
            num_res_layers,
            config.output_change_scale,
            config.as_parameter,
            embed_dim,
            device,
        )?;
        let residual_ffn = as_module(
            num_res_layers,
            config.output_change_scale,
            config.as_parameter,
            embed_dim,
            device,
        )?;

        Ok(Self {
            num_heads: config.num_heads,
            head_dim: d_model / config.num_heads,
            qkv: LinearConfig::new(d_model, d_model * 3).init::<B>(device),
            out_proj: LinearConfig::new(d_model, d_model).init::<B>(device),
            residual_attn,
            ln_attn: LayerNormConfig::new(d_model)
                .with_epsilon(config.layer_norm_eps)
                .init::<B>(device),
            ffn_in: LinearConfig::new(d_model, config.feedforward_dim).init::<B>(device),
            ffn_out: LinearConfig::new(config.feedforward_dim, d_model).init::<B>(device),
            residual_ffn,
            ln_ffn: LayerNormConfig::new(d_model)
                .with_epsilon(config.layer_norm_eps)
                .init::<B>(device),
        })
    }

    /// Run one layer over a `[batch, seq, embed_dim]` tensor.
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let f_x = self.self_attention(x.clone());
        let x = self.residual_attn.forward(x, f_x);
        let x = self.apply_layer_norm(&self.ln_attn, x);

        let f_x = self.ffn_out.forward(relu(self.ffn_in.forward(x.clone())));
        let x = self.residual_ffn.forward(x, f_x);
        self.apply_layer_norm(&self.ln_ffn, x)
    }

    fn self_attention(&self, input: Tensor<B, 3>) -> Tensor<B, 3> {
        let qkv = self.qkv.forward(input);
        let (queries, keys, values) = self.split_qkv(qkv);
        let scale = (self.head_dim as f32).sqrt();
        let scores = queries.matmul(keys.swap_dims(2, 3)).div_scalar(scale);
        let weights = softmax(scores, 3);
        let attn = self.merge_heads(weights.matmul(values));
        self.out_proj.forward(attn)
    }

    fn apply_layer_norm(&self, norm: &LayerNorm<B>, input: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, seq, dim] = input.dims();
        if batch == 0 || seq == 0 || dim == 0 {
            return input;
        }
        let flat = input.reshape([batch * seq, dim]);
        norm.forward(flat).reshape([batch, seq, dim])
    }

    fn split_qkv(&self, qkv: Tensor<B, 3>) -> (Tensor<B, 4>, Tensor<B, 4>, Tensor<B, 4>) {
        let [batch, seq, _] = qkv.dims();
        let qkv = qkv.reshape([batch, seq, 3, self.num_heads, self.head_dim]);
        let heads = |index: usize| {
            qkv.clone()
                .narrow(2, index, 1)
                .reshape([batch, seq, self.num_heads, self.head_dim])
                .swap_dims(1, 2)
        };
        (heads(0), heads(1), heads(2))
    }

    fn merge_heads(&self, input: Tensor<B, 4>) -> Tensor<B, 3> {
        let [batch, heads, seq, dim] = input.dims();
        input.swap_dims(1, 2).reshape([batch, seq, heads * dim])
    }
}

/// Stack of [`AdminEncoderLayer`]s sharing one omega policy.
#[derive(Module, Debug)]
pub struct AdminEncoder<B: Backend> {
    pub layers: Vec<AdminEncoderLayer<B>>,
}

impl<B: Backend> AdminEncoder<B> {
    pub fn new(config: &EncoderConfig, device: &B::Device) -> Result<Self> {
        if config.encoder_layers == 0 {
            return Err(AdminError::invalid("encoder_layers must be positive"));
        }
        let layers = (0..config.encoder_layers)
            .map(|_| AdminEncoderLayer::new(config, device))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(
            encoder_layers = config.encoder_layers,
            num_res_layers = config.num_res_layers(),
            scale = %config.output_change_scale,
            "built admin encoder"
        );
        Ok(Self { layers })
    }

    pub fn forward(&self, mut input: Tensor<B, 3>) -> Tensor<B, 3> {
        for layer in &self.layers {
            input = layer.forward(input);
        }
        input
    }
}
