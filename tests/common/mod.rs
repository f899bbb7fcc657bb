//! Shared test utilities for tensor construction and comparison.

#![allow(dead_code)]

use burn::tensor::{Tensor, TensorData};
use burn_ndarray::{NdArray, NdArrayDevice};

pub type TestBackend = NdArray<f32>;

pub const FIXTURE_DIR: &str = "tests/fixtures";

/// Path of a fixture file relative to the crate root.
pub fn fixture_path(name: &str) -> String {
    format!("{}/{FIXTURE_DIR}/{name}", env!("CARGO_MANIFEST_DIR"))
}

/// Flatten a tensor into its f32 values.
pub fn values<const D: usize>(tensor: Tensor<TestBackend, D>) -> Vec<f32> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .expect("f32 tensor data")
}

/// Deterministic 3D tensor with distinct, sign-mixed values.
pub fn ramp3(
    batch: usize,
    seq: usize,
    dim: usize,
    offset: f32,
    device: &NdArrayDevice,
) -> Tensor<TestBackend, 3> {
    let data: Vec<f32> = (0..batch * seq * dim)
        .map(|i| (i as f32 * 0.37 + offset).sin() * 2.0)
        .collect();
    Tensor::from_data(TensorData::new(data, [batch, seq, dim]), device)
}

/// Assert two slices are element-wise close within tolerance.
pub fn assert_close(a: &[f32], b: &[f32], tol: f32) {
    assert_eq!(a.len(), b.len(), "length mismatch: {} vs {}", a.len(), b.len());
    for (idx, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        if (x - y).abs() > tol {
            panic!("mismatch at {idx}: {x} vs {y} (diff: {}, tol: {tol})", (x - y).abs());
        }
    }
}
