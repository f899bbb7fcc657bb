//! Closed-form initialization of the shortcut rescalar omega.
//!
//! Omega is chosen so that the change of the network output at initialization
//! grows as `O(1)`, `O(log n)` or `O(n)` in the number of residual layers `n`.

use crate::error::{AdminError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target asymptotic output change at initialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputChangeScale {
    /// `O(1)`: omega = sqrt(n).
    Constant,
    /// `O(logn)`: omega = sqrt((n + 1) / ln(n + 1) - 1).
    #[default]
    Logarithmic,
    /// `O(n)`: omega = 1, i.e. a plain residual connection.
    Linear,
}

impl OutputChangeScale {
    /// Every supported policy, in increasing order of output change.
    pub const ALL: [OutputChangeScale; 3] = [Self::Constant, Self::Logarithmic, Self::Linear];

    /// Canonical policy string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Constant => "O(1)",
            Self::Logarithmic => "O(logn)",
            Self::Linear => "O(n)",
        }
    }
}

impl fmt::Display for OutputChangeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputChangeScale {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "O(1)" => Ok(Self::Constant),
            "O(logn)" | "default" => Ok(Self::Logarithmic),
            "O(n)" => Ok(Self::Linear),
            other => Err(AdminError::invalid(format!(
                "unsupported output change scale '{other}': only O(n), O(logn) / default, and O(1) are supported"
            ))),
        }
    }
}

impl TryFrom<String> for OutputChangeScale {
    type Error = AdminError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<OutputChangeScale> for String {
    fn from(value: OutputChangeScale) -> Self {
        value.as_str().to_string()
    }
}

/// Compute the omega initialization for `num_res_layers` residual connections.
///
/// A typical n-layer Transformer encoder has `2 * n` residual layers.
///
/// # Errors
///
/// Returns [`AdminError::InvalidArgument`] when `num_res_layers` is zero.
pub fn calculate_init(num_res_layers: usize, scale: OutputChangeScale) -> Result<f64> {
    if num_res_layers == 0 {
        return Err(AdminError::invalid(
            "num_res_layers must be positive to compute an omega initialization",
        ));
    }

    let n = num_res_layers as f64;
    let squared = match scale {
        OutputChangeScale::Logarithmic => (n + 1.0) / (n + 1.0).ln() - 1.0,
        OutputChangeScale::Linear => 1.0,
        OutputChangeScale::Constant => n,
    };
    let omega = squared.sqrt();
    if !omega.is_finite() {
        return Err(AdminError::invalid(format!(
            "omega initialization is not finite for {num_res_layers} residual layers under {scale}"
        )));
    }

    tracing::debug!(num_res_layers, %scale, omega, "computed omega initialization");
    Ok(omega)
}

/// Same as [`calculate_init`], parsing the policy from its string form.
pub fn calculate_init_str(num_res_layers: usize, scale: &str) -> Result<f64> {
    calculate_init(num_res_layers, scale.parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_scale_is_sqrt_of_layers() {
        for n in [1usize, 2, 6, 12, 36, 100, 1000] {
            let omega = calculate_init(n, OutputChangeScale::Constant).unwrap();
            assert_eq!(omega, (n as f64).sqrt());
        }
    }

    #[test]
    fn linear_scale_is_one() {
        for n in [1usize, 2, 24, 4096] {
            assert_eq!(calculate_init(n, OutputChangeScale::Linear).unwrap(), 1.0);
        }
    }

    #[test]
    fn logarithmic_scale_for_single_layer() {
        let omega = calculate_init(1, OutputChangeScale::Logarithmic).unwrap();
        let expected = (2.0 / 2.0_f64.ln() - 1.0).sqrt();
        assert_eq!(omega, expected);
        assert!((omega - 1.3731).abs() < 1e-4);
    }

    #[test]
    fn logarithmic_scale_sits_between_linear_and_constant() {
        for n in [4usize, 12, 48, 192] {
            let log = calculate_init(n, OutputChangeScale::Logarithmic).unwrap();
            let constant = calculate_init(n, OutputChangeScale::Constant).unwrap();
            assert!(log > 1.0, "n={n}: {log}");
            assert!(log < constant, "n={n}: {log} vs {constant}");
        }
    }

    #[test]
    fn default_alias_matches_logarithmic() {
        assert_eq!(
            calculate_init_str(12, "default").unwrap(),
            calculate_init_str(12, "O(logn)").unwrap()
        );
        assert_eq!(OutputChangeScale::default(), OutputChangeScale::Logarithmic);
    }

    #[test]
    fn unknown_scale_is_rejected() {
        for n in [0usize, 1, 7, 100] {
            let err = calculate_init_str(n, "bogus_policy").unwrap_err();
            assert!(matches!(err, AdminError::InvalidArgument(_)));
        }
        assert!("o(n)".parse::<OutputChangeScale>().is_err());
    }

    #[test]
    fn zero_layers_is_rejected() {
        for scale in OutputChangeScale::ALL {
            let err = calculate_init(0, scale).unwrap_err();
            assert!(err.to_string().contains("num_res_layers"));
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        for scale in OutputChangeScale::ALL {
            assert_eq!(scale.to_string().parse::<OutputChangeScale>().unwrap(), scale);
        }
    }
}
