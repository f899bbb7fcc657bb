//! Command-line interface for inspecting Admin omega initializations.

use admin_burn::config::load_config;
use admin_burn::{calculate_init, AdminEncoder, OutputChangeScale};
use anyhow::Result;
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use burn_ndarray::{NdArray, NdArrayDevice};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "backend-wgpu")]
use burn_wgpu::graphics::AutoGraphicsApi;
#[cfg(feature = "backend-wgpu")]
use burn_wgpu::{init_setup, Wgpu, WgpuDevice};

/// Supported compute backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum BackendChoice {
    /// Use the WGPU backend (GPU acceleration when available).
    Wgpu,
    /// Use the ndarray backend (CPU).
    Ndarray,
}

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "admin-burn")]
#[command(about = "Omega initialization for residual rescaling", long_about = None)]
struct Cli {
    /// Log debug events to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Compute backend used by `check`.
    #[arg(long, value_enum, default_value_t = BackendChoice::Ndarray, global = true)]
    backend: BackendChoice,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Print omega for one layer count.
    Init {
        /// Total number of residual layers.
        #[arg(long)]
        layers: usize,
        /// Output change scale: O(1), O(logn) / default, or O(n).
        #[arg(long, default_value = "default")]
        scale: OutputChangeScale,
    },
    /// Print omega for every layer count up to a maximum, under every scale.
    Table {
        /// Largest residual layer count to list.
        #[arg(long, default_value_t = 24)]
        max_layers: usize,
    },
    /// Build the modules described by a config and run one forward pass.
    Check {
        /// Configuration YAML.
        #[arg(long)]
        config: PathBuf,
        /// Sequence length of the probe input.
        #[arg(long, default_value_t = 4)]
        seq_len: usize,
    },
}

/// Entry point for the CLI.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Init { layers, scale } => {
            let omega = calculate_init(layers, scale)?;
            println!("{omega}");
        }
        Commands::Table { max_layers } => {
            print!("{}", format_table(max_layers)?);
        }
        Commands::Check { config, seq_len } => match cli.backend {
            BackendChoice::Wgpu => {
                #[cfg(feature = "backend-wgpu")]
                {
                    let device = WgpuDevice::default();
                    init_setup::<AutoGraphicsApi>(&device, Default::default());
                    run_check::<Wgpu>(&config, seq_len, &device)?;
                }
                #[cfg(not(feature = "backend-wgpu"))]
                {
                    let _ = (config, seq_len);
                    anyhow::bail!("WGPU backend not enabled; build with --features backend-wgpu");
                }
            }
            BackendChoice::Ndarray => {
                let device = NdArrayDevice::default();
                run_check::<NdArray<f32>>(&config, seq_len, &device)?;
            }
        },
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Render omega for `1..=max_layers` as a whitespace-aligned table.
fn format_table(max_layers: usize) -> Result<String> {
    if max_layers == 0 {
        anyhow::bail!("--max-layers must be > 0");
    }
    let mut output = format!("{:>8}", "layers");
    for scale in OutputChangeScale::ALL {
        output.push_str(&format!(" {:>10}", scale.as_str()));
    }
    output.push('\n');
    for layers in 1..=max_layers {
        output.push_str(&format!("{layers:>8}"));
        for scale in OutputChangeScale::ALL {
            output.push_str(&format!(" {:>10.6}", calculate_init(layers, scale)?));
        }
        output.push('\n');
    }
    Ok(output)
}

fn run_check<B: Backend>(config_path: &Path, seq_len: usize, device: &B::Device) -> Result<()> {
    if seq_len == 0 {
        anyhow::bail!("--seq-len must be > 0");
    }
    let config = load_config(config_path)?;
    let residual = config.residual.init::<B>(device)?;
    let omega = residual.omega().into_data();
    let omega = omega
        .as_slice::<f32>()
        .map_err(|e| anyhow::anyhow!("Unexpected omega data: {e:?}"))?;
    println!(
        "residual: scale={} trainable={} omega={} channels={}",
        config.residual.output_change_scale,
        residual.is_trainable(),
        omega[0],
        omega.len()
    );

    // A trainable omega fixes the channel count; a scalar one broadcasts anywhere.
    let dim = if residual.is_trainable() {
        omega.len()
    } else {
        config.encoder.as_ref().map_or(1, |encoder| encoder.embed_dim)
    };
    let probe = probe_input::<B>(seq_len, dim, device);
    let combined = residual.forward(probe.clone(), probe);
    println!("residual output shape: {:?}", combined.dims());

    if let Some(encoder_config) = config.encoder.as_ref() {
        let encoder = AdminEncoder::<B>::new(encoder_config, device)?;
        let output = encoder.forward(probe_input::<B>(seq_len, encoder_config.embed_dim, device));
        println!(
            "encoder: layers={} residual_layers={} output shape: {:?}",
            encoder.layers.len(),
            encoder_config.num_res_layers(),
            output.dims()
        );
    }
    Ok(())
}

/// Deterministic `[1, seq_len, dim]` input in `[-1, 1]`.
fn probe_input<B: Backend>(seq_len: usize, dim: usize, device: &B::Device) -> Tensor<B, 3> {
    let len = seq_len * dim;
    let values: Vec<f32> = (0..len)
        .map(|i| ((i % 9) as f32 - 4.0) / 4.0)
        .collect();
    Tensor::from_data(TensorData::new(values, [1, seq_len, dim]), device)
}
