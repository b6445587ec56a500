//! Builds the driver network, prints its stages and runs a forward pass on
//! blank frames.
//!
//! ```bash
//! cargo run --example summary -- --save-config cnn_driver.yaml --save-params cnn_driver.safetensors
//! ```
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use clap::Parser;
use cnn_driver::{record::RecordValue, CnnDriver, CnnDriverConfig};
use std::path::PathBuf;

/// Show the architecture of the driver network
#[derive(Clone, Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML configuration of the network. The default architecture is used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Device name.
    /// If set to `"cpu"`, the CPU will be used.
    /// Otherwise, the device will be determined by the `cuda_if_available()` method.
    #[arg(long)]
    device: Option<String>,

    /// Batch size of the blank frames fed to the network
    #[arg(long, default_value_t = 4)]
    batch_size: usize,

    /// Print mean and standard deviation of every parameter
    #[arg(long)]
    param_stats: bool,

    /// Write the configuration as YAML to this path
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Write the initial parameters in safetensors format to this path
    #[arg(long)]
    save_params: Option<PathBuf>,
}

fn device(args: &Args) -> Result<Device> {
    let device = match args.device.as_deref() {
        Some("cpu") => Device::Cpu,
        _ => Device::cuda_if_available(0)?,
    };
    log::info!("Device is {:?}", device);
    Ok(device)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => CnnDriverConfig::load(path)?,
        None => CnnDriverConfig::default(),
    };
    let mut driver = CnnDriver::build(config, device(&args)?)?;
    driver.eval();

    let shapes = driver.config().features.stage_shapes()?;
    for (i, shape) in shapes.iter().enumerate() {
        println!("layer{}: {:?}", i + 1, shape);
    }
    for stage in driver.stages() {
        println!("{:<10} {:?}", stage.name, stage.kind);
    }
    println!("parameters: {}", driver.n_params());

    let [c, h, w] = driver.config().in_shape();
    let xs = Tensor::zeros((args.batch_size, c, h, w), DType::F32, driver.device())?;
    let ys = driver.forward(&xs)?;
    println!("steering {:?}: {:?}", ys.dims(), ys.flatten_all()?.to_vec1::<f32>()?);

    if args.param_stats {
        for (k, v) in driver.param_stats()?.iter() {
            if let RecordValue::Scalar(v) = v {
                println!("{:<28} {:>10.6}", k, v);
            }
        }
    }

    if let Some(path) = &args.save_config {
        driver.config().save(path)?;
    }
    if let Some(path) = &args.save_params {
        driver.save(path)?;
    }

    Ok(())
}
