// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `woodgrain`: rewrite a G-code file with noise-driven temperature changes.
//!
//! Settings come from the built-in defaults, then an optional JSON profile,
//! then command-line flags. Logs go to stderr (`RUST_LOG`, default `info`);
//! the rewritten G-code goes to `--output` or stdout, and only once the whole
//! transform has succeeded.

mod layers;

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use woodgrain_core::{GcodeDialect, WoodGrain, WoodGrainConfig};

use crate::layers::split_layers;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Wood grain: vary the hotend temperature with layer height"
)]
struct Args {
    /// G-code file to rewrite (`-` reads stdin)
    input: PathBuf,
    /// Destination file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// JSON profile with camelCase settings and an optional `dialect` object
    #[arg(long)]
    profile: Option<PathBuf>,
    /// Lowest temperature (°C)
    #[arg(long)]
    min_temp: Option<f64>,
    /// Highest temperature (°C)
    #[arg(long)]
    max_temp: Option<f64>,
    /// Average grain size (mm)
    #[arg(long)]
    grain_size: Option<f64>,
    /// Start temperature held over the first half millimetre; 0 disables
    #[arg(long)]
    first_temp: Option<f64>,
    /// Exponent shaping the noise; above 1 gives sparser dark bands
    #[arg(long)]
    spikiness_power: Option<f64>,
    /// Largest temperature rise between two heights (°C); 0 disables
    #[arg(long)]
    max_upward: Option<f64>,
    /// Vertical shift of the noise curve (mm)
    #[arg(long, allow_negative_numbers = true)]
    z_offset: Option<f64>,
    /// Noise seed; 0 picks one at random (logged for reproduction)
    #[arg(long)]
    random_seed: Option<u64>,
    /// Lines starting with this text begin a new layer
    #[arg(long, default_value = ";LAYER:")]
    layer_marker: String,
}

impl Args {
    fn apply_overrides(&self, config: &mut WoodGrainConfig) {
        let floats = [
            (self.min_temp, &mut config.min_temp),
            (self.max_temp, &mut config.max_temp),
            (self.grain_size, &mut config.grain_size),
            (self.first_temp, &mut config.first_temp),
            (self.spikiness_power, &mut config.spikiness_power),
            (self.max_upward, &mut config.max_upward),
            (self.z_offset, &mut config.z_offset),
        ];
        for (flag, slot) in floats {
            if let Some(value) = flag {
                *slot = value;
            }
        }
        if let Some(seed) = self.random_seed {
            config.random_seed = seed;
        }
    }
}

/// Profile file: wood grain settings plus the command vocabulary.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Profile {
    #[serde(flatten)]
    settings: WoodGrainConfig,
    dialect: GcodeDialect,
}

fn load_profile(path: Option<&Path>) -> Result<Profile> {
    let Some(path) = path else {
        return Ok(Profile::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("read profile {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse profile {}", path.display()))
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("read G-code from stdin")?;
        Ok(text)
    } else {
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
    }
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, text).with_context(|| format!("write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|()| stdout.flush())
                .context("write G-code to stdout")
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let Profile {
        settings: mut config,
        dialect,
    } = load_profile(args.profile.as_deref())?;
    args.apply_overrides(&mut config);

    let input = read_input(&args.input)?;
    let layers = split_layers(&input, &args.layer_marker);
    info!(layers = layers.len(), input = %args.input.display(), "loaded");

    let engine = WoodGrain::with_dialect(config, dialect);
    let settings = engine.config();
    info!(
        min_temp = settings.min_temp,
        max_temp = settings.max_temp,
        grain_size = settings.grain_size,
        max_upward = settings.max_upward,
        "settings resolved"
    );
    let woodified = engine
        .run(&layers)
        .context("wood grain transform failed")?;

    write_output(args.output.as_deref(), &woodified.text())?;
    info!(
        seed = woodified.seed,
        injected = woodified.injected.len(),
        "done"
    );
    Ok(())
}
