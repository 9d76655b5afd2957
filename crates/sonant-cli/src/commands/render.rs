//! Automation script rendering command.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use sonant_config::{AutomationScript, ContextConfig};

#[derive(Args)]
pub struct RenderArgs {
    /// Automation script (TOML)
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Context settings (TOML); defaults to 48 kHz, 120 bpm, 4/4
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the rendered signal to a mono 32-bit float WAV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the rendered values as JSON
    #[arg(long)]
    json: bool,
}

/// JSON shape of a rendered script.
#[derive(Serialize)]
struct Rendered<'a> {
    name: &'a str,
    units: &'a str,
    sample_rate: u32,
    frames: usize,
    samples: &'a [f64],
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => ContextConfig::load(path)?,
        None => ContextConfig::default(),
    };
    let script = AutomationScript::load(&args.script)?;
    let samples = script.render(&config)?;
    tracing::info!(name = %script.name, frames = samples.len(), "rendered");

    if let Some(output) = &args.output {
        write_wav(output, &samples, config.sample_rate)?;
        if !args.json {
            println!("Wrote {} samples to {}", samples.len(), output.display());
        }
    }

    if args.json {
        let rendered = Rendered {
            name: &script.name,
            units: script.units.name(),
            sample_rate: config.sample_rate,
            frames: samples.len(),
            samples: &samples,
        };
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else if args.output.is_none() {
        print_summary(&script, &samples, config.sample_rate);
    }

    Ok(())
}

fn write_wav(path: &Path, samples: &[f64], sample_rate: u32) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample as f32)?;
    }
    writer.finalize()?;
    Ok(())
}

fn print_summary(script: &AutomationScript, samples: &[f64], sample_rate: u32) {
    println!("Script: {}", script.name);
    if !script.description.is_empty() {
        println!("  {}", script.description);
    }
    println!("  Units:       {}", script.units);
    println!("  Frames:      {} at {} Hz", samples.len(), sample_rate);

    let (min, max) = samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
            (lo.min(s), hi.max(s))
        });
    if let (Some(first), Some(last)) = (samples.first(), samples.last()) {
        println!("  First:       {first}");
        println!("  Last:        {last}");
        println!("  Range:       {min} .. {max}");
    }
}
