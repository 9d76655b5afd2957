//! Unit conversion command.

use anyhow::Context as _;
use clap::Args;
use sonant_core::{Clock, TimeBase, Value};

#[derive(Args)]
pub struct ConvertArgs {
    /// Value to convert: a number, note name or time expression
    #[arg(value_name = "VALUE", allow_hyphen_values = true)]
    value: String,

    /// Units of the value (default, time, frequency, decibels, normal_range,
    /// audio_range, positive, bpm)
    #[arg(short, long, default_value = "default")]
    units: String,

    /// Treat VALUE as a raw engine value and convert it back to the units
    #[arg(long)]
    to_semantic: bool,

    /// Tempo used for musical time
    #[arg(long, default_value = "120.0")]
    bpm: f64,

    /// Sample rate used for sample-count times
    #[arg(long, default_value = "48000")]
    sample_rate: u32,
}

pub fn run(args: ConvertArgs) -> anyhow::Result<()> {
    let units = sonant_config::validate_units(&args.units)?;

    if args.to_semantic {
        let raw: f64 = args
            .value
            .trim()
            .parse()
            .with_context(|| format!("raw value '{}' is not a number", args.value))?;
        println!("{} raw = {} {}", raw, units.to_semantic(raw), units);
        return Ok(());
    }

    let clock = Clock {
        time_base: TimeBase {
            bpm: args.bpm,
            ..TimeBase::default()
        },
        now: 0.0,
        sample_rate: f64::from(args.sample_rate),
    };
    let value = match args.value.trim().parse::<f64>() {
        Ok(n) => Value::Number(n),
        Err(_) => Value::Expr(args.value.clone()),
    };
    let raw = units.to_raw(&value, &clock)?;
    tracing::debug!(%units, raw, "converted");
    println!("{} {} = {} raw", args.value, units, raw);
    Ok(())
}
