//! Clamp demonstration: a constant signal through a Min or Max operator.

use clap::Args;
use sonant_core::{Context, Inlet, Max, Min, NodeId, Signal};

/// Frames rendered before reading the settled output.
const SETTLE_FRAMES: usize = 128;

#[derive(Args)]
pub struct ClampArgs {
    /// Clamp threshold
    #[arg(short, long, allow_hyphen_values = true)]
    threshold: f64,

    /// Constant input value
    #[arg(short, long, allow_hyphen_values = true)]
    input: f64,

    /// Use Max (floor at the threshold) instead of Min (ceiling)
    #[arg(long)]
    max: bool,

    /// Sample rate of the rendering context
    #[arg(long, default_value = "48000")]
    sample_rate: u32,
}

pub fn run(args: ClampArgs) -> anyhow::Result<()> {
    let mut ctx = Context::new(f64::from(args.sample_rate));
    let input = Signal::new(&mut ctx, args.input)?;

    let (name, output) = if args.max {
        let op = Max::new(&mut ctx, args.threshold)?;
        ("max", settle(&mut ctx, &input, op.input(), op.output())?)
    } else {
        let op = Min::new(&mut ctx, args.threshold)?;
        ("min", settle(&mut ctx, &input, op.input(), op.output())?)
    };

    tracing::debug!(op = name, input = args.input, threshold = args.threshold, output, "clamp rendered");
    println!("{}({}, {}) = {}", name, args.input, args.threshold, output);
    Ok(())
}

fn settle(ctx: &mut Context, input: &Signal, inlet: Inlet, output: NodeId) -> anyhow::Result<f64> {
    input.connect(ctx, inlet)?;
    let samples = ctx.render(SETTLE_FRAMES, output)?;
    samples
        .last()
        .copied()
        .ok_or_else(|| anyhow::anyhow!("nothing rendered"))
}
