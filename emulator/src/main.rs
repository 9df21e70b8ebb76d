//! Runs a bundled S-language sample program.
//!
//! Usage: `semu [--program NAME] [--level N] [--inputs 3,4] [--listing] [--lineage] [--debug]`

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use s_emulator::{
    init_logger, samples, CallInlining, Emulator, EmulatorConfig, ListingLine, Program,
};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Inlining {
    /// Inline function bodies until only basic instructions remain
    #[default]
    Full,
    /// Keep calls as boundaries and execute them directly
    Boundary,
}

impl From<Inlining> for CallInlining {
    fn from(inlining: Inlining) -> Self {
        match inlining {
            Inlining::Full => CallInlining::Full,
            Inlining::Boundary => CallInlining::Boundary,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "semu")]
#[command(about = "Expand and run an S-language sample program")]
struct Args {
    /// Sample program to load
    #[arg(short, long, default_value = "addition")]
    program: String,

    /// Expansion level; defaults to the maximum
    #[arg(short, long)]
    level: Option<usize>,

    /// Comma-separated input values for x1, x2, ...
    #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
    inputs: Vec<i64>,

    /// Function-call inlining policy
    #[arg(long, value_enum, default_value_t)]
    inlining: Inlining,

    /// Print the expanded program listing
    #[arg(long)]
    listing: bool,

    /// Print the derivation lineage of every expanded instruction
    #[arg(long)]
    lineage: bool,

    /// Step through the run one instruction at a time
    #[arg(long)]
    debug: bool,

    /// List the bundled samples and exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    let _guard = init_logger();

    let args = Args::parse();

    if args.list {
        for program in samples::catalog() {
            println!("{}", program.name());
        }
        return Ok(());
    }

    let program: Program = samples::by_name(&args.program)
        .ok_or_else(|| anyhow!("unknown sample program {}", args.program))?;
    let config = EmulatorConfig::default().with_call_inlining(args.inlining.into());
    let mut emulator = Emulator::with_config(program, config);

    let max = emulator.max_expansion_level()?;
    let level = args.level.unwrap_or(max);
    info!(program = %args.program, level, max, "loaded");

    let expansion = emulator
        .expand(level)
        .with_context(|| format!("expanding {} to level {level}", args.program))?;

    if args.listing {
        print!("{}", expansion.program);
    }
    if args.lineage {
        for index in 0..expansion.program.len() {
            println!("{}", expansion.forest.render_lineage(index));
        }
    }

    if args.debug {
        let mut report = emulator.debug_start(level, &args.inputs)?;
        while !report.is_finished() {
            if let Some(instruction) = expansion.program.instructions().get(report.pc) {
                println!("{}", ListingLine(report.pc, instruction));
            }
            report = emulator.debug_step_forward()?;
        }
        emulator.debug_stop()?;
    } else {
        let result = emulator.execute(level, &args.inputs)?;
        for (var, value) in &result.variables {
            println!("{var} = {value}");
        }
        result.profile.log_summary();
    }

    for record in emulator.history() {
        println!(
            "run #{}: level {} output {} cycles {}",
            record.run(),
            record.level(),
            record.output(),
            record.cycles()
        );
    }
    Ok(())
}
