use std::path::PathBuf;

use clap::{Parser, Subcommand};

use wiktionary_apertium::config::{PipelineConfig, Profile};
use wiktionary_apertium::{Result, StageOutcome, StageRunner};

#[derive(Parser)]
#[command(name = "wiktionary-apertium")]
#[command(about = "Build Apertium Ido-Esperanto dictionaries from Wiktionary and Wikipedia dumps")]
struct Args {
    /// Pipeline YAML (default: config/pipeline.yaml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Rebuild outputs that already exist
    #[arg(short, long, global = true)]
    force: bool,

    /// Quiet mode - warnings and errors only, no progress
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read dumps into per-source documents
    Extract {
        /// Configured source to extract (default: all of them)
        #[arg(short, long)]
        source: Option<String>,

        /// Dump to read instead of the configured one (.xml or .xml.bz2)
        #[arg(long, requires = "source")]
        dump: Option<PathBuf>,

        /// Page layout of the dump, overriding the configured one
        #[arg(long, value_enum, requires = "source")]
        profile: Option<Profile>,
    },
    /// Merge source documents into one
    Merge,
    /// Assign parts of speech and paradigms, derive twins
    Infer,
    /// Drop invalid entries and translations
    Filter,
    /// Write the monolingual and bilingual dictionaries
    Export,
    /// Every stage in order
    Run,
}

fn report(stage: &str, outcome: StageOutcome, quiet: bool) {
    if !quiet && outcome == StageOutcome::Skipped {
        println!("{}: up to date", stage);
    }
}

fn run(args: Args) -> Result<()> {
    let config = PipelineConfig::load(args.config.as_deref())?;
    let runner = StageRunner::new(&config, args.force, args.quiet);

    match args.command {
        Command::Extract { source, dump, profile } => match source {
            Some(name) => {
                let source = config.source_with_overrides(&name, dump, profile)?;
                report(&name, runner.extract(&source)?, args.quiet);
            }
            None => {
                for (name, outcome) in runner.extract_all()? {
                    report(&name, outcome, args.quiet);
                }
            }
        },
        Command::Merge => report("merge", runner.merge()?, args.quiet),
        Command::Infer => report("infer", runner.infer()?, args.quiet),
        Command::Filter => report("filter", runner.filter()?, args.quiet),
        Command::Export => report("export", runner.export()?, args.quiet),
        Command::Run => runner.run_all()?,
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
