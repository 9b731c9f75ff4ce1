use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
mod config;
mod progress;

use config::Config;

#[derive(Parser)]
#[command(name = "lanestack")]
#[command(about = "Lanestack - per-reference alignment stacker for BLAST-style reports")]
#[command(version)]
#[command(long_about = "
Lanestack turns textual local-alignment reports (BLASTX/BLASTP/BLASTN style)
into per-reference multiple alignments: a reconstructed reference consensus,
one aligned lane per read, and merged insertion columns.

Examples:
  lanestack stack --report hits.blast --reads reads.fasta --out stacks/
  lanestack stack --report hits.blast.gz --reads reads.fq.gz --min-reads 5 --format fasta
  lanestack list --report hits.blast --reads reads.fasta
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build per-reference alignments from a report and the read sequences
    Stack {
        /// Alignment report file (BLAST-style text, optionally gzipped)
        #[arg(long, required = true)]
        report: PathBuf,

        /// Read sequences (FASTA/FASTQ, optionally gzipped)
        #[arg(long, required = true)]
        reads: PathBuf,

        /// Output directory, one file per reference (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Minimum reads a reference needs to be reported
        #[arg(long)]
        min_reads: Option<usize>,

        /// Skip matches with a reported identity below 97 percent
        #[arg(long)]
        identity_filter: bool,

        /// Do not merge read insertions into extra alignment columns
        #[arg(long)]
        no_insertions: bool,

        /// Minimum bit score for a match to count
        #[arg(long)]
        min_score: Option<f32>,

        /// Keep matches within this percentage of a read's best score
        #[arg(long)]
        top_percent: Option<f32>,

        /// Maximum expect value for a match to count
        #[arg(long)]
        max_expect: Option<f64>,

        /// Minimum percent identity for a match to count
        #[arg(long)]
        min_identity: Option<f32>,
    },

    /// List the references a report would stack, with their read counts
    List {
        /// Alignment report file (BLAST-style text, optionally gzipped)
        #[arg(long, required = true)]
        report: PathBuf,

        /// Read sequences (FASTA/FASTQ, optionally gzipped)
        #[arg(long, required = true)]
        reads: PathBuf,

        /// Minimum reads a reference needs to be listed
        #[arg(long)]
        min_reads: Option<usize>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Name-prefixed rows, padded to a common width
    Text,
    /// One gapped FASTA record per row
    Fasta,
    /// Full alignment structure as JSON
    Json,
}

fn setup_logging(verbose: u8, quiet: bool) -> Result<()> {
    if quiet {
        std::env::set_var("RUST_LOG", "error");
    } else {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }

    env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet)?;

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Stack {
            report,
            reads,
            out,
            format,
            min_reads,
            identity_filter,
            no_insertions,
            min_score,
            top_percent,
            max_expect,
            min_identity,
        } => {
            commands::stack::execute(
                &config,
                report,
                reads,
                out,
                format,
                min_reads,
                identity_filter,
                no_insertions,
                min_score,
                top_percent,
                max_expect,
                min_identity,
            )?;
        }

        Commands::List {
            report,
            reads,
            min_reads,
        } => {
            commands::list::execute(&config, report, reads, min_reads)?;
        }
    }

    Ok(())
}
