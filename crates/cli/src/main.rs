mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

// Re-exported so the command modules can reach the library helpers through
// `crate::`.
pub(crate) use fnsweep::{infer_binary_name, parse_u64, sha256_file};

use commands::{analyze_command, ranges_command, runs_command};

/// Heuristic function-boundary discovery CLI.
///
/// This CLI is a thin wrapper around `sweep-core` (exposed in code as
/// `sweep_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "fnsweep",
    version,
    about = "Discover function boundaries in stripped machine code",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a region of a binary for function boundaries.
    ///
    /// With no region arguments, the executable section of the file is
    /// analyzed (falling back to the whole file mapped at address 0).
    Analyze {
        /// Path to the binary file to analyze.
        #[arg(long)]
        path: String,

        /// Virtual base address of the region (hex with 0x prefix, or decimal).
        #[arg(long)]
        base: Option<String>,

        /// File offset of the region's first byte. Defaults to 0.
        #[arg(long)]
        file_offset: Option<String>,

        /// Region size in bytes.
        #[arg(long)]
        size: Option<String>,

        /// Architecture to decode for (x86_64, x86, arm, arm64, riscv, ppc).
        #[arg(long, default_value = "x86_64")]
        arch: String,

        /// YAML file listing regions to analyze (base/file_offset/size).
        #[arg(long)]
        regions: Option<String>,

        /// SQLite range database to export results into.
        #[arg(long)]
        db: Option<String>,

        /// Human-friendly binary name for run records. Defaults to the file name.
        #[arg(long)]
        name: Option<String>,

        /// Skip hashing the binary for the run record.
        #[arg(long, default_value_t = false)]
        skip_hash: bool,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List function ranges recorded in a range database.
    Ranges {
        /// SQLite range database path.
        #[arg(long)]
        db: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List analysis run history from a range database.
    Runs {
        /// SQLite range database path.
        #[arg(long)]
        db: String,

        /// Only show runs for this binary name.
        #[arg(long)]
        binary: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            path,
            base,
            file_offset,
            size,
            arch,
            regions,
            db,
            name,
            skip_hash,
            json,
        } => analyze_command(
            &path,
            base,
            file_offset,
            size,
            &arch,
            regions,
            db,
            name,
            skip_hash,
            json,
        ),
        Command::Ranges { db, json } => ranges_command(&db, json),
        Command::Runs { db, binary, json } => runs_command(&db, binary, json),
    }
}
