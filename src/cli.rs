//! Command-line surface: five subcommands over a clap derive parser.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "dedalus", version, about = "An interpreter for the Dedalus Datalog dialect")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a source file and print its AST.
    Parse { path: PathBuf },

    /// Parse and desugar a source file, printing the result.
    Desugar { path: PathBuf },

    /// Parse, desugar, and typecheck a source file, reporting success or
    /// the first violated invariant.
    Typecheck { path: PathBuf },

    /// Parse, desugar, typecheck, and run a program for a number of
    /// timesteps, printing the resulting process.
    Run {
        path: PathBuf,
        /// Number of timesteps to advance. Defaults to the configured value.
        #[arg(long)]
        timesteps: Option<u64>,
    },

    /// Open an interactive REPL.
    Repl,
}
