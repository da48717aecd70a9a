use std::fs;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dedalus_core::cli::{Cli, Command};
use dedalus_core::config::Config;
use dedalus_core::desugar::desugar;
use dedalus_core::error::ReplResult;
use dedalus_core::eval::{run, spawn, UniformRandInt};
use dedalus_core::parser::parse_program;
use dedalus_core::render::render_process;
use dedalus_core::repl;
use dedalus_core::typecheck::typecheck;

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn read_source(path: &std::path::Path) -> ReplResult<String> {
    fs::read_to_string(path).map_err(|e| dedalus_core::error::ReplError::Io(e.to_string()))
}

fn run_command(cli: Cli, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Parse { path } => {
            let source = read_source(&path)?;
            let program = parse_program(&source)?;
            println!("{program}");
        }
        Command::Desugar { path } => {
            let source = read_source(&path)?;
            let program = desugar(&parse_program(&source)?);
            println!("{program}");
        }
        Command::Typecheck { path } => {
            let source = read_source(&path)?;
            let program = desugar(&parse_program(&source)?);
            match typecheck(program) {
                Ok(_) => println!("ok"),
                Err(e) => {
                    println!("typecheck failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::Run { path, timesteps } => {
            let source = read_source(&path)?;
            let program = typecheck(desugar(&parse_program(&source)?))?;
            let randint = UniformRandInt::new(config.run.randint_low, config.run.randint_high);
            let process = spawn(program, Some(Box::new(randint)));
            let timesteps = timesteps.unwrap_or(config.run.default_timesteps);
            let process = run(process, timesteps);
            println!("{}", render_process(&process));
        }
        Command::Repl => {
            repl::run(config)?;
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load().unwrap_or_default();
    init_logging(&config);

    let cli = Cli::parse();
    run_command(cli, config)
}
