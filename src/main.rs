use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use bitarray::{selftest, Error, Output, Session, DEFAULT_WRAP_WIDTH};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the built-in bit array checks
    Selftest {
        /// Number of bits in the array under test
        #[arg(short, long, default_value_t = 16, value_parser = clap::value_parser!(u32).range(1..))]
        size: u32,
    },
    /// Executes a command script (new, delete, set, unset, get, size, print)
    Run {
        /// Script to execute. Reads stdin when omitted.
        file: Option<PathBuf>,

        /// Keep executing after a failing line
        #[arg(short, long, default_value_t = false)]
        keep_going: bool,

        /// Characters per line when printing bits, 0 disables wrapping
        #[arg(short, long, default_value_t = DEFAULT_WRAP_WIDTH)]
        width: usize,
    },
}

fn read_script(file: Option<&PathBuf>) -> std::io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut script = String::new();
            std::io::stdin().read_to_string(&mut script)?;
            Ok(script)
        }
    }
}

fn main() -> ExitCode {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .env()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Selftest { size } => {
            println!("Beginning test of bit array library");
            match selftest::run(size, |rendering| println!("{}", rendering)) {
                Ok(()) => ExitCode::SUCCESS,
                Err(failure) => {
                    println!("Self test failed: {}", failure);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Run {
            file,
            keep_going,
            width,
        } => {
            let script = match read_script(file.as_ref()) {
                Ok(script) => script,
                Err(e) => {
                    println!("Failed to read script. Error: {}", e);
                    return ExitCode::FAILURE;
                }
            };

            let mut session = Session::with_wrap_width(width);
            let summary = session.run_script(&script, keep_going, |output| {
                if *output != Output::Nothing {
                    println!("{}", output);
                }
            });

            log::info!(
                "executed {} commands, {} failed",
                summary.executed,
                summary.failures.len()
            );
            for (line, error) in &summary.failures {
                match error {
                    Error::Parse { .. } => eprintln!("{}", error),
                    _ => eprintln!("line {}: {}", line, error),
                }
            }

            if summary.succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
