//! Kython compiler - CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kython_compiler::compiler::load_compiler;
use kython_compiler::kyc::{self, KycFile};
use kython_compiler::util::config::{load_config, Backend};
use kython_compiler::util::logger;
use kython_compiler::{NAME, VERSION};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Compile Python source into KYC code objects
#[derive(Parser, Debug)]
#[command(name = "kyc")]
#[command(author = "Kython Team")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Compiler backend (native or subprocess)
    #[arg(long, global = true)]
    backend: Option<Backend>,

    /// Path to the kython_bridge shared library
    #[arg(long, global = true, value_name = "PATH")]
    library: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a Python source file and print a summary
    Compile {
        /// Source file to compile
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the binary artifact to this file
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,

        /// Print the decoded artifact as JSON
        #[arg(long)]
        json: bool,

        /// Print the full dump instead of the summary
        #[arg(long, conflicts_with = "json")]
        dump: bool,
    },

    /// Compile Python code from the command line
    Eval {
        /// Code to compile
        #[arg(value_name = "CODE")]
        code: String,

        /// Filename recorded in the code object
        #[arg(long, default_value = "<module>")]
        filename: String,

        /// Print the decoded artifact as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect an existing .kyc file
    Dump {
        /// Artifact to inspect
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init_cli(args.verbose);

    if args.verbose {
        eprintln!("kyc version: {}", VERSION);
        eprintln!("Host: {}", std::env::consts::OS);
    }

    let mut config = load_config(&std::env::current_dir()?).context("Failed to load config")?;
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if let Some(library) = args.library {
        config.bridge.library = Some(library);
    }

    match args.command {
        Commands::Compile {
            file,
            output,
            json,
            dump,
        } => {
            let compiler = load_compiler(&config).context("Failed to load compiler backend")?;
            let bytes = compiler
                .compile_path_raw(&file)
                .with_context(|| format!("Failed to compile: {}", file.display()))?;
            let kyc = kyc::parse_kyc(&bytes).context("Compiler produced a malformed artifact")?;

            if let Some(output) = output {
                fs::write(&output, &bytes)
                    .with_context(|| format!("Failed to write: {}", output.display()))?;
                eprintln!("Wrote {} bytes to {}", bytes.len(), output.display());
            }
            if json || dump {
                print_kyc(&kyc, json)?;
            } else {
                println!("{}", kyc.summary());
            }
        }
        Commands::Eval {
            code,
            filename,
            json,
        } => {
            let compiler = load_compiler(&config).context("Failed to load compiler backend")?;
            let kyc = compiler
                .compile_str(&code, &filename)
                .context("Failed to compile code")?;
            print_kyc(&kyc, json)?;
        }
        Commands::Dump { file, json } => {
            let kyc = kyc::read_kyc_file(&file)
                .with_context(|| format!("Failed to read: {}", file.display()))?;
            print_kyc(&kyc, json)?;
        }
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
        }
    }

    Ok(())
}

fn print_kyc(
    kyc: &KycFile,
    json: bool,
) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, kyc)?;
        writeln!(out)?;
    } else {
        kyc::dump_kyc(kyc, &mut out)?;
    }
    Ok(())
}
