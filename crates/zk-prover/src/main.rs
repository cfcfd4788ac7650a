//! `match-zksnark` command line tool
//!
//! ```text
//! match-zksnark generate <path_prefix> <csv12> [--gadget <name>]
//! match-zksnark prove    <path_prefix> <csv12> [--gadget <name>]
//! match-zksnark verify   <path_prefix> <proof_b64> <primary_input_b64>
//! ```
//!
//! `prove` writes the proof and the primary input to standard error, one per
//! line. `verify` prints `true` or `false` to standard output; its exit code
//! only reflects argument and IO problems, never the verification outcome.
//! Every failure exits with -1.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use match_zk_prover::config::CONFIG_FILE_ENV;
use match_zk_prover::{generate_match_keys, prove_match, verify_match, EqualityGadget, ProverConfig};

#[derive(Debug, Parser)]
#[command(
    name = "match-zksnark",
    about = "Generate keys for, prove and verify ratio match relations"
)]
struct Cli {
    /// JSON config file; environment variables and flags override its values
    #[arg(long, global = true, env = CONFIG_FILE_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Arguments shared by the subcommands that build the circuit
#[derive(Debug, Args)]
struct CircuitArgs {
    /// Prefix the key file names are appended to
    path_prefix: PathBuf,

    /// i0,n0,d0,r0,i1,n1,d1,r1,i2,n2,d2,r2
    #[arg(allow_hyphen_values = true)]
    tuples: String,

    /// Equality gadget: product-to-one (default) or zero-test.
    /// `prove` must use the gadget the keys were generated with.
    #[arg(long)]
    gadget: Option<EqualityGadget>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate proving and verification keys
    Generate(CircuitArgs),
    /// Prove the relation for a tuple list
    Prove(CircuitArgs),
    /// Verify a proof against its primary input
    Verify {
        path_prefix: PathBuf,
        proof: String,
        primary_input: String,
    },
}

fn init_tracing() {
    // stderr carries the proof payload, so stay quiet unless RUST_LOG asks otherwise
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "error".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Defaults, then the config file, then the environment, then the command line
fn load_config(
    file: Option<&Path>,
    path_prefix: PathBuf,
    gadget: Option<EqualityGadget>,
) -> Result<ProverConfig> {
    let base = match file {
        Some(path) => ProverConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => ProverConfig::default(),
    };
    let mut config = base.with_env().context("Failed to read configuration")?;

    config.key_prefix = path_prefix;
    if let Some(gadget) = gadget {
        config.gadget = gadget;
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let file = cli.config.as_deref();
    match cli.command {
        Command::Generate(args) => {
            let config = load_config(file, args.path_prefix, args.gadget)?;
            generate_match_keys(&config, &args.tuples).with_context(|| {
                format!("Failed to generate keys under {}", config.key_prefix.display())
            })?;
        }
        Command::Prove(args) => {
            let config = load_config(file, args.path_prefix, args.gadget)?;
            let artifacts = prove_match(&config, &args.tuples).context("Failed to generate proof")?;
            eprintln!("{}", artifacts.proof);
            eprintln!("{}", artifacts.primary_input);
        }
        Command::Verify {
            path_prefix,
            proof,
            primary_input,
        } => {
            let config = load_config(file, path_prefix, None)?;
            let verified = verify_match(&config, &proof, &primary_input).context("Failed to verify proof")?;
            println!("{verified}");
        }
    }
    Ok(())
}

fn main() {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { -1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(-1);
    }
}
