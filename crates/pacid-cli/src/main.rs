//! # pacid CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;

use pacid_cli::options::GlobalArgs;

/// PAC-ID toolchain.
///
/// Parses and validates PAC-ID URLs, re-renders them in short or long
/// notation, and inspects base36 tokens and T-REX data.
#[derive(Parser, Debug)]
#[command(name = "pacid", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the parsed tree of a URL.
    Parse(pacid_cli::parse::ParseArgs),
    /// Print diagnostics; exit status 1 when invalid.
    Validate(pacid_cli::validate::ValidateArgs),
    /// Re-render a URL.
    Serialize(pacid_cli::serialize::SerializeArgs),
    /// Base36-encode text.
    Encode(pacid_cli::codec::EncodeArgs),
    /// Decode a base36 token.
    Decode(pacid_cli::codec::DecodeArgs),
    /// Inspect T-REX data.
    Trex(pacid_cli::trex::TrexArgs),
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let code = match &cli.command {
        Commands::Parse(args) => pacid_cli::parse::run(args, &cli.global, &mut out).map(|()| ExitCode::SUCCESS),
        Commands::Validate(args) => pacid_cli::validate::run(args, &cli.global, &mut out)
            .map(|valid| if valid { ExitCode::SUCCESS } else { ExitCode::from(1) }),
        Commands::Serialize(args) => {
            pacid_cli::serialize::run(args, &cli.global, &mut out).map(|()| ExitCode::SUCCESS)
        }
        Commands::Encode(args) => pacid_cli::codec::encode(args, &mut out).map(|()| ExitCode::SUCCESS),
        Commands::Decode(args) => pacid_cli::codec::decode(args, &mut out).map(|()| ExitCode::SUCCESS),
        Commands::Trex(args) => pacid_cli::trex::run(args, &cli.global, &mut out).map(|()| ExitCode::SUCCESS),
    }?;

    out.flush()?;
    Ok(code)
}
