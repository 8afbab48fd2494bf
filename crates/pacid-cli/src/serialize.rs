//! # Serialize Subcommand
//!
//! Parses a URL and renders it again in the requested notation.

use std::io::Write;

use clap::Args;

use pacid::SerializeOptions;

use crate::options::{GlobalArgs, NotationArg};

/// Arguments for the serialize subcommand.
#[derive(Args, Debug)]
pub struct SerializeArgs {
    /// The PAC-ID URL.
    pub url: String,

    /// Segment and extension notation.
    #[arg(long, value_enum, default_value_t = NotationArg::Preserve)]
    pub notation: NotationArg,

    /// Upper-case the whole URL.
    #[arg(long)]
    pub uppercase: bool,
}

/// Re-render the URL.
pub fn run(args: &SerializeArgs, global: &GlobalArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let parsed = global.parser().parse(&args.url)?;
    let options = SerializeOptions {
        notation: args.notation.into(),
        uppercase_only: args.uppercase,
    };
    writeln!(out, "{}", parsed.to_url(&options))?;
    Ok(())
}
