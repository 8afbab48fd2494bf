//! # Encode / Decode Subcommands
//!
//! The base36 text codec on the command line.

use std::io::Write;

use clap::Args;

use pacid_core::base36;

/// Arguments for the encode subcommand.
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Text to encode.
    pub text: String,
}

/// Arguments for the decode subcommand.
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Base36 token to decode.
    pub token: String,
}

/// Print the base36 token for the text.
pub fn encode(args: &EncodeArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(out, "{}", base36::encode(&args.text).as_str())?;
    Ok(())
}

/// Print the text behind a base36 token.
pub fn decode(args: &DecodeArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(out, "{}", base36::decode(&args.token)?)?;
    Ok(())
}
