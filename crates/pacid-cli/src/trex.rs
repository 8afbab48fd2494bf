//! # T-REX Subcommand
//!
//! Parses a T-REX blob on its own and prints it one segment per line, or as
//! native values with `--json`.

use std::io::Write;

use clap::Args;

use pacid_core::{UnitTable, Validated};
use pacid_trex::Trex;

use crate::options::{write_report, GlobalArgs};

/// Arguments for the trex subcommand.
#[derive(Args, Debug)]
pub struct TrexArgs {
    /// The T-REX data, with or without a leading `*`.
    pub data: String,
}

/// Parse and print the blob.
pub fn run(args: &TrexArgs, global: &GlobalArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let trex = Trex::parse(&args.data, &UnitTable::builtin())?;
    if global.strict {
        trex.ensure_valid()?;
    }
    if global.json {
        let json = serde_json::json!({
            "valid": trex.is_valid(),
            "segments": trex.to_native_map()?,
            "messages": trex.all_messages(),
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&json)?)?;
        return Ok(());
    }
    writeln!(out, "{}", trex.pretty())?;
    writeln!(out)?;
    write_report(out, &trex.all_messages(), &trex.serialize())?;
    Ok(())
}
