//! # Parse Subcommand
//!
//! Prints the parsed tree of a PAC-ID URL followed by its diagnostics.

use std::io::Write;

use clap::Args;

use pacid::{Extension, ExtensionPayload, PacUrl, ParsedId, Validated};

use crate::options::{write_report, GlobalArgs};

/// Arguments for the parse subcommand.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// The PAC-ID URL.
    pub url: String,
}

/// Parse the URL and describe it.
pub fn run(args: &ParseArgs, global: &GlobalArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let parsed = global.parser().parse(&args.url)?;
    if global.json {
        writeln!(out, "{}", parsed.to_json()?)?;
        return Ok(());
    }
    describe(&parsed, out)?;
    writeln!(out)?;
    write_report(out, &parsed.all_messages(), &parsed.to_string())?;
    Ok(())
}

fn describe(url: &PacUrl, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "Issuer: {}", url.id().issuer())?;
    match url.id() {
        ParsedId::Plain(p) => {
            writeln!(out, "Identifier:")?;
            for s in p.segments() {
                writeln!(out, "  {s}")?;
            }
        }
        ParsedId::Categorized(c) => {
            for cat in c.categories() {
                let known = if cat.is_known() { "" } else { " (unknown)" };
                writeln!(out, "Category {}{known}", cat.key())?;
                for f in cat.fields() {
                    writeln!(
                        out,
                        "  {} ({}): {}",
                        f.name,
                        f.alias,
                        f.filled().unwrap_or("-")
                    )?;
                }
                for s in cat.additional_segments() {
                    writeln!(out, "  + {s}")?;
                }
            }
        }
    }
    for e in url.extensions() {
        describe_extension(e, out)?;
    }
    Ok(())
}

fn describe_extension(e: &Extension, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        out,
        "Extension {} ${}",
        e.name().unwrap_or("?"),
        e.ext_type().unwrap_or("?")
    )?;
    match e.payload() {
        ExtensionPayload::Generic(data) => writeln!(out, "  {data}"),
        ExtensionPayload::DisplayName(d) => writeln!(out, "  {}", d.display_name()),
        ExtensionPayload::Trex(t) => writeln!(out, "  {}", t.trex().pretty().replace('\n', "\n  ")),
        ExtensionPayload::Custom(c) => writeln!(out, "  {}", c.data()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_string(url: &str, global: &GlobalArgs) -> String {
        let mut out = Vec::new();
        run(&ParseArgs { url: url.to_string() }, global, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_text_output() {
        let text = run_to_string(
            "HTTPS://PAC.METTORIUS.COM/-MD/BAL500/1234*1T*A$T.A:X",
            &GlobalArgs::default(),
        );
        assert!(text.contains("Issuer: METTORIUS.COM"));
        assert!(text.contains("model_number (240): BAL500"));
        assert!(text.contains("Extension N $N\n  A"));
        assert!(text.contains("All clear!"));
    }

    #[test]
    fn test_no_cat_prints_plain_segments() {
        let global = GlobalArgs {
            no_cat: true,
            ..GlobalArgs::default()
        };
        let text = run_to_string("HTTPS://PAC.METTORIUS.COM/-MD/BAL500/1234", &global);
        assert!(text.contains("Identifier:\n  -MD\n  BAL500\n  1234"));
    }

    #[test]
    fn test_json_output() {
        let global = GlobalArgs {
            json: true,
            ..GlobalArgs::default()
        };
        let text = run_to_string("HTTPS://PAC.METTORIUS.COM/21:1", &global);
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["id"]["kind"], "plain");
    }

    #[test]
    fn test_structural_error_propagates() {
        let mut out = Vec::new();
        let args = ParseArgs {
            url: "HTTPS://PAC.METTORIUS.COM".to_string(),
        };
        assert!(run(&args, &GlobalArgs::default(), &mut out).is_err());
    }
}
