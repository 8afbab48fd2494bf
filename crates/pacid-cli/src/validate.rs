//! # Validate Subcommand
//!
//! Prints every diagnostic of a PAC-ID URL. The caller turns an invalid
//! result into a non-zero exit status.

use std::io::Write;

use clap::Args;

use pacid::Validated;

use crate::options::{write_report, GlobalArgs};

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// The PAC-ID URL.
    pub url: String,
}

/// Validate the URL; returns whether it is valid.
pub fn run(args: &ValidateArgs, global: &GlobalArgs, out: &mut dyn Write) -> anyhow::Result<bool> {
    let parsed = global.parser().parse(&args.url)?;
    let messages = parsed.all_messages();
    let valid = parsed.is_valid();
    tracing::debug!(valid, messages = messages.len(), "validated");

    if global.json {
        let report = serde_json::json!({
            "valid": valid,
            "messages": messages,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write_report(out, &messages, &parsed.to_string())?;
    }
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(url: &str, global: &GlobalArgs) -> (bool, String) {
        let mut out = Vec::new();
        let valid = run(&ValidateArgs { url: url.to_string() }, global, &mut out).unwrap();
        (valid, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_valid_url() {
        let (valid, text) = validate("HTTPS://PAC.METTORIUS.COM/-MD/BAL500/1234", &GlobalArgs::default());
        assert!(valid);
        assert_eq!(text.trim(), "All clear!");
    }

    #[test]
    fn test_invalid_url_reports_with_highlight() {
        let (valid, text) = validate("HTTPS://PAC.METTORIUS.COM/-MD/KEY:VAL", &GlobalArgs::default());
        assert!(!valid);
        assert!(text.contains("missing mandatory field Model Number"));
        assert!(text.contains("»-MD«"));
    }

    #[test]
    fn test_json_report() {
        let global = GlobalArgs {
            json: true,
            ..GlobalArgs::default()
        };
        let (valid, text) = validate("HTTPS://PAC.METTORIUS.COM/-MD/KEY:VAL", &global);
        assert!(!valid);
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["valid"], false);
        assert!(json["messages"].as_array().is_some_and(|m| !m.is_empty()));
    }

    #[test]
    fn test_strict_turns_invalid_into_error() {
        let global = GlobalArgs {
            strict: true,
            ..GlobalArgs::default()
        };
        let mut out = Vec::new();
        let args = ValidateArgs {
            url: "HTTPS://PAC.METTORIUS.COM/-MD/KEY:VAL".to_string(),
        };
        assert!(run(&args, &global, &mut out).is_err());
    }
}
