//! # Shared Flags
//!
//! Flags accepted by every subcommand and their mapping onto the library's
//! parser configuration.

use std::io::Write;

use clap::{Args, ValueEnum};

use pacid::{Notation, ParseOptions, Parser, Report, ValidationMessage};

/// Flags shared by all subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Print structured JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Do not interpret identifiers as PAC-CAT.
    #[arg(long, global = true)]
    pub no_cat: bool,

    /// Keep extensions as raw name/type/data.
    #[arg(long, global = true)]
    pub raw_extensions: bool,

    /// Fail when the input has validation errors.
    #[arg(long, global = true)]
    pub strict: bool,
}

impl GlobalArgs {
    /// Parse options selected by the flags.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            try_pac_cat: !self.no_cat,
            decode_extensions: !self.raw_extensions,
            strict: self.strict,
        }
    }

    /// A parser configured by the flags.
    pub fn parser(&self) -> Parser {
        Parser::new().with_options(self.parse_options())
    }
}

/// `--notation` values.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotationArg {
    /// Identifier as written.
    #[default]
    Preserve,
    /// Category keys omitted where possible.
    Short,
    /// Every field keyed.
    Long,
}

impl From<NotationArg> for Notation {
    fn from(n: NotationArg) -> Self {
        match n {
            NotationArg::Preserve => Notation::Preserve,
            NotationArg::Short => Notation::Short,
            NotationArg::Long => Notation::Long,
        }
    }
}

/// Write a diagnostics report, with highlights marked inside `context`.
pub fn write_report(
    out: &mut dyn Write,
    messages: &[ValidationMessage],
    context: &str,
) -> std::io::Result<()> {
    writeln!(out, "{}", Report::new(messages).with_context(context))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_map_onto_options() {
        let args = GlobalArgs {
            no_cat: true,
            strict: true,
            ..GlobalArgs::default()
        };
        let o = args.parse_options();
        assert!(!o.try_pac_cat);
        assert!(o.decode_extensions);
        assert!(o.strict);
    }

    #[test]
    fn test_notation_arg() {
        assert_eq!(Notation::from(NotationArg::Long), Notation::Long);
        assert_eq!(Notation::from(NotationArg::default()), Notation::Preserve);
    }
}
