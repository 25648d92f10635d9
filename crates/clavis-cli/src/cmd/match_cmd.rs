use crate::output::{OutputMode, render};
use clap::Args;
use clavis_core::matcher::normalized_names_match;
use clavis_core::normalize::normalize;
use serde::Serialize;

#[derive(Args, Debug)]
#[command(
    about = "Test whether two names refer to the same record",
    after_help = "EXAMPLES:\n    # Author suffixes still match\n    clv match \"Inga edulis\" \"Inga edulis Mart.\"\n\n\
                  # Machine-readable output\n    clv match \"Acacia sp\" \"Acacia mangium\" --json"
)]
pub struct MatchArgs {
    /// First name.
    pub left: String,
    /// Second name.
    pub right: String,
}

#[derive(Debug, Serialize)]
pub struct MatchOutput {
    pub left: String,
    pub right: String,
    pub left_normalized: String,
    pub right_normalized: String,
    pub matched: bool,
}

pub fn run_match(args: &MatchArgs, output: OutputMode) -> anyhow::Result<()> {
    let left_normalized = normalize(&args.left);
    let right_normalized = normalize(&args.right);
    let result = MatchOutput {
        matched: normalized_names_match(&left_normalized, &right_normalized),
        left: args.left.clone(),
        right: args.right.clone(),
        left_normalized,
        right_normalized,
    };

    render(output, &result, |r, w| {
        writeln!(w, "{:?} -> {:?}", r.left, r.left_normalized)?;
        writeln!(w, "{:?} -> {:?}", r.right, r.right_normalized)?;
        writeln!(w, "{}", if r.matched { "match" } else { "no match" })
    })
}
