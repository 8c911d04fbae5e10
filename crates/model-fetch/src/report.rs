//! Failure lines printed by the `model-fetch` binary.

use std::fmt::Display;
use std::io::{self, Write};

use crate::fetch::FetchError;

/// Closing line of every failure report.
pub const REMEDIATION_HINT: &str = "Please check your internet connection and try again.";

/// Write `headline` followed by the remediation hint.
pub fn write_failure(out: &mut impl Write, headline: impl Display) -> io::Result<()> {
    writeln!(out, "{}", headline)?;
    writeln!(out, "{}", REMEDIATION_HINT)
}

/// Headline for a failed download run, naming the repository when known.
pub fn download_headline(err: &FetchError) -> String {
    format!(
        "Error downloading {}: {}",
        err.repo().unwrap_or("repositories"),
        err
    )
}
