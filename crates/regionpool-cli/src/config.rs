//! Command-line configuration from flags and environment.

use clap::{Args, Parser, Subcommand};

use regionpool::TransferMode;

/// Exercise a virtual-memory region arena and report on it.
#[derive(Parser, Debug)]
#[command(name = "regionpool", version, about)]
pub struct AppConfig {
    /// Scenario to run.
    #[command(subcommand)]
    pub command: Command,

    /// Print the diagnostics report as JSON.
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available scenarios.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fill fixed-size chunks until the arena is exhausted, then verify them.
    Stress(StressArgs),
    /// Write a marker, relocate the arena, and check the marker survived.
    Resize(ResizeArgs),
    /// Copy one arena's contents into another.
    Transfer(TransferArgs),
}

/// Options shared by every scenario.
#[derive(Args, Debug, Clone)]
pub struct ArenaArgs {
    /// Usable arena capacity (e.g. "4096", "4K", "8M").
    #[arg(long, default_value = "4K", env = "REGIONPOOL_CAPACITY", value_parser = parse_size)]
    pub capacity: usize,

    /// Page size override instead of the host's (e.g. "16K").
    #[arg(long, env = "REGIONPOOL_PAGE_SIZE", value_parser = parse_size)]
    pub page_size: Option<usize>,
}

/// Options for `stress`.
#[derive(Args, Debug, Clone)]
pub struct StressArgs {
    #[command(flatten)]
    pub arena: ArenaArgs,

    /// Bytes per allocation.
    #[arg(long, default_value = "32", value_parser = parse_size)]
    pub chunk: usize,

    /// Upper bound on allocation attempts.
    #[arg(long, default_value = "100000")]
    pub max_iterations: usize,
}

/// Options for `resize`.
#[derive(Args, Debug, Clone)]
pub struct ResizeArgs {
    #[command(flatten)]
    pub arena: ArenaArgs,

    /// Target capacity (e.g. "64K").
    #[arg(long, value_parser = parse_size)]
    pub to: usize,
}

/// Options for `transfer`.
#[derive(Args, Debug, Clone)]
pub struct TransferArgs {
    #[command(flatten)]
    pub arena: ArenaArgs,

    /// `overwrite` or `append`.
    #[arg(long, default_value = "append")]
    pub mode: TransferMode,

    /// Bytes to place in the source arena.
    #[arg(long, default_value = "256", value_parser = parse_size)]
    pub source_bytes: usize,

    /// Bytes already in the destination arena.
    #[arg(long, default_value = "128", value_parser = parse_size)]
    pub dest_bytes: usize,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

/// Parse a size string such as "4096", "4K", "8M", "1G" or "512B".
pub fn parse_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("size must not be empty".to_string());
    }

    let upper = s.to_ascii_uppercase();
    let (num_str, multiplier) = if let Some(n) = upper.strip_suffix('G') {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix('M') {
        (n, 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix('K') {
        (n, 1024)
    } else if let Some(n) = upper.strip_suffix('B') {
        (n, 1)
    } else {
        (upper.as_str(), 1)
    };

    let value: usize = num_str
        .trim()
        .parse()
        .map_err(|e| format!("invalid size {s:?}: {e}"))?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size {s:?} overflows"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_size_values() {
        assert_eq!(parse_size("4096"), Ok(4096));
        assert_eq!(parse_size("4K"), Ok(4096));
        assert_eq!(parse_size("4k"), Ok(4096));
        assert_eq!(parse_size("8M"), Ok(8 * 1024 * 1024));
        assert_eq!(parse_size("1G"), Ok(1024 * 1024 * 1024));
        assert_eq!(parse_size("512B"), Ok(512));
    }

    #[test]
    fn parse_size_invalid() {
        assert!(parse_size("").is_err());
        assert!(parse_size("abc").is_err());
        assert!(parse_size("-1K").is_err());
    }

    #[test]
    fn parse_subcommands() {
        let config = AppConfig::try_parse_from([
            "regionpool",
            "transfer",
            "--mode",
            "overwrite",
            "--capacity",
            "8K",
        ])
        .unwrap();
        match config.command {
            Command::Transfer(args) => {
                assert_eq!(args.mode, TransferMode::Overwrite);
                assert_eq!(args.arena.capacity, 8 * 1024);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(!config.json);
    }

    #[test]
    fn resize_requires_target() {
        assert!(AppConfig::try_parse_from(["regionpool", "resize"]).is_err());
    }
}
