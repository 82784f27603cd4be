//! Scenario dispatch and execution.

use std::fmt;

use anyhow::{bail, ensure, Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use regionpool::{Arena, ArenaConfig, ArenaError, Diagnostics, DiagnosticsReport, TransferMode};

use crate::config::{AppConfig, ArenaArgs, Command, ResizeArgs, StressArgs, TransferArgs};

const MARKER: &[u8] = b"regionpool-marker";
const SOURCE_PATTERN: u8 = 0xA5;
const DEST_PATTERN: u8 = 0x5A;

/// Result of one scenario run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "scenario", rename_all = "lowercase")]
pub enum Outcome {
    /// Chunks were filled until exhaustion and verified.
    Stress {
        /// Requested bytes per chunk.
        chunk: usize,
        /// Successful allocations before exhaustion.
        allocations: usize,
        /// Region length in bytes.
        capacity: usize,
        /// Diagnostics at the end of the run.
        report: DiagnosticsReport,
    },
    /// The arena was relocated with a marker in it.
    Resize {
        /// Region length before.
        old_capacity: usize,
        /// Region length after.
        new_capacity: usize,
        /// Diagnostics at the end of the run.
        report: DiagnosticsReport,
    },
    /// One arena was copied into another.
    Transfer {
        /// Transfer mode used.
        mode: TransferMode,
        /// Bytes copied.
        copied: usize,
        /// Bytes live in the destination afterwards.
        dest_used: usize,
        /// Destination diagnostics.
        report: DiagnosticsReport,
    },
}

impl Outcome {
    /// Diagnostics attached to the outcome.
    pub fn report(&self) -> &DiagnosticsReport {
        match self {
            Self::Stress { report, .. }
            | Self::Resize { report, .. }
            | Self::Transfer { report, .. } => report,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stress {
                chunk,
                allocations,
                capacity,
                ..
            } => writeln!(
                f,
                "Completed {allocations} allocations of {chunk} bytes in a {capacity}-byte region"
            )?,
            Self::Resize {
                old_capacity,
                new_capacity,
                ..
            } => writeln!(
                f,
                "Resized {old_capacity} -> {new_capacity} bytes, marker intact"
            )?,
            Self::Transfer {
                mode,
                copied,
                dest_used,
                ..
            } => writeln!(
                f,
                "Transferred {copied} bytes ({mode}), destination now holds {dest_used} bytes"
            )?,
        }
        write!(f, "{}", self.report())
    }
}

/// Run the application.
pub fn run(config: &AppConfig) -> Result<()> {
    let outcome = execute(&config.command)?;
    if config.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{outcome}");
    }
    Ok(())
}

/// Run one scenario and return its outcome.
pub fn execute(command: &Command) -> Result<Outcome> {
    match command {
        Command::Stress(args) => run_stress(args),
        Command::Resize(args) => run_resize(args),
        Command::Transfer(args) => run_transfer(args),
    }
}

fn build_arena(args: &ArenaArgs) -> Result<Arena<Diagnostics>> {
    let mut config = ArenaConfig::new(args.capacity);
    if let Some(page_size) = args.page_size {
        config = config.with_page_size(page_size);
    }
    Arena::with_observer(config, Diagnostics::new())
        .with_context(|| format!("failed to construct a {}-byte arena", args.capacity))
}

fn run_stress(args: &StressArgs) -> Result<Outcome> {
    info!(capacity = args.arena.capacity, chunk = args.chunk, "Starting stress run");
    let mut arena = build_arena(&args.arena)?;
    let mut chunks = Vec::new();

    for i in 0..args.max_iterations {
        match arena.fill(args.chunk) {
            Ok(chunk) => {
                let stamp = stamp_for(i);
                arena.bytes_mut(&chunk)?.fill(stamp);
                chunks.push((chunk, stamp));
            }
            Err(ArenaError::OutOfCapacity { .. }) => break,
            Err(err) => return Err(err).context("allocation failed"),
        }
    }

    ensure!(!chunks.is_empty(), "no allocation of {} bytes fit", args.chunk);
    for (i, (chunk, stamp)) in chunks.iter().enumerate() {
        if arena.bytes(chunk)?.iter().any(|b| b != stamp) {
            bail!("memory corruption detected in chunk {i}");
        }
    }
    debug!(allocations = chunks.len(), "Stress chunks verified");

    Ok(Outcome::Stress {
        chunk: args.chunk,
        allocations: chunks.len(),
        capacity: arena.capacity(),
        report: arena.report(),
    })
}

fn run_resize(args: &ResizeArgs) -> Result<Outcome> {
    info!(capacity = args.arena.capacity, to = args.to, "Starting resize run");
    let mut arena = build_arena(&args.arena)?;
    let marker = arena.fill_copy(MARKER)?;
    let old_capacity = arena.capacity();

    let arena = arena.resize(args.to).map_err(|err| {
        let (_, kind) = err.into_parts();
        anyhow::Error::new(kind).context(format!("failed to resize arena to {} bytes", args.to))
    })?;

    ensure!(
        arena.bytes(&marker)?.starts_with(MARKER),
        "marker lost across resize"
    );

    Ok(Outcome::Resize {
        old_capacity,
        new_capacity: arena.capacity(),
        report: arena.report(),
    })
}

fn run_transfer(args: &TransferArgs) -> Result<Outcome> {
    info!(mode = %args.mode, "Starting transfer run");
    let mut source = build_arena(&args.arena)?;
    fill_pattern(&mut source, args.source_bytes, SOURCE_PATTERN).context("filling source")?;
    let mut dest = build_arena(&args.arena)?;
    fill_pattern(&mut dest, args.dest_bytes, DEST_PATTERN).context("filling destination")?;
    let dest_before = dest.used();

    let copied = dest
        .copy_from(&source, args.mode)
        .context("transfer failed")?;

    let live = dest.live_bytes();
    let (kept, copied_bytes) = match args.mode {
        TransferMode::Overwrite => live.split_at(0),
        TransferMode::Append => live.split_at(dest_before),
    };
    ensure!(
        kept.iter().all(|&b| b == DEST_PATTERN),
        "destination contents were not preserved"
    );
    ensure!(
        copied_bytes.len() == copied && copied_bytes.iter().all(|&b| b == SOURCE_PATTERN),
        "copied bytes do not match the source"
    );

    Ok(Outcome::Transfer {
        mode: args.mode,
        copied,
        dest_used: dest.used(),
        report: dest.report(),
    })
}

fn fill_pattern(arena: &mut Arena<Diagnostics>, bytes: usize, pattern: u8) -> Result<()> {
    if bytes == 0 {
        return Ok(());
    }
    let alloc = arena.fill(bytes)?;
    arena.bytes_mut(&alloc)?.fill(pattern);
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn stamp_for(i: usize) -> u8 {
    (i % 251) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaArgs;

    fn arena_args(capacity: usize) -> ArenaArgs {
        ArenaArgs {
            capacity,
            page_size: None,
        }
    }

    #[test]
    fn stress_fills_whole_region() {
        let outcome = execute(&Command::Stress(StressArgs {
            arena: arena_args(4096),
            chunk: 32,
            max_iterations: 100_000,
        }))
        .unwrap();
        match outcome {
            Outcome::Stress {
                allocations,
                capacity,
                report,
                ..
            } => {
                assert_eq!(allocations, (capacity - regionpool::HEADER_SIZE) / 32);
                assert_eq!(report.allocations as usize, allocations);
                assert_eq!(report.failed_allocations, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn stress_respects_iteration_cap() {
        let outcome = execute(&Command::Stress(StressArgs {
            arena: arena_args(4096),
            chunk: 8,
            max_iterations: 10,
        }))
        .unwrap();
        assert_eq!(outcome.report().allocations, 10);
        assert_eq!(outcome.report().failed_allocations, 0);
    }

    #[test]
    fn resize_grows() {
        let outcome = execute(&Command::Resize(ResizeArgs {
            arena: arena_args(4096),
            to: 64 * 1024,
        }))
        .unwrap();
        match outcome {
            Outcome::Resize {
                old_capacity,
                new_capacity,
                report,
            } => {
                assert!(new_capacity > old_capacity);
                assert_eq!(report.resizes, 1);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn resize_to_zero_is_an_error() {
        let err = execute(&Command::Resize(ResizeArgs {
            arena: arena_args(4096),
            to: 0,
        }))
        .unwrap_err();
        assert!(format!("{err:#}").contains("capacity must be non-zero"));
    }

    #[test]
    fn transfer_append_and_overwrite() {
        for (mode, expected) in [(TransferMode::Append, 384), (TransferMode::Overwrite, 256)] {
            let outcome = execute(&Command::Transfer(TransferArgs {
                arena: arena_args(4096),
                mode,
                source_bytes: 256,
                dest_bytes: 128,
            }))
            .unwrap();
            match outcome {
                Outcome::Transfer {
                    copied, dest_used, ..
                } => {
                    assert_eq!(copied, 256);
                    assert_eq!(dest_used, expected);
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let outcome = execute(&Command::Stress(StressArgs {
            arena: arena_args(4096),
            chunk: 64,
            max_iterations: 3,
        }))
        .unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["scenario"], "stress");
        assert_eq!(json["report"]["allocations"], 3);
    }
}
