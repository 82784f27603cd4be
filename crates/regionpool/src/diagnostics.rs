//! Usage statistics for instrumented arenas.
//!
//! [`Diagnostics`] is an [`ArenaObserver`] that counts allocations, tracks
//! the peak cursor and the bytes lost to alignment padding, and remembers
//! where and when its arena was built. Attach it with
//! [`Arena::with_diagnostics`](crate::Arena::with_diagnostics).

use std::fmt;
use std::panic::Location;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::header::HEADER_SIZE;
use crate::observer::ArenaObserver;

/// Counters and provenance for one arena.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    allocations: u64,
    failed_allocations: u64,
    bytes_requested: u64,
    bytes_consumed: u64,
    resets: u64,
    resizes: u64,
    transfers: u64,
    peak_cursor: usize,
    created_at: SystemTime,
    location: Option<&'static Location<'static>>,
}

impl Diagnostics {
    /// Create zeroed diagnostics.
    pub fn new() -> Self {
        Self {
            allocations: 0,
            failed_allocations: 0,
            bytes_requested: 0,
            bytes_consumed: 0,
            resets: 0,
            resizes: 0,
            transfers: 0,
            peak_cursor: HEADER_SIZE,
            created_at: SystemTime::now(),
            location: None,
        }
    }

    /// Number of successful fills.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Number of refused fills.
    pub fn failed_allocations(&self) -> u64 {
        self.failed_allocations
    }

    /// Bytes asked for by successful fills, before alignment padding.
    pub fn bytes_requested(&self) -> u64 {
        self.bytes_requested
    }

    /// Bytes actually consumed by successful fills, after alignment padding.
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    /// Number of resets.
    pub fn resets(&self) -> u64 {
        self.resets
    }

    /// Number of successful relocations.
    pub fn resizes(&self) -> u64 {
        self.resizes
    }

    /// Number of successful transfers into the arena.
    pub fn transfers(&self) -> u64 {
        self.transfers
    }

    /// Highest cursor value ever observed.
    pub fn peak_cursor(&self) -> usize {
        self.peak_cursor
    }

    /// Highest number of bytes ever in use at once.
    pub fn peak_usage(&self) -> usize {
        self.peak_cursor.saturating_sub(HEADER_SIZE)
    }

    /// When the arena was constructed.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// The call site that constructed the arena.
    pub fn location(&self) -> Option<&'static Location<'static>> {
        self.location
    }

    /// Share of consumed bytes that went to alignment padding, in percent.
    #[allow(clippy::cast_precision_loss)]
    pub fn fragmentation(&self) -> f64 {
        if self.bytes_consumed == 0 {
            return 0.0;
        }
        let padding = self.bytes_consumed - self.bytes_requested;
        padding as f64 / self.bytes_consumed as f64 * 100.0
    }

    /// Mean requested size of a successful fill.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_allocation(&self) -> f64 {
        if self.allocations == 0 {
            return 0.0;
        }
        self.bytes_requested as f64 / self.allocations as f64
    }

    /// Build a report against the arena's current capacity and cursor.
    #[allow(clippy::cast_precision_loss)]
    pub fn report(&self, capacity: usize, cursor: usize) -> DiagnosticsReport {
        let used_bytes = cursor.saturating_sub(HEADER_SIZE);
        let usable_bytes = capacity.saturating_sub(HEADER_SIZE);
        let percent_used = if usable_bytes == 0 {
            0.0
        } else {
            used_bytes as f64 / usable_bytes as f64 * 100.0
        };
        DiagnosticsReport {
            created_at_unix: self
                .created_at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            location: self
                .location
                .map_or_else(|| "unknown".to_string(), ToString::to_string),
            allocations: self.allocations,
            failed_allocations: self.failed_allocations,
            bytes_requested: self.bytes_requested,
            bytes_consumed: self.bytes_consumed,
            used_bytes,
            usable_bytes,
            percent_used,
            peak_bytes: self.peak_usage(),
            average_allocation: self.average_allocation(),
            fragmentation: self.fragmentation(),
            resets: self.resets,
            resizes: self.resizes,
            transfers: self.transfers,
        }
    }

    fn observe_cursor(&mut self, cursor: usize) {
        self.peak_cursor = self.peak_cursor.max(cursor);
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaObserver for Diagnostics {
    fn on_create(
        &mut self,
        _capacity: usize,
        cursor: usize,
        created_at: SystemTime,
        location: &'static Location<'static>,
    ) {
        self.created_at = created_at;
        self.location = Some(location);
        self.peak_cursor = cursor;
    }

    fn on_fill(&mut self, requested: usize, aligned: usize, cursor: usize) {
        self.allocations += 1;
        self.bytes_requested += requested as u64;
        self.bytes_consumed += aligned as u64;
        self.observe_cursor(cursor);
    }

    fn on_fill_failed(&mut self, _requested: usize) {
        self.failed_allocations += 1;
    }

    fn on_reset(&mut self) {
        self.resets += 1;
    }

    fn on_resize(&mut self, _old_capacity: usize, _new_capacity: usize) {
        self.resizes += 1;
    }

    fn on_transfer(&mut self, _bytes: usize, cursor: usize) {
        self.transfers += 1;
        self.observe_cursor(cursor);
    }
}

/// Point-in-time summary of an instrumented arena.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsReport {
    /// Construction time, Unix epoch seconds.
    pub created_at_unix: u64,
    /// Construction call site (`file:line:column`).
    pub location: String,
    /// Successful fills.
    pub allocations: u64,
    /// Refused fills.
    pub failed_allocations: u64,
    /// Bytes requested before padding.
    pub bytes_requested: u64,
    /// Bytes consumed after padding.
    pub bytes_consumed: u64,
    /// Bytes currently in use.
    pub used_bytes: usize,
    /// Bytes available to allocations in total.
    pub usable_bytes: usize,
    /// `used_bytes` as a share of `usable_bytes`.
    pub percent_used: f64,
    /// Highest `used_bytes` ever observed.
    pub peak_bytes: usize,
    /// Mean requested size per fill.
    pub average_allocation: f64,
    /// Padding as a share of consumed bytes.
    pub fragmentation: f64,
    /// Resets performed.
    pub resets: u64,
    /// Relocations performed.
    pub resizes: u64,
    /// Transfers received.
    pub transfers: u64,
}

impl fmt::Display for DiagnosticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Arena diagnostics")?;
        writeln!(
            f,
            "  created:        {} (unix) at {}",
            self.created_at_unix, self.location
        )?;
        writeln!(
            f,
            "  allocations:    {} ({} failed)",
            self.allocations, self.failed_allocations
        )?;
        writeln!(
            f,
            "  requested:      {} bytes ({} consumed)",
            self.bytes_requested, self.bytes_consumed
        )?;
        writeln!(
            f,
            "  usage:          {} / {} bytes ({:.2}%)",
            self.used_bytes, self.usable_bytes, self.percent_used
        )?;
        writeln!(f, "  peak:           {} bytes", self.peak_bytes)?;
        writeln!(
            f,
            "  avg allocation: {:.2} bytes",
            self.average_allocation
        )?;
        writeln!(f, "  fragmentation:  {:.2}%", self.fragmentation)?;
        write!(
            f,
            "  resets: {}, resizes: {}, transfers: {}",
            self.resets, self.resizes, self.transfers
        )
    }
}
