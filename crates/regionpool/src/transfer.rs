//! Copying live data between arenas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::arena::Arena;
use crate::error::{ArenaError, Result};
use crate::header::HEADER_SIZE;
use crate::observer::ArenaObserver;

/// Where transferred bytes land in the destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// Replace the destination's contents.
    Overwrite,
    /// Place the bytes after the destination's existing contents.
    Append,
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overwrite => write!(f, "overwrite"),
            Self::Append => write!(f, "append"),
        }
    }
}

impl FromStr for TransferMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(Self::Overwrite),
            "append" => Ok(Self::Append),
            other => Err(format!("unknown transfer mode: {other}")),
        }
    }
}

impl<O: ArenaObserver> Arena<O> {
    /// Copy every live byte of `source` into this arena.
    ///
    /// In [`TransferMode::Overwrite`] the bytes land right after the header,
    /// replacing the current contents and invalidating issued allocations.
    /// In [`TransferMode::Append`] they land at the current cursor.
    ///
    /// Capacity is checked before anything changes: if the data does not
    /// fit, this arena is left exactly as it was. `source` is never
    /// modified. Returns the number of bytes copied.
    pub fn copy_from<S: ArenaObserver>(
        &mut self,
        source: &Arena<S>,
        mode: TransferMode,
    ) -> Result<usize> {
        if !source.is_active() {
            return Err(ArenaError::Inactive);
        }
        let data = source.live_bytes();
        let region = self.region.as_mut().ok_or(ArenaError::Inactive)?;

        let start = match mode {
            TransferMode::Overwrite => HEADER_SIZE,
            TransferMode::Append => self.cursor,
        };
        let available = region.len() - start;
        if data.len() > available {
            trace!(
                requested = data.len(),
                available,
                %mode,
                "Transfer refused"
            );
            return Err(ArenaError::OutOfCapacity {
                requested: data.len(),
                available,
            });
        }

        let generation = match mode {
            TransferMode::Overwrite => self
                .generation
                .checked_add(1)
                .ok_or(ArenaError::GenerationExhausted)?,
            TransferMode::Append => self.generation,
        };

        let end = start + data.len();
        region.as_mut_slice()[start..end].copy_from_slice(data);
        self.generation = generation;
        self.cursor = end;
        self.observer.on_transfer(data.len(), end);
        trace!(bytes = data.len(), %mode, cursor = end, "Transfer complete");
        Ok(data.len())
    }
}

/// Copy every live byte of `source` into `destination`.
///
/// Free-function form of [`Arena::copy_from`].
pub fn copy<S: ArenaObserver, D: ArenaObserver>(
    source: &Arena<S>,
    destination: &mut Arena<D>,
    mode: TransferMode,
) -> Result<usize> {
    destination.copy_from(source, mode)
}
