//! Arena configuration parameters.

use crate::align::ALIGNMENT;
use crate::error::{ArenaError, Result};
use crate::region::host_page_size;

/// Configuration for constructing an arena.
///
/// Validated at construction; the arena copies what it needs and never
/// consults the config again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Usable bytes requested, excluding the in-region header.
    ///
    /// The arena rounds header plus capacity up to a whole page, so the
    /// usable space is at least this much.
    pub capacity: usize,

    /// Page size to round capacities to.
    ///
    /// `None` queries the host once at construction. An explicit value must
    /// be a power of two no smaller than the allocation alignment.
    pub page_size: Option<usize>,
}

impl ArenaConfig {
    /// Default usable capacity: 64 KiB.
    pub const DEFAULT_CAPACITY: usize = 64 * 1024;

    /// Create a config for the given usable capacity, using the host page size.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            page_size: None,
        }
    }

    /// Override the page size instead of querying the host.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(ArenaError::ZeroCapacity);
        }
        if let Some(page_size) = self.page_size {
            if !page_size.is_power_of_two() || page_size < ALIGNMENT {
                return Err(ArenaError::InvalidPageSize(page_size));
            }
        }
        Ok(())
    }

    /// The page size the arena will use.
    pub(crate) fn resolved_page_size(&self) -> usize {
        self.page_size.unwrap_or_else(host_page_size)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_is_64k() {
        let config = ArenaConfig::default();
        assert_eq!(config.capacity, 64 * 1024);
        assert!(config.page_size.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            ArenaConfig::new(0).validate(),
            Err(ArenaError::ZeroCapacity)
        ));
    }

    #[test]
    fn page_size_must_be_power_of_two() {
        let config = ArenaConfig::new(1024).with_page_size(3000);
        assert!(matches!(
            config.validate(),
            Err(ArenaError::InvalidPageSize(3000))
        ));
        let config = ArenaConfig::new(1024).with_page_size(4);
        assert!(config.validate().is_err());
        let config = ArenaConfig::new(1024).with_page_size(16 * 1024);
        assert!(config.validate().is_ok());
        assert_eq!(config.resolved_page_size(), 16 * 1024);
    }
}
