//! Once-per-second advancement of running counters.
//!
//! The engine only counts ticks and says when a save is due; wall-clock
//! scheduling belongs to whoever calls [`TickEngine::tick`].

use crate::types::Item;

pub const DEFAULT_SAVE_INTERVAL: u32 = 30;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Number of active items that were advanced.
    pub advanced: usize,
    /// True when this tick lands on the save cadence.
    pub save_due: bool,
}

#[derive(Debug, Clone)]
pub struct TickEngine {
    ticks: u64,
    save_interval: u32,
}

impl Default for TickEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_INTERVAL)
    }
}

impl TickEngine {
    /// An interval of 0 is treated as 1 (save every tick).
    pub fn new(save_interval: u32) -> Self {
        Self {
            ticks: 0,
            save_interval: save_interval.max(1),
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn save_interval(&self) -> u32 {
        self.save_interval
    }

    pub fn tick(&mut self, items: &mut [Item]) -> TickOutcome {
        let mut advanced = 0;
        for item in items.iter_mut().filter(|i| i.is_active) {
            item.advance();
            advanced += 1;
        }
        self.ticks += 1;
        TickOutcome {
            advanced,
            save_due: self.ticks % u64::from(self.save_interval) == 0,
        }
    }
}
