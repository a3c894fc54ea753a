//! MLFQ priority levels and per-level storage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Priority levels of the multi-level feedback queue, ordered from most to
/// least favoured.
///
/// The ordering is stable so the scheduler can rely on integer indexes
/// instead of branching on specific labels. A record's level is an attribute
/// it carries; it has no meaning while the record is in the CPU slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    L0,
    L1,
    L2,
}

impl Level {
    /// Ordered list of all levels (highest priority first) for iteration.
    pub const ALL: [Level; 3] = [Level::L0, Level::L1, Level::L2];

    /// Stable index for level based arrays.
    pub const fn index(self) -> usize {
        match self {
            Level::L0 => 0,
            Level::L1 => 1,
            Level::L2 => 2,
        }
    }

    /// The level a process lands on after exhausting its quantum.
    ///
    /// Saturates at the lowest level: a process already on [`Level::L2`]
    /// stays there.
    pub const fn demoted(self) -> Level {
        match self {
            Level::L0 => Level::L1,
            Level::L1 | Level::L2 => Level::L2,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Level::L0 => "L0",
            Level::L1 => "L1",
            Level::L2 => "L2",
        };
        write!(f, "{label}")
    }
}

/// Helper structure wrapping a value per [`Level`].
///
/// Used for the MLFQ queue array and the per-level quantum table. As long as
/// [`Level::ALL`] stays in sync, call sites iterate dynamically and never
/// hard-code the level count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTable<T> {
    values: Vec<T>,
}

impl<T> LevelTable<T> {
    /// Build a table by executing a closure for each level in
    /// [`Level::ALL`] order.
    pub fn from_fn(mut f: impl FnMut(Level) -> T) -> Self {
        let mut values = Vec::with_capacity(Level::ALL.len());
        for level in Level::ALL {
            values.push(f(level));
        }
        LevelTable { values }
    }

    /// Build a table from a vector ordered according to [`Level::ALL`].
    ///
    /// # Panics
    /// Panics if `values.len() != Level::ALL.len()`.
    pub fn from_vec(values: Vec<T>) -> Self {
        assert!(
            values.len() == Level::ALL.len(),
            "level table expects {} entries, got {}",
            Level::ALL.len(),
            values.len()
        );
        LevelTable { values }
    }

    /// Borrow the value for a given level.
    pub fn get(&self, level: Level) -> &T {
        &self.values[level.index()]
    }

    /// Mutably borrow the value for a given level.
    pub fn get_mut(&mut self, level: Level) -> &mut T {
        &mut self.values[level.index()]
    }
}

impl<T> Index<Level> for LevelTable<T> {
    type Output = T;

    fn index(&self, index: Level) -> &Self::Output {
        self.get(index)
    }
}

impl<T> IndexMut<Level> for LevelTable<T> {
    fn index_mut(&mut self, index: Level) -> &mut Self::Output {
        self.get_mut(index)
    }
}
