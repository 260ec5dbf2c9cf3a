use crate::engine::Address;
use std::collections::BTreeSet;

/// Breakpoint addresses, iterated in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breakpoints {
    points: BTreeSet<Address>,
}

impl Breakpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the address was not already set.
    pub fn add(&mut self, addr: Address) -> bool {
        let inserted = self.points.insert(addr);
        if inserted {
            log::debug!("breakpoint set at {:#06x}", addr);
        }
        inserted
    }

    /// Returns `true` if the address was set.
    pub fn remove(&mut self, addr: Address) -> bool {
        let removed = self.points.remove(&addr);
        if removed {
            log::debug!("breakpoint removed from {:#06x}", addr);
        }
        removed
    }

    /// Flip the breakpoint at `addr`; returns whether it is now set.
    pub fn toggle(&mut self, addr: Address) -> bool {
        if self.remove(addr) {
            false
        } else {
            self.add(addr)
        }
    }

    pub fn contains(&self, addr: Address) -> bool {
        self.points.contains(&addr)
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Address> + '_ {
        self.points.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<Address> {
        self.iter().collect()
    }
}
