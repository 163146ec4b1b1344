use serde::{Deserialize, Serialize};
use soa_core::Direction;

/// Structure-of-arrays storage for one agent species. Deleted slots go on a
/// free-list and are handed out again by `allocate` until `defrag` packs the
/// live agents to the front.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentPool {
    /// Cell index the agent occupies
    pub position: Vec<u32>,
    pub egg_timer: Vec<u32>,
    /// Always 0 for fish
    pub energy: Vec<u32>,
    /// Move requested during the current phase
    pub target: Vec<Option<Direction>>,
    pub alive: Vec<bool>,
    free: Vec<u32>,
}

impl AgentPool {
    /// Store a new agent at `position`, reusing a freed slot when one exists
    pub fn allocate(&mut self, position: u32, energy: u32) -> u32 {
        if let Some(slot) = self.free.pop() {
            let i = slot as usize;
            self.position[i] = position;
            self.egg_timer[i] = 0;
            self.energy[i] = energy;
            self.target[i] = None;
            self.alive[i] = true;
            return slot;
        }

        let slot = self.alive.len() as u32;
        self.position.push(position);
        self.egg_timer.push(0);
        self.energy.push(energy);
        self.target.push(None);
        self.alive.push(true);
        slot
    }

    /// Mark `slot` dead and queue it for reuse. Releasing twice is a no-op.
    pub fn release(&mut self, slot: u32) {
        let i = slot as usize;
        if self.alive[i] {
            self.alive[i] = false;
            self.target[i] = None;
            self.free.push(slot);
        }
    }

    /// Number of slots, live or not
    pub fn capacity(&self) -> usize {
        self.alive.len()
    }

    pub fn live_count(&self) -> usize {
        self.alive.len() - self.free.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Columns share one length and the free-list holds each dead slot once
    pub fn is_well_formed(&self) -> bool {
        let n = self.alive.len();
        let aligned = [
            self.position.len(),
            self.egg_timer.len(),
            self.energy.len(),
            self.target.len(),
        ]
        .iter()
        .all(|&len| len == n);
        if !aligned {
            return false;
        }

        let mut listed = vec![false; n];
        for &slot in &self.free {
            let i = slot as usize;
            if i >= n || self.alive[i] || listed[i] {
                return false;
            }
            listed[i] = true;
        }
        self.free.len() == self.alive.iter().filter(|&&a| !a).count()
    }

    /// Snapshot of the live slots in slot order
    pub fn live_slots(&self) -> Vec<u32> {
        self.alive
            .iter()
            .enumerate()
            .filter(|&(_, &a)| a)
            .map(|(i, _)| i as u32)
            .collect()
    }

    /// Pack live agents into slots `0..live_count` preserving their order.
    /// Returns the old-slot -> new-slot mapping (`None` for dead slots).
    pub fn defrag(&mut self) -> Vec<Option<u32>> {
        let mut remap = vec![None; self.alive.len()];
        let mut next = 0usize;

        for old in 0..self.alive.len() {
            if !self.alive[old] {
                continue;
            }
            if old != next {
                self.position[next] = self.position[old];
                self.egg_timer[next] = self.egg_timer[old];
                self.energy[next] = self.energy[old];
                self.target[next] = self.target[old];
                self.alive[next] = true;
            }
            remap[old] = Some(next as u32);
            next += 1;
        }

        self.position.truncate(next);
        self.egg_timer.truncate(next);
        self.energy.truncate(next);
        self.target.truncate(next);
        self.alive.truncate(next);
        self.free.clear();
        remap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_released_slots_are_reused() {
        let mut pool = AgentPool::default();
        let a = pool.allocate(10, 0);
        let b = pool.allocate(11, 0);
        pool.release(a);
        assert_eq!(pool.live_count(), 1);

        let c = pool.allocate(12, 3);
        assert_eq!(c, a);
        assert_eq!(pool.capacity(), 2);
        assert_eq!(pool.position[c as usize], 12);
        assert_eq!(pool.energy[c as usize], 3);
        assert_eq!(pool.live_slots(), vec![a, b]);
    }

    #[test]
    fn test_double_release_is_ignored() {
        let mut pool = AgentPool::default();
        let a = pool.allocate(0, 0);
        pool.release(a);
        pool.release(a);
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.live_count(), 0);
    }

    #[test]
    fn test_well_formed_detects_corruption() {
        let mut pool = AgentPool::default();
        for cell in 0..3 {
            pool.allocate(cell, 0);
        }
        pool.release(1);
        assert!(pool.is_well_formed());

        let mut short = pool.clone();
        short.egg_timer.pop();
        assert!(!short.is_well_formed());

        let mut leaked = pool.clone();
        leaked.alive[2] = false;
        assert!(!leaked.is_well_formed());

        let mut live_on_free_list = pool.clone();
        live_on_free_list.alive[1] = true;
        assert!(!live_on_free_list.is_well_formed());
    }

    #[test]
    fn test_defrag_packs_and_remaps() {
        let mut pool = AgentPool::default();
        for cell in 0..5 {
            pool.allocate(cell * 10, cell);
        }
        pool.release(0);
        pool.release(3);

        let remap = pool.defrag();
        assert_eq!(remap, vec![None, Some(0), Some(1), None, Some(2)]);
        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.free_count(), 0);
        assert_eq!(pool.position, vec![10, 20, 40]);
        assert_eq!(pool.energy, vec![1, 2, 4]);
    }
}
