// ==============================================================================
// spawn.rs — STARTING GRID SLOT ALLOCATION
// ------------------------------------------------------------------------------
// Two columns, rows stepping back along -Z. The lowest free slot is handed out
// first; released slots are reused.
// ==============================================================================

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::scene::EntityId;

const COLUMN_SPACING: f32 = 4.0; // m between columns
const ROW_SPACING: f32 = 6.0;    // m between rows

// ---------------------------------------------
// SPAWN RESULT RETURNED TO STATE + NET
// ---------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSpawnInfo {
    pub player_id: EntityId,
    pub slot: usize,
    pub position: [f32; 3], // ground-level point; physics adds ride height
}

#[derive(Debug, Default)]
pub struct SpawnManager {
    taken: BTreeSet<usize>,
    by_player: HashMap<EntityId, usize>,
}

impl SpawnManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot_position(slot: usize) -> [f32; 3] {
        let column = (slot % 2) as f32;
        let row = (slot / 2) as f32;
        [(column - 0.5) * COLUMN_SPACING, 0.0, -row * ROW_SPACING]
    }

    /// Same player asking twice keeps the same slot.
    pub fn allocate_spawn(&mut self, player_id: &str) -> PlayerSpawnInfo {
        let slot = match self.by_player.get(player_id) {
            Some(&slot) => slot,
            None => {
                let slot = (0..).find(|s| !self.taken.contains(s)).unwrap_or(self.taken.len());
                self.taken.insert(slot);
                self.by_player.insert(player_id.to_string(), slot);
                slot
            }
        };

        PlayerSpawnInfo { player_id: player_id.to_string(), slot, position: Self::slot_position(slot) }
    }

    pub fn release(&mut self, player_id: &str) {
        if let Some(slot) = self.by_player.remove(player_id) {
            self.taken.remove(&slot);
        }
    }

    pub fn len(&self) -> usize {
        self.by_player.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_player.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_fill_in_order() {
        let mut m = SpawnManager::new();
        let a = m.allocate_spawn("a");
        let b = m.allocate_spawn("b");
        let c = m.allocate_spawn("c");
        assert_eq!((a.slot, b.slot, c.slot), (0, 1, 2));
        assert_ne!(a.position, b.position);
        assert!(c.position[2] < a.position[2]);
    }

    #[test]
    fn test_released_slot_is_reused() {
        let mut m = SpawnManager::new();
        m.allocate_spawn("a");
        m.allocate_spawn("b");
        m.release("a");
        assert_eq!(m.allocate_spawn("c").slot, 0);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_same_player_same_slot() {
        let mut m = SpawnManager::new();
        let first = m.allocate_spawn("a");
        assert_eq!(m.allocate_spawn("a"), first);
    }
}
