//! Table-related components: Table, Seating, Busy, TableListing.

use hecs::Entity;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::common::Vec2;
use super::customers::FoodType;

/// Table component - static attributes of one table on the floor
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Table {
    /// Display number, 1-based, assigned in floor order
    pub number: u32,
    /// Satisfies groups that asked for a reserved table
    pub reserved: bool,
    /// Food this table serves, if it is food-specific
    pub food: Option<FoodType>,
}

/// Seating component - the sit-slot pool of a table.
///
/// Slots are consumed one per seated member and all restored together when
/// the group leaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seating {
    /// Seat positions on the floor, fixed for the session
    pub slots: Vec<Vec2>,
    /// Indices into `slots` that are currently unoccupied
    free: Vec<usize>,
}

impl Seating {
    pub fn new(slots: Vec<Vec2>) -> Self {
        let free = (0..slots.len()).collect();
        Self { slots, free }
    }

    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn free_count(&self) -> u32 {
        self.free.len() as u32
    }

    /// Claim a random free slot, returning its position
    pub fn claim(&mut self, rng: &mut impl Rng) -> Option<Vec2> {
        if self.free.is_empty() {
            return None;
        }
        let pick = rng.gen_range(0..self.free.len());
        let slot = self.free.swap_remove(pick);
        Some(self.slots[slot])
    }

    /// Restore every slot (the group left)
    pub fn release_all(&mut self) {
        self.free = (0..self.slots.len()).collect();
    }
}

/// Busy component - present on a table only while a group holds it
#[derive(Debug, Clone, Copy)]
pub struct Busy {
    pub group: Entity,
}

/// Static description of a table, used by floor generation and listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    pub position: Vec2,
    /// Seat offsets relative to `position`
    pub seats: Vec<Vec2>,
    #[serde(default)]
    pub reserved: bool,
    #[serde(default)]
    pub food: Option<FoodType>,
}

impl TableSpec {
    /// Seat positions in floor coordinates
    pub fn seat_positions(&self) -> Vec<Vec2> {
        self.seats.iter().map(|&s| self.position + s).collect()
    }
}

/// TableListing component - a purchasable table slot.
///
/// Listings form a chain: buying one reveals the next. The purchase flag is
/// persisted in the key-value store under `id`.
#[derive(Debug, Clone)]
pub struct TableListing {
    /// Persistence key, e.g. "TABLE_LEVEL1_1"
    pub id: String,
    pub price: i64,
    pub spec: TableSpec,
    /// Hidden listings cannot be purchased until their predecessor is
    pub available: bool,
    pub purchased: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seating(n: usize) -> Seating {
        Seating::new((0..n).map(|i| Vec2::new(i as f32, 0.0)).collect())
    }

    #[test]
    fn test_seating_claim_consumes_slots() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seats = seating(3);
        assert_eq!(seats.free_count(), 3);

        let mut claimed = Vec::new();
        for _ in 0..3 {
            claimed.push(seats.claim(&mut rng).unwrap());
        }
        assert_eq!(seats.free_count(), 0);
        assert!(seats.claim(&mut rng).is_none());

        // Each claim returned a distinct seat
        claimed.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap());
        claimed.dedup_by(|a, b| a.x == b.x);
        assert_eq!(claimed.len(), 3);
    }

    #[test]
    fn test_seating_release_restores_all() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seats = seating(4);
        seats.claim(&mut rng);
        seats.claim(&mut rng);
        assert_eq!(seats.free_count(), 2);

        seats.release_all();
        assert_eq!(seats.free_count(), 4);
    }

    #[test]
    fn test_spec_seat_positions_are_offsets() {
        let spec = TableSpec {
            position: Vec2::new(10.0, 5.0),
            seats: vec![Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)],
            reserved: false,
            food: None,
        };
        let positions = spec.seat_positions();
        assert_eq!(positions[0], Vec2::new(9.0, 5.0));
        assert_eq!(positions[1], Vec2::new(11.0, 5.0));
    }
}
