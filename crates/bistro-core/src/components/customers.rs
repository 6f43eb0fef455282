//! Customer-related components: Group, PartyKind, TablePrefs, Dining, Patience.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::tables::Table;

/// Size class of an arriving party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartyKind {
    Single,
    Couple,
    Triple,
    Quadruple,
    /// High-paying solo guest; always demands a reserved table
    Vip,
}

impl PartyKind {
    /// Number of people in the party (lead plus followers)
    pub fn head_count(&self) -> u32 {
        match self {
            PartyKind::Single | PartyKind::Vip => 1,
            PartyKind::Couple => 2,
            PartyKind::Triple => 3,
            PartyKind::Quadruple => 4,
        }
    }
}

/// What kind of food a table serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoodType {
    Pizza,
    Burger,
    Fish,
    IceCream,
    Coffee,
    Sandwich,
}

/// Optional table preferences rolled at spawn time.
///
/// Preferences are conjunctive: every active preference must hold on a
/// candidate table before it is eligible for the group.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TablePrefs {
    /// Only accept the table with this number
    pub number: Option<u32>,
    /// Only accept reserved tables
    pub reserved: bool,
    /// Only accept tables serving this food
    pub food: Option<FoodType>,
}

impl TablePrefs {
    pub fn none() -> Self {
        Self::default()
    }

    /// Check every active preference against a table
    pub fn matches(&self, table: &Table) -> bool {
        if let Some(number) = self.number {
            if table.number != number {
                return false;
            }
        }
        if self.reserved && !table.reserved {
            return false;
        }
        if let Some(food) = self.food {
            if table.food != Some(food) {
                return false;
            }
        }
        true
    }

    /// True if any preference is active
    pub fn is_any(&self) -> bool {
        self.number.is_some() || self.reserved || self.food.is_some()
    }
}

/// Group component - one arriving customer party.
///
/// The group entity owns its member entities in arrival order (lead first);
/// members carry only Position/Movement and never point back at the group.
#[derive(Debug, Clone)]
pub struct Group {
    pub kind: PartyKind,
    pub prefs: TablePrefs,
    /// Money credited to the player when the group finishes eating
    pub prize: i64,
    pub members: Vec<Entity>,
}

impl Group {
    pub fn head_count(&self) -> u32 {
        self.kind.head_count()
    }

    pub fn lead(&self) -> Entity {
        self.members[0]
    }
}

/// Lifecycle phase of a group
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiningPhase {
    /// In the wait line, boredom clock running
    Waiting,
    /// At a table, waiting out the seating delay
    Seated { table: Entity },
    /// Eating for `duration` seconds
    Eating { table: Entity, duration: f32 },
    /// Walking out; despawned once every member reaches the exit
    Leaving { exit: super::common::Vec2 },
}

/// Dining component - tracks a group's current phase and when it began
#[derive(Debug, Clone, Copy)]
pub struct Dining {
    pub phase: DiningPhase,
    /// Simulation time the current phase started
    pub since: f64,
}

impl Dining {
    pub fn waiting(now: f64) -> Self {
        Self {
            phase: DiningPhase::Waiting,
            since: now,
        }
    }

    pub fn elapsed(&self, now: f64) -> f32 {
        (now - self.since) as f32
    }
}

/// Patience component - the boredom clock of a waiting group.
///
/// A group tolerates `grace` seconds of settling in before the boredom clock
/// starts, then leaves unseated once another `limit` seconds pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Patience {
    pub grace: f32,
    pub limit: f32,
    pub waited: f32,
}

impl Patience {
    pub fn new(grace: f32, limit: f32) -> Self {
        Self {
            grace,
            limit,
            waited: 0.0,
        }
    }

    /// Advance the clock; returns true once patience has run out
    pub fn tick(&mut self, delta_seconds: f32) -> bool {
        self.waited += delta_seconds;
        self.is_exhausted()
    }

    pub fn is_exhausted(&self) -> bool {
        self.waited >= self.grace + self.limit
    }

    /// Boredom progress in 0.0..=1.0 once past the grace period
    pub fn boredom(&self) -> f32 {
        ((self.waited - self.grace) / self.limit).clamp(0.0, 1.0)
    }
}
