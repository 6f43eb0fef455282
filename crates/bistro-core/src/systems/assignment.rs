//! Table assignment - matches waiting groups to eligible tables
//!
//! A table is eligible for a group when it is not busy, has enough free sit
//! slots, and satisfies every active preference. Among eligible tables the
//! pick is uniformly random. Failure is recoverable: the group keeps waiting.

use hecs::{Entity, World};
use rand::Rng;

use crate::components::*;
use crate::config::SimConfig;

/// Why a seating attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatError {
    /// No table on the floor satisfies the group right now
    NoEligibleTable,
    /// The chosen table is held by another group
    TableBusy,
    /// The chosen table has fewer free sit slots than the party
    NotEnoughSeats,
    /// The chosen table violates an active preference
    PreferenceMismatch,
    /// The group is not in the wait line (already seated or leaving)
    GroupNotWaiting,
}

impl std::fmt::Display for SeatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeatError::NoEligibleTable => write!(f, "no eligible table available"),
            SeatError::TableBusy => write!(f, "table is busy"),
            SeatError::NotEnoughSeats => write!(f, "not enough free seats"),
            SeatError::PreferenceMismatch => write!(f, "table does not match preferences"),
            SeatError::GroupNotWaiting => write!(f, "group is not waiting for a table"),
        }
    }
}

impl std::error::Error for SeatError {}

/// All tables currently eligible for a party of `head_count` with `prefs`
pub fn eligible_tables(world: &World, head_count: u32, prefs: &TablePrefs) -> Vec<Entity> {
    world
        .query::<(&Table, &Seating, Option<&Busy>)>()
        .iter()
        .filter(|(_, (table, seating, busy))| {
            busy.is_none() && seating.free_count() >= head_count && prefs.matches(table)
        })
        .map(|(entity, _)| entity)
        .collect()
}

/// Pick one eligible table uniformly at random, or signal that none exists
pub fn pick_table(
    world: &World,
    head_count: u32,
    prefs: &TablePrefs,
    rng: &mut impl Rng,
) -> Option<Entity> {
    let candidates = eligible_tables(world, head_count, prefs);
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.gen_range(0..candidates.len())])
}

/// Seat a group at a specific table.
///
/// Validates the same predicates as [`eligible_tables`] against the one
/// table, then: marks it busy, claims one random sit slot per member and
/// walks each member there, moves the group to `Seated`, and cancels the
/// boredom clock.
pub fn seat_group(
    world: &mut World,
    config: &SimConfig,
    group_entity: Entity,
    table_entity: Entity,
    now: f64,
    rng: &mut impl Rng,
) -> Result<(), SeatError> {
    let (head_count, prefs, members) = match world.get::<&Group>(group_entity) {
        Ok(group) => (group.head_count(), group.prefs, group.members.clone()),
        Err(_) => return Err(SeatError::NoEligibleTable),
    };

    match world.get::<&Dining>(group_entity) {
        Ok(dining) if dining.phase == DiningPhase::Waiting => {}
        _ => return Err(SeatError::GroupNotWaiting),
    }

    if world.get::<&Busy>(table_entity).is_ok() {
        return Err(SeatError::TableBusy);
    }

    let table = match world.get::<&Table>(table_entity) {
        Ok(table) => *table,
        Err(_) => return Err(SeatError::NoEligibleTable),
    };
    if !prefs.matches(&table) {
        return Err(SeatError::PreferenceMismatch);
    }

    // Claim a seat per member; capacity is checked up front so claims cannot
    // run dry partway
    let mut seats = Vec::with_capacity(members.len());
    {
        let mut seating = match world.get::<&mut Seating>(table_entity) {
            Ok(seating) => seating,
            Err(_) => return Err(SeatError::NoEligibleTable),
        };
        if seating.free_count() < head_count {
            return Err(SeatError::NotEnoughSeats);
        }
        for _ in 0..members.len() {
            if let Some(seat) = seating.claim(rng) {
                seats.push(seat);
            }
        }
    }

    for (&member, &seat) in members.iter().zip(seats.iter()) {
        let _ = world.insert_one(member, Movement::to(seat, config.walk_speed));
    }

    let _ = world.insert_one(table_entity, Busy { group: group_entity });
    let _ = world.remove_one::<Patience>(group_entity);

    if let Ok(mut dining) = world.get::<&mut Dining>(group_entity) {
        dining.phase = DiningPhase::Seated {
            table: table_entity,
        };
        dining.since = now;
    }

    Ok(())
}
