//! Customer lifecycle - Waiting, Seated, Eating, Leaving, and removal
//!
//! Polled once per tick. Transitions that touch money are reported as events
//! and applied by the engine, so a group's prize is credited exactly once.

use hecs::{Entity, World};
use rand::Rng;

use crate::components::*;
use crate::config::SimConfig;
use crate::generation::FloorPlan;

/// What happened to a group during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LifecycleEvent {
    /// Patience ran out before a table was found; no prize
    TimedOut { group: Entity },
    /// The group finished eating and paid
    Served { group: Entity, prize: i64 },
    /// Every member reached the exit; the group is gone
    Departed { group: Entity },
}

/// Advance every group one tick through its lifecycle
pub fn lifecycle_system(
    world: &mut World,
    config: &SimConfig,
    floor: &FloorPlan,
    sim_time: f64,
    delta_seconds: f32,
    rng: &mut impl Rng,
) -> Vec<LifecycleEvent> {
    let mut events = Vec::new();

    // Waiting: run the boredom clock
    let mut timed_out = Vec::new();
    for (entity, (dining, patience)) in world.query_mut::<(&Dining, &mut Patience)>() {
        if dining.phase != DiningPhase::Waiting {
            continue;
        }
        if patience.tick(delta_seconds) {
            timed_out.push(entity);
        }
    }
    for entity in timed_out {
        let _ = world.remove_one::<Patience>(entity);
        begin_leaving(world, entity, config, floor, sim_time, rng);
        events.push(LifecycleEvent::TimedOut { group: entity });
    }

    // Seated: start eating once the party has settled in
    let mut start_eating = Vec::new();
    for (entity, dining) in world.query::<&Dining>().iter() {
        if let DiningPhase::Seated { table } = dining.phase {
            if dining.elapsed(sim_time) >= config.seating_delay {
                start_eating.push((entity, table));
            }
        }
    }
    for (entity, table) in start_eating {
        let duration = config.eating_time.sample(rng);
        if let Ok(mut dining) = world.get::<&mut Dining>(entity) {
            dining.phase = DiningPhase::Eating { table, duration };
            dining.since = sim_time;
        }
    }

    // Eating: finish, release the table, pay
    let mut finished = Vec::new();
    for (entity, dining) in world.query::<&Dining>().iter() {
        if let DiningPhase::Eating { table, duration } = dining.phase {
            if dining.elapsed(sim_time) >= duration {
                finished.push((entity, table));
            }
        }
    }
    for (entity, table) in finished {
        release_table(world, table);
        let prize = world
            .get::<&Group>(entity)
            .map(|group| group.prize)
            .unwrap_or(0);
        begin_leaving(world, entity, config, floor, sim_time, rng);
        events.push(LifecycleEvent::Served {
            group: entity,
            prize,
        });
    }

    // Leaving: despawn once every member reached the exit
    let mut departed = Vec::new();
    for (entity, (group, dining)) in world.query::<(&Group, &Dining)>().iter() {
        if let DiningPhase::Leaving { .. } = dining.phase {
            let all_out = group
                .members
                .iter()
                .all(|&member| world.get::<&Movement>(member).is_err());
            if all_out {
                departed.push(entity);
            }
        }
    }
    for entity in departed {
        let members = world
            .get::<&Group>(entity)
            .map(|group| group.members.clone())
            .unwrap_or_default();
        for member in members {
            let _ = world.despawn(member);
        }
        let _ = world.despawn(entity);
        events.push(LifecycleEvent::Departed { group: entity });
    }

    events
}

/// Restore a table's full slot pool and clear its occupancy
pub fn release_table(world: &mut World, table: Entity) {
    if let Ok(mut seating) = world.get::<&mut Seating>(table) {
        seating.release_all();
    }
    let _ = world.remove_one::<Busy>(table);
}

/// Send a group walking to a random exit
fn begin_leaving(
    world: &mut World,
    group_entity: Entity,
    config: &SimConfig,
    floor: &FloorPlan,
    sim_time: f64,
    rng: &mut impl Rng,
) {
    let exit = floor.exits[rng.gen_range(0..floor.exits.len())];

    let members = world
        .get::<&Group>(group_entity)
        .map(|group| group.members.clone())
        .unwrap_or_default();
    for member in members {
        let _ = world.insert_one(member, Movement::to(exit, config.walk_speed));
    }

    if let Ok(mut dining) = world.get::<&mut Dining>(group_entity) {
        dining.phase = DiningPhase::Leaving { exit };
        dining.since = sim_time;
    }
}
