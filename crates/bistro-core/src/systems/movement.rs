//! Movement system - walks entities with a Movement component toward their targets

use hecs::{Entity, World};

use crate::components::{Movement, Position};

/// Arrival radius in meters
const ARRIVE_EPSILON: f32 = 0.05;

/// Advance every walking entity; remove Movement on arrival
pub fn movement_system(world: &mut World, delta_seconds: f32) {
    let mut arrived: Vec<Entity> = Vec::new();

    for (entity, (pos, movement)) in world.query_mut::<(&mut Position, &Movement)>() {
        let diff = movement.target - pos.0;
        let distance = diff.length();
        let step = movement.speed * delta_seconds;

        if distance < ARRIVE_EPSILON || step >= distance {
            pos.0 = movement.target;
            arrived.push(entity);
        } else {
            pos.0 = pos.0 + diff * (step / distance);
        }
    }

    for entity in arrived {
        let _ = world.remove_one::<Movement>(entity);
    }
}

/// True once an entity has no pending walk order
pub fn has_arrived(world: &World, entity: Entity) -> bool {
    world.get::<&Movement>(entity).is_err()
}
