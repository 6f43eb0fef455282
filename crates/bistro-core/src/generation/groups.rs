//! Customer group generation - the arrival timer and party spawning

use hecs::{Entity, World};
use rand::Rng;

use crate::components::*;
use crate::config::SimConfig;
use crate::generation::FloorPlan;

/// Arrival timer. Ticked once per engine update; when a spawn attempt finds
/// the entrance blocked it is retried on the next tick, not re-rolled in place.
#[derive(Debug, Clone)]
pub struct Spawner {
    timer: f32,
    delay: f32,
}

impl Spawner {
    pub fn new(config: &SimConfig, rng: &mut impl Rng) -> Self {
        Self {
            timer: 0.0,
            delay: config.spawn_interval.sample(rng),
        }
    }

    /// Advance the timer and, when due, try to spawn one group
    pub fn tick(
        &mut self,
        world: &mut World,
        config: &SimConfig,
        floor: &FloorPlan,
        sim_time: f64,
        delta_seconds: f32,
        rng: &mut impl Rng,
    ) -> Option<Entity> {
        self.timer += delta_seconds;
        if self.timer < self.delay {
            return None;
        }

        let origin_x = floor.spawn_point.x + config.spawn_jitter_x.sample(rng);
        if entrance_blocked(world, floor, origin_x, config.spawn_separation) {
            // No available spawn position; keep the timer expired and retry
            return None;
        }

        self.timer = 0.0;
        self.delay = config.spawn_interval.sample(rng);

        let kind = roll_party_kind(config, rng);
        let prefs = roll_prefs(world, config, kind, rng);
        Some(spawn_group(world, config, floor, kind, prefs, sim_time, origin_x, rng))
    }
}

/// True if a waiting group's lead already stands too close to the spawn spot
fn entrance_blocked(world: &World, floor: &FloorPlan, origin_x: f32, separation: f32) -> bool {
    let spot = Vec2::new(origin_x, floor.spawn_point.y);

    for (_, (group, dining)) in world.query::<(&Group, &Dining)>().iter() {
        if dining.phase != DiningPhase::Waiting {
            continue;
        }
        if let Ok(pos) = world.get::<&Position>(group.lead()) {
            if pos.0.distance(&spot) < separation {
                return true;
            }
        }
    }
    false
}

/// Sequential chance cascade with a fresh roll per branch
pub fn roll_party_kind(config: &SimConfig, rng: &mut impl Rng) -> PartyKind {
    if rng.gen::<f32>() <= config.vip_chance {
        PartyKind::Vip
    } else if rng.gen::<f32>() <= config.couple_chance {
        PartyKind::Couple
    } else if rng.gen::<f32>() <= config.triple_chance {
        PartyKind::Triple
    } else if rng.gen::<f32>() <= config.quadruple_chance {
        PartyKind::Quadruple
    } else {
        PartyKind::Single
    }
}

/// Roll the group's table preferences.
///
/// Number preferences pick a random table currently on the floor; food
/// preferences only come from foods actually served on the floor. VIPs
/// always demand a reserved table.
pub fn roll_prefs(
    world: &World,
    config: &SimConfig,
    kind: PartyKind,
    rng: &mut impl Rng,
) -> TablePrefs {
    let mut prefs = TablePrefs::none();

    if kind == PartyKind::Vip {
        prefs.reserved = true;
        return prefs;
    }

    if rng.gen::<f32>() <= config.number_pref_chance {
        let numbers: Vec<u32> = world.query::<&Table>().iter().map(|(_, t)| t.number).collect();
        if !numbers.is_empty() {
            prefs.number = Some(numbers[rng.gen_range(0..numbers.len())]);
        }
    }

    if rng.gen::<f32>() <= config.reserve_pref_chance {
        prefs.reserved = true;
    }

    if rng.gen::<f32>() <= config.food_pref_chance {
        let foods: Vec<FoodType> = world
            .query::<&Table>()
            .iter()
            .filter_map(|(_, t)| t.food)
            .collect();
        if !foods.is_empty() {
            prefs.food = Some(foods[rng.gen_range(0..foods.len())]);
        }
    }

    prefs
}

/// Spawn a group at the entrance and send it walking to the wait line
pub fn spawn_group(
    world: &mut World,
    config: &SimConfig,
    floor: &FloorPlan,
    kind: PartyKind,
    prefs: TablePrefs,
    sim_time: f64,
    origin_x: f32,
    rng: &mut impl Rng,
) -> Entity {
    let head_count = kind.head_count() as usize;
    let origin = Vec2::new(origin_x, floor.spawn_point.y);
    let wait_spot = Vec2::new(origin_x, floor.wait_line.y + config.wait_jitter_y.sample(rng));

    let mut members = Vec::with_capacity(head_count);
    let mut left_filled = false;

    for i in 0..head_count {
        let offset = member_offset(i, config.follower_spacing, &mut left_filled, rng);
        let member = world.spawn((
            Position(origin + offset),
            Movement::to(wait_spot + offset, config.walk_speed),
        ));
        members.push(member);
    }

    let prize = config.prize_span(kind).sample(rng);

    world.spawn((
        Group {
            kind,
            prefs,
            prize,
            members,
        },
        Dining::waiting(sim_time),
        Patience::new(config.idle_grace, config.boredom_limit),
    ))
}

/// Standing offset for the i-th party member: lead center, then one to each
/// side, then one behind
fn member_offset(index: usize, spacing: f32, left_filled: &mut bool, rng: &mut impl Rng) -> Vec2 {
    match index {
        0 => Vec2::ZERO,
        1 => {
            let side = if rng.gen::<f32>() <= 0.5 { 1.0 } else { -1.0 };
            *left_filled = side < 0.0;
            Vec2::new(spacing * side, 0.0)
        }
        2 => Vec2::new(if *left_filled { spacing } else { -spacing }, 0.0),
        _ => Vec2::new(0.0, -spacing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{generate_floor, FloorConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (World, FloorPlan, SimConfig, StdRng) {
        let mut world = World::new();
        let plan = generate_floor(&mut world, &FloorConfig::default());
        (world, plan, SimConfig::default(), StdRng::seed_from_u64(11))
    }

    #[test]
    fn test_spawn_group_members_match_head_count() {
        let (mut world, plan, config, mut rng) = setup();

        let group = spawn_group(
            &mut world,
            &config,
            &plan,
            PartyKind::Triple,
            TablePrefs::none(),
            0.0,
            0.0,
            &mut rng,
        );

        let members = world.get::<&Group>(group).unwrap().members.clone();
        assert_eq!(members.len(), 3);
        for member in members {
            assert!(world.get::<&Position>(member).is_ok());
            assert!(world.get::<&Movement>(member).is_ok());
        }

        let dining = world.get::<&Dining>(group).unwrap();
        assert_eq!(dining.phase, DiningPhase::Waiting);
    }

    #[test]
    fn test_spawner_waits_out_its_delay() {
        let (mut world, plan, config, mut rng) = setup();
        let mut spawner = Spawner::new(&config, &mut rng);

        // Under the minimum delay nothing can spawn
        assert!(spawner
            .tick(&mut world, &config, &plan, 0.0, 1.0, &mut rng)
            .is_none());

        // Past the maximum delay a spawn must happen (entrance is clear)
        let spawned = spawner.tick(
            &mut world,
            &config,
            &plan,
            0.0,
            config.spawn_interval.max,
            &mut rng,
        );
        assert!(spawned.is_some());
    }

    #[test]
    fn test_blocked_entrance_defers_spawn() {
        let (mut world, plan, mut config, mut rng) = setup();
        // Remove jitter so every attempt lands on the same blocked spot
        config.spawn_jitter_x = crate::config::Span::new(0.0, 0.0);

        // Park a waiting group right on the spawn point
        let squatter = spawn_group(
            &mut world,
            &config,
            &plan,
            PartyKind::Single,
            TablePrefs::none(),
            0.0,
            0.0,
            &mut rng,
        );
        let lead = world.get::<&Group>(squatter).unwrap().lead();
        world.get::<&mut Position>(lead).unwrap().0 = plan.spawn_point;

        let mut spawner = Spawner::new(&config, &mut rng);
        assert!(spawner
            .tick(&mut world, &config, &plan, 0.0, 20.0, &mut rng)
            .is_none());

        // Clear the entrance; the already-expired timer fires next tick
        world.get::<&mut Position>(lead).unwrap().0 = Vec2::new(50.0, 50.0);
        assert!(spawner
            .tick(&mut world, &config, &plan, 0.0, 0.016, &mut rng)
            .is_some());
    }

    #[test]
    fn test_vip_always_wants_reserved() {
        let (world, _, config, mut rng) = setup();
        for _ in 0..20 {
            let prefs = roll_prefs(&world, &config, PartyKind::Vip, &mut rng);
            assert!(prefs.reserved);
            assert!(prefs.number.is_none());
        }
    }

    #[test]
    fn test_party_cascade_extremes() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut config = SimConfig::default();

        config.vip_chance = 1.0;
        assert_eq!(roll_party_kind(&config, &mut rng), PartyKind::Vip);

        config.vip_chance = 0.0;
        config.couple_chance = 0.0;
        config.triple_chance = 0.0;
        config.quadruple_chance = 0.0;
        assert_eq!(roll_party_kind(&config, &mut rng), PartyKind::Single);

        config.quadruple_chance = 1.0;
        assert_eq!(roll_party_kind(&config, &mut rng), PartyKind::Quadruple);
    }
}
