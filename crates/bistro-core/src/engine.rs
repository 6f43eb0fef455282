//! Simulation engine - main entry point for running the simulation

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::components::*;
use crate::config::SimConfig;
use crate::generation::{generate_floor, spawn_group, FloorConfig, FloorPlan, Spawner};
use crate::persistence::{KvStore, StoreError};
use crate::systems::*;

/// Scene-transition collaborator. Invoked with the next level's name once
/// every table listing on the current floor has been purchased.
pub trait SceneTransition {
    fn load(&mut self, level: &str);
}

/// Invalid tuning or floor data caught at construction
#[derive(Debug)]
pub enum BuildError {
    Config(String),
    Floor(String),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Config(msg) => write!(f, "invalid simulation config: {}", msg),
            BuildError::Floor(msg) => write!(f, "invalid floor config: {}", msg),
        }
    }
}

impl std::error::Error for BuildError {}

/// Main simulation engine
pub struct Simulation {
    /// ECS world containing all entities
    pub world: World,
    config: SimConfig,
    floor: FloorPlan,
    spawner: Spawner,
    store: Box<dyn KvStore>,
    scene: Option<Box<dyn SceneTransition>>,
    rng: StdRng,
    /// Simulation time in seconds since start
    sim_time: f64,
    time_scale: f32,
}

impl Simulation {
    /// Create a simulation on a fresh floor, restoring any persisted
    /// purchases from the store. Both configs are validated here so bad
    /// data is refused up front instead of failing mid-simulation.
    pub fn new(
        config: SimConfig,
        floor_config: FloorConfig,
        store: Box<dyn KvStore>,
    ) -> Result<Self, BuildError> {
        Self::build(config, floor_config, store, StdRng::from_entropy())
    }

    /// Deterministic construction for tests
    pub fn with_seed(
        config: SimConfig,
        floor_config: FloorConfig,
        store: Box<dyn KvStore>,
        seed: u64,
    ) -> Result<Self, BuildError> {
        Self::build(config, floor_config, store, StdRng::seed_from_u64(seed))
    }

    fn build(
        config: SimConfig,
        floor_config: FloorConfig,
        store: Box<dyn KvStore>,
        mut rng: StdRng,
    ) -> Result<Self, BuildError> {
        config.validate().map_err(BuildError::Config)?;
        floor_config.validate().map_err(BuildError::Floor)?;

        let mut world = World::new();
        let mut floor = generate_floor(&mut world, &floor_config);
        restore_purchases(&mut world, store.as_ref(), &mut floor);
        let spawner = Spawner::new(&config, &mut rng);

        Ok(Self {
            world,
            config,
            floor,
            spawner,
            store,
            scene: None,
            rng,
            sim_time: 0.0,
            time_scale: 1.0,
        })
    }

    /// Install the scene-transition collaborator
    pub fn set_scene_transition(&mut self, scene: Box<dyn SceneTransition>) {
        self.scene = Some(scene);
    }

    /// Advance the simulation by `delta_seconds` of real time.
    ///
    /// Runs the arrival timer, movement, and the lifecycle pass, credits
    /// prizes for groups that finished eating, and returns the tick's events.
    pub fn update(&mut self, delta_seconds: f32) -> Vec<LifecycleEvent> {
        let scaled = delta_seconds * self.time_scale;
        self.sim_time += scaled as f64;

        self.spawner.tick(
            &mut self.world,
            &self.config,
            &self.floor,
            self.sim_time,
            scaled,
            &mut self.rng,
        );

        movement_system(&mut self.world, scaled);

        let events = lifecycle_system(
            &mut self.world,
            &self.config,
            &self.floor,
            self.sim_time,
            scaled,
            &mut self.rng,
        );

        for event in &events {
            if let LifecycleEvent::Served { prize, .. } = event {
                credit(self.store.as_mut(), *prize);
            }
        }

        events
    }

    /// Spawn a group directly at the entrance, bypassing the arrival timer.
    /// VIP parties always demand a reserved table, whatever the caller passed.
    pub fn spawn_walk_in(&mut self, kind: PartyKind, mut prefs: TablePrefs) -> Entity {
        if kind == PartyKind::Vip {
            prefs.reserved = true;
        }
        let origin_x = self.floor.spawn_point.x + self.config.spawn_jitter_x.sample(&mut self.rng);
        spawn_group(
            &mut self.world,
            &self.config,
            &self.floor,
            kind,
            prefs,
            self.sim_time,
            origin_x,
            &mut self.rng,
        )
    }

    /// Find a random eligible table for a waiting group and seat it there
    pub fn request_table(&mut self, group: Entity) -> Result<Entity, SeatError> {
        let (head_count, prefs) = match self.world.get::<&Group>(group) {
            Ok(group) => (group.head_count(), group.prefs),
            Err(_) => return Err(SeatError::NoEligibleTable),
        };

        let table = pick_table(&self.world, head_count, &prefs, &mut self.rng)
            .ok_or(SeatError::NoEligibleTable)?;
        self.seat_at(group, table)?;
        Ok(table)
    }

    /// Seat a waiting group at a specific table
    pub fn seat_at(&mut self, group: Entity, table: Entity) -> Result<(), SeatError> {
        seat_group(
            &mut self.world,
            &self.config,
            group,
            table,
            self.sim_time,
            &mut self.rng,
        )
    }

    /// Buy a table listing; triggers the scene transition once the floor is
    /// fully unlocked
    pub fn purchase(&mut self, listing: Entity) -> Result<Entity, PurchaseError> {
        let table = purchase_table(
            &mut self.world,
            self.store.as_mut(),
            &mut self.floor,
            listing,
        )?;

        if all_purchased(&self.world) {
            if let (Some(scene), Some(next)) = (self.scene.as_mut(), self.floor.next_level.as_ref())
            {
                scene.load(next);
            }
        }

        Ok(table)
    }

    /// Commit the store to its backing medium
    pub fn persist(&mut self) -> Result<(), StoreError> {
        self.store.flush()
    }

    /// Add money directly (rewarded ads, cheats, harness setup)
    pub fn grant(&mut self, amount: i64) {
        credit(self.store.as_mut(), amount);
    }

    /// Current money total
    pub fn balance(&self) -> i64 {
        balance(self.store.as_ref())
    }

    /// Get current simulation time in seconds
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Get current time scale
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// The generated floor (entity handles included)
    pub fn floor(&self) -> &FloorPlan {
        &self.floor
    }

    /// Count groups currently in the simulation
    pub fn group_count(&self) -> usize {
        self.world.query::<&Group>().iter().count()
    }

    /// Groups still in the wait line
    pub fn waiting_groups(&self) -> Vec<Entity> {
        self.world
            .query::<(&Group, &Dining)>()
            .iter()
            .filter(|(_, (_, dining))| dining.phase == DiningPhase::Waiting)
            .map(|(entity, _)| entity)
            .collect()
    }

    /// Count open tables
    pub fn table_count(&self) -> usize {
        self.world.query::<&Table>().iter().count()
    }

    /// Count open tables that are not busy
    pub fn free_table_count(&self) -> usize {
        self.world
            .query::<(&Table, Option<&Busy>)>()
            .iter()
            .filter(|(_, (_, busy))| busy.is_none())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use std::sync::{Arc, Mutex};

    fn quiet_config() -> SimConfig {
        // Keep the arrival timer out of the way of scripted scenarios
        let mut config = SimConfig::default();
        config.spawn_interval = crate::config::Span::new(10_000.0, 10_000.0);
        config
    }

    fn sim() -> Simulation {
        Simulation::with_seed(
            quiet_config(),
            FloorConfig::default(),
            Box::new(MemoryStore::new()),
            99,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_floor_without_exits() {
        // Parses fine as JSON, but nobody could ever leave
        let mut floor = FloorConfig::default();
        floor.exits.clear();
        let result = Simulation::with_seed(
            quiet_config(),
            floor,
            Box::new(MemoryStore::new()),
            1,
        );
        assert!(matches!(result, Err(BuildError::Floor(_))));
    }

    #[test]
    fn test_rejects_inverted_spawn_interval() {
        let mut config = quiet_config();
        config.spawn_interval = crate::config::Span::new(13.0, 4.0);
        let result = Simulation::with_seed(
            config,
            FloorConfig::default(),
            Box::new(MemoryStore::new()),
            1,
        );
        assert!(matches!(result, Err(BuildError::Config(_))));
    }

    #[test]
    fn test_walk_in_vip_demands_reserved() {
        let mut sim = sim();
        let vip = sim.spawn_walk_in(PartyKind::Vip, TablePrefs::none());
        assert!(sim.world.get::<&Group>(vip).unwrap().prefs.reserved);
    }

    #[test]
    fn test_engine_creation() {
        let sim = sim();
        assert_eq!(sim.group_count(), 0);
        assert_eq!(sim.table_count(), 4);
        assert_eq!(sim.free_table_count(), 4);
        assert_eq!(sim.balance(), 0);
        assert_eq!(sim.sim_time(), 0.0);
    }

    #[test]
    fn test_time_scale() {
        let mut sim = sim();
        sim.set_time_scale(2.0);
        sim.update(1.0);
        assert!((sim.sim_time() - 2.0).abs() < 0.001);

        sim.set_time_scale(-5.0);
        assert_eq!(sim.time_scale(), 0.0);
    }

    #[test]
    fn test_full_service_pays_out() {
        let mut sim = sim();
        let group = sim.spawn_walk_in(PartyKind::Couple, TablePrefs::none());
        let prize = sim.world.get::<&Group>(group).unwrap().prize;

        let table = sim.request_table(group).unwrap();
        assert_eq!(sim.free_table_count(), 3);

        // Walk, settle, eat, pay
        let mut served = false;
        for _ in 0..600 {
            for event in sim.update(0.1) {
                if let LifecycleEvent::Served { group: g, prize: p } = event {
                    assert_eq!(g, group);
                    assert_eq!(p, prize);
                    served = true;
                }
            }
        }
        assert!(served);
        assert_eq!(sim.balance(), prize);
        assert_eq!(sim.free_table_count(), 4);

        // The same table can serve again
        let next = sim.spawn_walk_in(PartyKind::Couple, TablePrefs::none());
        assert!(sim.seat_at(next, table).is_ok());
    }

    #[test]
    fn test_unseated_group_times_out_broke() {
        let mut sim = sim();
        // Nobody has a table 99, so this group can never be seated
        let prefs = TablePrefs {
            number: Some(99),
            ..TablePrefs::none()
        };
        let group = sim.spawn_walk_in(PartyKind::Single, prefs);
        assert_eq!(sim.request_table(group), Err(SeatError::NoEligibleTable));

        let mut timed_out = false;
        let mut departed = false;
        for _ in 0..600 {
            for event in sim.update(0.1) {
                match event {
                    LifecycleEvent::TimedOut { group: g } => {
                        assert_eq!(g, group);
                        timed_out = true;
                    }
                    LifecycleEvent::Departed { group: g } => {
                        assert_eq!(g, group);
                        departed = true;
                    }
                    LifecycleEvent::Served { .. } => panic!("group should never be served"),
                }
            }
        }

        assert!(timed_out);
        assert!(departed);
        assert_eq!(sim.balance(), 0);
        assert_eq!(sim.group_count(), 0);
    }

    #[test]
    fn test_seated_group_cannot_be_reseated() {
        let mut sim = sim();
        let group = sim.spawn_walk_in(PartyKind::Single, TablePrefs::none());
        sim.request_table(group).unwrap();
        assert_eq!(sim.request_table(group), Err(SeatError::GroupNotWaiting));
    }

    struct RecordingScene(Arc<Mutex<Vec<String>>>);

    impl SceneTransition for RecordingScene {
        fn load(&mut self, level: &str) {
            self.0.lock().unwrap().push(level.to_string());
        }
    }

    #[test]
    fn test_buying_out_the_floor_loads_next_level() {
        let mut sim = sim();
        let loaded = Arc::new(Mutex::new(Vec::new()));
        sim.set_scene_transition(Box::new(RecordingScene(loaded.clone())));

        sim.grant(100_000);

        let listings = sim.floor().listings.clone();
        for listing in listings {
            sim.purchase(listing).unwrap();
        }

        assert_eq!(sim.table_count(), 6);
        assert_eq!(loaded.lock().unwrap().as_slice(), ["LEVEL2"]);
    }
}
