//! Simulation tuning knobs.
//!
//! Defaults mirror the shipped balancing: spawn cadence, party-size odds,
//! preference odds, patience windows, and per-party prize ranges.

use rand::distributions::uniform::SampleUniform;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::PartyKind;

/// Inclusive sampling range
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Span<T> {
    pub min: T,
    pub max: T,
}

impl<T: SampleUniform + PartialOrd + Copy> Span<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> T {
        rng.gen_range(self.min..=self.max)
    }
}

/// All simulation tuning in one place
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seconds between group spawns
    pub spawn_interval: Span<f32>,
    /// Minimum distance from other waiting leads before a spawn goes through
    pub spawn_separation: f32,
    /// Spawn-point jitter along the entrance
    pub spawn_jitter_x: Span<f32>,
    /// Wait-line depth jitter
    pub wait_jitter_y: Span<f32>,

    /// Chance an arriving party is a couple / triple / quadruple / VIP.
    /// Rolled in sequence with a fresh roll per branch; single otherwise.
    pub vip_chance: f32,
    pub couple_chance: f32,
    pub triple_chance: f32,
    pub quadruple_chance: f32,

    /// Chance of each table preference
    pub number_pref_chance: f32,
    pub reserve_pref_chance: f32,
    pub food_pref_chance: f32,

    /// Settling-in seconds before the boredom clock starts
    pub idle_grace: f32,
    /// Boredom seconds a waiting group tolerates before leaving unseated
    pub boredom_limit: f32,
    /// Seconds between sitting down and starting to eat
    pub seating_delay: f32,
    /// Seconds a group spends eating
    pub eating_time: Span<f32>,

    /// Walk speed in meters per second
    pub walk_speed: f32,
    /// Shoulder-to-shoulder spacing between party members
    pub follower_spacing: f32,

    /// Prize ranges per party kind
    pub prize_single: Span<i64>,
    pub prize_couple: Span<i64>,
    pub prize_triple: Span<i64>,
    pub prize_quadruple: Span<i64>,
    pub prize_vip: Span<i64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            spawn_interval: Span::new(4.0, 13.0),
            spawn_separation: 1.0,
            spawn_jitter_x: Span::new(-2.2, 2.2),
            wait_jitter_y: Span::new(-0.8, 0.8),
            vip_chance: 0.05,
            couple_chance: 0.5,
            triple_chance: 0.25,
            quadruple_chance: 0.1,
            number_pref_chance: 0.3,
            reserve_pref_chance: 0.2,
            food_pref_chance: 0.2,
            idle_grace: 2.0,
            boredom_limit: 10.0,
            seating_delay: 1.5,
            eating_time: Span::new(8.0, 16.0),
            walk_speed: 1.4,
            follower_spacing: 0.7,
            prize_single: Span::new(40, 75),
            prize_couple: Span::new(65, 99),
            prize_triple: Span::new(79, 110),
            prize_quadruple: Span::new(90, 135),
            prize_vip: Span::new(250, 500),
        }
    }
}

impl SimConfig {
    /// Prize range for a party kind
    pub fn prize_span(&self, kind: PartyKind) -> Span<i64> {
        match kind {
            PartyKind::Single => self.prize_single,
            PartyKind::Couple => self.prize_couple,
            PartyKind::Triple => self.prize_triple,
            PartyKind::Quadruple => self.prize_quadruple,
            PartyKind::Vip => self.prize_vip,
        }
    }

    /// Sanity-check chances and ranges
    pub fn validate(&self) -> Result<(), String> {
        let chances = [
            ("vip_chance", self.vip_chance),
            ("couple_chance", self.couple_chance),
            ("triple_chance", self.triple_chance),
            ("quadruple_chance", self.quadruple_chance),
            ("number_pref_chance", self.number_pref_chance),
            ("reserve_pref_chance", self.reserve_pref_chance),
            ("food_pref_chance", self.food_pref_chance),
        ];
        for (name, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} out of range: {}", name, value));
            }
        }

        if self.spawn_interval.min > self.spawn_interval.max {
            return Err("spawn_interval inverted".into());
        }
        if self.spawn_jitter_x.min > self.spawn_jitter_x.max {
            return Err("spawn_jitter_x inverted".into());
        }
        if self.wait_jitter_y.min > self.wait_jitter_y.max {
            return Err("wait_jitter_y inverted".into());
        }
        if self.eating_time.min > self.eating_time.max {
            return Err("eating_time inverted".into());
        }
        if self.walk_speed <= 0.0 {
            return Err(format!("walk_speed must be positive: {}", self.walk_speed));
        }
        if self.boredom_limit <= 0.0 {
            return Err(format!(
                "boredom_limit must be positive: {}",
                self.boredom_limit
            ));
        }

        for kind in [
            PartyKind::Single,
            PartyKind::Couple,
            PartyKind::Triple,
            PartyKind::Quadruple,
            PartyKind::Vip,
        ] {
            let span = self.prize_span(kind);
            if span.min <= 0 || span.min > span.max {
                return Err(format!("prize range for {:?} invalid", kind));
            }
        }

        Ok(())
    }
}
