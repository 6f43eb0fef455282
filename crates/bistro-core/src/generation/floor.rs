//! Floor generation - builds table and listing entities from a floor config

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use crate::components::*;

/// A purchasable table slot in the floor config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSpec {
    /// Persistence key for the purchase flag, e.g. "TABLE_LEVEL1_1"
    pub id: String,
    pub price: i64,
    pub table: TableSpec,
}

/// Static description of one restaurant floor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorConfig {
    pub name: String,
    /// Level to load once every listing is purchased
    #[serde(default)]
    pub next_level: Option<String>,
    /// Where new groups appear
    pub spawn_point: Vec2,
    /// Front of the wait line
    pub wait_line: Vec2,
    /// Exit doors; leaving groups pick one at random
    pub exits: Vec<Vec2>,
    /// Tables open from the start
    pub tables: Vec<TableSpec>,
    /// Purchasable tables, revealed in order
    #[serde(default)]
    pub listings: Vec<ListingSpec>,
}

impl FloorConfig {
    /// Parse a floor config from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sanity-check the layout
    pub fn validate(&self) -> Result<(), String> {
        if self.exits.is_empty() {
            return Err(format!("floor '{}' has no exits", self.name));
        }
        if self.tables.is_empty() && self.listings.is_empty() {
            return Err(format!("floor '{}' has no tables at all", self.name));
        }
        for (i, spec) in self.tables.iter().enumerate() {
            if spec.seats.is_empty() {
                return Err(format!("table {} on '{}' has no seats", i + 1, self.name));
            }
        }
        for listing in &self.listings {
            if listing.table.seats.is_empty() {
                return Err(format!("listing '{}' has no seats", listing.id));
            }
            if self.listings.iter().filter(|l| l.id == listing.id).count() > 1 {
                return Err(format!("duplicate listing id '{}'", listing.id));
            }
        }
        Ok(())
    }
}

impl Default for FloorConfig {
    /// A small opening floor: four tables of mixed capacity, two purchasable
    fn default() -> Self {
        let seats2 = vec![Vec2::new(-0.6, 0.0), Vec2::new(0.6, 0.0)];
        let seats4 = vec![
            Vec2::new(-0.6, -0.6),
            Vec2::new(0.6, -0.6),
            Vec2::new(-0.6, 0.6),
            Vec2::new(0.6, 0.6),
        ];

        Self {
            name: "LEVEL1".to_string(),
            next_level: Some("LEVEL2".to_string()),
            spawn_point: Vec2::new(0.0, -8.0),
            wait_line: Vec2::new(0.0, -5.0),
            exits: vec![Vec2::new(-4.0, -9.0), Vec2::new(4.0, -9.0)],
            tables: vec![
                TableSpec {
                    position: Vec2::new(-3.0, 0.0),
                    seats: seats2.clone(),
                    reserved: false,
                    food: None,
                },
                TableSpec {
                    position: Vec2::new(0.0, 2.0),
                    seats: seats4.clone(),
                    reserved: false,
                    food: None,
                },
                TableSpec {
                    position: Vec2::new(3.0, 0.0),
                    seats: seats2.clone(),
                    reserved: true,
                    food: None,
                },
                TableSpec {
                    position: Vec2::new(0.0, 5.0),
                    seats: seats4.clone(),
                    reserved: false,
                    food: Some(FoodType::Pizza),
                },
            ],
            listings: vec![
                ListingSpec {
                    id: "TABLE_LEVEL1_1".to_string(),
                    price: 750,
                    table: TableSpec {
                        position: Vec2::new(-3.0, 4.0),
                        seats: seats2,
                        reserved: false,
                        food: None,
                    },
                },
                ListingSpec {
                    id: "TABLE_LEVEL1_2".to_string(),
                    price: 1500,
                    table: TableSpec {
                        position: Vec2::new(3.0, 4.0),
                        seats: seats4,
                        reserved: false,
                        food: Some(FoodType::Burger),
                    },
                },
            ],
        }
    }
}

/// Entity handles for a generated floor
#[derive(Debug)]
pub struct FloorPlan {
    pub name: String,
    pub next_level: Option<String>,
    pub spawn_point: Vec2,
    pub wait_line: Vec2,
    pub exits: Vec<Vec2>,
    /// Open tables, in numbering order
    pub tables: Vec<Entity>,
    /// Listing entities, in reveal order
    pub listings: Vec<Entity>,
}

/// Spawn table and listing entities for a floor config.
///
/// Open tables are numbered 1..n in config order; purchased listings get the
/// next numbers as they are restored or bought.
pub fn generate_floor(world: &mut World, config: &FloorConfig) -> FloorPlan {
    let mut tables = Vec::with_capacity(config.tables.len());

    for (i, spec) in config.tables.iter().enumerate() {
        tables.push(spawn_table(world, spec, i as u32 + 1));
    }

    let mut listings = Vec::with_capacity(config.listings.len());
    for (i, spec) in config.listings.iter().enumerate() {
        let entity = world.spawn((TableListing {
            id: spec.id.clone(),
            price: spec.price,
            spec: spec.table.clone(),
            available: i == 0,
            purchased: false,
        },));
        listings.push(entity);
    }

    FloorPlan {
        name: config.name.clone(),
        next_level: config.next_level.clone(),
        spawn_point: config.spawn_point,
        wait_line: config.wait_line,
        exits: config.exits.clone(),
        tables,
        listings,
    }
}

/// Spawn one open table with its seating pool
pub fn spawn_table(world: &mut World, spec: &TableSpec, number: u32) -> Entity {
    world.spawn((
        Table {
            number,
            reserved: spec.reserved,
            food: spec.food,
        },
        Seating::new(spec.seat_positions()),
        Position(spec.position),
    ))
}

/// The number the next opened table gets
pub fn next_table_number(world: &World) -> u32 {
    world
        .query::<&Table>()
        .iter()
        .map(|(_, t)| t.number)
        .max()
        .unwrap_or(0)
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_floor_is_valid() {
        assert!(FloorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_generate_floor_numbers_tables() {
        let mut world = World::new();
        let plan = generate_floor(&mut world, &FloorConfig::default());

        assert_eq!(plan.tables.len(), 4);
        for (i, &entity) in plan.tables.iter().enumerate() {
            let table = world.get::<&Table>(entity).unwrap();
            assert_eq!(table.number, i as u32 + 1);
            assert!(world.get::<&Seating>(entity).is_ok());
        }
        assert_eq!(next_table_number(&world), 5);
    }

    #[test]
    fn test_only_first_listing_available() {
        let mut world = World::new();
        let plan = generate_floor(&mut world, &FloorConfig::default());

        let first = world.get::<&TableListing>(plan.listings[0]).unwrap();
        let second = world.get::<&TableListing>(plan.listings[1]).unwrap();
        assert!(first.available);
        assert!(!second.available);
        assert!(!first.purchased);
    }

    #[test]
    fn test_floor_config_from_json() {
        let json = r#"{
            "name": "TEST",
            "spawn_point": { "x": 0.0, "y": -8.0 },
            "wait_line": { "x": 0.0, "y": -5.0 },
            "exits": [{ "x": 4.0, "y": -9.0 }],
            "tables": [
                {
                    "position": { "x": 0.0, "y": 0.0 },
                    "seats": [{ "x": -0.6, "y": 0.0 }, { "x": 0.6, "y": 0.0 }],
                    "reserved": true
                }
            ]
        }"#;

        let config = FloorConfig::from_json(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.tables.len(), 1);
        assert!(config.tables[0].reserved);
        assert!(config.next_level.is_none());
    }
}
