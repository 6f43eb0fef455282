//! Economy - the player's money and table purchasing
//!
//! Money lives in the injected key-value store under [`PLAYER_MONEY`], so the
//! running total survives between sessions alongside the per-listing purchase
//! flags.

use hecs::{Entity, World};

use crate::components::TableListing;
use crate::generation::{next_table_number, spawn_table, FloorPlan};
use crate::persistence::{self, KvStore, StoreError};

/// Key of the running money total
pub const PLAYER_MONEY: &str = "PLAYER_MONEY";

/// Current money total
pub fn balance(store: &dyn KvStore) -> i64 {
    persistence::get_or_default(store, PLAYER_MONEY)
}

/// Add to the money total
pub fn credit(store: &mut dyn KvStore, amount: i64) {
    let total = balance(store) + amount;
    persistence::set(store, PLAYER_MONEY, &total);
}

/// Deduct `amount` if the player can afford it
pub fn try_spend(store: &mut dyn KvStore, amount: i64) -> bool {
    let total = balance(store);
    if total < amount {
        return false;
    }
    persistence::set(store, PLAYER_MONEY, &(total - amount));
    true
}

/// Why a purchase was refused
#[derive(Debug)]
pub enum PurchaseError {
    /// The player cannot afford the listing
    InsufficientFunds,
    /// The listing's predecessor has not been purchased yet
    ListingHidden,
    /// The table is already on the floor
    AlreadyPurchased,
    /// The purchase flag could not be committed
    Store(StoreError),
}

impl std::fmt::Display for PurchaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PurchaseError::InsufficientFunds => write!(f, "not enough money"),
            PurchaseError::ListingHidden => write!(f, "listing not yet available"),
            PurchaseError::AlreadyPurchased => write!(f, "table already purchased"),
            PurchaseError::Store(e) => write!(f, "store error: {}", e),
        }
    }
}

impl std::error::Error for PurchaseError {}

/// Buy an available listing: debit the price, persist the flag, open the
/// table, and reveal the next listing in the chain.
pub fn purchase_table(
    world: &mut World,
    store: &mut dyn KvStore,
    floor: &mut FloorPlan,
    listing_entity: Entity,
) -> Result<Entity, PurchaseError> {
    let (id, price, spec) = {
        let listing = world
            .get::<&TableListing>(listing_entity)
            .map_err(|_| PurchaseError::ListingHidden)?;
        if listing.purchased {
            return Err(PurchaseError::AlreadyPurchased);
        }
        if !listing.available {
            return Err(PurchaseError::ListingHidden);
        }
        (listing.id.clone(), listing.price, listing.spec.clone())
    };

    if !try_spend(store, price) {
        return Err(PurchaseError::InsufficientFunds);
    }
    persistence::set(store, &id, &true);
    store.flush().map_err(PurchaseError::Store)?;

    let table = open_listing(world, floor, listing_entity, &spec);
    Ok(table)
}

/// Re-open tables whose purchase flags were persisted in an earlier session.
/// Availability is recomputed so the first unpurchased listing is the one on
/// offer.
pub fn restore_purchases(world: &mut World, store: &dyn KvStore, floor: &mut FloorPlan) {
    let listings = floor.listings.clone();
    for entity in listings {
        let (id, spec, purchased) = {
            let listing = match world.get::<&TableListing>(entity) {
                Ok(listing) => listing,
                Err(_) => continue,
            };
            (listing.id.clone(), listing.spec.clone(), listing.purchased)
        };

        if !purchased && persistence::get_or_default::<bool>(store, &id) {
            open_listing(world, floor, entity, &spec);
        }
    }
}

/// Mark a listing purchased, spawn its table, and reveal the next listing
fn open_listing(
    world: &mut World,
    floor: &mut FloorPlan,
    listing_entity: Entity,
    spec: &crate::components::TableSpec,
) -> Entity {
    let number = next_table_number(world);
    let table = spawn_table(world, spec, number);
    floor.tables.push(table);

    if let Ok(mut listing) = world.get::<&mut TableListing>(listing_entity) {
        listing.purchased = true;
        listing.available = false;
    }

    // Reveal the next unpurchased listing in chain order
    for &entity in &floor.listings {
        if let Ok(mut listing) = world.get::<&mut TableListing>(entity) {
            if !listing.purchased {
                listing.available = true;
                break;
            }
        }
    }

    table
}

/// Level is complete once every listing has been bought
pub fn all_purchased(world: &World) -> bool {
    world
        .query::<&TableListing>()
        .iter()
        .all(|(_, listing)| listing.purchased)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Table;
    use crate::generation::{generate_floor, FloorConfig};
    use crate::persistence::MemoryStore;

    #[test]
    fn test_wallet_credit_and_spend() {
        let mut store = MemoryStore::new();
        assert_eq!(balance(&store), 0);

        credit(&mut store, 300);
        assert_eq!(balance(&store), 300);

        assert!(try_spend(&mut store, 200));
        assert_eq!(balance(&store), 100);

        // Never spends below zero
        assert!(!try_spend(&mut store, 101));
        assert_eq!(balance(&store), 100);
    }

    #[test]
    fn test_purchase_opens_table_and_reveals_next() {
        let mut world = World::new();
        let mut store = MemoryStore::new();
        let mut floor = generate_floor(&mut world, &FloorConfig::default());
        let first = floor.listings[0];
        let second = floor.listings[1];

        credit(&mut store, 10_000);
        let before = floor.tables.len();

        let table = purchase_table(&mut world, &mut store, &mut floor, first).unwrap();

        assert_eq!(floor.tables.len(), before + 1);
        assert_eq!(world.get::<&Table>(table).unwrap().number, before as u32 + 1);
        assert!(world.get::<&TableListing>(first).unwrap().purchased);
        assert!(world.get::<&TableListing>(second).unwrap().available);
        assert_eq!(
            persistence::get::<bool>(&store, "TABLE_LEVEL1_1"),
            Some(true)
        );
    }

    #[test]
    fn test_purchase_refusals() {
        let mut world = World::new();
        let mut store = MemoryStore::new();
        let mut floor = generate_floor(&mut world, &FloorConfig::default());
        let first = floor.listings[0];
        let second = floor.listings[1];

        // Hidden until its predecessor is bought
        credit(&mut store, 10_000);
        assert!(matches!(
            purchase_table(&mut world, &mut store, &mut floor, second),
            Err(PurchaseError::ListingHidden)
        ));

        purchase_table(&mut world, &mut store, &mut floor, first).unwrap();
        assert!(matches!(
            purchase_table(&mut world, &mut store, &mut floor, first),
            Err(PurchaseError::AlreadyPurchased)
        ));

        // Broke players keep their listing
        let mut poor_store = MemoryStore::new();
        let mut world2 = World::new();
        let mut floor2 = generate_floor(&mut world2, &FloorConfig::default());
        let listing = floor2.listings[0];
        assert!(matches!(
            purchase_table(&mut world2, &mut poor_store, &mut floor2, listing),
            Err(PurchaseError::InsufficientFunds)
        ));
        assert!(!world2.get::<&TableListing>(listing).unwrap().purchased);
    }

    #[test]
    fn test_restore_purchases_from_flags() {
        let mut store = MemoryStore::new();
        persistence::set(&mut store, "TABLE_LEVEL1_1", &true);

        let mut world = World::new();
        let mut floor = generate_floor(&mut world, &FloorConfig::default());
        let before = floor.tables.len();

        restore_purchases(&mut world, &store, &mut floor);

        assert_eq!(floor.tables.len(), before + 1);
        assert!(world.get::<&TableListing>(floor.listings[0]).unwrap().purchased);
        // The second listing is now the one on offer
        assert!(world.get::<&TableListing>(floor.listings[1]).unwrap().available);
        assert!(!all_purchased(&world));
    }

    #[test]
    fn test_all_purchased_completes_level() {
        let mut world = World::new();
        let mut store = MemoryStore::new();
        let mut floor = generate_floor(&mut world, &FloorConfig::default());
        credit(&mut store, 100_000);

        let listings = floor.listings.clone();
        for listing in listings {
            purchase_table(&mut world, &mut store, &mut floor, listing).unwrap();
        }
        assert!(all_purchased(&world));
    }
}
