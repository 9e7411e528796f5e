//! The entity store: authoritative in-memory collections of users, hotels,
//! rooms, and bookings, backed by per-type snapshot files and the booking
//! ledger.
//!
//! Collections are plain Vecs scanned linearly — lookups are O(n) by design
//! and there is a single logical writer. The one point lookup that gets a
//! cache is hotel-by-id.

mod error;
mod mutations;
mod queries;
#[cfg(test)]
mod tests;

pub use error::StoreError;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use ulid::Ulid;

use crate::cache::{CacheRegistry, EvictionStrategy, TrackedCache};
use crate::ledger::BookingLedger;
use crate::model::{Booking, Hotel, Room, User};
use crate::observability;
use crate::recent::LinkedList;
use crate::snapshot;
use crate::sortsearch::MemoSorter;

const USERS_FILE: &str = "users.dat";
const HOTELS_FILE: &str = "hotels.dat";
const ROOMS_FILE: &str = "rooms.dat";
const BOOKINGS_DIR: &str = "bookings";

/// Most-recently-viewed hotels kept per session.
const RECENT_LIMIT: usize = 5;

const DEFAULT_EVICTION_THRESHOLD: usize = 15;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the snapshot artifacts and the ledger directory.
    pub data_dir: PathBuf,
    /// Seed a default admin/test user and sample inventory when the loaded
    /// collections are empty.
    pub seed_sample_data: bool,
    /// Booking count above which eviction passes run.
    pub eviction_threshold: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            seed_sample_data: true,
            eviction_threshold: DEFAULT_EVICTION_THRESHOLD,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("INNKEEP_DATA_DIR").unwrap_or_else(|_| "./data".into());
        let seed_sample_data = std::env::var("INNKEEP_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(true);
        let eviction_threshold = std::env::var("INNKEEP_EVICTION_THRESHOLD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_EVICTION_THRESHOLD);
        Self {
            data_dir: PathBuf::from(data_dir),
            seed_sample_data,
            eviction_threshold,
        }
    }
}

pub struct EntityStore {
    config: StoreConfig,
    users: Vec<User>,
    hotels: Vec<Hotel>,
    rooms: Vec<Room>,
    bookings: Vec<Booking>,
    recently_viewed: LinkedList<Ulid>,
    registry: CacheRegistry,
    hotel_cache: TrackedCache<Ulid, Hotel>,
    sorter: MemoSorter,
    ledger: BookingLedger,
}

impl EntityStore {
    /// Load each entity type from its backing artifact, reconcile
    /// relationships, and seed sample data when configured and empty.
    pub fn open(config: StoreConfig) -> Self {
        if let Err(e) = fs::create_dir_all(&config.data_dir) {
            tracing::error!(
                dir = %config.data_dir.display(),
                error = %e,
                "failed to create data directory; saves will fail until it exists"
            );
        }

        let registry = CacheRegistry::new();
        let hotel_cache = registry.register("hotel_by_id");
        let sorter = MemoSorter::new(&registry);
        let ledger = BookingLedger::new(config.data_dir.join(BOOKINGS_DIR));

        let users: Vec<User> = load_snapshot(&config.data_dir.join(USERS_FILE), "users");
        let loaded_hotels: Vec<Hotel> = load_snapshot(&config.data_dir.join(HOTELS_FILE), "hotels");
        let (hotels, hotel_rebind) = dedup_hotels_by_name(loaded_hotels);
        let rooms: Vec<Room> = load_snapshot(&config.data_dir.join(ROOMS_FILE), "rooms");

        let mut store = Self {
            config,
            users,
            hotels,
            rooms,
            bookings: Vec::new(),
            recently_viewed: LinkedList::new(),
            registry,
            hotel_cache,
            sorter,
            ledger,
        };

        store.load_bookings();
        store.reconcile(&hotel_rebind);

        for hotel in &store.hotels {
            store.hotel_cache.insert(hotel.id, hotel.clone());
        }

        store.registry.check_and_clear(
            store.bookings.len(),
            store.config.eviction_threshold,
            EvictionStrategy::TimeBased,
            40,
        );

        store.seed_if_empty();
        store
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn cache_registry(&self) -> &CacheRegistry {
        &self.registry
    }

    // ── Load & reconciliation ────────────────────────────────

    /// Resolve ledger records against the canonical user/room collections.
    /// Records whose ids do not resolve are dropped; load continues.
    fn load_bookings(&mut self) {
        let records = self.ledger.load();
        let total = records.len();
        for record in records {
            let user_exists = self.users.iter().any(|u| u.id == record.user);
            let price = self
                .rooms
                .iter()
                .find(|r| r.id == record.room)
                .map(|r| r.price_per_night);
            match (user_exists, price) {
                (true, Some(price_per_night)) => {
                    self.bookings.push(Booking::new(
                        record.id,
                        record.user,
                        record.room,
                        record.check_in,
                        record.check_out,
                        price_per_night,
                    ));
                }
                _ => {
                    tracing::debug!(booking = %record.id, "dropping booking with unresolvable user or room");
                }
            }
        }
        tracing::info!(
            loaded = self.bookings.len(),
            scanned = total,
            "loaded bookings from ledger"
        );
    }

    /// Post-load pass rebinding every relationship to the canonical
    /// instance per id. Derived collections (hotel.rooms, user.bookings,
    /// room.bookings) are rebuilt from the forward references, which are
    /// the authoritative ones on disk.
    fn reconcile(&mut self, hotel_rebind: &HashMap<Ulid, Ulid>) {
        // Rooms bound to a discarded duplicate hotel move to the canonical
        // record with the same name.
        for room in &mut self.rooms {
            if let Some(hotel_id) = room.hotel
                && let Some(&canonical) = hotel_rebind.get(&hotel_id)
            {
                room.hotel = Some(canonical);
            }
        }

        // Rooms pointing at a hotel that no longer exists are orphaned.
        let hotel_ids: HashSet<Ulid> = self.hotels.iter().map(|h| h.id).collect();
        for room in &mut self.rooms {
            if room.hotel.is_some_and(|h| !hotel_ids.contains(&h)) {
                room.hotel = None;
            }
        }

        // Rebuild hotel → room links.
        for hotel in &mut self.hotels {
            hotel.rooms.clear();
        }
        let room_links: Vec<(Ulid, Ulid)> = self
            .rooms
            .iter()
            .filter_map(|r| r.hotel.map(|h| (h, r.id)))
            .collect();
        for (hotel_id, room_id) in room_links {
            if let Some(hotel) = self.hotels.iter_mut().find(|h| h.id == hotel_id) {
                hotel.add_room(room_id);
            }
        }

        // Rebuild user → booking and room → booking links.
        for user in &mut self.users {
            user.bookings.clear();
        }
        for room in &mut self.rooms {
            room.bookings.clear();
        }
        let booking_links: Vec<(Ulid, Ulid, Ulid)> = self
            .bookings
            .iter()
            .map(|b| (b.user, b.room, b.id))
            .collect();
        for (user_id, room_id, booking_id) in booking_links {
            if let Some(user) = self.users.iter_mut().find(|u| u.id == user_id) {
                user.add_booking(booking_id);
            }
            if let Some(room) = self.rooms.iter_mut().find(|r| r.id == room_id) {
                room.add_booking(booking_id);
            }
        }
    }

    // ── Seed data ────────────────────────────────────────────

    fn seed_if_empty(&mut self) {
        if !self.config.seed_sample_data {
            return;
        }
        if self.users.is_empty() {
            self.create_user(
                "admin",
                "admin123",
                "Administrator",
                "admin@hotel.com",
                "123-456-7890",
                true,
            );
            self.create_user(
                "testUser",
                "password",
                "Test User",
                "test@hotel.com",
                "987-654-3210",
                false,
            );
            tracing::info!("created default admin and test users");
        }
        if self.hotels.is_empty() {
            self.seed_sample_hotels();
        }
    }

    fn seed_sample_hotels(&mut self) {
        let grand = self.create_hotel(
            "Grand Hotel",
            "New York",
            5,
            "A luxury hotel in the heart of Manhattan",
        );
        let seaside = self.create_hotel(
            "Seaside Resort",
            "Miami",
            4,
            "Beautiful beachfront resort with ocean views",
        );
        let lodge = self.create_hotel(
            "Mountain Lodge",
            "Aspen",
            4,
            "Cozy lodge with stunning mountain views",
        );
        let inn = self.create_hotel("City Inn", "Chicago", 3, "Affordable hotel in downtown Chicago");
        let sunset = self.create_hotel(
            "Sunset Hotel",
            "Los Angeles",
            5,
            "Elegant hotel with sunset views over the Pacific",
        );

        self.create_room(grand.id, "101", "Single", 150.0);
        self.create_room(grand.id, "102", "Double", 200.0);
        self.create_room(grand.id, "201", "Suite", 350.0);

        self.create_room(seaside.id, "101", "Double", 180.0);
        self.create_room(seaside.id, "102", "Double", 180.0);
        self.create_room(seaside.id, "201", "Suite", 300.0);

        self.create_room(lodge.id, "101", "Single", 120.0);
        self.create_room(lodge.id, "102", "Double", 160.0);
        self.create_room(lodge.id, "201", "Family", 220.0);

        self.create_room(inn.id, "101", "Single", 90.0);
        self.create_room(inn.id, "102", "Double", 120.0);
        self.create_room(inn.id, "201", "Double", 120.0);

        self.create_room(sunset.id, "101", "Double", 250.0);
        self.create_room(sunset.id, "102", "Double", 250.0);
        self.create_room(sunset.id, "201", "Suite", 400.0);
        self.create_room(sunset.id, "202", "Presidential Suite", 800.0);

        tracing::info!(
            hotels = self.hotels.len(),
            rooms = self.rooms.len(),
            "seeded sample inventory"
        );
    }

    /// Clear all in-memory collections and caches, remove the hotel/room
    /// snapshots and every ledger record, and reseed the sample inventory.
    pub fn reset_and_create_sample_data(&mut self) {
        self.users.clear();
        self.hotels.clear();
        self.rooms.clear();
        self.bookings.clear();
        self.recently_viewed.clear();
        self.registry.clear_all();

        for (file, artifact) in [(HOTELS_FILE, "hotels"), (ROOMS_FILE, "rooms")] {
            if let Err(e) = snapshot::remove(&self.config.data_dir.join(file)) {
                tracing::error!(artifact, error = %e, "failed to remove snapshot");
            }
        }
        if let Err(e) = self.ledger.clear() {
            tracing::error!(error = %e, "failed to clear booking ledger");
        }

        self.seed_sample_hotels();
    }

    // ── Snapshot save paths ──────────────────────────────────

    fn save_users(&self) {
        save_snapshot(&self.config.data_dir.join(USERS_FILE), &self.users, "users");
    }

    fn save_hotels(&self) {
        save_snapshot(&self.config.data_dir.join(HOTELS_FILE), &self.hotels, "hotels");
    }

    fn save_rooms(&self) {
        save_snapshot(&self.config.data_dir.join(ROOMS_FILE), &self.rooms, "rooms");
    }

    /// Bulk ledger pass: only currently-confirmed bookings are written.
    fn save_bookings(&self) {
        for booking in &self.bookings {
            if booking.confirmed {
                self.write_booking_record(booking);
            }
        }
    }

    /// Eager single-record write, used at creation regardless of
    /// confirmation state.
    fn write_booking_record(&self, booking: &Booking) {
        let Some(user) = self.users.iter().find(|u| u.id == booking.user) else {
            return;
        };
        let Some(room) = self.rooms.iter().find(|r| r.id == booking.room) else {
            return;
        };
        let hotel = room
            .hotel
            .and_then(|hid| self.hotels.iter().find(|h| h.id == hid));
        if let Err(e) = self.ledger.write(booking, user, room, hotel) {
            tracing::error!(booking = %booking.id, error = %e, "failed to write booking record");
        }
    }
}

/// Missing artifact → empty collection. Any other failure is logged and
/// degrades to empty for that entity type; no retry, no propagation.
fn load_snapshot<T: DeserializeOwned>(path: &Path, artifact: &'static str) -> Vec<T> {
    match snapshot::load(path) {
        Ok(records) => records,
        Err(e) => {
            let err = StoreError::Snapshot { artifact, source: e };
            tracing::error!(error = %err, "failed to load snapshot, starting empty");
            metrics::counter!(observability::SNAPSHOT_LOAD_FAILURES_TOTAL).increment(1);
            Vec::new()
        }
    }
}

/// Save failures are logged and swallowed: in-memory state stays
/// authoritative and disk may lag.
fn save_snapshot<T: Serialize>(path: &Path, records: &[T], artifact: &'static str) {
    if let Err(e) = snapshot::save(path, records) {
        let err = StoreError::Snapshot { artifact, source: e };
        tracing::error!(error = %err, "failed to save snapshot; disk is behind memory");
        metrics::counter!(observability::SNAPSHOT_SAVE_FAILURES_TOTAL).increment(1);
    }
}

/// Keep the first hotel per name; map each discarded duplicate's id to the
/// surviving canonical id so rooms can be rebound.
fn dedup_hotels_by_name(loaded: Vec<Hotel>) -> (Vec<Hotel>, HashMap<Ulid, Ulid>) {
    let total = loaded.len();
    let mut hotels: Vec<Hotel> = Vec::with_capacity(total);
    let mut rebind = HashMap::new();
    for hotel in loaded {
        match hotels.iter().find(|h| h.name == hotel.name).map(|h| h.id) {
            Some(canonical) => {
                rebind.insert(hotel.id, canonical);
            }
            None => hotels.push(hotel),
        }
    }
    if !rebind.is_empty() {
        tracing::info!(
            unique = hotels.len(),
            scanned = total,
            "filtered duplicate hotels by name"
        );
    }
    (hotels, rebind)
}
