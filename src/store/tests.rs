use chrono::NaiveDate;
use tempfile::TempDir;
use ulid::Ulid;

use crate::model::{Hotel, Room};
use crate::snapshot;

use super::{EntityStore, HOTELS_FILE, ROOMS_FILE, StoreConfig, USERS_FILE};

fn test_config(dir: &TempDir) -> StoreConfig {
    StoreConfig {
        data_dir: dir.path().to_path_buf(),
        seed_sample_data: false,
        eviction_threshold: 15,
    }
}

fn open_store(dir: &TempDir) -> EntityStore {
    EntityStore::open(test_config(dir))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// user + hotel + room, the minimum needed to book.
fn seed_booking_fixture(store: &mut EntityStore) -> (Ulid, Ulid, Ulid) {
    let user = store.create_user("ann", "pw", "Ann Example", "ann@x", "555", false);
    let hotel = store.create_hotel("Grand Hotel", "New York", 5, "Luxury");
    let room = store.create_room(hotel.id, "101", "Single", 150.0);
    (user.id, hotel.id, room.id)
}

// ── Users ────────────────────────────────────────────────────

#[test]
fn create_and_look_up_user() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);

    let user = store.create_user("Ann", "pw", "Ann Example", "ann@x", "555", false);
    assert_eq!(store.get_user_by_id(user.id).unwrap().username, "Ann");
    // Case-insensitive username lookup.
    assert_eq!(store.get_user_by_username("ann").unwrap().id, user.id);
    assert_eq!(store.get_user_by_username("ANN").unwrap().id, user.id);
    assert!(store.get_user_by_username("bob").is_none());
}

#[test]
fn update_on_unknown_id_is_a_silent_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let user = store.create_user("ann", "pw", "Ann", "a@x", "555", false);

    let mut ghost = user.clone();
    ghost.id = Ulid::new();
    ghost.full_name = "Ghost".into();
    store.update_user(ghost);

    assert_eq!(store.get_all_users().len(), 1);
    assert_eq!(store.get_user_by_id(user.id).unwrap().full_name, "Ann");
}

#[test]
fn get_all_returns_defensive_copies() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    store.create_user("ann", "pw", "Ann", "a@x", "555", false);

    let mut copy = store.get_all_users();
    copy.clear();
    assert_eq!(store.get_all_users().len(), 1);

    let mut hotel_copy = store.create_hotel("Grand Hotel", "NY", 5, "");
    hotel_copy.name = "Renamed".into();
    assert_eq!(store.get_hotel_by_name("Grand Hotel").unwrap().name, "Grand Hotel");
}

// ── Hotels ───────────────────────────────────────────────────

#[test]
fn create_hotel_is_idempotent_on_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);

    let first = store.create_hotel("Grand Hotel", "New York", 5, "Luxury");
    let second = store.create_hotel("Grand Hotel", "Elsewhere", 3, "Impostor");
    assert_eq!(first.id, second.id);

    let all = store.get_all_hotels();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].location, "New York");
}

#[test]
fn hotel_point_cache_serves_and_evicts() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let hotel = store.create_hotel("Grand Hotel", "NY", 5, "");

    assert_eq!(store.get_hotel_by_id(hotel.id).unwrap().id, hotel.id);

    store.delete_hotel(hotel.id);
    assert!(store.get_hotel_by_id(hotel.id).is_none());
    assert_eq!(store.hotel_cache.len(), 0);
}

#[test]
fn update_hotel_refreshes_cache() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let mut hotel = store.create_hotel("Grand Hotel", "NY", 5, "");

    hotel.rating = 4;
    store.update_hotel(hotel.clone());
    // Served from cache and current.
    assert_eq!(store.get_hotel_by_id(hotel.id).unwrap().rating, 4);
}

#[test]
fn delete_hotel_orphans_its_rooms() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let hotel = store.create_hotel("Grand Hotel", "NY", 5, "");
    let room = store.create_room(hotel.id, "101", "Single", 100.0);

    store.delete_hotel(hotel.id);

    let room = store.get_room_by_id(room.id).unwrap();
    assert!(room.hotel.is_none());
    assert!(store.get_rooms_by_hotel(hotel.id).is_empty());
}

// ── Rooms ────────────────────────────────────────────────────

#[test]
fn create_room_links_both_directions() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let hotel = store.create_hotel("Grand Hotel", "NY", 5, "");
    let room = store.create_room(hotel.id, "101", "Single", 100.0);

    assert_eq!(room.hotel, Some(hotel.id));
    assert!(store.get_hotel_by_id(hotel.id).unwrap().rooms.contains(&room.id));
    assert_eq!(store.get_rooms_by_hotel(hotel.id).len(), 1);
}

#[test]
fn create_room_with_unknown_hotel_is_orphaned() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let room = store.create_room(Ulid::new(), "101", "Single", 100.0);
    assert!(room.hotel.is_none());
    assert_eq!(store.get_all_rooms().len(), 1);
}

#[test]
fn delete_room_unlinks_hotel_and_cascades_bookings() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let (user_id, hotel_id, room_id) = seed_booking_fixture(&mut store);
    store
        .create_booking(user_id, room_id, date(2025, 6, 1), date(2025, 6, 4))
        .unwrap();

    store.delete_room(room_id);

    assert!(store.get_room_by_id(room_id).is_none());
    assert!(store.get_all_bookings().is_empty());
    assert!(!store.get_hotel_by_id(hotel_id).unwrap().rooms.contains(&room_id));
    assert!(store.get_user_by_id(user_id).unwrap().bookings.is_empty());
}

// ── Bookings ─────────────────────────────────────────────────

#[test]
fn create_booking_computes_price_and_links() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let (user_id, _, room_id) = seed_booking_fixture(&mut store);

    let booking = store
        .create_booking(user_id, room_id, date(2025, 6, 1), date(2025, 6, 4))
        .unwrap();

    assert_eq!(booking.total_price, 450.0); // 3 nights x 150
    assert!(!booking.confirmed);
    assert!(store.get_user_by_id(user_id).unwrap().bookings.contains(&booking.id));
    assert!(store.get_room_by_id(room_id).unwrap().bookings.contains(&booking.id));
    assert_eq!(store.get_bookings_by_user(user_id).len(), 1);
    assert_eq!(store.get_bookings_by_room(room_id).len(), 1);
}

#[test]
fn create_booking_with_unresolvable_ids_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let (user_id, _, room_id) = seed_booking_fixture(&mut store);

    assert!(store
        .create_booking(Ulid::new(), room_id, date(2025, 6, 1), date(2025, 6, 4))
        .is_none());
    assert!(store
        .create_booking(user_id, Ulid::new(), date(2025, 6, 1), date(2025, 6, 4))
        .is_none());
    assert!(store.get_all_bookings().is_empty());
}

#[test]
fn update_booking_recomputes_total_price() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let (user_id, _, room_id) = seed_booking_fixture(&mut store);
    let mut booking = store
        .create_booking(user_id, room_id, date(2025, 6, 1), date(2025, 6, 2))
        .unwrap();
    assert_eq!(booking.total_price, 150.0);

    booking.check_out = date(2025, 6, 8);
    store.update_booking(booking.clone());

    let updated = store.get_booking_by_id(booking.id).unwrap();
    assert_eq!(updated.total_price, 7.0 * 150.0);
}

#[test]
fn delete_booking_unlinks_user_room_and_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let (user_id, _, room_id) = seed_booking_fixture(&mut store);
    let booking = store
        .create_booking(user_id, room_id, date(2025, 6, 1), date(2025, 6, 4))
        .unwrap();

    store.delete_booking(booking.id);

    assert!(store.get_booking_by_id(booking.id).is_none());
    assert!(store.get_user_by_id(user_id).unwrap().bookings.is_empty());
    assert!(store.get_room_by_id(room_id).unwrap().bookings.is_empty());

    // Gone from the resolvable set on next load.
    drop(store);
    let reopened = open_store(&dir);
    assert!(reopened.get_all_bookings().is_empty());
}

#[test]
fn delete_user_cascades_to_bookings() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let (user_id, _, room_id) = seed_booking_fixture(&mut store);
    store
        .create_booking(user_id, room_id, date(2025, 6, 1), date(2025, 6, 4))
        .unwrap();

    store.delete_user(user_id);

    assert!(store.get_user_by_id(user_id).is_none());
    assert!(store.get_all_bookings().is_empty());
    assert!(store.get_room_by_id(room_id).unwrap().bookings.is_empty());
}

// ── Load & reconciliation ────────────────────────────────────

#[test]
fn reload_reconciles_relationships_to_canonical_instances() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let (user_id, hotel_id, room_id) = seed_booking_fixture(&mut store);
    let booking = store
        .create_booking(user_id, room_id, date(2025, 6, 1), date(2025, 6, 4))
        .unwrap();
    drop(store);

    let store = open_store(&dir);
    assert_eq!(store.get_all_hotels().len(), 1);

    let hotel = store.get_hotel_by_id(hotel_id).unwrap();
    let room = store.get_room_by_id(room_id).unwrap();
    assert_eq!(room.hotel, Some(hotel.id));
    assert!(hotel.rooms.contains(&room.id));

    let loaded = store.get_booking_by_id(booking.id).unwrap();
    assert_eq!(loaded.total_price, 450.0);
    assert!(store.get_user_by_id(user_id).unwrap().bookings.contains(&booking.id));
    assert!(room.bookings.contains(&booking.id));
}

#[test]
fn load_dedups_hotels_by_name_and_rebinds_rooms() {
    let dir = tempfile::tempdir().unwrap();

    let first = Hotel::new(Ulid::new(), "Grand Hotel", "New York", 5, "canonical");
    let duplicate = Hotel::new(Ulid::new(), "Grand Hotel", "Boston", 4, "duplicate");
    let mut room = Room::new(Ulid::new(), "101", "Single", 100.0);
    room.hotel = Some(duplicate.id);

    snapshot::save(&dir.path().join(HOTELS_FILE), &[first.clone(), duplicate.clone()]).unwrap();
    snapshot::save(&dir.path().join(ROOMS_FILE), &[room.clone()]).unwrap();

    let store = open_store(&dir);

    let hotels = store.get_all_hotels();
    assert_eq!(hotels.len(), 1);
    assert_eq!(hotels[0].id, first.id);
    assert_eq!(hotels[0].location, "New York");

    // The room bound to the discarded duplicate now points at the survivor.
    let room = store.get_room_by_id(room.id).unwrap();
    assert_eq!(room.hotel, Some(first.id));
    assert!(store.get_hotel_by_id(first.id).unwrap().rooms.contains(&room.id));
}

#[test]
fn rooms_referencing_missing_hotels_are_orphaned_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let mut room = Room::new(Ulid::new(), "101", "Single", 100.0);
    room.hotel = Some(Ulid::new());
    snapshot::save(&dir.path().join(ROOMS_FILE), &[room.clone()]).unwrap();

    let store = open_store(&dir);
    assert!(store.get_room_by_id(room.id).unwrap().hotel.is_none());
}

#[test]
fn unresolvable_ledger_records_are_dropped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let bookings_dir = dir.path().join("bookings");
    std::fs::create_dir_all(&bookings_dir).unwrap();
    std::fs::write(
        bookings_dir.join("resertghost12345.txt"),
        format!(
            "Booking ID: {}\nUser ID: {}\nRoom ID: {}\nCheck-in Date: 2025-06-01\nCheck-out Date: 2025-06-04\n",
            Ulid::new(),
            Ulid::new(),
            Ulid::new(),
        ),
    )
    .unwrap();

    let store = open_store(&dir);
    assert!(store.get_all_bookings().is_empty());
}

#[test]
fn corrupt_snapshot_degrades_to_empty_collection() {
    let dir = tempfile::tempdir().unwrap();
    // A full frame whose CRC cannot match its payload.
    std::fs::write(dir.path().join(USERS_FILE), b"\x04\x00\x00\x00AAAA\x00\x00\x00\x00").unwrap();

    let store = open_store(&dir);
    assert!(store.get_all_users().is_empty());
}

#[test]
fn confirmed_flag_is_not_persisted_in_the_ledger() {
    // Inherited behavior: records carry no confirmed line, so every booking
    // reloads unconfirmed.
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let (user_id, _, room_id) = seed_booking_fixture(&mut store);
    let mut booking = store
        .create_booking(user_id, room_id, date(2025, 6, 1), date(2025, 6, 4))
        .unwrap();
    booking.confirmed = true;
    store.update_booking(booking.clone());
    assert!(store.get_booking_by_id(booking.id).unwrap().confirmed);
    drop(store);

    let store = open_store(&dir);
    assert!(!store.get_booking_by_id(booking.id).unwrap().confirmed);
}

// ── Recently viewed ──────────────────────────────────────────

#[test]
fn recently_viewed_caps_dedups_and_orders() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);

    let names = ["A", "B", "C", "D", "E", "F"];
    let hotels: Vec<_> = names
        .iter()
        .map(|n| store.create_hotel(*n, "x", 3, ""))
        .collect();
    let by_name = |n: &str| hotels.iter().find(|h| h.name == n).unwrap().clone();

    for n in ["A", "B", "A", "C", "D", "E", "F"] {
        let hotel = by_name(n);
        store.add_to_recently_viewed_hotels(&hotel);
    }

    let viewed: Vec<String> = store
        .get_recently_viewed_hotels()
        .into_iter()
        .map(|h| h.name)
        .collect();
    assert_eq!(viewed, vec!["F", "E", "D", "C", "A"]);
}

#[test]
fn recently_viewed_clear_and_deleted_hotels() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let a = store.create_hotel("A", "x", 3, "");
    let b = store.create_hotel("B", "x", 3, "");
    store.add_to_recently_viewed_hotels(&a);
    store.add_to_recently_viewed_hotels(&b);

    store.delete_hotel(a.id);
    let viewed = store.get_recently_viewed_hotels();
    assert_eq!(viewed.len(), 1);
    assert_eq!(viewed[0].id, b.id);

    store.clear_recently_viewed_hotels();
    assert!(store.get_recently_viewed_hotels().is_empty());
}

// ── Eviction triggers ────────────────────────────────────────

#[test]
fn booking_creation_past_threshold_runs_an_eviction_pass() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let (user_id, _, room_id) = seed_booking_fixture(&mut store);

    for i in 0..15 {
        store
            .create_booking(user_id, room_id, date(2025, 6, 1), date(2025, 6, 2 + i))
            .unwrap();
    }
    // 15 bookings: signal is not strictly above the threshold yet.
    assert_eq!(store.hotel_cache.len(), 1);

    store
        .create_booking(user_id, room_id, date(2025, 7, 1), date(2025, 7, 2))
        .unwrap();
    // 16 bookings: the pass removed max(1, ceil(1 * 30%)) = 1 entry.
    assert_eq!(store.hotel_cache.len(), 0);
}

#[test]
fn eviction_covers_the_memoized_sort_cache() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let (user_id, _, room_id) = seed_booking_fixture(&mut store);

    let hotels = store.get_all_hotels();
    store.sort_hotels_by_name(&hotels);
    assert_eq!(store.sorter.cached_sorts(), 1);

    for i in 0..16 {
        store
            .create_booking(user_id, room_id, date(2025, 6, 1), date(2025, 6, 2 + i))
            .unwrap();
    }
    assert_eq!(store.sorter.cached_sorts(), 0);
}

// ── Seed data ────────────────────────────────────────────────

#[test]
fn seeds_default_users_and_inventory_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        data_dir: dir.path().to_path_buf(),
        seed_sample_data: true,
        eviction_threshold: 15,
    };

    let store = EntityStore::open(config.clone());
    let admin = store.get_user_by_username("admin").unwrap();
    assert!(admin.is_admin);
    assert!(store.get_user_by_username("testUser").is_some());
    assert_eq!(store.get_all_hotels().len(), 5);
    let hotel_count = store.get_all_hotels().len();
    let room_count = store.get_all_rooms().len();
    assert!(room_count >= hotel_count * 3);
    drop(store);

    // A second open loads the persisted data instead of reseeding.
    let store = EntityStore::open(config);
    assert_eq!(store.get_all_hotels().len(), hotel_count);
    assert_eq!(store.get_all_rooms().len(), room_count);
    assert_eq!(store.get_all_users().len(), 2);
}

#[test]
fn reset_recreates_sample_inventory() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    let (user_id, _, room_id) = seed_booking_fixture(&mut store);
    store
        .create_booking(user_id, room_id, date(2025, 6, 1), date(2025, 6, 4))
        .unwrap();

    store.reset_and_create_sample_data();

    assert_eq!(store.get_all_hotels().len(), 5);
    assert!(store.get_all_bookings().is_empty());
    assert!(store.get_hotel_by_name("Sunset Hotel").is_some());
    // Every sample hotel got rooms.
    for hotel in store.get_all_hotels() {
        assert!(!hotel.rooms.is_empty());
    }
}

// ── Sort & search surface ────────────────────────────────────

#[test]
fn store_sort_and_search_surface() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = open_store(&dir);
    store.create_hotel("Seaside Resort", "Miami", 4, "");
    store.create_hotel("Grand Hotel", "New York", 5, "");
    store.create_hotel("City Inn", "Chicago", 3, "");

    let sorted = store.sort_hotels_by_name(&store.get_all_hotels());
    let names: Vec<&str> = sorted.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["City Inn", "Grand Hotel", "Seaside Resort"]);

    assert_eq!(store.search_hotel_by_name(&sorted, "Grand Hotel"), Some(1));
    assert_eq!(store.search_hotel_by_name(&sorted, "Zzz Hotel"), None);

    let by_rating = store.sort_hotels_by_rating(&store.get_all_hotels());
    let ratings: Vec<u8> = by_rating.iter().map(|h| h.rating).collect();
    assert_eq!(ratings, vec![5, 4, 3]);
}
