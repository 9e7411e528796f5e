use ulid::Ulid;

use crate::model::{Booking, Hotel, Room, User};
use crate::sortsearch::{self, SortOrder};

use super::EntityStore;

impl EntityStore {
    // ── Users ────────────────────────────────────────────────

    pub fn get_user_by_id(&self, id: Ulid) -> Option<User> {
        self.users.iter().find(|u| u.id == id).cloned()
    }

    /// Username match is case-insensitive.
    pub fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned()
    }

    pub fn get_all_users(&self) -> Vec<User> {
        self.users.clone()
    }

    // ── Hotels ───────────────────────────────────────────────

    /// Point lookup through the tracked cache; a miss falls back to the
    /// linear scan and populates the cache.
    pub fn get_hotel_by_id(&self, id: Ulid) -> Option<Hotel> {
        if let Some(hotel) = self.hotel_cache.get(&id) {
            return Some(hotel);
        }
        let hotel = self.hotels.iter().find(|h| h.id == id).cloned();
        if let Some(hotel) = &hotel {
            self.hotel_cache.insert(id, hotel.clone());
        }
        hotel
    }

    /// Exact-name scan (names are unique among canonical hotels).
    pub fn get_hotel_by_name(&self, name: &str) -> Option<Hotel> {
        self.hotels.iter().find(|h| h.name == name).cloned()
    }

    pub fn get_all_hotels(&self) -> Vec<Hotel> {
        self.hotels.clone()
    }

    // ── Rooms ────────────────────────────────────────────────

    pub fn get_room_by_id(&self, id: Ulid) -> Option<Room> {
        self.rooms.iter().find(|r| r.id == id).cloned()
    }

    pub fn get_all_rooms(&self) -> Vec<Room> {
        self.rooms.clone()
    }

    pub fn get_rooms_by_hotel(&self, hotel_id: Ulid) -> Vec<Room> {
        self.rooms
            .iter()
            .filter(|r| r.hotel == Some(hotel_id))
            .cloned()
            .collect()
    }

    // ── Bookings ─────────────────────────────────────────────

    pub fn get_booking_by_id(&self, id: Ulid) -> Option<Booking> {
        self.bookings.iter().find(|b| b.id == id).cloned()
    }

    pub fn get_all_bookings(&self) -> Vec<Booking> {
        self.bookings.clone()
    }

    pub fn get_bookings_by_user(&self, user_id: Ulid) -> Vec<Booking> {
        self.bookings
            .iter()
            .filter(|b| b.user == user_id)
            .cloned()
            .collect()
    }

    pub fn get_bookings_by_room(&self, room_id: Ulid) -> Vec<Booking> {
        self.bookings
            .iter()
            .filter(|b| b.room == room_id)
            .cloned()
            .collect()
    }

    // ── Recently viewed ──────────────────────────────────────

    /// Recently viewed hotels, most recent first. Ids that no longer
    /// resolve (deleted hotels) are skipped.
    pub fn get_recently_viewed_hotels(&self) -> Vec<Hotel> {
        self.recently_viewed
            .iter()
            .filter_map(|id| self.get_hotel_by_id(*id))
            .collect()
    }

    // ── Sort & search ────────────────────────────────────────

    /// Hotels sorted by name ascending, memoized by sort descriptor and
    /// input content.
    pub fn sort_hotels_by_name(&self, hotels: &[Hotel]) -> Vec<Hotel> {
        self.sorter.sort(hotels, SortOrder::NameAscending)
    }

    /// Hotels sorted by rating descending, memoized.
    pub fn sort_hotels_by_rating(&self, hotels: &[Hotel]) -> Vec<Hotel> {
        self.sorter.sort(hotels, SortOrder::RatingDescending)
    }

    /// Binary search over a list already sorted with
    /// [`Self::sort_hotels_by_name`].
    pub fn search_hotel_by_name(&self, sorted: &[Hotel], name: &str) -> Option<usize> {
        sortsearch::search_hotel_by_name(sorted, name)
    }
}
