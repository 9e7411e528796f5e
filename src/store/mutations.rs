use chrono::NaiveDate;
use tracing::Level;
use ulid::Ulid;

use crate::cache::EvictionStrategy;
use crate::logging::with_logging;
use crate::model::{Booking, Hotel, Room, User};

use super::{EntityStore, RECENT_LIMIT};

impl EntityStore {
    // ── Users ────────────────────────────────────────────────

    pub fn create_user(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        full_name: impl Into<String>,
        email: impl Into<String>,
        phone_number: impl Into<String>,
        is_admin: bool,
    ) -> User {
        let user = User::new(
            Ulid::new(),
            username,
            password,
            full_name,
            email,
            phone_number,
            is_admin,
        );
        self.users.push(user.clone());
        self.save_users();
        user
    }

    /// Replace the stored user with the same id. Unknown id is a silent
    /// no-op: callers must check existence first.
    pub fn update_user(&mut self, user: User) {
        if let Some(index) = self.users.iter().position(|u| u.id == user.id) {
            self.users[index] = user;
            self.save_users();
        }
    }

    /// Delete a user and, since a booking cannot outlive its user, every
    /// booking the user owns.
    pub fn delete_user(&mut self, id: Ulid) {
        let booking_ids: Vec<Ulid> = self
            .bookings
            .iter()
            .filter(|b| b.user == id)
            .map(|b| b.id)
            .collect();
        for booking_id in booking_ids {
            self.delete_booking(booking_id);
        }
        self.users.retain(|u| u.id != id);
        self.save_users();
    }

    // ── Hotels ───────────────────────────────────────────────

    /// Idempotent on name collision: an existing hotel with the same name
    /// is returned instead of creating a duplicate.
    pub fn create_hotel(
        &mut self,
        name: impl Into<String>,
        location: impl Into<String>,
        rating: u8,
        description: impl Into<String>,
    ) -> Hotel {
        let name = name.into();
        let location = location.into();
        let description = description.into();
        let args = [
            ("name", name.clone()),
            ("location", location.clone()),
            ("rating", rating.to_string()),
            ("description", description.clone()),
        ];
        with_logging(Level::INFO, "create_hotel", &args, || {
            if let Some(existing) = self.get_hotel_by_name(&name) {
                return existing;
            }
            let hotel = Hotel::new(Ulid::new(), name, location, rating, description);
            self.hotels.push(hotel.clone());
            self.hotel_cache.insert(hotel.id, hotel.clone());
            self.save_hotels();
            hotel
        })
    }

    /// Replace the stored hotel with the same id and refresh the point
    /// cache. Unknown id is a silent no-op.
    pub fn update_hotel(&mut self, hotel: Hotel) {
        if let Some(index) = self.hotels.iter().position(|h| h.id == hotel.id) {
            self.hotel_cache.insert(hotel.id, hotel.clone());
            self.hotels[index] = hotel;
            self.save_hotels();
        }
    }

    /// Delete a hotel. Its rooms are unlinked and left orphaned rather
    /// than deleted.
    pub fn delete_hotel(&mut self, id: Ulid) {
        let mut orphaned = false;
        for room in &mut self.rooms {
            if room.hotel == Some(id) {
                room.hotel = None;
                orphaned = true;
            }
        }
        self.hotels.retain(|h| h.id != id);
        self.hotel_cache.remove(&id);
        self.save_hotels();
        if orphaned {
            self.save_rooms();
        }
    }

    // ── Rooms ────────────────────────────────────────────────

    /// Create a room, attaching it to its hotel when `hotel_id` resolves;
    /// otherwise the room starts orphaned.
    pub fn create_room(
        &mut self,
        hotel_id: Ulid,
        room_number: impl Into<String>,
        room_type: impl Into<String>,
        price_per_night: f64,
    ) -> Room {
        let room_number = room_number.into();
        let room_type = room_type.into();
        let args = [
            ("hotel_id", hotel_id.to_string()),
            ("room_number", room_number.clone()),
            ("room_type", room_type.clone()),
            ("price_per_night", price_per_night.to_string()),
        ];
        with_logging(Level::INFO, "create_room", &args, || {
            let mut room = Room::new(Ulid::new(), room_number, room_type, price_per_night);
            let mut updated_hotel = None;
            if let Some(index) = self.hotels.iter().position(|h| h.id == hotel_id) {
                let hotel = &mut self.hotels[index];
                hotel.add_room(room.id);
                room.hotel = Some(hotel.id);
                updated_hotel = Some(hotel.clone());
            }
            if let Some(hotel) = updated_hotel {
                self.hotel_cache.insert(hotel.id, hotel);
            }
            self.rooms.push(room.clone());
            self.save_rooms();
            room
        })
    }

    /// Replace the stored room with the same id. Unknown id is a silent
    /// no-op. Changing the room's hotel link here leaves the old hotel's
    /// room list stale until the next load — same caller hazard as a stale
    /// update.
    pub fn update_room(&mut self, room: Room) {
        if let Some(index) = self.rooms.iter().position(|r| r.id == room.id) {
            self.rooms[index] = room;
            self.save_rooms();
        }
    }

    /// Delete a room, its hotel link, and — since a booking cannot outlive
    /// its room — every booking for it.
    pub fn delete_room(&mut self, id: Ulid) {
        let booking_ids: Vec<Ulid> = self
            .bookings
            .iter()
            .filter(|b| b.room == id)
            .map(|b| b.id)
            .collect();
        for booking_id in booking_ids {
            self.delete_booking(booking_id);
        }

        let hotel_id = self.rooms.iter().find(|r| r.id == id).and_then(|r| r.hotel);
        let mut updated_hotel = None;
        if let Some(hotel_id) = hotel_id
            && let Some(index) = self.hotels.iter().position(|h| h.id == hotel_id)
        {
            let hotel = &mut self.hotels[index];
            hotel.remove_room(id);
            updated_hotel = Some(hotel.clone());
        }
        if let Some(hotel) = updated_hotel {
            self.hotel_cache.insert(hotel.id, hotel);
        }

        self.rooms.retain(|r| r.id != id);
        self.save_rooms();
    }

    // ── Bookings ─────────────────────────────────────────────

    /// Create a booking for a user and room. Returns `None` when either id
    /// does not resolve. The record is written to the ledger eagerly,
    /// before confirmation.
    pub fn create_booking(
        &mut self,
        user_id: Ulid,
        room_id: Ulid,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Option<Booking> {
        let args = [
            ("user_id", user_id.to_string()),
            ("room_id", room_id.to_string()),
            ("check_in", check_in.to_string()),
            ("check_out", check_out.to_string()),
        ];
        with_logging(Level::INFO, "create_booking", &args, || {
            let user_index = self.users.iter().position(|u| u.id == user_id)?;
            let room_index = self.rooms.iter().position(|r| r.id == room_id)?;

            let price_per_night = self.rooms[room_index].price_per_night;
            let booking = Booking::new(
                Ulid::new(),
                user_id,
                room_id,
                check_in,
                check_out,
                price_per_night,
            );
            self.users[user_index].add_booking(booking.id);
            self.rooms[room_index].add_booking(booking.id);
            self.bookings.push(booking.clone());

            self.save_bookings();
            self.write_booking_record(&booking);

            self.registry.check_and_clear(
                self.bookings.len(),
                self.config.eviction_threshold,
                EvictionStrategy::Lru,
                30,
            );

            Some(booking)
        })
    }

    /// Replace the stored booking with the same id, recomputing the total
    /// price from its dates and its room's current price. Unknown id is a
    /// silent no-op.
    pub fn update_booking(&mut self, mut booking: Booking) {
        if let Some(price_per_night) = self
            .rooms
            .iter()
            .find(|r| r.id == booking.room)
            .map(|r| r.price_per_night)
        {
            booking.recalculate_total(price_per_night);
        }
        if let Some(index) = self.bookings.iter().position(|b| b.id == booking.id) {
            self.bookings[index] = booking;
            self.save_bookings();
        }
    }

    /// Delete a booking: unlink it from its user and room, drop its ledger
    /// records, then run the frequency-based eviction check.
    pub fn delete_booking(&mut self, id: Ulid) {
        if let Some(booking) = self.bookings.iter().find(|b| b.id == id).cloned() {
            if let Some(user) = self.users.iter_mut().find(|u| u.id == booking.user) {
                user.remove_booking(id);
            }
            if let Some(room) = self.rooms.iter_mut().find(|r| r.id == booking.room) {
                room.remove_booking(id);
            }
        }
        self.bookings.retain(|b| b.id != id);
        self.save_bookings();
        if let Err(e) = self.ledger.remove(id) {
            tracing::error!(booking = %id, error = %e, "failed to remove booking records");
        }

        self.registry.check_and_clear(
            self.bookings.len(),
            self.config.eviction_threshold,
            EvictionStrategy::Lfu,
            25,
        );
    }

    // ── Recently viewed ──────────────────────────────────────

    /// Move the hotel to the front of the recently-viewed list, dropping
    /// any earlier occurrence and anything past the length bound.
    pub fn add_to_recently_viewed_hotels(&mut self, hotel: &Hotel) {
        self.recently_viewed.remove(&hotel.id);
        self.recently_viewed.push_front(hotel.id);
        self.recently_viewed.truncate(RECENT_LIMIT);
    }

    pub fn clear_recently_viewed_hotels(&mut self) {
        self.recently_viewed.clear();
    }
}
