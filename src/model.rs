use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Whole nights between check-in and check-out. Zero when checkout is on or
/// before checkin.
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days().max(0)
}

/// An application user. Owns an ordered list of booking ids; the bookings
/// themselves live in the store's booking collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Ulid,
    /// Unique, matched case-insensitively on lookup.
    pub username: String,
    /// Stored and compared as a plain value — a known weakness, kept as-is.
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub is_admin: bool,
    /// Ids of bookings made by this user, oldest first. Derived state:
    /// rebuilt from the booking collection at load.
    pub bookings: Vec<Ulid>,
}

impl User {
    pub fn new(
        id: Ulid,
        username: impl Into<String>,
        password: impl Into<String>,
        full_name: impl Into<String>,
        email: impl Into<String>,
        phone_number: impl Into<String>,
        is_admin: bool,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            password: password.into(),
            full_name: full_name.into(),
            email: email.into(),
            phone_number: phone_number.into(),
            is_admin,
            bookings: Vec::new(),
        }
    }

    pub fn add_booking(&mut self, booking_id: Ulid) {
        if !self.bookings.contains(&booking_id) {
            self.bookings.push(booking_id);
        }
    }

    pub fn remove_booking(&mut self, booking_id: Ulid) {
        self.bookings.retain(|b| *b != booking_id);
    }
}

/// A hotel. Owns an ordered list of room ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: Ulid,
    /// Unique among canonical hotels.
    pub name: String,
    pub location: String,
    /// 1–5 stars.
    pub rating: u8,
    pub description: String,
    /// Ids of rooms in this hotel. Derived state: rebuilt from the room
    /// collection at load.
    pub rooms: Vec<Ulid>,
}

impl Hotel {
    pub fn new(
        id: Ulid,
        name: impl Into<String>,
        location: impl Into<String>,
        rating: u8,
        description: impl Into<String>,
    ) -> Self {
        debug_assert!((1..=5).contains(&rating), "hotel rating must be 1-5");
        Self {
            id,
            name: name.into(),
            location: location.into(),
            rating,
            description: description.into(),
            rooms: Vec::new(),
        }
    }

    pub fn add_room(&mut self, room_id: Ulid) {
        if !self.rooms.contains(&room_id) {
            self.rooms.push(room_id);
        }
    }

    pub fn remove_room(&mut self, room_id: Ulid) {
        self.rooms.retain(|r| *r != room_id);
    }
}

/// A room in a hotel. `hotel` is `None` when the owning hotel has been
/// deleted (an orphaned room is allowed; a user-less or room-less booking
/// is not).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: Ulid,
    pub room_number: String,
    pub room_type: String,
    pub price_per_night: f64,
    pub available: bool,
    pub hotel: Option<Ulid>,
    /// Ids of bookings for this room. Derived state: rebuilt at load.
    pub bookings: Vec<Ulid>,
}

impl Room {
    pub fn new(
        id: Ulid,
        room_number: impl Into<String>,
        room_type: impl Into<String>,
        price_per_night: f64,
    ) -> Self {
        debug_assert!(price_per_night > 0.0, "price per night must be positive");
        Self {
            id,
            room_number: room_number.into(),
            room_type: room_type.into(),
            price_per_night,
            available: true,
            hotel: None,
            bookings: Vec::new(),
        }
    }

    pub fn add_booking(&mut self, booking_id: Ulid) {
        if !self.bookings.contains(&booking_id) {
            self.bookings.push(booking_id);
        }
    }

    pub fn remove_booking(&mut self, booking_id: Ulid) {
        self.bookings.retain(|b| *b != booking_id);
    }
}

/// A booking of one room by one user for a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub user: Ulid,
    pub room: Ulid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    /// Always `nights * price_per_night` of the booked room; recomputed
    /// whenever either date changes.
    pub total_price: f64,
    pub confirmed: bool,
}

impl Booking {
    pub fn new(
        id: Ulid,
        user: Ulid,
        room: Ulid,
        check_in: NaiveDate,
        check_out: NaiveDate,
        price_per_night: f64,
    ) -> Self {
        let mut booking = Self {
            id,
            user,
            room,
            check_in,
            check_out,
            total_price: 0.0,
            confirmed: false,
        };
        booking.recalculate_total(price_per_night);
        booking
    }

    pub fn nights(&self) -> i64 {
        nights_between(self.check_in, self.check_out)
    }

    pub fn recalculate_total(&mut self, price_per_night: f64) {
        self.total_price = self.nights() as f64 * price_per_night;
    }

    /// Replace both dates and recompute the total in one step.
    pub fn set_dates(&mut self, check_in: NaiveDate, check_out: NaiveDate, price_per_night: f64) {
        self.check_in = check_in;
        self.check_out = check_out;
        self.recalculate_total(price_per_night);
    }
}
