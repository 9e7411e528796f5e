//! innkeep — a bookable-inventory core.
//!
//! The authoritative state is an in-memory [`store::EntityStore`] of users,
//! hotels, rooms, and bookings, backed by per-type snapshot files and a
//! per-booking text ledger. Cross-entity relationships are id-based and
//! rebound to canonical instances by a reconciliation pass at load. A
//! registry of tracked caches gives hotel lookups and memoized sorts their
//! point caches, evicted in strategy-driven passes at booking-count
//! thresholds.
//!
//! The UI layer is an external consumer; this crate exposes only entity
//! values, ids, and the store operations.

pub mod cache;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod observability;
pub mod recent;
pub mod snapshot;
pub mod sortsearch;
pub mod store;

pub use cache::{CacheRegistry, EvictionStrategy, Memoized, TrackedCache};
pub use ledger::{BookingLedger, LedgerRecord};
pub use model::{Booking, Hotel, Room, User};
pub use recent::LinkedList;
pub use sortsearch::{MemoSorter, SortOrder};
pub use store::{EntityStore, StoreConfig, StoreError};
