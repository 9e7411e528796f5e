//! Booking ledger: one flat text record per booking in a dedicated
//! directory, instead of the snapshot mechanism the other entity types use.
//!
//! Record files are named `resert<username><5 random digits>.txt`. The
//! random suffix can collide with an existing record of another booking;
//! that risk is inherited behavior and deliberately left unchecked.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rand::Rng;
use ulid::Ulid;

use crate::model::{Booking, Hotel, Room, User};
use crate::observability;

const RECORD_PREFIX: &str = "resert";
const RECORD_EXT: &str = ".txt";

/// The required head of every record. Informational lines (price, email,
/// hotel name, ...) may follow and are ignored at load.
const REQUIRED_LINES: usize = 5;

/// A parsed ledger record, not yet resolved against the canonical
/// collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRecord {
    pub id: Ulid,
    pub user: Ulid,
    pub room: Ulid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

pub struct BookingLedger {
    dir: PathBuf,
}

impl BookingLedger {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    /// Write one booking record. A booking that already has a record on
    /// disk is rewritten in place; otherwise a fresh file name is drawn.
    pub fn write(
        &self,
        booking: &Booking,
        user: &User,
        room: &Room,
        hotel: Option<&Hotel>,
    ) -> io::Result<()> {
        self.ensure_dir()?;
        let path = self
            .find_record_path(booking.id)
            .unwrap_or_else(|| self.dir.join(record_file_name(&user.username)));

        let file = File::create(&path)?;
        let mut w = BufWriter::new(file);
        writeln!(w, "Booking ID: {}", booking.id)?;
        writeln!(w, "User ID: {}", booking.user)?;
        writeln!(w, "Room ID: {}", booking.room)?;
        writeln!(w, "Check-in Date: {}", booking.check_in)?;
        writeln!(w, "Check-out Date: {}", booking.check_out)?;
        writeln!(w, "Total Price: {}", booking.total_price)?;
        writeln!(w, "User Email: {}", user.email)?;
        writeln!(w, "User Full Name: {}", user.full_name)?;
        if let Some(hotel) = hotel {
            writeln!(w, "Hotel: {}", hotel.name)?;
            writeln!(w, "Room Number: {}", room.room_number)?;
            writeln!(w, "Room Type: {}", room.room_type)?;
        }
        w.flush()
    }

    /// Scan the ledger directory and parse every record file. Unparseable
    /// files are skipped with a warning; for a duplicated booking id the
    /// first record (in file-name order) wins. Resolution of user/room ids
    /// against the canonical collections is the store's job.
    pub fn load(&self) -> Vec<LedgerRecord> {
        let mut records = Vec::new();
        let mut seen: HashSet<Ulid> = HashSet::new();
        for path in self.record_paths() {
            match parse_record(&path) {
                Some(record) => {
                    if seen.insert(record.id) {
                        metrics::counter!(observability::LEDGER_RECORDS_LOADED_TOTAL).increment(1);
                        records.push(record);
                    } else {
                        tracing::warn!(path = %path.display(), "duplicate booking id in ledger, keeping first");
                        metrics::counter!(observability::LEDGER_RECORDS_SKIPPED_TOTAL).increment(1);
                    }
                }
                None => {
                    tracing::warn!(path = %path.display(), "skipping unparseable booking record");
                    metrics::counter!(observability::LEDGER_RECORDS_SKIPPED_TOTAL).increment(1);
                }
            }
        }
        records
    }

    /// Delete every record file for `booking_id`, so the booking leaves the
    /// resolvable set on next load. Returns how many files were removed.
    pub fn remove(&self, booking_id: Ulid) -> io::Result<usize> {
        let mut removed = 0;
        for path in self.record_paths() {
            if parse_record(&path).is_some_and(|r| r.id == booking_id) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Delete every record file in the ledger directory.
    pub fn clear(&self) -> io::Result<()> {
        for path in self.record_paths() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn find_record_path(&self, booking_id: Ulid) -> Option<PathBuf> {
        self.record_paths()
            .into_iter()
            .find(|path| parse_record(path).is_some_and(|r| r.id == booking_id))
    }

    /// All files matching the record naming convention, in name order so
    /// first-wins semantics are deterministic.
    fn record_paths(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(RECORD_PREFIX) && n.ends_with(RECORD_EXT))
            })
            .collect();
        paths.sort();
        paths
    }
}

fn record_file_name(username: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(10_000..100_000);
    format!("{RECORD_PREFIX}{username}{suffix}{RECORD_EXT}")
}

/// Positional `Key: Value` parse of the five required lines. Key names are
/// not checked, matching the original record reader.
fn parse_record(path: &Path) -> Option<LedgerRecord> {
    let text = fs::read_to_string(path).ok()?;
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < REQUIRED_LINES {
        return None;
    }
    Some(LedgerRecord {
        id: Ulid::from_string(field(lines[0])?).ok()?,
        user: Ulid::from_string(field(lines[1])?).ok()?,
        room: Ulid::from_string(field(lines[2])?).ok()?,
        check_in: field(lines[3])?.parse().ok()?,
        check_out: field(lines[4])?.parse().ok()?,
    })
}

fn field(line: &str) -> Option<&str> {
    line.split_once(": ").map(|(_, value)| value.trim())
}
