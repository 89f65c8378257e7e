use crate::db::connection::{init_db, table_exists, Database};
use crate::domain::{Listing, StoredListing};
use crate::errors::Result;
use chrono::Utc;
use rusqlite::{params, Row};
use std::collections::HashSet;

/// Durable record of which listings exist and which were announced.
pub trait ListingStore {
    /// Every known listing id. Empty before the first ingest.
    fn load_known_ids(&mut self) -> Result<HashSet<String>>;

    /// Inserts listings already filtered against `load_known_ids`.
    /// All rows land or none do. Returns the number inserted.
    fn append_new(&mut self, listings: &[Listing]) -> Result<usize>;

    /// The outbox: unsent listings, oldest first.
    fn pending(&mut self) -> Result<Vec<StoredListing>>;

    /// Flips `notification_sent` to true and commits.
    fn mark_sent(&mut self, id: &str) -> Result<()>;
}

impl ListingStore for Database {
    fn load_known_ids(&mut self) -> Result<HashSet<String>> {
        self.with_conn(|conn| {
            if !table_exists(conn, "listings")? {
                log::info!("No listings table yet, starting with zero known ids");
                return Ok(HashSet::new());
            }

            let mut stmt = conn.prepare("SELECT id FROM listings")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

            let mut ids = HashSet::new();
            for r in rows {
                ids.insert(r?);
            }
            Ok(ids)
        })
    }

    fn append_new(&mut self, listings: &[Listing]) -> Result<usize> {
        if listings.is_empty() {
            return Ok(0);
        }
        init_db(self)?;

        let now = Utc::now().naive_utc();

        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    r#"
                    INSERT INTO listings (
                        id, address, postal_code, price,
                        living_area, room_count, bedroom_count,
                        energy_label, year_built,
                        first_seen_at, notification_sent
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0)
                    "#,
                )?;

                for l in listings {
                    stmt.execute(params![
                        l.id,
                        l.address,
                        l.postal_code,
                        l.price,
                        l.living_area,
                        l.room_count,
                        l.bedroom_count,
                        l.energy_label,
                        l.year_built,
                        now,
                    ])?;
                }
            }
            // Dropping `tx` on an early return above rolls the batch back.
            tx.commit()?;
            Ok(listings.len())
        })
    }

    fn pending(&mut self) -> Result<Vec<StoredListing>> {
        self.with_conn(|conn| {
            if !table_exists(conn, "listings")? {
                return Ok(Vec::new());
            }

            let mut stmt = conn.prepare(
                r#"
                SELECT
                    seq,               -- 0
                    id,                -- 1
                    address,           -- 2
                    postal_code,       -- 3
                    price,             -- 4
                    living_area,       -- 5
                    room_count,        -- 6
                    bedroom_count,     -- 7
                    energy_label,      -- 8
                    year_built,        -- 9
                    first_seen_at,     -- 10
                    notification_sent  -- 11
                FROM listings
                WHERE notification_sent = 0
                ORDER BY seq
                "#,
            )?;

            let rows = stmt.query_map([], stored_listing_from_row)?;

            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
    }

    fn mark_sent(&mut self, id: &str) -> Result<()> {
        let now = Utc::now().naive_utc();
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE listings SET notification_sent = 1, notified_at = ?2
                 WHERE id = ?1 AND notification_sent = 0",
                params![id, now],
            )?;
            if changed == 0 {
                log::warn!("Listing {id} was already marked sent or does not exist");
            }
            Ok(())
        })
    }
}

fn stored_listing_from_row(row: &Row<'_>) -> rusqlite::Result<StoredListing> {
    Ok(StoredListing {
        seq: row.get(0)?,
        listing: Listing {
            id: row.get(1)?,
            address: row.get(2)?,
            postal_code: row.get(3)?,
            price: row.get(4)?,
            living_area: row.get(5)?,
            room_count: row.get(6)?,
            bedroom_count: row.get(7)?,
            energy_label: row.get(8)?,
            year_built: row.get(9)?,
        },
        first_seen_at: row.get(10)?,
        notification_sent: row.get(11)?,
    })
}

/// (pending, total) listing counts, for `status`.
pub fn outbox_counts(db: &mut Database) -> Result<(i64, i64)> {
    db.with_conn(|conn| {
        if !table_exists(conn, "listings")? {
            return Ok((0, 0));
        }
        let counts = conn.query_row(
            "SELECT COALESCE(SUM(notification_sent = 0), 0), COUNT(*) FROM listings",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(counts)
    })
}
