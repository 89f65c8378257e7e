use crate::db::connection::table_exists;
use crate::errors::Result;
use rusqlite::{params, Connection};

#[derive(Debug)]
pub struct IngestRun {
    pub id: i64,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    pub fetched: Option<i64>,
    pub inserted: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
}

pub fn start_ingest_run(conn: &Connection, now: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO ingest_runs (started_at, success) VALUES (?, 0)",
        params![now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn end_ingest_run(
    conn: &Connection,
    run_id: i64,
    now: i64,
    fetched: usize,
    inserted: usize,
    error: Option<String>,
) -> Result<()> {
    conn.execute(
        "UPDATE ingest_runs SET finished_at = ?, fetched = ?, inserted = ?, success = ?, error_message = ? WHERE id = ?",
        params![now, fetched as i64, inserted as i64, error.is_none(), error, run_id],
    )?;
    Ok(())
}

pub fn get_recent_ingest_runs(conn: &Connection, limit: usize) -> Result<Vec<IngestRun>> {
    if !table_exists(conn, "ingest_runs")? {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        "SELECT id, started_at, finished_at, fetched, inserted, success, error_message FROM ingest_runs ORDER BY id DESC LIMIT ?",
    )?;

    let rows = stmt.query_map(params![limit as i64], |row| {
        Ok(IngestRun {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            fetched: row.get(3)?,
            inserted: row.get(4)?,
            success: row.get(5)?,
            error_message: row.get(6)?,
        })
    })?;

    let mut runs = Vec::new();
    for r in rows {
        runs.push(r?);
    }
    Ok(runs)
}
