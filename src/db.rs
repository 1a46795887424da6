use anyhow::Result;
use rusqlite::Connection;

use crate::flatten::FlatTables;

const DB_PATH: &str = "data/workouts.sqlite";

pub fn connect() -> Result<Connection> {
    std::fs::create_dir_all("data")?;
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS workout_pages (
            id          INTEGER PRIMARY KEY,
            url         TEXT UNIQUE NOT NULL,
            username    TEXT,
            parsed_json TEXT,
            error       TEXT,
            scraped_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_pages_username ON workout_pages(username);

        -- Flattened relational form
        CREATE TABLE IF NOT EXISTS workouts (
            workout_id      TEXT PRIMARY KEY,
            name            TEXT,
            created_at      TEXT,
            created_by      TEXT,
            duration        INTEGER,
            cardio_duration INTEGER,
            energy_level    INTEGER,
            self_rating     INTEGER,
            muscles_used    TEXT,
            url             TEXT NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_workouts_url ON workouts(url);

        CREATE TABLE IF NOT EXISTS workout_components (
            workout_component_id TEXT PRIMARY KEY,
            workout_id           TEXT NOT NULL REFERENCES workouts(workout_id),
            sequence             INTEGER,
            rest_time            INTEGER,
            created_at           TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_components_workout
            ON workout_components(workout_id);

        CREATE TABLE IF NOT EXISTS sets (
            set_id               TEXT PRIMARY KEY,
            workout_component_id TEXT NOT NULL REFERENCES workout_components(workout_component_id),
            sequence             INTEGER,
            rest_time            INTEGER,
            type                 TEXT CHECK(type IN ('STRAIGHT_SET','SUPER_SET','DROP_SET')),
            created_at           TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_sets_component ON sets(workout_component_id);

        CREATE TABLE IF NOT EXISTS set_components (
            set_component_id TEXT PRIMARY KEY,
            set_id           TEXT NOT NULL REFERENCES sets(set_id),
            sequence         INTEGER,
            weight_metric    TEXT CHECK(weight_metric IN ('lbs','kg','seconds')),
            weight           INTEGER,
            reps             INTEGER,
            rest_time        INTEGER,
            exercise_link    TEXT,
            created_at       TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_set_components_set ON set_components(set_id);
        ",
    )?;
    Ok(())
}

// ── Scraping ──

pub struct PageRow {
    pub url: String,
    pub username: Option<String>,
    pub parsed_json: Option<String>,
    pub error: Option<String>,
}

pub fn save_pages(conn: &Connection, rows: &[PageRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO workout_pages (url, username, parsed_json, error)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for r in rows {
            count += stmt.execute(rusqlite::params![r.url, r.username, r.parsed_json, r.error])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn fetch_scraped_urls(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT url FROM workout_pages")?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Flattening ──

/// Parsed pages whose workout has not been flattened yet.
pub fn fetch_unflattened(conn: &Connection, limit: Option<usize>) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT p.parsed_json
         FROM workout_pages p
         LEFT JOIN workouts w ON w.url = p.url
         WHERE p.parsed_json IS NOT NULL AND w.url IS NULL
         ORDER BY p.id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn save_flattened(conn: &Connection, tables: &FlatTables) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut w_stmt = tx.prepare(
            "INSERT OR REPLACE INTO workouts
             (workout_id, name, created_at, created_by, duration, cardio_duration,
              energy_level, self_rating, muscles_used, url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        for w in &tables.workouts {
            w_stmt.execute(rusqlite::params![
                w.workout_id, w.name, w.created_at, w.created_by, w.duration,
                w.cardio_duration, w.energy_level, w.self_rating, w.muscles_used, w.url,
            ])?;
        }

        let mut c_stmt = tx.prepare(
            "INSERT OR REPLACE INTO workout_components
             (workout_component_id, workout_id, sequence, rest_time, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for c in &tables.workout_components {
            c_stmt.execute(rusqlite::params![
                c.workout_component_id, c.workout_id, c.sequence, c.rest_time, c.created_at,
            ])?;
        }

        let mut s_stmt = tx.prepare(
            "INSERT OR REPLACE INTO sets
             (set_id, workout_component_id, sequence, rest_time, type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for s in &tables.sets {
            s_stmt.execute(rusqlite::params![
                s.set_id, s.workout_component_id, s.sequence, s.rest_time, s.kind, s.created_at,
            ])?;
        }

        let mut sc_stmt = tx.prepare(
            "INSERT OR REPLACE INTO set_components
             (set_component_id, set_id, sequence, weight_metric, weight, reps,
              rest_time, exercise_link, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for sc in &tables.set_components {
            sc_stmt.execute(rusqlite::params![
                sc.set_component_id, sc.set_id, sc.sequence, sc.weight_metric,
                sc.weight, sc.reps, sc.rest_time, sc.exercise_link, sc.created_at,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Stats ──

pub struct Stats {
    pub pages: usize,
    pub parsed: usize,
    pub errors: usize,
    pub workouts: usize,
    pub workout_components: usize,
    pub sets: usize,
    pub set_components: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let pages: usize = conn.query_row("SELECT COUNT(*) FROM workout_pages", [], |r| r.get(0))?;
    let parsed: usize = conn.query_row(
        "SELECT COUNT(*) FROM workout_pages WHERE parsed_json IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let errors: usize = conn.query_row(
        "SELECT COUNT(*) FROM workout_pages WHERE error IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let workouts: usize = conn.query_row("SELECT COUNT(*) FROM workouts", [], |r| r.get(0))?;
    let workout_components: usize =
        conn.query_row("SELECT COUNT(*) FROM workout_components", [], |r| r.get(0))?;
    let sets: usize = conn.query_row("SELECT COUNT(*) FROM sets", [], |r| r.get(0))?;
    let set_components: usize =
        conn.query_row("SELECT COUNT(*) FROM set_components", [], |r| r.get(0))?;
    Ok(Stats {
        pages,
        parsed,
        errors,
        workouts,
        workout_components,
        sets,
        set_components,
    })
}
