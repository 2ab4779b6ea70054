use crate::error::LoadError;
use rusqlite::types::Value;
use rusqlite::Connection;
use tracing::info;

/// Destination table name.
pub const TABLE: &str = "fl_insurance";

/// Fixed destination schema: string-formatted CSV fields land in these
/// columns through SQLite's own affinity rules, so the loader never needs
/// to coerce values itself.
const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS fl_insurance (
    policyID INTEGER NOT NULL PRIMARY KEY,
    statecode TEXT NOT NULL,
    county TEXT NOT NULL,
    eq_site_limit REAL NOT NULL,
    hu_site_limit REAL NOT NULL,
    fl_site_limit REAL NOT NULL,
    fr_site_limit REAL NOT NULL,
    tiv_2011 REAL NOT NULL,
    tiv_2012 REAL NOT NULL,
    eq_site_deductible REAL NOT NULL,
    hu_site_deductible REAL NOT NULL,
    fl_site_deductible REAL NOT NULL,
    fr_site_deductible REAL NOT NULL,
    point_latitude REAL NOT NULL,
    point_longitude REAL NOT NULL,
    line TEXT NOT NULL,
    construction TEXT NOT NULL,
    point_granularity INTEGER NOT NULL
)";

/// Create the destination table if missing and clear any prior contents, so
/// every load starts against an empty table. Safe to call repeatedly.
pub fn ensure_table(conn: &Connection) -> Result<(), LoadError> {
    conn.execute(CREATE_TABLE, [])?;
    let cleared = conn.execute(&format!("DELETE FROM {}", TABLE), [])?;
    if cleared > 0 {
        info!(rows = cleared, "table {} existed, cleared prior contents", TABLE);
    }
    Ok(())
}

/// Log the first `limit` rows of the destination table. Diagnostic aid to
/// eyeball a load's outcome.
pub fn preview(conn: &Connection, limit: usize) -> Result<(), LoadError> {
    let mut stmt = conn.prepare(&format!("SELECT * FROM {} LIMIT {}", TABLE, limit))?;
    let columns = stmt.column_count();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut fields = Vec::with_capacity(columns);
        for i in 0..columns {
            let value: Value = row.get(i)?;
            fields.push(match value {
                Value::Null => "NULL".to_string(),
                Value::Integer(n) => n.to_string(),
                Value::Real(f) => f.to_string(),
                Value::Text(s) => s,
                Value::Blob(b) => format!("<{} bytes>", b.len()),
            });
        }
        info!("{}", fields.join(" | "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use rusqlite::Connection;

    fn count(conn: &Connection) -> Result<i64> {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", TABLE), [], |r| r.get(0))?)
    }

    #[test]
    fn ensure_table_is_idempotent_and_truncating() -> Result<()> {
        let conn = Connection::open_in_memory()?;
        ensure_table(&conn)?;
        assert_eq!(count(&conn)?, 0);

        conn.execute(
            &format!(
                "INSERT INTO {} VALUES (1, 'FL', 'CLAY COUNTY', 0, 1, 0, 0, \
                 1, 1, 0, 0, 0, 0, 30.1, -81.7, 'Residential', 'Wood', 1)",
                TABLE
            ),
            [],
        )?;
        assert_eq!(count(&conn)?, 1);

        // second ensure on a populated table clears it instead of failing
        ensure_table(&conn)?;
        assert_eq!(count(&conn)?, 0);
        Ok(())
    }

    #[test]
    fn preview_handles_empty_and_populated_tables() -> Result<()> {
        let conn = Connection::open_in_memory()?;
        ensure_table(&conn)?;
        preview(&conn, 10)?;

        conn.execute(
            &format!(
                "INSERT INTO {} VALUES (2, 'FL', 'SUWANNEE COUNTY', 0, 1, 0, 0, \
                 1, 1, 0, 0, 0, 0, 30.0, -83.0, 'Residential', 'Wood', 3)",
                TABLE
            ),
            [],
        )?;
        preview(&conn, 10)?;
        Ok(())
    }
}
