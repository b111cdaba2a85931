//! Embedded schema migrations.
//!
//! The SQLite scripts build the local mirror; the Postgres script is the
//! hosted schema and is only printed (`ytprod db schema`), never applied here.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;

use super::diesel_pool::DieselError;
use super::now_timestamp;

/// Hosted Postgres schema (tables, indexes, `updated_at` triggers).
pub const POSTGRES_SCHEMA: &str = include_str!("../../migrations/postgres/001_initial_schema.sql");

/// Ordered SQLite migrations: `(version, sql)`.
const SQLITE_MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial_schema",
    include_str!("../../migrations/sqlite/001_initial_schema.sql"),
)];

diesel::table! {
    schema_migrations (version) {
        version -> Text,
        applied_at -> Text,
    }
}

/// Apply every migration not yet recorded in `schema_migrations`.
///
/// Returns the number of migrations applied.
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<usize, DieselError> {
    conn.batch_execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )?;

    let mut applied = 0;
    for (version, sql) in SQLITE_MIGRATIONS {
        let already: i64 = schema_migrations::table
            .filter(schema_migrations::version.eq(*version))
            .count()
            .get_result(conn)?;
        if already > 0 {
            continue;
        }

        conn.transaction::<_, DieselError, _>(|conn| {
            conn.batch_execute(sql)?;
            diesel::insert_into(schema_migrations::table)
                .values((
                    schema_migrations::version.eq(*version),
                    schema_migrations::applied_at.eq(now_timestamp()),
                ))
                .execute(conn)?;
            Ok(())
        })?;
        tracing::debug!("Applied migration {}", version);
        applied += 1;
    }

    Ok(applied)
}

/// Versions of all embedded SQLite migrations, in order.
pub fn known_versions() -> impl Iterator<Item = &'static str> {
    SQLITE_MIGRATIONS.iter().map(|(version, _)| *version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let mut conn = SqliteConnection::establish(":memory:").unwrap();
        assert_eq!(run_migrations(&mut conn).unwrap(), SQLITE_MIGRATIONS.len());
        assert_eq!(run_migrations(&mut conn).unwrap(), 0);
    }

    #[test]
    fn test_postgres_schema_declares_every_table() {
        for table in ["users", "videos", "transcripts", "summaries", "jobs"] {
            assert!(
                POSTGRES_SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")),
                "missing table {table}"
            );
            assert!(POSTGRES_SCHEMA.contains(&format!("update_{table}_updated_at")));
        }
    }

    #[test]
    fn test_known_versions() {
        assert_eq!(known_versions().next(), Some("001_initial_schema"));
    }
}
