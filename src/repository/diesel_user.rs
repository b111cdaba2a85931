//! Diesel-based user repository for SQLite.

use diesel::prelude::*;
use uuid::Uuid;

use super::diesel_models::{NewUser, UserRecord};
use super::diesel_pool::{run_blocking, SqlitePool};
use super::{now_timestamp, parse_datetime, Result};
use crate::models::User;
use crate::schema::users;

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            id: record.id,
            email: record.email,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

/// Diesel-based user repository with compile-time query checking.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: SqlitePool,
}

impl DieselUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new user with a generated id. Fails if the email is taken.
    pub async fn create(&self, email: &str) -> Result<User> {
        let id = Uuid::new_v4().to_string();
        let email = email.to_string();
        let pool = self.pool.clone();

        let record = run_blocking(pool, move |conn| {
            let now = now_timestamp();
            diesel::insert_into(users::table)
                .values(&NewUser {
                    id: &id,
                    email: &email,
                    created_at: &now,
                    updated_at: &now,
                })
                .execute(conn)?;
            users::table.find(&id).first::<UserRecord>(conn)
        })
        .await?;

        Ok(record.into())
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> Result<Option<User>> {
        let id = id.to_string();
        let pool = self.pool.clone();

        let record = run_blocking(pool, move |conn| {
            users::table.find(&id).first::<UserRecord>(conn).optional()
        })
        .await?;

        Ok(record.map(User::from))
    }

    /// Count all users.
    pub async fn count(&self) -> Result<u64> {
        let pool = self.pool.clone();

        let count = run_blocking(pool, move |conn| {
            use diesel::dsl::count_star;
            users::table.select(count_star()).first::<i64>(conn)
        })
        .await?;

        Ok(count as u64)
    }

    /// Change a user's email.
    pub async fn update_email(&self, id: &str, email: &str) -> Result<bool> {
        let id = id.to_string();
        let email = email.to_string();
        let pool = self.pool.clone();

        let rows = run_blocking(pool, move |conn| {
            diesel::update(users::table.find(&id))
                .set(users::email.eq(&email))
                .execute(conn)
        })
        .await?;

        Ok(rows > 0)
    }

    /// Delete a user. Their videos keep existing with `user_id` cleared.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        let pool = self.pool.clone();

        let rows = run_blocking(pool, move |conn| {
            diesel::delete(users::table.find(&id)).execute(conn)
        })
        .await?;

        Ok(rows > 0)
    }
}
