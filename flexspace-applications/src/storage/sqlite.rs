//! SQLite storage backend

use super::{BookingStorage, RoomStorage, UserStorage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flexspace_core::{
    Booking, BookingFilter, BookingId, BookingStatus, FlexSpaceError, FlexSpaceResult,
    NewBooking, NewRoom, NewUser, PageRequest, Room, RoomFilter, RoomId, User, UserFilter, UserId,
};
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info};

const COMPONENT: &str = "sqlite_storage";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE COLLATE NOCASE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'User',
        token_version INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS rooms (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        slug TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        capacity INTEGER NOT NULL,
        price_hour REAL NOT NULL,
        description TEXT,
        amenities TEXT NOT NULL DEFAULT '[]',
        photos TEXT NOT NULL DEFAULT '[]',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bookings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        room_id INTEGER NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
        date_start INTEGER NOT NULL,
        date_end INTEGER NOT NULL,
        total_price REAL NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_bookings_room ON bookings(room_id, date_start)",
    "CREATE INDEX IF NOT EXISTS idx_bookings_user ON bookings(user_id)",
];

/// Storage backed by an sqlx SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

fn db_error(message: &str, e: sqlx::Error) -> FlexSpaceError {
    error!("{}: {}", message, e);
    FlexSpaceError::storage(COMPONENT, message, e)
}

/// Map unique-constraint violations to Conflict, everything else to a storage error
fn write_error(conflict_message: &str, e: sqlx::Error) -> FlexSpaceError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            FlexSpaceError::conflict(conflict_message)
        }
        _ => db_error("Write failed", e),
    }
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> FlexSpaceResult<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| FlexSpaceError::storage(COMPONENT, format!("Failed to read column {}", name), e))
}

fn parse_column<T>(row: &SqliteRow, name: &str) -> FlexSpaceResult<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = column(row, name)?;
    raw.parse()
        .map_err(|e: String| FlexSpaceError::internal(COMPONENT, format!("column {}: {}", name, e)))
}

fn json_column(row: &SqliteRow, name: &str) -> FlexSpaceResult<Vec<String>> {
    let raw: String = column(row, name)?;
    Ok(serde_json::from_str(&raw)?)
}

fn millis_column(row: &SqliteRow, name: &str) -> FlexSpaceResult<DateTime<Utc>> {
    let millis: i64 = column(row, name)?;
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        FlexSpaceError::internal(COMPONENT, format!("column {} out of range", name))
    })
}

/// Substring pattern for `LIKE … ESCAPE '\'`; `%` and `_` in the term match literally.
fn like_pattern(search: &Option<String>) -> Option<String> {
    search.as_deref().filter(|s| !s.is_empty()).map(|s| {
        let mut pattern = String::with_capacity(s.len() + 2);
        pattern.push('%');
        for c in s.to_lowercase().chars() {
            if matches!(c, '\\' | '%' | '_') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    })
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create from database URL, creating the file if needed
    pub async fn from_url(database_url: &str) -> FlexSpaceResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| db_error("Invalid SQLite URL", e))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        // Every connection to `:memory:` would see its own empty database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| db_error("Failed to connect to SQLite database", e))?;

        info!("Connected to SQLite database {}", database_url);
        Ok(Self::new(pool))
    }

    /// Create database tables
    pub async fn create_tables(&self) -> FlexSpaceResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("Failed to create schema", e))?;
        }
        info!("Database schema ready");
        Ok(())
    }

    fn row_to_user(row: &SqliteRow) -> FlexSpaceResult<User> {
        Ok(User {
            id: column(row, "id")?,
            name: column(row, "name")?,
            email: column(row, "email")?,
            password_hash: column(row, "password_hash")?,
            role: parse_column(row, "role")?,
            token_version: column(row, "token_version")?,
            created_at: column(row, "created_at")?,
            updated_at: column(row, "updated_at")?,
        })
    }

    fn row_to_room(row: &SqliteRow) -> FlexSpaceResult<Room> {
        Ok(Room {
            id: column(row, "id")?,
            slug: column(row, "slug")?,
            name: column(row, "name")?,
            room_type: parse_column(row, "type")?,
            capacity: column(row, "capacity")?,
            price_hour: column(row, "price_hour")?,
            description: column(row, "description")?,
            amenities: json_column(row, "amenities")?,
            photos: json_column(row, "photos")?,
            created_at: column(row, "created_at")?,
            updated_at: column(row, "updated_at")?,
        })
    }

    fn row_to_booking(row: &SqliteRow) -> FlexSpaceResult<Booking> {
        Ok(Booking {
            id: column(row, "id")?,
            user_id: column(row, "user_id")?,
            room_id: column(row, "room_id")?,
            date_start: millis_column(row, "date_start")?,
            date_end: millis_column(row, "date_end")?,
            total_price: column(row, "total_price")?,
            status: parse_column(row, "status")?,
            created_at: column(row, "created_at")?,
            updated_at: column(row, "updated_at")?,
        })
    }

    async fn user_or_not_found(&self, id: UserId) -> FlexSpaceResult<User> {
        self.find_user(id)
            .await?
            .ok_or_else(|| FlexSpaceError::not_found(format!("User {}", id)))
    }
}

#[async_trait]
impl UserStorage for SqliteStorage {
    async fn create_user(&self, user: NewUser) -> FlexSpaceResult<User> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role, token_version, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("email already registered", e))?;

        let id = result.last_insert_rowid();
        debug!("Inserted user {}", id);
        self.user_or_not_found(id).await
    }

    async fn find_user(&self, id: UserId) -> FlexSpaceResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load user", e))?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> FlexSpaceResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ? COLLATE NOCASE")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load user", e))?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> FlexSpaceResult<(Vec<User>, u64)> {
        const WHERE: &str = "WHERE (?1 IS NULL OR role = ?1) \
             AND (?2 IS NULL OR lower(name) LIKE ?2 ESCAPE '\\' OR lower(email) LIKE ?2 ESCAPE '\\')";
        let role = filter.role.map(|r| r.as_str());
        let pattern = like_pattern(&filter.search);

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users {}", WHERE))
            .bind(role)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to count users", e))?;

        let rows = sqlx::query(&format!(
            "SELECT * FROM users {} ORDER BY id LIMIT ?3 OFFSET ?4",
            WHERE
        ))
        .bind(role)
        .bind(&pattern)
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list users", e))?;

        let users = rows.iter().map(Self::row_to_user).collect::<Result<_, _>>()?;
        Ok((users, total as u64))
    }

    async fn update_user(&self, user: &User) -> FlexSpaceResult<User> {
        let result =
            sqlx::query("UPDATE users SET name = ?, email = ?, role = ?, updated_at = ? WHERE id = ?")
                .bind(&user.name)
                .bind(&user.email)
                .bind(user.role.as_str())
                .bind(Utc::now())
                .bind(user.id)
                .execute(&self.pool)
                .await
                .map_err(|e| write_error("email already registered", e))?;

        if result.rows_affected() == 0 {
            return Err(FlexSpaceError::not_found(format!("User {}", user.id)));
        }
        self.user_or_not_found(user.id).await
    }

    async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
        revoke_tokens: bool,
    ) -> FlexSpaceResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, token_version = token_version + ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(if revoke_tokens { 1_i64 } else { 0 })
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update password", e))?;

        if result.rows_affected() == 0 {
            return Err(FlexSpaceError::not_found(format!("User {}", id)));
        }
        Ok(())
    }

    async fn increment_token_version(&self, id: UserId) -> FlexSpaceResult<i64> {
        let version: Option<i64> = sqlx::query_scalar(
            "UPDATE users SET token_version = token_version + 1 WHERE id = ? RETURNING token_version",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to bump token version", e))?;

        version.ok_or_else(|| FlexSpaceError::not_found(format!("User {}", id)))
    }

    async fn rotate_token_version(
        &self,
        id: UserId,
        expected: i64,
    ) -> FlexSpaceResult<Option<i64>> {
        let version: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE users SET token_version = token_version + 1
            WHERE id = ? AND token_version = ?
            RETURNING token_version
            "#,
        )
        .bind(id)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to rotate token version", e))?;

        if version.is_none() && self.find_user(id).await?.is_none() {
            return Err(FlexSpaceError::not_found(format!("User {}", id)));
        }
        Ok(version)
    }

    async fn delete_user(&self, id: UserId) -> FlexSpaceResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete user", e))?;

        if result.rows_affected() == 0 {
            return Err(FlexSpaceError::not_found(format!("User {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl RoomStorage for SqliteStorage {
    async fn create_room(&self, room: NewRoom) -> FlexSpaceResult<Room> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO rooms (slug, name, type, capacity, price_hour, description, amenities, photos, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, '[]', ?, ?)
            "#,
        )
        .bind(&room.slug)
        .bind(&room.name)
        .bind(room.room_type.as_str())
        .bind(room.capacity)
        .bind(room.price_hour)
        .bind(&room.description)
        .bind(serde_json::to_string(&room.amenities)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("slug already in use", e))?;

        let id = result.last_insert_rowid();
        self.find_room(id)
            .await?
            .ok_or_else(|| FlexSpaceError::not_found(format!("Room {}", id)))
    }

    async fn find_room(&self, id: RoomId) -> FlexSpaceResult<Option<Room>> {
        let row = sqlx::query("SELECT * FROM rooms WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load room", e))?;
        row.as_ref().map(Self::row_to_room).transpose()
    }

    async fn find_room_by_slug(&self, slug: &str) -> FlexSpaceResult<Option<Room>> {
        let row = sqlx::query("SELECT * FROM rooms WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load room", e))?;
        row.as_ref().map(Self::row_to_room).transpose()
    }

    async fn list_rooms(&self, filter: &RoomFilter) -> FlexSpaceResult<Vec<Room>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM rooms
            WHERE (?1 IS NULL OR type = ?1)
              AND (?2 IS NULL OR capacity >= ?2)
              AND (?3 IS NULL OR capacity <= ?3)
              AND (?4 IS NULL OR price_hour >= ?4)
              AND (?5 IS NULL OR price_hour <= ?5)
              AND (?6 IS NULL OR lower(name) LIKE ?6 ESCAPE '\' OR lower(COALESCE(description, '')) LIKE ?6 ESCAPE '\')
            ORDER BY id
            "#,
        )
        .bind(filter.room_type.map(|t| t.as_str()))
        .bind(filter.min_capacity)
        .bind(filter.max_capacity)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(like_pattern(&filter.search))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list rooms", e))?;

        rows.iter().map(Self::row_to_room).collect()
    }

    async fn update_room(&self, room: &Room) -> FlexSpaceResult<Room> {
        let result = sqlx::query(
            r#"
            UPDATE rooms
            SET slug = ?, name = ?, type = ?, capacity = ?, price_hour = ?,
                description = ?, amenities = ?, photos = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&room.slug)
        .bind(&room.name)
        .bind(room.room_type.as_str())
        .bind(room.capacity)
        .bind(room.price_hour)
        .bind(&room.description)
        .bind(serde_json::to_string(&room.amenities)?)
        .bind(serde_json::to_string(&room.photos)?)
        .bind(Utc::now())
        .bind(room.id)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("slug already in use", e))?;

        if result.rows_affected() == 0 {
            return Err(FlexSpaceError::not_found(format!("Room {}", room.id)));
        }
        self.find_room(room.id)
            .await?
            .ok_or_else(|| FlexSpaceError::not_found(format!("Room {}", room.id)))
    }

    async fn delete_room(&self, id: RoomId) -> FlexSpaceResult<()> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete room", e))?;

        if result.rows_affected() == 0 {
            return Err(FlexSpaceError::not_found(format!("Room {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStorage for SqliteStorage {
    async fn create_booking(&self, booking: NewBooking) -> FlexSpaceResult<Booking> {
        let start = booking.date_start.timestamp_millis();
        let end = booking.date_end.timestamp_millis();
        let now = Utc::now();

        // One statement takes the write lock before reading, so racing inserts
        // queue on the busy timeout and the loser sees the clash.
        let result = sqlx::query(
            r#"
            INSERT INTO bookings (user_id, room_id, date_start, date_end, total_price, status, created_at, updated_at)
            SELECT ?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?6
            WHERE NOT EXISTS (
                SELECT 1 FROM bookings
                WHERE room_id = ?2 AND status != 'cancelled' AND date_start < ?4 AND ?3 < date_end
            )
            "#,
        )
        .bind(booking.user_id)
        .bind(booking.room_id)
        .bind(start)
        .bind(end)
        .bind(booking.total_price)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert booking", e))?;

        if result.rows_affected() == 0 {
            return Err(FlexSpaceError::conflict(
                "room is already booked for this time",
            ));
        }

        let id = result.last_insert_rowid();
        self.find_booking(id)
            .await?
            .ok_or_else(|| FlexSpaceError::not_found(format!("Booking {}", id)))
    }

    async fn find_booking(&self, id: BookingId) -> FlexSpaceResult<Option<Booking>> {
        let row = sqlx::query("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load booking", e))?;
        row.as_ref().map(Self::row_to_booking).transpose()
    }

    async fn list_user_bookings(&self, user_id: UserId) -> FlexSpaceResult<Vec<Booking>> {
        let rows = sqlx::query("SELECT * FROM bookings WHERE user_id = ? ORDER BY id DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list bookings", e))?;
        rows.iter().map(Self::row_to_booking).collect()
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
        page: PageRequest,
    ) -> FlexSpaceResult<(Vec<Booking>, u64)> {
        const WHERE: &str = "WHERE (?1 IS NULL OR status = ?1) \
             AND (?2 IS NULL OR date_start >= ?2) \
             AND (?3 IS NULL OR date_end <= ?3)";
        let status = filter.status.map(|s| s.as_str());
        let from = filter.date_start.map(|d| d.timestamp_millis());
        let until = filter.date_end.map(|d| d.timestamp_millis());

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM bookings {}", WHERE))
            .bind(status)
            .bind(from)
            .bind(until)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to count bookings", e))?;

        let rows = sqlx::query(&format!(
            "SELECT * FROM bookings {} ORDER BY id DESC LIMIT ?4 OFFSET ?5",
            WHERE
        ))
        .bind(status)
        .bind(from)
        .bind(until)
        .bind(page.limit as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list bookings", e))?;

        let bookings = rows
            .iter()
            .map(Self::row_to_booking)
            .collect::<Result<_, _>>()?;
        Ok((bookings, total as u64))
    }

    async fn update_booking_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> FlexSpaceResult<Booking> {
        let result = sqlx::query("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to update booking", e))?;

        if result.rows_affected() == 0 {
            return Err(FlexSpaceError::not_found(format!("Booking {}", id)));
        }
        self.find_booking(id)
            .await?
            .ok_or_else(|| FlexSpaceError::not_found(format!("Booking {}", id)))
    }

    async fn cancel_booking(&self, id: BookingId) -> FlexSpaceResult<Option<Booking>> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET status = 'cancelled', updated_at = ?
            WHERE id = ? AND status IN ('pending', 'paid')
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to cancel booking", e))?;

        let booking = self
            .find_booking(id)
            .await?
            .ok_or_else(|| FlexSpaceError::not_found(format!("Booking {}", id)))?;
        Ok((result.rows_affected() > 0).then_some(booking))
    }
}
