use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    BookingStatus, CatalogEntry, ConfirmedBooking, Gender, Identity, OfferingCategory,
    TempleStats, UserRecord,
};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";
const DATE_FORMAT: &str = "%Y-%m-%d";

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.naive_utc().format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, TS_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .with_context(|| format!("invalid timestamp in database: {s}"))?;
    Ok(naive.and_utc())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ── Catalog ──

const CATALOG_COLUMNS: &str = "category, id, display_name, description, unit_price_paise, capacity, \
     time_slots, suggested_amounts, duration_minutes, is_active";

pub fn get_catalog_entry(
    conn: &Connection,
    category: OfferingCategory,
    id: &str,
) -> anyhow::Result<Option<CatalogEntry>> {
    let sql = format!("SELECT {CATALOG_COLUMNS} FROM catalog_entries WHERE category = ?1 AND id = ?2");
    let row = conn
        .query_row(&sql, params![category.as_str(), id], |row| {
            Ok(parse_catalog_row(row))
        })
        .optional()?;
    row.transpose()
}

pub fn list_catalog(
    conn: &Connection,
    category: Option<OfferingCategory>,
    include_inactive: bool,
) -> anyhow::Result<Vec<CatalogEntry>> {
    let sql = format!(
        "SELECT {CATALOG_COLUMNS} FROM catalog_entries \
         WHERE (?1 IS NULL OR category = ?1) AND (?2 OR is_active = 1) \
         ORDER BY category, unit_price_paise, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![category.map(|c| c.as_str()), include_inactive],
        |row| Ok(parse_catalog_row(row)),
    )?;

    let mut entries = vec![];
    for row in rows {
        entries.push(row??);
    }
    Ok(entries)
}

/// Returns `false` when an entry with the same category and id already exists.
pub fn insert_catalog_entry(conn: &Connection, entry: &CatalogEntry) -> anyhow::Result<bool> {
    let result = conn.execute(
        "INSERT INTO catalog_entries (category, id, display_name, description, unit_price_paise, capacity,
             time_slots, suggested_amounts, duration_minutes, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            entry.category.as_str(),
            entry.id,
            entry.display_name,
            entry.description,
            entry.unit_price_paise,
            entry.capacity,
            serde_json::to_string(&entry.time_slots)?,
            serde_json::to_string(&entry.suggested_amounts)?,
            entry.duration_minutes,
            entry.is_active,
        ],
    );

    match result {
        Ok(_) => Ok(true),
        Err(e) if is_unique_violation(&e) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

pub fn update_catalog_entry(conn: &Connection, entry: &CatalogEntry) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE catalog_entries SET display_name = ?3, description = ?4, unit_price_paise = ?5,
             capacity = ?6, time_slots = ?7, suggested_amounts = ?8, duration_minutes = ?9, is_active = ?10
         WHERE category = ?1 AND id = ?2",
        params![
            entry.category.as_str(),
            entry.id,
            entry.display_name,
            entry.description,
            entry.unit_price_paise,
            entry.capacity,
            serde_json::to_string(&entry.time_slots)?,
            serde_json::to_string(&entry.suggested_amounts)?,
            entry.duration_minutes,
            entry.is_active,
        ],
    )?;
    Ok(count > 0)
}

pub fn set_catalog_active(
    conn: &Connection,
    category: OfferingCategory,
    id: &str,
    active: bool,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE catalog_entries SET is_active = ?3 WHERE category = ?1 AND id = ?2",
        params![category.as_str(), id, active],
    )?;
    Ok(count > 0)
}

fn parse_catalog_row(row: &rusqlite::Row) -> anyhow::Result<CatalogEntry> {
    let category_str: String = row.get(0)?;
    let time_slots_json: String = row.get(6)?;
    let suggested_json: String = row.get(7)?;

    Ok(CatalogEntry {
        category: OfferingCategory::parse(&category_str)
            .with_context(|| format!("unknown category in catalog: {category_str}"))?,
        id: row.get(1)?,
        display_name: row.get(2)?,
        description: row.get(3)?,
        unit_price_paise: row.get(4)?,
        capacity: row.get(5)?,
        time_slots: serde_json::from_str(&time_slots_json)?,
        suggested_amounts: serde_json::from_str(&suggested_json)?,
        duration_minutes: row.get(8)?,
        is_active: row.get(9)?,
    })
}

// ── Users & sessions ──

/// Returns `false` when the email is already registered.
pub fn create_user(conn: &Connection, user: &UserRecord) -> anyhow::Result<bool> {
    let result = conn.execute(
        "INSERT INTO users (id, first_name, last_name, email, phone_number, gender, date_of_birth,
             password_salt, password_digest, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            user.identity.id,
            user.identity.first_name,
            user.identity.last_name,
            user.identity.email,
            user.identity.phone_number,
            user.gender.map(|g| g.as_str()),
            user.date_of_birth.map(|d| d.format(DATE_FORMAT).to_string()),
            user.password_salt,
            user.password_digest,
            format_ts(&user.created_at),
        ],
    );

    match result {
        Ok(_) => Ok(true),
        Err(e) if is_unique_violation(&e) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

const USER_COLUMNS: &str = "id, first_name, last_name, phone_number, email, password_salt, password_digest, \
     created_at, gender, date_of_birth";

pub fn get_user_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<UserRecord>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    let row = conn
        .query_row(&sql, params![id], |row| Ok(parse_user_row(row)))
        .optional()?;
    row.transpose()
}

/// Overwrites the editable profile fields. Email and credentials stay put.
pub fn update_user_profile(conn: &Connection, user: &UserRecord) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET first_name = ?2, last_name = ?3, phone_number = ?4, gender = ?5, date_of_birth = ?6
         WHERE id = ?1",
        params![
            user.identity.id,
            user.identity.first_name,
            user.identity.last_name,
            user.identity.phone_number,
            user.gender.map(|g| g.as_str()),
            user.date_of_birth.map(|d| d.format(DATE_FORMAT).to_string()),
        ],
    )?;
    Ok(count > 0)
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<UserRecord>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
    let row = conn
        .query_row(&sql, params![email], |row| Ok(parse_user_row(row)))
        .optional()?;
    row.transpose()
}

pub fn list_users(conn: &Connection) -> anyhow::Result<Vec<UserRecord>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok(parse_user_row(row)))?;

    let mut users = vec![];
    for row in rows {
        users.push(row??);
    }
    Ok(users)
}

fn parse_user_row(row: &rusqlite::Row) -> anyhow::Result<UserRecord> {
    let created_at: String = row.get(7)?;
    let gender: Option<String> = row.get(8)?;
    let date_of_birth: Option<String> = row.get(9)?;
    Ok(UserRecord {
        identity: Identity {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            phone_number: row.get(3)?,
            email: row.get(4)?,
        },
        gender: gender.as_deref().and_then(Gender::parse),
        date_of_birth: date_of_birth
            .map(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT))
            .transpose()
            .context("invalid date_of_birth in database")?,
        password_salt: row.get(5)?,
        password_digest: row.get(6)?,
        created_at: parse_ts(&created_at)?,
    })
}

pub fn create_session(
    conn: &Connection,
    token: &str,
    user_id: &str,
    created_at: &DateTime<Utc>,
    expires_at: &DateTime<Utc>,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![token, user_id, format_ts(created_at), format_ts(expires_at)],
    )?;
    Ok(())
}

/// The identity behind an unexpired session token.
pub fn get_session_identity(
    conn: &Connection,
    token: &str,
    now: &DateTime<Utc>,
) -> anyhow::Result<Option<Identity>> {
    let identity = conn
        .query_row(
            "SELECT u.id, u.first_name, u.last_name, u.phone_number, u.email
             FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.token = ?1 AND s.expires_at > ?2",
            params![token, format_ts(now)],
            |row| {
                Ok(Identity {
                    id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    phone_number: row.get(3)?,
                    email: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(identity)
}

pub fn delete_session(conn: &Connection, token: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(count > 0)
}

pub fn expire_old_sessions(conn: &Connection, now: &DateTime<Utc>) -> anyhow::Result<usize> {
    let count = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![format_ts(now)],
    )?;
    Ok(count)
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, receipt_number, user_id, category, offering_id, offering_name, booking_date, \
     time_slot, quantity, requester, donation_amount, total_amount, status, created_at";

pub fn insert_booking(conn: &Connection, booking: &ConfirmedBooking) -> anyhow::Result<()> {
    let donation_json = booking
        .donation_amount
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        "INSERT INTO bookings (id, receipt_number, user_id, category, offering_id, offering_name, booking_date,
             time_slot, quantity, requester, donation_amount, total_amount, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            booking.id,
            booking.receipt_number,
            booking.user_id,
            booking.category.as_str(),
            booking.offering_id,
            booking.offering_name,
            booking.date.format(DATE_FORMAT).to_string(),
            booking.time_slot,
            booking.quantity,
            serde_json::to_string(&booking.requester)?,
            donation_json,
            booking.total_amount,
            booking.status.as_str(),
            format_ts(&booking.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_bookings_for_user(
    conn: &Connection,
    user_id: &str,
    category: Option<OfferingCategory>,
) -> anyhow::Result<Vec<ConfirmedBooking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings \
         WHERE user_id = ?1 AND (?2 IS NULL OR category = ?2) \
         ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id, category.map(|c| c.as_str())], |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_all_bookings(
    conn: &Connection,
    category: Option<OfferingCategory>,
    limit: i64,
) -> anyhow::Result<Vec<ConfirmedBooking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings \
         WHERE (?1 IS NULL OR category = ?1) \
         ORDER BY created_at DESC, id DESC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![category.map(|c| c.as_str()), limit], |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Bookings dated on or after `from`, soonest first.
pub fn get_upcoming_bookings(
    conn: &Connection,
    category: Option<OfferingCategory>,
    from: NaiveDate,
    limit: i64,
) -> anyhow::Result<Vec<ConfirmedBooking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings \
         WHERE (?1 IS NULL OR category = ?1) AND booking_date >= ?2 \
         ORDER BY booking_date ASC, time_slot ASC, created_at ASC LIMIT ?3"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![
            category.map(|c| c.as_str()),
            from.format(DATE_FORMAT).to_string(),
            limit
        ],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_booking_by_receipt(
    conn: &Connection,
    receipt_number: &str,
) -> anyhow::Result<Option<ConfirmedBooking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE receipt_number = ?1");
    let row = conn
        .query_row(&sql, params![receipt_number], |row| Ok(parse_booking_row(row)))
        .optional()?;
    row.transpose()
}

pub fn get_temple_stats(conn: &Connection) -> anyhow::Result<TempleStats> {
    let count_for = |category: OfferingCategory| -> anyhow::Result<i64> {
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM bookings WHERE category = ?1",
            params![category.as_str()],
            |row| row.get(0),
        )?)
    };

    // Summed here rather than with SQL SUM(), which errors on overflow.
    let mut stmt = conn.prepare("SELECT total_amount FROM bookings WHERE category = 'donation'")?;
    let mut donation_total: i64 = 0;
    for amount in stmt.query_map([], |row| row.get::<_, i64>(0))? {
        donation_total = donation_total.saturating_add(amount?);
    }
    let registered_users: i64 =
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;

    Ok(TempleStats {
        darshan_bookings: count_for(OfferingCategory::Darshan)?,
        aarti_bookings: count_for(OfferingCategory::Aarti)?,
        pooja_bookings: count_for(OfferingCategory::Pooja)?,
        donation_total,
        registered_users,
    })
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<ConfirmedBooking> {
    let category_str: String = row.get(3)?;
    let date_str: String = row.get(6)?;
    let requester_json: String = row.get(9)?;
    let donation_json: Option<String> = row.get(10)?;
    let status_str: String = row.get(12)?;
    let created_at_str: String = row.get(13)?;

    Ok(ConfirmedBooking {
        id: row.get(0)?,
        receipt_number: row.get(1)?,
        user_id: row.get(2)?,
        category: OfferingCategory::parse(&category_str)
            .with_context(|| format!("unknown booking category: {category_str}"))?,
        offering_id: row.get(4)?,
        offering_name: row.get(5)?,
        date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
            .with_context(|| format!("invalid booking date: {date_str}"))?,
        time_slot: row.get(7)?,
        quantity: row.get(8)?,
        requester: serde_json::from_str(&requester_json)?,
        donation_amount: donation_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?,
        total_amount: row.get(11)?,
        status: BookingStatus::parse(&status_str)
            .with_context(|| format!("unknown booking status: {status_str}"))?,
        created_at: parse_ts(&created_at_str)?,
    })
}
