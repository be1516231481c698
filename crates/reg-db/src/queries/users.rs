//! User CRUD operations.

use rusqlite::{Connection, OptionalExtension};
use reg_core::{Error, Result, UserId};

use crate::integrity::{self, DeleteReport, Entity};
use crate::models::User;
use crate::support::{
    check_len, check_opt_date, check_required, db_err, immediate, now, unique_or_db, ChangeSet,
    EMAIL_TEXT, PHONE_TEXT, SHORT_TEXT, USERNAME_TEXT,
};

const COLS: &str = "id, username, first_name, last_name, email, date_of_birth, phone_number, \
                    is_active, created_at, modified_at";

/// Fields for a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: Option<String>,
    pub phone_number: String,
    pub is_active: bool,
}

impl NewUser {
    /// A new active user with only a username set.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            date_of_birth: None,
            phone_number: String::new(),
            is_active: true,
        }
    }
}

/// Partial update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<Option<String>>,
    pub phone_number: Option<String>,
    pub is_active: Option<bool>,
}

fn duplicate_username(username: &str) -> String {
    format!("username '{username}' already exists")
}

/// Optional personal fields may be blank but not over-long.
fn check_contact_fields(
    first_name: Option<&str>,
    last_name: Option<&str>,
    email: Option<&str>,
    phone_number: Option<&str>,
) -> Result<()> {
    for (field, value, max) in [
        ("first_name", first_name, SHORT_TEXT),
        ("last_name", last_name, SHORT_TEXT),
        ("email", email, EMAIL_TEXT),
        ("phone_number", phone_number, PHONE_TEXT),
    ] {
        if let Some(v) = value {
            check_len(field, v, max)?;
        }
    }
    Ok(())
}

/// Create a new user and return it.
pub fn create_user(conn: &Connection, new: &NewUser) -> Result<User> {
    check_required("username", &new.username, USERNAME_TEXT)?;
    check_contact_fields(
        Some(&new.first_name),
        Some(&new.last_name),
        Some(&new.email),
        Some(&new.phone_number),
    )?;
    check_opt_date("date_of_birth", new.date_of_birth.as_deref())?;

    let now = now();
    conn.execute(
        "INSERT INTO users (username, first_name, last_name, email, date_of_birth,
                            phone_number, is_active, created_at, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        rusqlite::params![
            new.username,
            new.first_name,
            new.last_name,
            new.email,
            new.date_of_birth,
            new.phone_number,
            new.is_active,
            now,
        ],
    )
    .map_err(|e| unique_or_db(e, || duplicate_username(&new.username)))?;

    Ok(User {
        id: UserId::from(conn.last_insert_rowid()),
        username: new.username.clone(),
        first_name: new.first_name.clone(),
        last_name: new.last_name.clone(),
        email: new.email.clone(),
        date_of_birth: new.date_of_birth.clone(),
        phone_number: new.phone_number.clone(),
        is_active: new.is_active,
        created_at: now.clone(),
        modified_at: now,
    })
}

/// Get a user by primary key.
pub fn get_user(conn: &Connection, id: UserId) -> Result<Option<User>> {
    let q = format!("SELECT {COLS} FROM users WHERE id = ?1");
    conn.query_row(&q, [id.get()], User::from_row)
        .optional()
        .map_err(db_err)
}

/// Get a user by username.
pub fn get_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let q = format!("SELECT {COLS} FROM users WHERE username = ?1");
    conn.query_row(&q, [username], User::from_row)
        .optional()
        .map_err(db_err)
}

/// List all users ordered by username.
pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let q = format!("SELECT {COLS} FROM users ORDER BY username ASC");
    let mut stmt = conn.prepare(&q).map_err(db_err)?;
    let rows = stmt
        .query_map([], User::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

/// Apply `changes` to a user and return the updated record.
pub fn update_user(conn: &Connection, id: UserId, changes: &UserChanges) -> Result<User> {
    if let Some(username) = &changes.username {
        check_required("username", username, USERNAME_TEXT)?;
    }
    check_contact_fields(
        changes.first_name.as_deref(),
        changes.last_name.as_deref(),
        changes.email.as_deref(),
        changes.phone_number.as_deref(),
    )?;
    if let Some(dob) = &changes.date_of_birth {
        check_opt_date("date_of_birth", dob.as_deref())?;
    }

    immediate(conn, |tx| {
        let mut set = ChangeSet::new();
        set.set("username", changes.username.clone());
        set.set("first_name", changes.first_name.clone());
        set.set("last_name", changes.last_name.clone());
        set.set("email", changes.email.clone());
        set.set_nullable("date_of_birth", changes.date_of_birth.clone());
        set.set("phone_number", changes.phone_number.clone());
        set.set("is_active", changes.is_active);

        let n = set.apply(tx, "users", "id", id.get()).map_err(|e| {
            unique_or_db(e, || duplicate_username(changes.username.as_deref().unwrap_or("")))
        })?;
        if n == 0 {
            return Err(Error::not_found("user", id));
        }
        get_user(tx, id)?.ok_or_else(|| Error::not_found("user", id))
    })
}

/// Apply `changes` to the user with `username`.
pub fn update_user_by_username(
    conn: &Connection,
    username: &str,
    changes: &UserChanges,
) -> Result<User> {
    let user = get_user_by_username(conn, username)?
        .ok_or_else(|| Error::not_found("user", username))?;
    update_user(conn, user.id, changes)
}

/// Delete a user together with its addresses, emergency contacts, role
/// links and profiles.
pub fn delete_user(conn: &Connection, id: UserId) -> Result<DeleteReport> {
    integrity::delete_entity(conn, Entity::User, id.get())
}

/// Delete the user with `username`.
pub fn delete_user_by_username(conn: &Connection, username: &str) -> Result<DeleteReport> {
    let user = get_user_by_username(conn, username)?
        .ok_or_else(|| Error::not_found("user", username))?;
    delete_user(conn, user.id)
}
