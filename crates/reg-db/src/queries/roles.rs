//! Role CRUD and user/role assignment.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension};
use reg_core::{Error, Result, RoleId, UserId, UserRoleId};

use crate::integrity::{self, DeleteReport, Entity};
use crate::models::{Role, UserRole};
use crate::support::{
    check_required, db_err, immediate, now, unique_or_db, ChangeSet, SHORT_TEXT,
};

const COLS: &str = "id, name, description, created_at, modified_at";

/// Partial update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct RoleChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

fn duplicate_name(name: &str) -> String {
    format!("role '{name}' already exists")
}

/// Create a new role.
pub fn create_role(conn: &Connection, name: &str, description: &str) -> Result<Role> {
    check_required("name", name, SHORT_TEXT)?;
    let now = now();
    conn.execute(
        "INSERT INTO roles (name, description, created_at, modified_at) VALUES (?1, ?2, ?3, ?3)",
        rusqlite::params![name, description, now],
    )
    .map_err(|e| unique_or_db(e, || duplicate_name(name)))?;

    Ok(Role {
        id: RoleId::from(conn.last_insert_rowid()),
        name: name.to_string(),
        description: description.to_string(),
        created_at: now.clone(),
        modified_at: now,
    })
}

/// Get a role by ID.
pub fn get_role(conn: &Connection, id: RoleId) -> Result<Option<Role>> {
    let q = format!("SELECT {COLS} FROM roles WHERE id = ?1");
    conn.query_row(&q, [id.get()], Role::from_row)
        .optional()
        .map_err(db_err)
}

/// Get a role by its unique name.
pub fn get_role_by_name(conn: &Connection, name: &str) -> Result<Option<Role>> {
    let q = format!("SELECT {COLS} FROM roles WHERE name = ?1");
    conn.query_row(&q, [name], Role::from_row)
        .optional()
        .map_err(db_err)
}

/// List all roles ordered by name.
pub fn list_roles(conn: &Connection) -> Result<Vec<Role>> {
    let q = format!("SELECT {COLS} FROM roles ORDER BY name ASC");
    let mut stmt = conn.prepare(&q).map_err(db_err)?;
    let rows = stmt
        .query_map([], Role::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

/// Apply `changes` to a role and return the updated record.
pub fn update_role(conn: &Connection, id: RoleId, changes: &RoleChanges) -> Result<Role> {
    if let Some(name) = &changes.name {
        check_required("name", name, SHORT_TEXT)?;
    }
    immediate(conn, |tx| {
        let mut set = ChangeSet::new();
        set.set("name", changes.name.clone());
        set.set("description", changes.description.clone());
        let n = set.apply(tx, "roles", "id", id.get()).map_err(|e| {
            unique_or_db(e, || duplicate_name(changes.name.as_deref().unwrap_or("")))
        })?;
        if n == 0 {
            return Err(Error::not_found("role", id));
        }
        get_role(tx, id)?.ok_or_else(|| Error::not_found("role", id))
    })
}

/// Delete a role; its assignments go with it.
pub fn delete_role(conn: &Connection, id: RoleId) -> Result<DeleteReport> {
    integrity::delete_entity(conn, Entity::Role, id.get())
}

// ---------------------------------------------------------------------------
// assignments
// ---------------------------------------------------------------------------

/// Assign `role_id` to `user_id`.
///
/// A pair can be assigned once; repeating it is a validation error.
pub fn assign_role(conn: &Connection, user_id: UserId, role_id: RoleId) -> Result<UserRole> {
    immediate(conn, |tx| {
        integrity::ensure_exists(tx, Entity::User, user_id.get())?;
        integrity::ensure_exists(tx, Entity::Role, role_id.get())?;

        let now = now();
        tx.execute(
            "INSERT INTO user_roles (user_id, role_id, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?3)",
            rusqlite::params![user_id.get(), role_id.get(), now],
        )
        .map_err(|e| {
            unique_or_db(e, || {
                format!("role {role_id} is already assigned to user {user_id}")
            })
        })?;

        Ok(UserRole {
            id: UserRoleId::from(tx.last_insert_rowid()),
            user_id,
            role_id,
            created_at: now.clone(),
            modified_at: now,
        })
    })
}

/// Remove the assignment of `role_id` from `user_id`.
pub fn remove_role(conn: &Connection, user_id: UserId, role_id: RoleId) -> Result<()> {
    let link: Option<i64> = conn
        .query_row(
            "SELECT id FROM user_roles WHERE user_id = ?1 AND role_id = ?2",
            [user_id.get(), role_id.get()],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_err)?;

    let link = link.ok_or_else(|| {
        Error::not_found("user role", format!("user {user_id} / role {role_id}"))
    })?;
    integrity::delete_entity(conn, Entity::UserRole, link)?;
    Ok(())
}

/// Roles assigned to a user, ordered by name.
pub fn list_roles_for_user(conn: &Connection, user_id: UserId) -> Result<Vec<Role>> {
    let mut stmt = conn
        .prepare(
            "SELECT r.id, r.name, r.description, r.created_at, r.modified_at
             FROM roles r JOIN user_roles ur ON ur.role_id = r.id
             WHERE ur.user_id = ?1 ORDER BY r.name ASC",
        )
        .map_err(db_err)?;
    let rows = stmt
        .query_map([user_id.get()], Role::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

/// All assignments grouped by user, for rendering user lists in one query.
pub fn roles_by_user(conn: &Connection) -> Result<HashMap<UserId, Vec<Role>>> {
    let mut stmt = conn
        .prepare(
            "SELECT ur.user_id, r.id, r.name, r.description, r.created_at, r.modified_at
             FROM roles r JOIN user_roles ur ON ur.role_id = r.id
             ORDER BY r.name ASC",
        )
        .map_err(db_err)?;
    let rows = stmt
        .query_map([], |row| {
            let user_id = UserId::from(row.get::<_, i64>(0)?);
            let role = Role {
                id: RoleId::from(row.get::<_, i64>(1)?),
                name: row.get(2)?,
                description: row.get(3)?,
                created_at: row.get(4)?,
                modified_at: row.get(5)?,
            };
            Ok((user_id, role))
        })
        .map_err(db_err)?;

    let mut grouped: HashMap<UserId, Vec<Role>> = HashMap::new();
    for row in rows {
        let (user_id, role) = row.map_err(db_err)?;
        grouped.entry(user_id).or_default().push(role);
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::users::{self, NewUser};

    #[test]
    fn crud() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let role = create_role(&conn, "Teacher", "Teaching staff").unwrap();
        assert_eq!(get_role(&conn, role.id).unwrap().unwrap().name, "Teacher");
        assert!(get_role_by_name(&conn, "Teacher").unwrap().is_some());

        let changes = RoleChanges {
            description: Some("Faculty".into()),
            ..Default::default()
        };
        let updated = update_role(&conn, role.id, &changes).unwrap();
        assert_eq!(updated.name, "Teacher");
        assert_eq!(updated.description, "Faculty");

        assert_eq!(delete_role(&conn, role.id).unwrap().deleted("roles"), 1);
        assert!(list_roles(&conn).unwrap().is_empty());
    }

    #[test]
    fn duplicate_name() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        create_role(&conn, "Staff", "").unwrap();
        assert!(matches!(
            create_role(&conn, "Staff", "again"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn assign_twice_keeps_one_row() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, &NewUser::new("t1")).unwrap();
        let role = create_role(&conn, "Teacher", "").unwrap();

        assign_role(&conn, user.id, role.id).unwrap();
        let err = assign_role(&conn, user.id, role.id).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM user_roles", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn assign_unknown_user_or_role() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, &NewUser::new("u")).unwrap();
        let role = create_role(&conn, "Staff", "").unwrap();

        let err = assign_role(&conn, UserId::from(999), role.id).unwrap_err();
        assert_eq!(err.to_string(), "user not found: 999");
        let err = assign_role(&conn, user.id, RoleId::from(999)).unwrap_err();
        assert_eq!(err.to_string(), "role not found: 999");
    }

    #[test]
    fn remove_and_list() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, &NewUser::new("multi")).unwrap();
        let a = create_role(&conn, "Student", "").unwrap();
        let b = create_role(&conn, "Assistant", "").unwrap();
        assign_role(&conn, user.id, a.id).unwrap();
        assign_role(&conn, user.id, b.id).unwrap();

        let names: Vec<String> = list_roles_for_user(&conn, user.id)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Assistant", "Student"]);

        remove_role(&conn, user.id, a.id).unwrap();
        assert_eq!(list_roles_for_user(&conn, user.id).unwrap().len(), 1);
        assert!(matches!(
            remove_role(&conn, user.id, a.id),
            Err(Error::NotFound { .. })
        ));

        let grouped = roles_by_user(&conn).unwrap();
        assert_eq!(grouped[&user.id].len(), 1);
    }

    #[test]
    fn deleting_role_unassigns_it() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, &NewUser::new("t1")).unwrap();
        let role = create_role(&conn, "Teacher", "").unwrap();
        assign_role(&conn, user.id, role.id).unwrap();

        let report = delete_role(&conn, role.id).unwrap();
        assert_eq!(report.deleted("user_roles"), 1);
        assert!(list_roles_for_user(&conn, user.id).unwrap().is_empty());
        assert!(users::get_user(&conn, user.id).unwrap().is_some());
    }
}
