//! Emergency contacts of a user.

use rusqlite::{Connection, OptionalExtension};
use reg_core::{EmergencyContactId, Error, Result, UserId};

use crate::integrity::{self, DeleteReport, Entity};
use crate::models::EmergencyContact;
use crate::support::{
    check_len, check_required, db_err, immediate, now, unique_or_db, ChangeSet, EMAIL_TEXT,
    PHONE_TEXT, SHORT_TEXT,
};

const COLS: &str = "id, user_id, first_name, last_name, relationship, phone_number, email, \
                    created_at, modified_at";

#[derive(Debug, Clone, Default)]
pub struct NewEmergencyContact {
    pub first_name: String,
    pub last_name: String,
    pub relationship: String,
    pub phone_number: String,
    pub email: Option<String>,
}

/// Partial update; `email: Some(None)` clears the address.
#[derive(Debug, Clone, Default)]
pub struct EmergencyContactChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub relationship: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<Option<String>>,
}

fn duplicate_phone(phone: &str) -> String {
    format!("an emergency contact with phone number '{phone}' already exists")
}

pub fn create_emergency_contact(
    conn: &Connection,
    user_id: UserId,
    new: &NewEmergencyContact,
) -> Result<EmergencyContact> {
    check_required("first_name", &new.first_name, SHORT_TEXT)?;
    check_required("last_name", &new.last_name, SHORT_TEXT)?;
    check_required("relationship", &new.relationship, SHORT_TEXT)?;
    check_required("phone_number", &new.phone_number, PHONE_TEXT)?;
    if let Some(email) = &new.email {
        check_len("email", email, EMAIL_TEXT)?;
    }

    immediate(conn, |tx| {
        integrity::ensure_exists(tx, Entity::User, user_id.get())?;
        let now = now();
        tx.execute(
            "INSERT INTO emergency_contacts (user_id, first_name, last_name, relationship,
                                             phone_number, email, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            rusqlite::params![
                user_id.get(),
                new.first_name,
                new.last_name,
                new.relationship,
                new.phone_number,
                new.email,
                now,
            ],
        )
        .map_err(|e| unique_or_db(e, || duplicate_phone(&new.phone_number)))?;

        Ok(EmergencyContact {
            id: EmergencyContactId::from(tx.last_insert_rowid()),
            user_id,
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            relationship: new.relationship.clone(),
            phone_number: new.phone_number.clone(),
            email: new.email.clone(),
            created_at: now.clone(),
            modified_at: now,
        })
    })
}

pub fn get_emergency_contact(
    conn: &Connection,
    id: EmergencyContactId,
) -> Result<Option<EmergencyContact>> {
    let q = format!("SELECT {COLS} FROM emergency_contacts WHERE id = ?1");
    conn.query_row(&q, [id.get()], EmergencyContact::from_row)
        .optional()
        .map_err(db_err)
}

/// List every emergency contact, grouped by user.
pub fn list_emergency_contacts(conn: &Connection) -> Result<Vec<EmergencyContact>> {
    let q = format!("SELECT {COLS} FROM emergency_contacts ORDER BY user_id ASC, id ASC");
    let mut stmt = conn.prepare(&q).map_err(db_err)?;
    let rows = stmt
        .query_map([], EmergencyContact::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

/// Emergency contacts registered for one user.
pub fn list_for_user(conn: &Connection, user_id: UserId) -> Result<Vec<EmergencyContact>> {
    let q = format!("SELECT {COLS} FROM emergency_contacts WHERE user_id = ?1 ORDER BY id ASC");
    let mut stmt = conn.prepare(&q).map_err(db_err)?;
    let rows = stmt
        .query_map([user_id.get()], EmergencyContact::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

pub fn update_emergency_contact(
    conn: &Connection,
    id: EmergencyContactId,
    changes: &EmergencyContactChanges,
) -> Result<EmergencyContact> {
    for (field, value, max) in [
        ("first_name", &changes.first_name, SHORT_TEXT),
        ("last_name", &changes.last_name, SHORT_TEXT),
        ("relationship", &changes.relationship, SHORT_TEXT),
        ("phone_number", &changes.phone_number, PHONE_TEXT),
    ] {
        if let Some(v) = value {
            check_required(field, v, max)?;
        }
    }
    if let Some(Some(email)) = &changes.email {
        check_len("email", email, EMAIL_TEXT)?;
    }

    immediate(conn, |tx| {
        let mut set = ChangeSet::new();
        set.set("first_name", changes.first_name.clone());
        set.set("last_name", changes.last_name.clone());
        set.set("relationship", changes.relationship.clone());
        set.set("phone_number", changes.phone_number.clone());
        set.set_nullable("email", changes.email.clone());

        let n = set.apply(tx, "emergency_contacts", "id", id.get()).map_err(|e| {
            unique_or_db(e, || duplicate_phone(changes.phone_number.as_deref().unwrap_or("")))
        })?;
        if n == 0 {
            return Err(Error::not_found("emergency contact", id));
        }
        get_emergency_contact(tx, id)?.ok_or_else(|| Error::not_found("emergency contact", id))
    })
}

/// Delete a contact together with its addresses.
pub fn delete_emergency_contact(conn: &Connection, id: EmergencyContactId) -> Result<DeleteReport> {
    integrity::delete_entity(conn, Entity::EmergencyContact, id.get())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::addresses::{self, AddressFields};
    use crate::queries::users::{self, NewUser};

    fn contact(phone: &str) -> NewEmergencyContact {
        NewEmergencyContact {
            first_name: "Dawit".into(),
            last_name: "Alemu".into(),
            relationship: "Uncle".into(),
            phone_number: phone.into(),
            email: Some("dawit@example.com".into()),
        }
    }

    #[test]
    fn create_list_update() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, &NewUser::new("student")).unwrap();

        let c = create_emergency_contact(&conn, user.id, &contact("0911")).unwrap();
        assert_eq!(list_for_user(&conn, user.id).unwrap(), vec![c.clone()]);

        let changes = EmergencyContactChanges {
            email: Some(None),
            relationship: Some("Aunt".into()),
            ..Default::default()
        };
        let updated = update_emergency_contact(&conn, c.id, &changes).unwrap();
        assert_eq!(updated.email, None);
        assert_eq!(updated.relationship, "Aunt");
        assert_eq!(updated.phone_number, "0911");
    }

    #[test]
    fn phone_number_is_unique() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let a = users::create_user(&conn, &NewUser::new("a")).unwrap();
        let b = users::create_user(&conn, &NewUser::new("b")).unwrap();

        create_emergency_contact(&conn, a.id, &contact("0911")).unwrap();
        let err = create_emergency_contact(&conn, b.id, &contact("0911")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(list_emergency_contacts(&conn).unwrap().len(), 1);
    }

    #[test]
    fn missing_names_rejected() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, &NewUser::new("x")).unwrap();
        let new = NewEmergencyContact {
            first_name: String::new(),
            ..contact("0933")
        };
        assert!(matches!(
            create_emergency_contact(&conn, user.id, &new),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn relationship_and_phone_limits() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, &NewUser::new("limits")).unwrap();

        for new in [
            NewEmergencyContact {
                relationship: String::new(),
                ..contact("0955")
            },
            NewEmergencyContact {
                relationship: "   ".into(),
                ..contact("0955")
            },
            contact("+2519220000001234"),
            NewEmergencyContact {
                last_name: "L".repeat(101),
                ..contact("0955")
            },
        ] {
            assert!(matches!(
                create_emergency_contact(&conn, user.id, &new),
                Err(Error::Validation(_))
            ));
        }
        assert!(list_for_user(&conn, user.id).unwrap().is_empty());

        let c = create_emergency_contact(&conn, user.id, &contact("+25192200000012")).unwrap();
        let changes = EmergencyContactChanges {
            relationship: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            update_emergency_contact(&conn, c.id, &changes),
            Err(Error::Validation(_))
        ));
        assert_eq!(
            get_emergency_contact(&conn, c.id).unwrap().unwrap().relationship,
            "Uncle"
        );
    }

    #[test]
    fn delete_takes_addresses() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, &NewUser::new("y")).unwrap();
        let c = create_emergency_contact(&conn, user.id, &contact("0944")).unwrap();
        let home = AddressFields {
            street_address: "Kazanchis".into(),
            woreda: 8,
            sub_city: "Kirkos".into(),
            city: "Addis Ababa".into(),
            country: "Ethiopia".into(),
        };
        addresses::create_contact_address(&conn, c.id, &home).unwrap();
        addresses::create_contact_address(&conn, c.id, &home).unwrap();

        let report = delete_emergency_contact(&conn, c.id).unwrap();
        assert_eq!(report.deleted("emergency_contact_addresses"), 2);
        assert_eq!(report.deleted("emergency_contacts"), 1);
        assert!(users::get_user(&conn, user.id).unwrap().is_some());
    }
}
