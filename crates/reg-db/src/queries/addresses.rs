//! Postal addresses owned by users and by emergency contacts.
//!
//! Both tables share one field set; [`AddressFields`] and [`AddressChanges`]
//! serve either owner.

use rusqlite::{Connection, OptionalExtension};
use reg_core::{AddressId, EmergencyContactAddressId, EmergencyContactId, Error, Result, UserId};

use crate::integrity::{self, DeleteReport, Entity};
use crate::models::{Address, EmergencyContactAddress};
use crate::support::{check_required, db_err, immediate, now, ChangeSet, SHORT_TEXT, STREET_TEXT};

const USER_COLS: &str =
    "id, user_id, street_address, woreda, sub_city, city, country, created_at, modified_at";
const CONTACT_COLS: &str = "id, emergency_contact_id, street_address, woreda, sub_city, city, \
                            country, created_at, modified_at";

/// Fields for a new address.
#[derive(Debug, Clone, Default)]
pub struct AddressFields {
    pub street_address: String,
    pub woreda: i64,
    pub sub_city: String,
    pub city: String,
    pub country: String,
}

/// Partial update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct AddressChanges {
    pub street_address: Option<String>,
    pub woreda: Option<i64>,
    pub sub_city: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl AddressFields {
    fn validate(&self) -> Result<()> {
        check_required("street_address", &self.street_address, STREET_TEXT)?;
        check_required("sub_city", &self.sub_city, SHORT_TEXT)?;
        check_required("city", &self.city, SHORT_TEXT)?;
        check_required("country", &self.country, SHORT_TEXT)
    }
}

impl AddressChanges {
    fn validate(&self) -> Result<()> {
        for (field, value, max) in [
            ("street_address", &self.street_address, STREET_TEXT),
            ("sub_city", &self.sub_city, SHORT_TEXT),
            ("city", &self.city, SHORT_TEXT),
            ("country", &self.country, SHORT_TEXT),
        ] {
            if let Some(v) = value {
                check_required(field, v, max)?;
            }
        }
        Ok(())
    }

    fn into_change_set(self) -> ChangeSet {
        let mut set = ChangeSet::new();
        set.set("street_address", self.street_address);
        set.set("woreda", self.woreda);
        set.set("sub_city", self.sub_city);
        set.set("city", self.city);
        set.set("country", self.country);
        set
    }
}

/// Insert an address row under `owner` and return its id and timestamp.
fn insert(
    conn: &Connection,
    entity: Entity,
    owner: Entity,
    owner_column: &str,
    owner_id: i64,
    fields: &AddressFields,
) -> Result<(i64, String)> {
    fields.validate()?;
    immediate(conn, |tx| {
        integrity::ensure_exists(tx, owner, owner_id)?;
        let now = now();
        let sql = format!(
            "INSERT INTO {} ({owner_column}, street_address, woreda, sub_city, city, country,
                             created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            entity.table()
        );
        tx.execute(
            &sql,
            rusqlite::params![
                owner_id,
                fields.street_address,
                fields.woreda,
                fields.sub_city,
                fields.city,
                fields.country,
                now,
            ],
        )
        .map_err(db_err)?;
        Ok((tx.last_insert_rowid(), now))
    })
}

fn apply_changes(conn: &Connection, entity: Entity, id: i64, changes: AddressChanges) -> Result<()> {
    changes.validate()?;
    let n = changes
        .into_change_set()
        .apply(conn, entity.table(), "id", id)
        .map_err(db_err)?;
    if n == 0 {
        return Err(Error::not_found(entity.label(), id));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// user addresses
// ---------------------------------------------------------------------------

/// Add an address for `user_id`.
pub fn create_address(conn: &Connection, user_id: UserId, fields: &AddressFields) -> Result<Address> {
    let (id, now) = insert(conn, Entity::Address, Entity::User, "user_id", user_id.get(), fields)?;
    Ok(Address {
        id: AddressId::from(id),
        user_id,
        street_address: fields.street_address.clone(),
        woreda: fields.woreda,
        sub_city: fields.sub_city.clone(),
        city: fields.city.clone(),
        country: fields.country.clone(),
        created_at: now.clone(),
        modified_at: now,
    })
}

pub fn get_address(conn: &Connection, id: AddressId) -> Result<Option<Address>> {
    let q = format!("SELECT {USER_COLS} FROM user_addresses WHERE id = ?1");
    conn.query_row(&q, [id.get()], Address::from_row)
        .optional()
        .map_err(db_err)
}

/// All addresses of a user, oldest first.
pub fn list_addresses_for_user(conn: &Connection, user_id: UserId) -> Result<Vec<Address>> {
    let q = format!("SELECT {USER_COLS} FROM user_addresses WHERE user_id = ?1 ORDER BY id ASC");
    let mut stmt = conn.prepare(&q).map_err(db_err)?;
    let rows = stmt
        .query_map([user_id.get()], Address::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

pub fn update_address(conn: &Connection, id: AddressId, changes: AddressChanges) -> Result<Address> {
    immediate(conn, |tx| {
        apply_changes(tx, Entity::Address, id.get(), changes)?;
        get_address(tx, id)?.ok_or_else(|| Error::not_found("address", id))
    })
}

pub fn delete_address(conn: &Connection, id: AddressId) -> Result<DeleteReport> {
    integrity::delete_entity(conn, Entity::Address, id.get())
}

// ---------------------------------------------------------------------------
// emergency contact addresses
// ---------------------------------------------------------------------------

/// Add an address for an emergency contact.
pub fn create_contact_address(
    conn: &Connection,
    contact_id: EmergencyContactId,
    fields: &AddressFields,
) -> Result<EmergencyContactAddress> {
    let (id, now) = insert(
        conn,
        Entity::EmergencyContactAddress,
        Entity::EmergencyContact,
        "emergency_contact_id",
        contact_id.get(),
        fields,
    )?;
    Ok(EmergencyContactAddress {
        id: EmergencyContactAddressId::from(id),
        emergency_contact_id: contact_id,
        street_address: fields.street_address.clone(),
        woreda: fields.woreda,
        sub_city: fields.sub_city.clone(),
        city: fields.city.clone(),
        country: fields.country.clone(),
        created_at: now.clone(),
        modified_at: now,
    })
}

pub fn get_contact_address(
    conn: &Connection,
    id: EmergencyContactAddressId,
) -> Result<Option<EmergencyContactAddress>> {
    let q = format!("SELECT {CONTACT_COLS} FROM emergency_contact_addresses WHERE id = ?1");
    conn.query_row(&q, [id.get()], EmergencyContactAddress::from_row)
        .optional()
        .map_err(db_err)
}

pub fn list_contact_addresses(
    conn: &Connection,
    contact_id: EmergencyContactId,
) -> Result<Vec<EmergencyContactAddress>> {
    let q = format!(
        "SELECT {CONTACT_COLS} FROM emergency_contact_addresses
         WHERE emergency_contact_id = ?1 ORDER BY id ASC"
    );
    let mut stmt = conn.prepare(&q).map_err(db_err)?;
    let rows = stmt
        .query_map([contact_id.get()], EmergencyContactAddress::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

pub fn update_contact_address(
    conn: &Connection,
    id: EmergencyContactAddressId,
    changes: AddressChanges,
) -> Result<EmergencyContactAddress> {
    immediate(conn, |tx| {
        apply_changes(tx, Entity::EmergencyContactAddress, id.get(), changes)?;
        get_contact_address(tx, id)?
            .ok_or_else(|| Error::not_found("emergency contact address", id))
    })
}

pub fn delete_contact_address(
    conn: &Connection,
    id: EmergencyContactAddressId,
) -> Result<DeleteReport> {
    integrity::delete_entity(conn, Entity::EmergencyContactAddress, id.get())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::emergency_contacts::{self, NewEmergencyContact};
    use crate::queries::users::{self, NewUser};

    fn addis() -> AddressFields {
        AddressFields {
            street_address: "Bole Road".into(),
            woreda: 3,
            sub_city: "Bole".into(),
            city: "Addis Ababa".into(),
            country: "Ethiopia".into(),
        }
    }

    #[test]
    fn user_address_crud() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, &NewUser::new("addr")).unwrap();

        let a = create_address(&conn, user.id, &addis()).unwrap();
        assert_eq!(get_address(&conn, a.id).unwrap().unwrap(), a);
        assert_eq!(list_addresses_for_user(&conn, user.id).unwrap().len(), 1);

        let changes = AddressChanges {
            woreda: Some(7),
            ..Default::default()
        };
        let updated = update_address(&conn, a.id, changes).unwrap();
        assert_eq!(updated.woreda, 7);
        assert_eq!(updated.city, "Addis Ababa");

        delete_address(&conn, a.id).unwrap();
        assert!(get_address(&conn, a.id).unwrap().is_none());
    }

    #[test]
    fn unknown_owner_is_not_found() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let err = create_address(&conn, UserId::from(5), &addis()).unwrap_err();
        assert_eq!(err.to_string(), "user not found: 5");
        let err =
            create_contact_address(&conn, EmergencyContactId::from(5), &addis()).unwrap_err();
        assert_eq!(err.to_string(), "emergency contact not found: 5");
    }

    #[test]
    fn contact_address_crud() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, &NewUser::new("owner")).unwrap();
        let contact = emergency_contacts::create_emergency_contact(
            &conn,
            user.id,
            &NewEmergencyContact {
                first_name: "Hana".into(),
                last_name: "Girma".into(),
                relationship: "Mother".into(),
                phone_number: "+251922000000".into(),
                email: None,
            },
        )
        .unwrap();

        let a = create_contact_address(&conn, contact.id, &addis()).unwrap();
        assert_eq!(list_contact_addresses(&conn, contact.id).unwrap(), vec![a.clone()]);

        let changes = AddressChanges {
            street_address: Some("Churchill Ave".into()),
            ..Default::default()
        };
        let updated = update_contact_address(&conn, a.id, changes).unwrap();
        assert_eq!(updated.street_address, "Churchill Ave");

        assert!(matches!(
            update_contact_address(
                &conn,
                EmergencyContactAddressId::from(999),
                AddressChanges::default()
            ),
            Err(Error::NotFound { .. })
        ));

        delete_contact_address(&conn, a.id).unwrap();
        assert!(list_contact_addresses(&conn, contact.id).unwrap().is_empty());
    }

    #[test]
    fn blank_or_oversized_fields_rejected() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, &NewUser::new("strict")).unwrap();

        for fields in [
            AddressFields { city: "  ".into(), ..addis() },
            AddressFields { country: String::new(), ..addis() },
            AddressFields { sub_city: String::new(), ..addis() },
            AddressFields { street_address: "x".repeat(256), ..addis() },
            AddressFields { city: "y".repeat(101), ..addis() },
        ] {
            assert!(matches!(
                create_address(&conn, user.id, &fields),
                Err(Error::Validation(_))
            ));
        }
        assert!(list_addresses_for_user(&conn, user.id).unwrap().is_empty());

        let a = create_address(
            &conn,
            user.id,
            &AddressFields { street_address: "x".repeat(255), ..addis() },
        )
        .unwrap();
        let changes = AddressChanges {
            country: Some(" ".into()),
            ..Default::default()
        };
        assert!(matches!(
            update_address(&conn, a.id, changes),
            Err(Error::Validation(_))
        ));
        assert_eq!(get_address(&conn, a.id).unwrap().unwrap().country, "Ethiopia");
    }
}
