use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{OpdEntry, OpdStatus, QueueEntry};

const OPD_COLUMNS: &str =
    "opd_number, patient_id, department, date, time_slot, status, phc_name, created_at";

pub fn insert_entry(conn: &Connection, entry: &OpdEntry) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO opd_entries (opd_number, patient_id, department, date, time_slot,
         status, phc_name, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.opd_number,
            entry.patient_id,
            entry.department,
            entry.date.to_string(),
            entry.time_slot,
            entry.status.as_str(),
            entry.phc_name,
            entry.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_entry(conn: &Connection, opd_number: &str) -> Result<Option<OpdEntry>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {OPD_COLUMNS} FROM opd_entries WHERE opd_number = ?1"),
            params![opd_number],
            opd_row,
        )
        .optional()?;
    row.map(opd_from_row).transpose()
}

/// Time slots already reserved for a department on a date. UX hint only;
/// slot exclusivity is enforced by the unique index at insert time.
pub fn taken_slots(
    conn: &Connection,
    department: &str,
    date: NaiveDate,
) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT time_slot FROM opd_entries WHERE department = ?1 AND date = ?2",
    )?;
    let rows = stmt.query_map(params![department, date.to_string()], |row| row.get(0))?;
    rows.collect::<Result<Vec<String>, _>>()
        .map_err(DatabaseError::from)
}

/// Waiting entries for a department, joined with patient display fields at
/// the store level. Ordering is applied by the caller (see `booking`).
pub fn waiting_queue(
    conn: &Connection,
    department: Option<&str>,
) -> Result<Vec<QueueEntry>, DatabaseError> {
    let sql = format!(
        "SELECT o.opd_number, o.patient_id, o.department, o.date, o.time_slot,
                o.status, o.phc_name, o.created_at,
                p.full_name, p.phone_number, p.sex, p.address
         FROM opd_entries o
         JOIN patients p ON p.patient_id = o.patient_id
         WHERE o.status = 'waiting'{}",
        if department.is_some() {
            " AND o.department = ?1"
        } else {
            ""
        }
    );

    let mut stmt = conn.prepare(&sql)?;
    let map_row = |row: &rusqlite::Row<'_>| {
        Ok((
            opd_row(row)?,
            row.get::<_, String>(8)?,
            row.get::<_, String>(9)?,
            row.get::<_, String>(10)?,
            row.get::<_, Option<String>>(11)?,
        ))
    };
    let rows: Vec<_> = match department {
        Some(dept) => stmt
            .query_map(params![dept], map_row)?
            .collect::<Result<_, _>>()?,
        None => stmt.query_map([], map_row)?.collect::<Result<_, _>>()?,
    };

    let mut queue = Vec::with_capacity(rows.len());
    for (row, patient_name, patient_phone, sex, address) in rows {
        queue.push(QueueEntry {
            entry: opd_from_row(row)?,
            patient_name,
            patient_phone,
            sex,
            address,
        });
    }
    Ok(queue)
}

/// Conditionally move an entry from `expected` to `next`. Returns `false`
/// when the entry was concurrently moved out of `expected`.
pub fn transition_status(
    conn: &Connection,
    opd_number: &str,
    expected: OpdStatus,
    next: OpdStatus,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE opd_entries SET status = ?3 WHERE opd_number = ?1 AND status = ?2",
        params![opd_number, expected.as_str(), next.as_str()],
    )?;
    Ok(changed == 1)
}

/// Sort key for a clinic time-slot label like `"09:30 AM"`. Unparseable
/// labels sort last so malformed legacy rows cannot hide valid ones.
pub fn slot_sort_key(time_slot: &str) -> NaiveTime {
    NaiveTime::parse_from_str(time_slot, "%I:%M %p")
        .unwrap_or_else(|_| NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default())
}

struct OpdRow {
    opd_number: String,
    patient_id: String,
    department: String,
    date: String,
    time_slot: String,
    status: String,
    phc_name: Option<String>,
    created_at: String,
}

fn opd_row(row: &rusqlite::Row<'_>) -> Result<OpdRow, rusqlite::Error> {
    Ok(OpdRow {
        opd_number: row.get(0)?,
        patient_id: row.get(1)?,
        department: row.get(2)?,
        date: row.get(3)?,
        time_slot: row.get(4)?,
        status: row.get(5)?,
        phc_name: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn opd_from_row(row: OpdRow) -> Result<OpdEntry, DatabaseError> {
    Ok(OpdEntry {
        date: NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        status: OpdStatus::from_str(&row.status)?,
        created_at: DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?
            .with_timezone(&Utc),
        opd_number: row.opd_number,
        patient_id: row.patient_id,
        department: row.department,
        time_slot: row.time_slot,
        phc_name: row.phc_name,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::patient::{insert_patient, tests::sample_patient};

    pub(crate) fn sample_entry(opd_number: &str, patient_id: &str, slot: &str) -> OpdEntry {
        OpdEntry {
            opd_number: opd_number.to_string(),
            patient_id: patient_id.to_string(),
            department: "Cardiology".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            time_slot: slot.to_string(),
            status: OpdStatus::Waiting,
            phc_name: None,
            created_at: Utc::now(),
        }
    }

    fn seeded_conn() -> Connection {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, &sample_patient("pt-1", "9876543210")).unwrap();
        conn
    }

    #[test]
    fn insert_and_fetch() {
        let conn = seeded_conn();
        insert_entry(&conn, &sample_entry("OPD000001", "pt-1", "09:00 AM")).unwrap();
        let entry = get_entry(&conn, "OPD000001").unwrap().unwrap();
        assert_eq!(entry.status, OpdStatus::Waiting);
        assert_eq!(entry.time_slot, "09:00 AM");
    }

    #[test]
    fn same_slot_twice_violates_unique_index() {
        let conn = seeded_conn();
        insert_entry(&conn, &sample_entry("OPD000001", "pt-1", "09:00 AM")).unwrap();
        let err = insert_entry(&conn, &sample_entry("OPD000002", "pt-1", "09:00 AM")).unwrap_err();
        let msg = crate::db::unique_violation(&err).unwrap();
        assert!(msg.contains("department"), "unexpected message: {msg}");
    }

    #[test]
    fn duplicate_opd_number_names_the_pk() {
        let conn = seeded_conn();
        insert_entry(&conn, &sample_entry("OPD000001", "pt-1", "09:00 AM")).unwrap();
        let err = insert_entry(&conn, &sample_entry("OPD000001", "pt-1", "09:30 AM")).unwrap_err();
        let msg = crate::db::unique_violation(&err).unwrap();
        assert!(msg.contains("opd_number"), "unexpected message: {msg}");
    }

    #[test]
    fn taken_slots_lists_reservations() {
        let conn = seeded_conn();
        insert_entry(&conn, &sample_entry("OPD000001", "pt-1", "09:00 AM")).unwrap();
        insert_entry(&conn, &sample_entry("OPD000002", "pt-1", "02:30 PM")).unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let slots = taken_slots(&conn, "Cardiology", date).unwrap();
        assert_eq!(slots.len(), 2);
        assert!(slots.contains(&"09:00 AM".to_string()));

        assert!(taken_slots(&conn, "Dermatology", date).unwrap().is_empty());
    }

    #[test]
    fn queue_joins_patient_fields() {
        let conn = seeded_conn();
        insert_entry(&conn, &sample_entry("OPD000001", "pt-1", "09:00 AM")).unwrap();

        let queue = waiting_queue(&conn, Some("Cardiology")).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].patient_name, "Asha Devi");
        assert_eq!(queue[0].patient_phone, "9876543210");
    }

    #[test]
    fn queue_excludes_other_departments_and_statuses() {
        let conn = seeded_conn();
        insert_entry(&conn, &sample_entry("OPD000001", "pt-1", "09:00 AM")).unwrap();
        let mut derm = sample_entry("OPD000002", "pt-1", "09:00 AM");
        derm.department = "Dermatology".to_string();
        insert_entry(&conn, &derm).unwrap();

        transition_status(&conn, "OPD000001", OpdStatus::Waiting, OpdStatus::Admitted).unwrap();

        let queue = waiting_queue(&conn, Some("Cardiology")).unwrap();
        assert!(queue.is_empty());
        let queue = waiting_queue(&conn, Some("Dermatology")).unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn conditional_transition_reports_miss() {
        let conn = seeded_conn();
        insert_entry(&conn, &sample_entry("OPD000001", "pt-1", "09:00 AM")).unwrap();

        assert!(
            transition_status(&conn, "OPD000001", OpdStatus::Waiting, OpdStatus::Admitted)
                .unwrap()
        );
        // Entry is no longer waiting, so the same edge misses
        assert!(
            !transition_status(&conn, "OPD000001", OpdStatus::Waiting, OpdStatus::Admitted)
                .unwrap()
        );
    }

    #[test]
    fn slot_sort_key_orders_morning_before_afternoon() {
        assert!(slot_sort_key("09:00 AM") < slot_sort_key("02:00 PM"));
        assert!(slot_sort_key("09:00 AM") < slot_sort_key("09:30 AM"));
        // Garbage sorts last
        assert!(slot_sort_key("whenever") > slot_sort_key("04:30 PM"));
    }
}
