use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::Patient;

const PATIENT_COLUMNS: &str = "patient_id, full_name, date_of_birth, phone_number, sex, \
     father_mother_name, husband_wife_name, pan_card, aadhar_card, ration_card, \
     address, photo, registered_at";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO patients (patient_id, full_name, date_of_birth, phone_number, sex,
         father_mother_name, husband_wife_name, pan_card, aadhar_card, ration_card,
         address, photo, registered_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            patient.patient_id,
            patient.full_name,
            patient.date_of_birth.to_string(),
            patient.phone_number,
            patient.sex,
            patient.father_mother_name,
            patient.husband_wife_name,
            patient.pan_card,
            patient.aadhar_card,
            patient.ration_card,
            patient.address,
            patient.photo,
            patient.registered_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, patient_id: &str) -> Result<Option<Patient>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE patient_id = ?1"),
            params![patient_id],
            patient_row,
        )
        .optional()?;

    row.map(patient_from_row).transpose()
}

struct PatientRow {
    patient_id: String,
    full_name: String,
    date_of_birth: String,
    phone_number: String,
    sex: String,
    father_mother_name: Option<String>,
    husband_wife_name: Option<String>,
    pan_card: Option<String>,
    aadhar_card: Option<String>,
    ration_card: Option<String>,
    address: Option<String>,
    photo: Option<String>,
    registered_at: String,
}

fn patient_row(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        patient_id: row.get(0)?,
        full_name: row.get(1)?,
        date_of_birth: row.get(2)?,
        phone_number: row.get(3)?,
        sex: row.get(4)?,
        father_mother_name: row.get(5)?,
        husband_wife_name: row.get(6)?,
        pan_card: row.get(7)?,
        aadhar_card: row.get(8)?,
        ration_card: row.get(9)?,
        address: row.get(10)?,
        photo: row.get(11)?,
        registered_at: row.get(12)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        date_of_birth: NaiveDate::parse_from_str(&row.date_of_birth, "%Y-%m-%d")
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        registered_at: DateTime::parse_from_rfc3339(&row.registered_at)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?
            .with_timezone(&Utc),
        patient_id: row.patient_id,
        full_name: row.full_name,
        phone_number: row.phone_number,
        sex: row.sex,
        father_mother_name: row.father_mother_name,
        husband_wife_name: row.husband_wife_name,
        pan_card: row.pan_card,
        aadhar_card: row.aadhar_card,
        ration_card: row.ration_card,
        address: row.address,
        photo: row.photo,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::open_memory_database;

    pub(crate) fn sample_patient(id: &str, phone: &str) -> Patient {
        Patient {
            patient_id: id.to_string(),
            full_name: "Asha Devi".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1988, 4, 12).unwrap(),
            phone_number: phone.to_string(),
            sex: "F".to_string(),
            father_mother_name: None,
            husband_wife_name: None,
            pan_card: None,
            aadhar_card: None,
            ration_card: None,
            address: Some("Ward 4, Rampur".to_string()),
            photo: None,
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_fetch_round_trip() {
        let conn = open_memory_database().unwrap();
        let patient = sample_patient("pt-ab12cd34", "9876543210");
        insert_patient(&conn, &patient).unwrap();

        let fetched = get_patient(&conn, "pt-ab12cd34").unwrap().unwrap();
        assert_eq!(fetched.full_name, "Asha Devi");
        assert_eq!(fetched.phone_number, "9876543210");
        assert_eq!(fetched.date_of_birth, patient.date_of_birth);
    }

    #[test]
    fn missing_patient_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_patient(&conn, "pt-nope").unwrap().is_none());
    }

    #[test]
    fn duplicate_phone_is_unique_violation() {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, &sample_patient("pt-1", "9876543210")).unwrap();
        let err = insert_patient(&conn, &sample_patient("pt-2", "9876543210")).unwrap_err();
        let msg = crate::db::unique_violation(&err).expect("unique violation expected");
        assert!(msg.contains("phone_number"));
    }
}
