use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::Doctor;

const DOCTOR_COLUMNS: &str = "kg_id, mbbs_cert_id, full_name, email, phone_number, phc_name, \
     department, password_hash, reset_token_hash, reset_token_expiry";

pub fn insert_doctor(conn: &Connection, doctor: &Doctor) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO doctors (kg_id, mbbs_cert_id, full_name, email, phone_number, phc_name,
         department, password_hash, reset_token_hash, reset_token_expiry)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            doctor.kg_id,
            doctor.mbbs_cert_id,
            doctor.full_name,
            doctor.email,
            doctor.phone_number,
            doctor.phc_name,
            doctor.department,
            doctor.password_hash,
            doctor.reset_token_hash,
            doctor.reset_token_expiry.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(())
}

pub fn get_doctor_by_cert_id(
    conn: &Connection,
    mbbs_cert_id: &str,
) -> Result<Option<Doctor>, DatabaseError> {
    fetch_one(conn, "mbbs_cert_id", mbbs_cert_id)
}

pub fn get_doctor_by_email(conn: &Connection, email: &str) -> Result<Option<Doctor>, DatabaseError> {
    fetch_one(conn, "email", email)
}

/// Find the doctor holding an unexpired reset token with the given hash.
pub fn get_doctor_by_reset_token_hash(
    conn: &Connection,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<Doctor>, DatabaseError> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {DOCTOR_COLUMNS} FROM doctors
                 WHERE reset_token_hash = ?1 AND reset_token_expiry > ?2"
            ),
            params![token_hash, now.to_rfc3339()],
            doctor_row,
        )
        .optional()?;
    row.map(doctor_from_row).transpose()
}

pub fn set_reset_token(
    conn: &Connection,
    kg_id: &str,
    token_hash: &str,
    expiry: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE doctors SET reset_token_hash = ?2, reset_token_expiry = ?3 WHERE kg_id = ?1",
        params![kg_id, token_hash, expiry.to_rfc3339()],
    )?;
    Ok(())
}

/// Set a new password hash and clear any pending reset token.
pub fn update_password(
    conn: &Connection,
    kg_id: &str,
    password_hash: &str,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE doctors SET password_hash = ?2, reset_token_hash = NULL,
         reset_token_expiry = NULL WHERE kg_id = ?1",
        params![kg_id, password_hash],
    )?;
    Ok(())
}

fn fetch_one(conn: &Connection, column: &str, value: &str) -> Result<Option<Doctor>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE {column} = ?1"),
            params![value],
            doctor_row,
        )
        .optional()?;
    row.map(doctor_from_row).transpose()
}

struct DoctorRow {
    kg_id: String,
    mbbs_cert_id: String,
    full_name: String,
    email: String,
    phone_number: Option<String>,
    phc_name: Option<String>,
    department: String,
    password_hash: String,
    reset_token_hash: Option<String>,
    reset_token_expiry: Option<String>,
}

fn doctor_row(row: &rusqlite::Row<'_>) -> Result<DoctorRow, rusqlite::Error> {
    Ok(DoctorRow {
        kg_id: row.get(0)?,
        mbbs_cert_id: row.get(1)?,
        full_name: row.get(2)?,
        email: row.get(3)?,
        phone_number: row.get(4)?,
        phc_name: row.get(5)?,
        department: row.get(6)?,
        password_hash: row.get(7)?,
        reset_token_hash: row.get(8)?,
        reset_token_expiry: row.get(9)?,
    })
}

fn doctor_from_row(row: DoctorRow) -> Result<Doctor, DatabaseError> {
    let reset_token_expiry = row
        .reset_token_expiry
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
        })
        .transpose()?;

    Ok(Doctor {
        kg_id: row.kg_id,
        mbbs_cert_id: row.mbbs_cert_id,
        full_name: row.full_name,
        email: row.email,
        phone_number: row.phone_number,
        phc_name: row.phc_name,
        department: row.department,
        password_hash: row.password_hash,
        reset_token_hash: row.reset_token_hash,
        reset_token_expiry,
    })
}
