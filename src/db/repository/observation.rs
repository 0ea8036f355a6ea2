use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Observation, PrescriptionLine};

/// Insert an observation and its prescription lines atomically.
pub fn insert_observation(
    conn: &mut Connection,
    observation: &Observation,
) -> Result<(), DatabaseError> {
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO observations (id, opd_number, doctor_id, patient_id, symptoms,
         diagnosis, advice, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            observation.id.to_string(),
            observation.opd_number,
            observation.doctor_id,
            observation.patient_id,
            observation.symptoms,
            observation.diagnosis,
            observation.advice,
            observation.recorded_at.to_rfc3339(),
        ],
    )?;

    for line in &observation.prescription {
        tx.execute(
            "INSERT INTO prescription_lines (id, observation_id, drug_name, dosage, duration)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Uuid::new_v4().to_string(),
                observation.id.to_string(),
                line.drug_name,
                line.dosage,
                line.duration,
            ],
        )?;
    }

    tx.commit()?;
    Ok(())
}

/// Observation history for a patient, newest first, lines attached.
pub fn observations_for_patient(
    conn: &Connection,
    patient_id: &str,
) -> Result<Vec<Observation>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, opd_number, doctor_id, patient_id, symptoms, diagnosis, advice, recorded_at
         FROM observations WHERE patient_id = ?1 ORDER BY recorded_at DESC",
    )?;

    let rows: Vec<_> = stmt
        .query_map(params![patient_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?
        .collect::<Result<_, _>>()?;

    let mut observations = Vec::with_capacity(rows.len());
    for (id, opd_number, doctor_id, patient_id, symptoms, diagnosis, advice, recorded_at) in rows {
        let id = Uuid::parse_str(&id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
        observations.push(Observation {
            prescription: prescription_lines(conn, &id)?,
            id,
            opd_number,
            doctor_id,
            patient_id,
            symptoms,
            diagnosis,
            advice,
            recorded_at: DateTime::parse_from_rfc3339(&recorded_at)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?
                .with_timezone(&Utc),
        });
    }
    Ok(observations)
}

fn prescription_lines(
    conn: &Connection,
    observation_id: &Uuid,
) -> Result<Vec<PrescriptionLine>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT drug_name, dosage, duration FROM prescription_lines
         WHERE observation_id = ?1 ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![observation_id.to_string()], |row| {
        Ok(PrescriptionLine {
            drug_name: row.get(0)?,
            dosage: row.get(1)?,
            duration: row.get(2)?,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}
