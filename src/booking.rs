//! OPD visit workflow: slot booking, the doctor queue view, status
//! transitions, and observation recording.
//!
//! Slot exclusivity is NOT checked with a prior read. The unique index on
//! `(department, date, time_slot)` is the single source of truth: two
//! concurrent bookings for the same triple serialize at the store and the
//! loser gets [`BookingError::SlotTaken`]. The taken-slot listing exists
//! purely as a UX hint for the booking form.

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{observation, opd, patient};
use crate::db::DatabaseError;
use crate::ids;
use crate::models::{Observation, OpdEntry, OpdStatus, PrescriptionLine, QueueEntry};
use crate::phone;

/// Attempts to allocate a fresh OPD number before giving up. The number is
/// time-derived, so consecutive attempts land in different windows.
const OPD_NUMBER_ATTEMPTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("patient not found: {0}")]
    PatientNotFound(String),

    #[error("patient phone number missing or invalid")]
    InvalidContact,

    #[error("slot already taken for this department, date and time")]
    SlotTaken,

    #[error("could not allocate a unique OPD number")]
    OpdNumberExhausted,

    #[error("OPD entry not found: {0}")]
    EntryNotFound(String),

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition { from: OpdStatus, to: OpdStatus },

    #[error("observation requires an admitted visit, entry is {0}")]
    NotAdmitted(OpdStatus),

    #[error(transparent)]
    Db(#[from] DatabaseError),
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub patient_id: String,
    pub department: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub phc_name: Option<String>,
}

/// A successful booking plus the contact details the confirmation SMS needs.
#[derive(Debug)]
pub struct BookedSlot {
    pub entry: OpdEntry,
    pub patient_name: String,
    pub patient_phone: String,
}

/// Reserve a slot for a registered patient.
pub fn book_slot(
    conn: &Connection,
    request: &BookingRequest,
    default_calling_code: &str,
) -> Result<BookedSlot, BookingError> {
    let patient_id = request.patient_id.trim().to_lowercase();
    let patient = patient::get_patient(conn, &patient_id)?
        .ok_or_else(|| BookingError::PatientNotFound(patient_id.clone()))?;

    let patient_phone = phone::normalize_e164(&patient.phone_number, default_calling_code)
        .ok_or(BookingError::InvalidContact)?;

    for _ in 0..OPD_NUMBER_ATTEMPTS {
        let entry = OpdEntry {
            opd_number: ids::generate_opd_number(),
            patient_id: patient.patient_id.clone(),
            department: request.department.clone(),
            date: request.date,
            time_slot: request.time_slot.clone(),
            status: OpdStatus::Waiting,
            phc_name: request.phc_name.clone(),
            created_at: Utc::now(),
        };

        match opd::insert_entry(conn, &entry) {
            Ok(()) => {
                tracing::info!(
                    opd_number = %entry.opd_number,
                    department = %entry.department,
                    date = %entry.date,
                    "OPD slot booked"
                );
                return Ok(BookedSlot {
                    entry,
                    patient_name: patient.full_name.clone(),
                    patient_phone,
                });
            }
            Err(err) => match crate::db::unique_violation(&err) {
                // PK collision: the time-derived number raced another
                // booking in the same window. Retry with a fresh number.
                Some(msg) if msg.contains("opd_number") => continue,
                // The only other unique constraint is the slot index.
                Some(_) => return Err(BookingError::SlotTaken),
                None => return Err(DatabaseError::from(err).into()),
            },
        }
    }
    Err(BookingError::OpdNumberExhausted)
}

/// Confirmation SMS body for a successful booking.
pub fn booking_confirmation_sms(slot: &BookedSlot) -> String {
    format!(
        "OPD Registration Successful!\nOPD Number: {}\nPatient: {}\nDepartment: {}\nTime Slot: {}\nDate: {}\n\nPlease arrive 15 minutes before your scheduled time.",
        slot.entry.opd_number,
        slot.patient_name,
        slot.entry.department,
        slot.entry.time_slot,
        slot.entry.date,
    )
}

/// Waiting entries for a department, joined with patient fields and sorted
/// deterministically: date, then time slot, then OPD number.
pub fn queue_view(
    conn: &Connection,
    department: Option<&str>,
) -> Result<Vec<QueueEntry>, DatabaseError> {
    let mut queue = opd::waiting_queue(conn, department)?;
    queue.sort_by(|a, b| {
        (a.entry.date, opd::slot_sort_key(&a.entry.time_slot), &a.entry.opd_number).cmp(&(
            b.entry.date,
            opd::slot_sort_key(&b.entry.time_slot),
            &b.entry.opd_number,
        ))
    });
    Ok(queue)
}

/// Move a visit along its lifecycle (waiting → admitted → completed).
pub fn change_status(
    conn: &Connection,
    opd_number: &str,
    next: OpdStatus,
) -> Result<OpdEntry, BookingError> {
    let entry = opd::get_entry(conn, opd_number)?
        .ok_or_else(|| BookingError::EntryNotFound(opd_number.to_string()))?;

    if !entry.status.can_transition_to(next) {
        return Err(BookingError::InvalidTransition {
            from: entry.status,
            to: next,
        });
    }

    // Conditional update: if another request won the race, re-read and
    // report the transition that actually failed.
    if !opd::transition_status(conn, opd_number, entry.status, next)? {
        let current = opd::get_entry(conn, opd_number)?
            .ok_or_else(|| BookingError::EntryNotFound(opd_number.to_string()))?;
        return Err(BookingError::InvalidTransition {
            from: current.status,
            to: next,
        });
    }

    tracing::info!(%opd_number, status = %next, "OPD status changed");
    opd::get_entry(conn, opd_number)?
        .ok_or_else(|| BookingError::EntryNotFound(opd_number.to_string()))
}

#[derive(Debug, Clone)]
pub struct ObservationInput {
    pub opd_number: String,
    pub doctor_id: String,
    pub patient_id: String,
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub advice: Option<String>,
    pub prescription: Vec<PrescriptionLine>,
}

/// Attach a clinical note to a visit. The visit must exist and be admitted;
/// anything else is rejected before the write.
pub fn record_observation(
    conn: &mut Connection,
    input: ObservationInput,
) -> Result<Observation, BookingError> {
    let entry = opd::get_entry(conn, &input.opd_number)?
        .ok_or_else(|| BookingError::EntryNotFound(input.opd_number.clone()))?;

    if entry.status != OpdStatus::Admitted {
        return Err(BookingError::NotAdmitted(entry.status));
    }

    let record = Observation {
        id: Uuid::new_v4(),
        opd_number: input.opd_number,
        doctor_id: input.doctor_id,
        patient_id: input.patient_id,
        symptoms: input.symptoms,
        diagnosis: input.diagnosis,
        advice: input.advice,
        prescription: input.prescription,
        recorded_at: Utc::now(),
    };
    observation::insert_observation(conn, &record)?;
    Ok(record)
}
