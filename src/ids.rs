//! Human-usable identifier generation.
//!
//! Patient IDs are short random lowercase codes (lowercase because OPD
//! booking case-folds the caller-supplied ID before lookup). OPD numbers
//! keep the legacy time-derived `OPD` prefix shape; the random tail narrows
//! the collision window but the primary-key constraint remains the real
//! guarantee, and callers retry on a collision.

use chrono::Utc;
use rand::Rng;

const PATIENT_ID_ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";
const PATIENT_ID_LEN: usize = 8;

/// Generate a patient ID like `pt-x7k2m9q4`.
pub fn generate_patient_id() -> String {
    let mut rng = rand::thread_rng();
    let tail: String = (0..PATIENT_ID_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..PATIENT_ID_ALPHABET.len());
            PATIENT_ID_ALPHABET[idx] as char
        })
        .collect();
    format!("pt-{tail}")
}

/// Generate a doctor ID like `kg-m4t8w2cd`.
pub fn generate_doctor_id() -> String {
    let mut rng = rand::thread_rng();
    let tail: String = (0..PATIENT_ID_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..PATIENT_ID_ALPHABET.len());
            PATIENT_ID_ALPHABET[idx] as char
        })
        .collect();
    format!("kg-{tail}")
}

/// Generate an OPD number like `OPD482739-07`: the last six digits of the
/// current unix-millisecond clock plus a two-digit random disambiguator.
pub fn generate_opd_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u8 = rand::thread_rng().gen_range(0..100);
    format!("OPD{:06}-{:02}", millis % 1_000_000, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn patient_ids_are_lowercase_and_prefixed() {
        let id = generate_patient_id();
        assert!(id.starts_with("pt-"));
        assert_eq!(id.len(), 3 + PATIENT_ID_LEN);
        assert_eq!(id, id.to_lowercase());
    }

    #[test]
    fn patient_ids_avoid_ambiguous_characters() {
        for _ in 0..50 {
            let id = generate_patient_id();
            assert!(!id[3..].contains(['0', '1', 'i', 'l', 'o']));
        }
    }

    #[test]
    fn patient_ids_are_practically_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_patient_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn doctor_ids_are_prefixed() {
        let id = generate_doctor_id();
        assert!(id.starts_with("kg-"));
        assert_eq!(id.len(), 3 + PATIENT_ID_LEN);
    }

    #[test]
    fn opd_number_shape() {
        let n = generate_opd_number();
        assert!(n.starts_with("OPD"));
        // OPD + 6 digits + '-' + 2 digits
        assert_eq!(n.len(), 12);
        assert_eq!(&n[9..10], "-");
    }
}
