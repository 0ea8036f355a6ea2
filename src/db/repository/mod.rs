pub mod doctor;
pub mod observation;
pub mod opd;
pub mod patient;
