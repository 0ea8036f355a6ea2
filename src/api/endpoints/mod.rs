//! Request handlers, one module per resource.

pub mod doctors;
pub mod health;
pub mod observations;
pub mod opd;
pub mod otp;
pub mod patients;
pub mod transcribe;
