//! Charak is an EHR backend for primary health centres.
//!
//! Patients register at the front desk and book OPD slots; doctors sign up
//! with email verification, work a per-department queue, and record
//! observations against admitted visits. Storage is SQLite, and the slot
//! uniqueness constraint in the schema is what makes double-booking
//! impossible.

pub mod api;
pub mod auth;
pub mod booking;
pub mod config;
pub mod db;
pub mod ids;
pub mod models;
pub mod notify;
pub mod otp;
pub mod phone;
