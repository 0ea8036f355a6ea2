//! Shared state handed to every request handler.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::config::Config;
use crate::db;
use crate::notify::Notifier;
use crate::otp::OtpStore;

/// Doctor signup codes sent by email.
const EMAIL_OTP_DIGITS: u32 = 4;
/// Login codes sent by SMS.
const PHONE_OTP_DIGITS: u32 = 6;

#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<Config>,
    pub db_path: PathBuf,
    pub email_otp: Arc<Mutex<OtpStore>>,
    pub phone_otp: Arc<Mutex<OtpStore>>,
    pub notifier: Arc<dyn Notifier>,
}

impl ApiContext {
    pub fn new(config: Arc<Config>, db_path: PathBuf, notifier: Arc<dyn Notifier>) -> Self {
        let ttl = config.otp_ttl;
        Self {
            config,
            db_path,
            email_otp: Arc::new(Mutex::new(OtpStore::new(EMAIL_OTP_DIGITS, ttl))),
            phone_otp: Arc::new(Mutex::new(OtpStore::new(PHONE_OTP_DIGITS, ttl))),
            notifier,
        }
    }

    /// Open a fresh connection for one request. SQLite in WAL mode handles
    /// the concurrency; the unique indexes handle the races.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        db::open_database(&self.db_path).map_err(|e| ApiError::Internal(e.to_string()))
    }
}
