//! One-time verification codes with enforced expiry.
//!
//! One `OtpStore` per delivery channel (email uses 4-digit codes, phone 6),
//! constructed once and shared through `ApiContext`, with no process-wide
//! singleton. Entries are swept opportunistically on issue so the map stays
//! bounded under sustained traffic.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;
use subtle::ConstantTimeEq;

/// Sweep threshold: issuing past this many live entries triggers a cleanup.
const SWEEP_THRESHOLD: usize = 1000;

struct OtpEntry {
    code: String,
    expires_at: Instant,
}

pub struct OtpStore {
    codes: HashMap<String, OtpEntry>,
    ttl: Duration,
    digits: u32,
}

impl OtpStore {
    pub fn new(digits: u32, ttl: Duration) -> Self {
        Self {
            codes: HashMap::new(),
            ttl,
            digits,
        }
    }

    /// Issue a fresh code for `address`, replacing any pending one.
    pub fn issue(&mut self, address: &str) -> String {
        if self.codes.len() > SWEEP_THRESHOLD {
            self.sweep();
        }

        let low = 10u32.pow(self.digits - 1);
        let high = 10u32.pow(self.digits);
        let code = rand::thread_rng().gen_range(low..high).to_string();

        self.codes.insert(
            address.to_string(),
            OtpEntry {
                code: code.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        code
    }

    /// Verify a code for `address`. A match consumes the entry (one-time
    /// use); a mismatch leaves it in place so the caller may retry. Expired
    /// or unknown addresses are a mismatch.
    pub fn verify(&mut self, address: &str, code: &str) -> bool {
        let Some(entry) = self.codes.get(address) else {
            return false;
        };
        if Instant::now() > entry.expires_at {
            self.codes.remove(address);
            return false;
        }
        let matches: bool = entry.code.as_bytes().ct_eq(code.as_bytes()).into();
        if matches {
            self.codes.remove(address);
        }
        matches
    }

    fn sweep(&mut self) {
        let now = Instant::now();
        self.codes.retain(|_, entry| now < entry.expires_at);
    }
}
