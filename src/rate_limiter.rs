/*!
 * Per-address admission gate.
 *
 * The table maps a client address to the unix timestamp (seconds) of its
 * last admitted request. The check-then-update sequence runs under one lock
 * so two concurrent requests from the same address cannot both pass.
 */

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use parking_lot::Mutex;
use log::debug;

/// Admission gate keyed by client address. Clones share one table.
#[derive(Clone)]
pub struct RateLimiter {
    /// Last admitted request per address
    last_seen: Arc<Mutex<HashMap<String, i64>>>,

    /// Configured budget in requests per minute
    requests_per_minute: u32,
}

impl RateLimiter {
    /// Create a limiter for the given budget. A zero budget is rejected by
    /// config validation; here it is treated as one request per minute.
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            last_seen: Arc::new(Mutex::new(HashMap::new())),
            requests_per_minute: requests_per_minute.max(1),
        }
    }

    /// Minimum spacing between admitted requests, in seconds.
    ///
    /// The rate term cancels, so this is 60 for every budget.
    pub fn threshold_secs(&self) -> i64 {
        let rate = i64::from(self.requests_per_minute);
        (rate * 60) / rate
    }

    /// Decide whether a request from `address` at `now` may proceed.
    /// Admission records `now`; rejection leaves the table untouched.
    pub fn admit(&self, address: &str, now: i64) -> bool {
        if is_local_address(address) {
            return true;
        }

        let threshold = self.threshold_secs();
        let mut table = self.last_seen.lock();
        let last = table.get(address).copied().unwrap_or(0);
        let elapsed = now - last;

        if elapsed < threshold {
            debug!("Rejecting {} ({}s since last request)", address, elapsed);
            return false;
        }

        table.insert(address.to_string(), now);
        true
    }

    /// Drop entries that can no longer cause a rejection. Returns how many
    /// were removed.
    pub fn sweep(&self, now: i64) -> usize {
        let threshold = self.threshold_secs();
        let mut table = self.last_seen.lock();
        let before = table.len();
        table.retain(|_, last| now - *last < threshold);
        let removed = before - table.len();
        if removed > 0 {
            debug!("Swept {} rate limit entries, {} remain", removed, table.len());
        }
        removed
    }

    /// Number of tracked addresses
    pub fn len(&self) -> usize {
        self.last_seen.lock().len()
    }

    /// Check if no address is tracked
    pub fn is_empty(&self) -> bool {
        self.last_seen.lock().is_empty()
    }
}

/// Loopback and private-network addresses bypass the gate. Anything that
/// does not parse as an IP address is treated as public.
pub fn is_local_address(address: &str) -> bool {
    let Ok(ip) = address.trim().parse::<IpAddr>() else {
        return false;
    };

    match ip {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_private() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return mapped.is_loopback() || mapped.is_private() || mapped.is_link_local();
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                // fc00::/7 unique local
                || (first & 0xfe00) == 0xfc00
                // fe80::/10 link local
                || (first & 0xffc0) == 0xfe80
        }
    }
}
