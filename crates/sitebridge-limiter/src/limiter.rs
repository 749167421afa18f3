//! The dual-level limiter: global ceiling first, then per-client.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::window::RateWindow;

// Roughly one check in a thousand sweeps expired client windows. The sweep
// only reclaims memory; decisions never depend on whether it ran.
const PRUNE_MODULO: u64 = 1000;
const PRUNE_MULTIPLIER: u64 = 2654435761;

/// Ceilings and window length for both limiter levels.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Requests a single client identifier may spend per window.
    pub client_limit: u32,
    /// Requests the whole process may spend per window.
    pub global_limit: u32,
    /// Window length for both levels.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            client_limit: 10,
            global_limit: 500,
            window: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Which ceiling rejected the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    GlobalExhausted,
    ClientExhausted,
}

impl DenyReason {
    /// User-facing explanation for a 429 body.
    pub fn message(self) -> &'static str {
        match self {
            DenyReason::GlobalExhausted => {
                "The shared daily AI quota is exhausted. Come back tomorrow."
            }
            DenyReason::ClientExhausted => "Rate limit exceeded. Please try again later.",
        }
    }
}

/// Outcome of a limiter check. The limiter classifies, it never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    /// Requests the client may still spend inside the current window.
    pub remaining: u32,
    /// Time until the relevant window rolls over.
    pub reset_in: Duration,
    pub reason: Option<DenyReason>,
}

struct LimiterState {
    global: RateWindow,
    clients: HashMap<String, RateWindow>,
    checks: u64,
}

/// Process-wide request limiter over rolling windows.
///
/// State lives behind one mutex; the check-then-mutate sequence is atomic per
/// call. Client windows are created lazily and reclaimed opportunistically.
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let now = SystemTime::now();
        Self {
            config,
            state: Mutex::new(LimiterState {
                global: RateWindow::empty(now, config.window),
                clients: HashMap::new(),
                checks: 0,
            }),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Classify one request from `client_id` against both ceilings.
    pub fn check(&self, client_id: &str) -> Decision {
        self.check_at(client_id, SystemTime::now())
    }

    /// Same as [`check`](Self::check) with an injectable clock.
    pub fn check_at(&self, client_id: &str, now: SystemTime) -> Decision {
        let mut guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let state = &mut *guard;

        if state.global.expired(now) {
            state.global = RateWindow::empty(now, self.config.window);
        }

        // The shared metered quota is protected before any per-client state.
        if state.global.count >= self.config.global_limit {
            return Decision {
                allowed: false,
                remaining: 0,
                reset_in: state.global.reset_in(now),
                reason: Some(DenyReason::GlobalExhausted),
            };
        }

        state.checks = state.checks.wrapping_add(1);
        if state.checks.wrapping_mul(PRUNE_MULTIPLIER) % PRUNE_MODULO == 0 {
            state.clients.retain(|_, window| !window.expired(now));
        }

        match state.clients.entry(client_id.to_string()) {
            Entry::Occupied(mut entry) if !entry.get().expired(now) => {
                let window = entry.get_mut();
                if window.count >= self.config.client_limit {
                    // Client ceiling reached; the global counter is untouched.
                    return Decision {
                        allowed: false,
                        remaining: 0,
                        reset_in: window.reset_in(now),
                        reason: Some(DenyReason::ClientExhausted),
                    };
                }
                window.count += 1;
                let decision = Decision {
                    allowed: true,
                    remaining: self.config.client_limit - window.count,
                    reset_in: window.reset_in(now),
                    reason: None,
                };
                state.global.count += 1;
                decision
            }
            // Absent or expired: the window is replaced, never incremented.
            entry => {
                let fresh = RateWindow::first(now, self.config.window);
                let decision = Decision {
                    allowed: true,
                    remaining: self.config.client_limit.saturating_sub(1),
                    reset_in: fresh.reset_in(now),
                    reason: None,
                };
                match entry {
                    Entry::Occupied(mut occupied) => {
                        occupied.insert(fresh);
                    }
                    Entry::Vacant(vacant) => {
                        vacant.insert(fresh);
                    }
                }
                state.global.count += 1;
                decision
            }
        }
    }

    /// Client windows currently held in memory (pruned ones excluded).
    pub fn tracked_clients(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clients
            .len()
    }
}
