//! Fixed-window request counters keyed by client identity.
//!
//! Two independent limiters protect the upstream quota: a coarse one over
//! all API traffic and a strict one over the transcription endpoint, which
//! is materially more expensive per call. Counters are per-process with no
//! persistence across restarts; this is a small single-instance gateway,
//! not a billing-grade limiter.

use std::{
  collections::HashMap,
  sync::Mutex,
  time::{Duration, Instant},
};

// ─── Policy ──────────────────────────────────────────────────────────────────

/// A window length and the request ceiling within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
  pub window:  Duration,
  pub ceiling: u32,
}

/// All API traffic: 100 requests per 15 minutes per client.
pub const API_POLICY: RateLimitPolicy = RateLimitPolicy {
  window:  Duration::from_secs(15 * 60),
  ceiling: 100,
};

/// Transcription only: 10 requests per minute per client.
pub const TRANSCRIBE_POLICY: RateLimitPolicy = RateLimitPolicy {
  window:  Duration::from_secs(60),
  ceiling: 10,
};

// Prune expired windows once the table grows past this.
const PRUNE_THRESHOLD: usize = 1024;

// ─── Decision ────────────────────────────────────────────────────────────────

/// The outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Allowed {
    remaining: u32,
  },
  Limited {
    limit:            u32,
    retry_after_secs: u64,
  },
}

// ─── Limiter ─────────────────────────────────────────────────────────────────

struct Window {
  started: Instant,
  count:   u32,
}

/// A fixed-window counter table. The mutex-guarded map is the only shared
/// mutable state in the gateway.
pub struct RateLimiter {
  policy:  RateLimitPolicy,
  windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
  pub fn new(policy: RateLimitPolicy) -> Self {
    Self {
      policy,
      windows: Mutex::new(HashMap::new()),
    }
  }

  pub fn policy(&self) -> RateLimitPolicy {
    self.policy
  }

  /// Admit or refuse one request from `identity`.
  pub fn check(&self, identity: &str) -> Decision {
    self.check_at(identity, Instant::now())
  }

  /// Clock-explicit variant so window expiry is testable without sleeping.
  pub fn check_at(&self, identity: &str, now: Instant) -> Decision {
    let mut windows = self.windows.lock().expect("rate limiter poisoned");

    if windows.len() > PRUNE_THRESHOLD {
      let window = self.policy.window;
      windows.retain(|_, w| now.duration_since(w.started) < window);
    }

    let entry = windows.entry(identity.to_string()).or_insert(Window {
      started: now,
      count:   0,
    });

    // A stale window restarts rather than carrying old counts forward.
    if now.duration_since(entry.started) >= self.policy.window {
      entry.started = now;
      entry.count = 0;
    }

    if entry.count >= self.policy.ceiling {
      let elapsed = now.duration_since(entry.started);
      let retry_after = self.policy.window.saturating_sub(elapsed);
      return Decision::Limited {
        limit:            self.policy.ceiling,
        retry_after_secs: retry_after.as_secs().max(1),
      };
    }

    entry.count += 1;
    Decision::Allowed {
      remaining: self.policy.ceiling - entry.count,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn limiter(ceiling: u32, window_secs: u64) -> RateLimiter {
    RateLimiter::new(RateLimitPolicy {
      window:  Duration::from_secs(window_secs),
      ceiling,
    })
  }

  #[test]
  fn requests_under_the_ceiling_are_allowed() {
    let l = limiter(3, 60);
    let now = Instant::now();
    assert_eq!(l.check_at("1.2.3.4", now), Decision::Allowed { remaining: 2 });
    assert_eq!(l.check_at("1.2.3.4", now), Decision::Allowed { remaining: 1 });
    assert_eq!(l.check_at("1.2.3.4", now), Decision::Allowed { remaining: 0 });
  }

  #[test]
  fn the_ceiling_plus_one_request_is_limited() {
    let l = limiter(3, 60);
    let now = Instant::now();
    for _ in 0..3 {
      assert!(matches!(l.check_at("1.2.3.4", now), Decision::Allowed { .. }));
    }
    assert!(matches!(
      l.check_at("1.2.3.4", now),
      Decision::Limited { limit: 3, .. }
    ));
  }

  #[test]
  fn identities_are_independent() {
    let l = limiter(1, 60);
    let now = Instant::now();
    assert!(matches!(l.check_at("1.2.3.4", now), Decision::Allowed { .. }));
    assert!(matches!(l.check_at("5.6.7.8", now), Decision::Allowed { .. }));
    assert!(matches!(l.check_at("1.2.3.4", now), Decision::Limited { .. }));
  }

  #[test]
  fn an_expired_window_resets_the_count() {
    let l = limiter(1, 60);
    let start = Instant::now();
    assert!(matches!(l.check_at("1.2.3.4", start), Decision::Allowed { .. }));
    assert!(matches!(l.check_at("1.2.3.4", start), Decision::Limited { .. }));

    let later = start + Duration::from_secs(61);
    assert!(matches!(l.check_at("1.2.3.4", later), Decision::Allowed { .. }));
  }

  #[test]
  fn retry_after_reflects_remaining_window() {
    let l = limiter(1, 60);
    let start = Instant::now();
    l.check_at("1.2.3.4", start);
    let decision = l.check_at("1.2.3.4", start + Duration::from_secs(20));
    match decision {
      Decision::Limited {
        retry_after_secs, ..
      } => assert!((39..=40).contains(&retry_after_secs), "{retry_after_secs}"),
      other => panic!("expected Limited, got {other:?}"),
    }
  }
}
