//! Per-chat sliding-window rate limiting.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use crate::domain::ChatId;

pub const MINUTE_WINDOW: Duration = Duration::from_secs(60);
pub const HOUR_WINDOW: Duration = Duration::from_secs(3600);

#[derive(Clone, Copy, Debug)]
pub struct RateLimits {
    pub per_minute: usize,
    pub per_hour: usize,
}

/// Timestamps of recent attempts for one chat, oldest first. Entries are kept
/// only as long as the hour window needs them and are pruned before every
/// count check, never after.
#[derive(Debug, Default)]
struct RateWindow {
    hits: VecDeque<Instant>,
}

impl RateWindow {
    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.hits.front() {
            if now.duration_since(oldest) >= HOUR_WINDOW {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }

    fn minute_count(&self, now: Instant) -> usize {
        self.hits
            .iter()
            .rev()
            .take_while(|&&t| now.duration_since(t) < MINUTE_WINDOW)
            .count()
    }

    fn retry_hint(&self, now: Instant, minute_over: bool, hour_over: bool) -> Option<Duration> {
        let minute_wait = minute_over
            .then(|| {
                self.hits
                    .iter()
                    .find(|&&t| now.duration_since(t) < MINUTE_WINDOW)
                    .map(|&t| MINUTE_WINDOW.saturating_sub(now.duration_since(t)))
            })
            .flatten();
        let hour_wait = hour_over
            .then(|| {
                self.hits
                    .front()
                    .map(|&t| HOUR_WINDOW.saturating_sub(now.duration_since(t)))
            })
            .flatten();

        match (minute_wait, hour_wait) {
            (Some(m), Some(h)) => Some(m.max(h)),
            (Some(m), None) => Some(m),
            (None, Some(h)) => Some(h),
            (None, None) => None,
        }
    }
}

/// Sliding counters per chat identifier, enforcing the per-minute and
/// per-hour ceilings.
///
/// Every call records the attempt and then checks both windows; the attempt
/// stays charged even when the upstream call later fails. Chats are fully
/// independent: each window sits behind its own lock, and the map lock is
/// held only for the lookup.
pub struct RateLimiter {
    limits: RateLimits,
    windows: Mutex<HashMap<ChatId, Arc<Mutex<RateWindow>>>>,
}

impl RateLimiter {
    pub fn new(limits: RateLimits) -> Self {
        Self {
            limits,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record one attempt for `chat` and report whether it is admitted,
    /// with a wait hint when it is not.
    pub fn allow(&self, chat: ChatId) -> (bool, Option<Duration>) {
        self.allow_at(chat, Instant::now())
    }

    pub fn allow_at(&self, chat: ChatId, now: Instant) -> (bool, Option<Duration>) {
        let window = {
            let mut map = self
                .windows
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            map.entry(chat).or_default().clone()
        };
        let mut window = window.lock().unwrap_or_else(PoisonError::into_inner);

        window.prune(now);
        window.hits.push_back(now);

        let minute_over = window.minute_count(now) > self.limits.per_minute;
        let hour_over = window.hits.len() > self.limits.per_hour;
        if !minute_over && !hour_over {
            return (true, None);
        }

        let hint = window.retry_hint(now, minute_over, hour_over);
        (false, hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(per_minute: usize, per_hour: usize) -> RateLimiter {
        RateLimiter::new(RateLimits {
            per_minute,
            per_hour,
        })
    }

    #[test]
    fn admits_until_minute_ceiling_then_rejects() {
        let rl = limiter(3, 100);
        let chat = ChatId(1);
        let start = Instant::now();

        for _ in 0..3 {
            assert!(rl.allow_at(chat, start).0);
        }
        let (ok, retry) = rl.allow_at(chat, start);
        assert!(!ok);
        assert!(retry.is_some());
        assert!(retry.unwrap() <= MINUTE_WINDOW);
    }

    #[test]
    fn minute_window_rolls_and_clears() {
        let rl = limiter(2, 100);
        let chat = ChatId(7);
        let start = Instant::now();

        assert!(rl.allow_at(chat, start).0);
        assert!(rl.allow_at(chat, start).0);
        assert!(!rl.allow_at(chat, start).0);

        // All three recorded attempts expire out of the minute window.
        assert!(rl.allow_at(chat, start + Duration::from_secs(61)).0);
    }

    #[test]
    fn hour_ceiling_applies_across_minutes() {
        let rl = limiter(100, 3);
        let chat = ChatId(2);
        let start = Instant::now();

        // Spaced out so the minute window never binds.
        for i in 0..3u64 {
            assert!(rl.allow_at(chat, start + Duration::from_secs(i * 120)).0);
        }
        let (ok, retry) = rl.allow_at(chat, start + Duration::from_secs(360));
        assert!(!ok);
        assert!(retry.is_some());

        // The two oldest entries (including the rejected attempt) fall out
        // of the hour window.
        assert!(rl.allow_at(chat, start + Duration::from_secs(3722)).0);
    }

    #[test]
    fn chats_do_not_interfere() {
        let rl = limiter(1, 100);
        let start = Instant::now();

        assert!(rl.allow_at(ChatId(1), start).0);
        assert!(!rl.allow_at(ChatId(1), start).0);

        // A different chat still has its full allowance.
        assert!(rl.allow_at(ChatId(2), start).0);
    }

    #[test]
    fn rejected_attempts_still_occupy_the_window() {
        let rl = limiter(1, 100);
        let chat = ChatId(3);
        let start = Instant::now();

        assert!(rl.allow_at(chat, start).0);
        assert!(!rl.allow_at(chat, start + Duration::from_secs(30)).0);

        // The rejected attempt at +30s is still inside the window at +70s.
        assert!(!rl.allow_at(chat, start + Duration::from_secs(70)).0);
        // Quiet period clears everything.
        assert!(rl.allow_at(chat, start + Duration::from_secs(200)).0);
    }
}
