use std::{
    sync::Mutex,
    collections::HashMap,
    time::{Instant, Duration},
};


const MAX_MAP_SIZE: usize = 4096;


/// Cooldown bookkeeping behind the rate limiter.
///
/// The default store keeps everything in process memory, which is only
/// sound for a single-instance deployment; a multi-instance deployment can
/// swap in a shared store without touching any call site.
pub trait CooldownStore: Send + Sync {
    /// Records `key` at `now` unless it was already recorded within the
    /// cooldown window. Returns the remaining cooldown on rejection.
    fn try_acquire(&self, key: &str, now: Instant) -> Option<Duration>;
}


pub struct MemoryCooldownStore {
    window: Duration,
    entries: Mutex<HashMap<String, Instant>>,
}

impl MemoryCooldownStore {
    pub fn new(window: Duration) -> Self {
        MemoryCooldownStore {
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl CooldownStore for MemoryCooldownStore {
    fn try_acquire(&self, key: &str, now: Instant) -> Option<Duration> {
        let mut entries = self.entries.lock().unwrap();

        if let Some(&last) = entries.get(key) {
            let elapsed = now.duration_since(last);
            if elapsed < self.window {
                return Some(self.window - elapsed);
            }
        }

        entries.insert(key.to_owned(), now);

        // Drop expired entries once the map grows past a fixed size.
        if entries.len() > MAX_MAP_SIZE {
            let window = self.window;
            entries.retain(|_, &mut last| now.duration_since(last) < window);
        }

        None
    }
}


/// Managed-state handle given to the route handlers.
pub struct RateLimiter {
    store: Box<dyn CooldownStore>,
}

impl RateLimiter {
    pub fn new(store: Box<dyn CooldownStore>) -> Self {
        RateLimiter { store }
    }

    /// Returns the remaining cooldown when `key` has to wait.
    pub fn try_acquire(&self, key: &str) -> Option<Duration> {
        self.store.try_acquire(key, Instant::now())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(5);

    #[test]
    fn first_request_passes() {
        let store = MemoryCooldownStore::new(WINDOW);
        assert!(store.try_acquire("1.2.3.4", Instant::now()).is_none());
    }

    #[test]
    fn request_within_window_is_rejected() {
        let store = MemoryCooldownStore::new(WINDOW);
        let t0 = Instant::now();

        assert!(store.try_acquire("1.2.3.4", t0).is_none());

        let remaining = store.try_acquire("1.2.3.4", t0 + Duration::from_secs(2))
            .expect("second request must cool down");
        assert_eq!(remaining, Duration::from_secs(3));
    }

    #[test]
    fn request_after_window_passes_and_rearms() {
        let store = MemoryCooldownStore::new(WINDOW);
        let t0 = Instant::now();

        assert!(store.try_acquire("1.2.3.4", t0).is_none());
        assert!(store.try_acquire("1.2.3.4", t0 + WINDOW).is_none());

        // The accepted request re-arms the cooldown.
        assert!(store.try_acquire("1.2.3.4", t0 + WINDOW + Duration::from_secs(1)).is_some());
    }

    #[test]
    fn keys_do_not_interfere() {
        let store = MemoryCooldownStore::new(WINDOW);
        let t0 = Instant::now();

        assert!(store.try_acquire("1.2.3.4", t0).is_none());
        assert!(store.try_acquire("5.6.7.8", t0).is_none());
    }
}
