use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Per-key mutual exclusion for read-modify-write cycles.
///
/// Callers holding different keys never wait on each other. Entries are
/// dropped from the table once the last holder of a key releases it.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lock<T>(&self, key: &str, critical: impl FnOnce() -> T) -> T {
        let slot = {
            let mut slots = lock_ignoring_poison(&self.slots);
            Arc::clone(
                slots
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        let result = {
            let _guard = lock_ignoring_poison(&slot);
            critical()
        };

        let mut slots = lock_ignoring_poison(&self.slots);
        // One reference lives in the table, one here; nobody else is waiting.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(key);
        }
        result
    }

    pub fn active_keys(&self) -> usize {
        lock_ignoring_poison(&self.slots).len()
    }
}

/// The guarded data is `()` or a plain table, so a panic in another holder
/// cannot leave it half-updated.
pub(crate) fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn same_key_sections_never_overlap() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    locks.with_lock("AL-1", || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(5));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().expect("join");
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active_keys(), 0);
    }

    #[test]
    fn returns_the_critical_section_value() {
        let locks = KeyedLocks::new();
        assert_eq!(locks.with_lock("a", || 41 + 1), 42);
    }
}
