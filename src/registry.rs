use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

/// Notified once per invoker construction with its retry configuration.
pub trait RetryObserver {
    fn on_init(&self, max_retry: u32, delay: Duration);
}

/// Retry configuration recorded for one invoker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registration {
    /// Position in registration order, starting at zero.
    pub id: usize,
    pub max_retry: u32,
    pub delay: Duration,
}

/// Explicit record of every invoker's retry configuration.
///
/// Clones share the same storage, so one registry can be handed to many
/// invokers while tests keep their own isolated instance.
#[derive(Clone, Debug, Default)]
pub struct RetryRegistry {
    entries: Arc<Mutex<Vec<Registration>>>,
}

impl RetryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all registrations in registration order.
    pub fn registrations(&self) -> Vec<Registration> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, id: usize) -> Option<Registration> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RetryObserver for RetryRegistry {
    fn on_init(&self, max_retry: u32, delay: Duration) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let id = entries.len();
        entries.push(Registration {
            id,
            max_retry,
            delay,
        });

        #[cfg(feature = "tracing")]
        tracing::debug!(
            id,
            max_retry,
            delay_ms = delay.as_millis() as u64,
            "registered retrying request"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Registration, RetryObserver, RetryRegistry};

    #[test]
    fn records_registrations_in_order() {
        let registry = RetryRegistry::new();
        assert!(registry.is_empty());

        registry.on_init(2, Duration::from_secs(5));
        registry.on_init(0, Duration::ZERO);

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get(1),
            Some(Registration {
                id: 1,
                max_retry: 0,
                delay: Duration::ZERO
            })
        );
        assert_eq!(registry.registrations()[0].max_retry, 2);
    }

    #[test]
    fn clones_share_storage_but_new_registries_are_isolated() {
        let registry = RetryRegistry::new();
        let shared = registry.clone();
        let isolated = RetryRegistry::new();

        shared.on_init(1, Duration::from_millis(10));

        assert_eq!(registry.len(), 1);
        assert!(isolated.is_empty());
        assert_eq!(isolated.get(0), None);
    }
}
