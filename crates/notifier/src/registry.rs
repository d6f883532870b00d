use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use signal_core::SignalError;

#[derive(Debug, Clone, Serialize)]
pub struct Subscriber {
    pub phone: String,
    pub active: bool,
    pub added_at: DateTime<Utc>,
}

/// Outbound subscriber list. Numbers are never deleted, only deactivated,
/// so a re-subscribe keeps its original record.
pub struct SubscriberRegistry {
    inner: Mutex<Vec<Subscriber>>,
}

impl SubscriberRegistry {
    pub fn new(seed: Vec<String>) -> Self {
        let now = Utc::now();
        let inner = seed
            .into_iter()
            .map(|phone| Subscriber {
                phone,
                active: true,
                added_at: now,
            })
            .collect();
        Self {
            inner: Mutex::new(inner),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a number. Re-adding an inactive number reactivates it;
    /// an already-active duplicate is rejected.
    pub fn add(&self, phone: &str) -> Result<(), SignalError> {
        let phone = phone.trim();
        if phone.is_empty() || !phone.chars().all(|c| c.is_ascii_digit() || c == '+') {
            return Err(SignalError::validation("invalid phone number"));
        }
        let mut subscribers = self.lock();
        if let Some(existing) = subscribers.iter_mut().find(|s| s.phone == phone) {
            if existing.active {
                return Err(SignalError::validation(format!(
                    "{phone} is already subscribed"
                )));
            }
            existing.active = true;
            return Ok(());
        }
        subscribers.push(Subscriber {
            phone: phone.to_string(),
            active: true,
            added_at: Utc::now(),
        });
        Ok(())
    }

    pub fn deactivate(&self, phone: &str) -> Result<(), SignalError> {
        let mut subscribers = self.lock();
        let subscriber = subscribers
            .iter_mut()
            .find(|s| s.phone == phone)
            .ok_or_else(|| SignalError::not_found(format!("subscriber {phone}")))?;
        subscriber.active = false;
        Ok(())
    }

    pub fn active(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|s| s.active)
            .map(|s| s.phone.clone())
            .collect()
    }

    pub fn all(&self) -> Vec<Subscriber> {
        self.lock().clone()
    }
}
