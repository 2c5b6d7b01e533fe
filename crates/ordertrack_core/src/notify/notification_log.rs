//! Bounded in-process notification log.
//!
//! # Responsibility
//! - Receive lifecycle events from the order service.
//! - Serve most-recent reads and read-flag updates to polling consumers.
//!
//! # Invariants
//! - Entries are kept newest first.
//! - Insertion and trim-to-capacity happen under one lock.
//! - The `read` flag is the only field mutated after publication.

use crate::config::DEFAULT_NOTIFICATION_CAPACITY;
use crate::model::notification::{Notification, NotificationId};
use log::debug;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};

pub type NotificationResult<T> = Result<T, NotificationError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    NotFound(NotificationId),
    LockPoisoned,
}

impl Display for NotificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "notification not found: {id}"),
            Self::LockPoisoned => write!(f, "notification log lock poisoned"),
        }
    }
}

impl Error for NotificationError {}

/// Destination for lifecycle events.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, notification: Notification) -> NotificationResult<()>;
}

/// Newest-first ring of notifications capped at `capacity`.
#[derive(Debug)]
pub struct NotificationLog {
    capacity: usize,
    entries: Mutex<VecDeque<Notification>>,
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_NOTIFICATION_CAPACITY)
    }
}

impl NotificationLog {
    /// Creates a log; a zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns up to `limit` notifications, newest first.
    pub fn recent(&self, limit: usize) -> NotificationResult<Vec<Notification>> {
        Ok(self.entries()?.iter().take(limit).cloned().collect())
    }

    pub fn all(&self) -> NotificationResult<Vec<Notification>> {
        Ok(self.entries()?.iter().cloned().collect())
    }

    pub fn len(&self) -> NotificationResult<usize> {
        Ok(self.entries()?.len())
    }

    pub fn is_empty(&self) -> NotificationResult<bool> {
        Ok(self.entries()?.is_empty())
    }

    pub fn unread_count(&self) -> NotificationResult<usize> {
        Ok(self.entries()?.iter().filter(|entry| !entry.read).count())
    }

    /// Marks one notification as read and returns its updated copy.
    pub fn mark_read(&self, id: NotificationId) -> NotificationResult<Notification> {
        let mut entries = self.entries()?;
        let entry = entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(NotificationError::NotFound(id))?;
        entry.read = true;
        Ok(entry.clone())
    }

    /// Marks every notification as read; returns how many changed.
    pub fn mark_all_read(&self) -> NotificationResult<usize> {
        let mut entries = self.entries()?;
        let mut changed = 0;
        for entry in entries.iter_mut().filter(|entry| !entry.read) {
            entry.read = true;
            changed += 1;
        }
        Ok(changed)
    }

    fn entries(&self) -> NotificationResult<MutexGuard<'_, VecDeque<Notification>>> {
        self.entries
            .lock()
            .map_err(|_| NotificationError::LockPoisoned)
    }
}

impl NotificationSink for NotificationLog {
    fn publish(&self, notification: Notification) -> NotificationResult<()> {
        let mut entries = self.entries()?;
        entries.push_front(notification);
        entries.truncate(self.capacity);
        debug!(
            "event=notification_publish module=notify status=ok size={}",
            entries.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{NotificationError, NotificationLog, NotificationSink};
    use crate::model::notification::Notification;
    use crate::model::order::OrderId;
    use chrono::Utc;
    use uuid::Uuid;

    fn created(id: usize) -> Notification {
        Notification::order_created(OrderId::new(format!("ORD-{id}")), "Someone", Utc::now())
    }

    #[test]
    fn ring_is_trimmed_to_capacity_newest_first() {
        let log = NotificationLog::with_capacity(3);
        for id in 1..=5 {
            log.publish(created(id)).unwrap();
        }
        let ids: Vec<String> = log
            .all()
            .unwrap()
            .iter()
            .map(|entry| entry.order_id.to_string())
            .collect();
        assert_eq!(ids, vec!["ORD-5", "ORD-4", "ORD-3"]);
    }

    #[test]
    fn mark_read_flips_only_the_target() {
        let log = NotificationLog::default();
        log.publish(created(1)).unwrap();
        log.publish(created(2)).unwrap();
        let target = log.recent(1).unwrap()[0].id;

        let updated = log.mark_read(target).unwrap();
        assert!(updated.read);
        assert_eq!(log.unread_count().unwrap(), 1);

        let missing = Uuid::new_v4();
        assert_eq!(
            log.mark_read(missing),
            Err(NotificationError::NotFound(missing))
        );
        assert_eq!(log.mark_all_read().unwrap(), 1);
        assert_eq!(log.unread_count().unwrap(), 0);
    }
}
