//! Fire-and-forget messages to factions about battle outcomes.
//!
//! The battle composes a [`Notification`] from a localization key plus
//! arguments and hands it to whatever [`NotificationSink`] the caller lent
//! it. A sink cannot fail the turn.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::factions::FactionId;

/// Kind of event being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationCategory {
    /// The faction's side won a battle.
    Victory,
    /// The faction's side lost a battle.
    Defeat,
    /// A battle ended with both sides gone.
    Draw,
    /// A fleet of the faction joined an ongoing battle.
    Allegiance,
}

/// A templated message for one faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Event kind.
    pub category: NotificationCategory,
    /// Recipient.
    pub faction: FactionId,
    /// Localization key of the message template.
    pub key: String,
    /// Template arguments.
    pub args: Vec<String>,
}

impl Notification {
    /// Create a notification without arguments.
    #[must_use]
    pub fn new(category: NotificationCategory, faction: FactionId, key: impl Into<String>) -> Self {
        Self {
            category,
            faction,
            key: key.into(),
            args: Vec::new(),
        }
    }

    /// Builder method to append a template argument.
    #[must_use]
    pub fn with_arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }
}

/// Receiver of battle notifications.
pub trait NotificationSink {
    /// Deliver one notification.
    fn notify(&mut self, notification: Notification);
}

/// Sink that keeps every notification in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifications {
    /// Notifications in delivery order.
    pub notifications: Vec<Notification>,
}

impl RecordingNotifications {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications of one category.
    pub fn of_category(&self, category: NotificationCategory) -> impl Iterator<Item = &Notification> {
        self.notifications
            .iter()
            .filter(move |n| n.category == category)
    }

    /// Notifications addressed to one faction.
    pub fn for_faction(&self, faction: FactionId) -> impl Iterator<Item = &Notification> {
        self.notifications
            .iter()
            .filter(move |n| n.faction == faction)
    }

    /// Number of notifications received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    /// Check if nothing was received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}

impl NotificationSink for RecordingNotifications {
    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}

/// Sink that writes every notification to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifications;

impl NotificationSink for LogNotifications {
    fn notify(&mut self, notification: Notification) {
        info!(
            category = ?notification.category,
            faction = %notification.faction,
            key = %notification.key,
            args = ?notification.args,
            "Notification"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_filters() {
        let mut sink = RecordingNotifications::new();
        let a = FactionId::new(1);
        let b = FactionId::new(2);
        sink.notify(Notification::new(NotificationCategory::Victory, a, "battle.victory").with_arg("Sol"));
        sink.notify(Notification::new(NotificationCategory::Defeat, b, "battle.defeat"));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.of_category(NotificationCategory::Victory).count(), 1);
        let for_a: Vec<_> = sink.for_faction(a).collect();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].args, vec!["Sol".to_string()]);
    }
}
