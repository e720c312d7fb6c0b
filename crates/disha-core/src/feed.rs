//! Notification feed model.
//!
//! The feed mirrors the portal's broadcast notifications into local
//! view state: a rotating banner with a cursor and a dismissal flag.
//! The poller replaces its contents on each successful fetch; rotation
//! and dismissal are purely local.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One broadcast notification as shown in the banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Display name of the admin who broadcast the message.
    pub author: String,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Rotating, dismissible view over the latest notifications.
///
/// The cursor is always interpreted modulo the item count, so stale
/// cursors from a previous list can never index out of bounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationFeed {
    items: Vec<Notification>,
    cursor: usize,
    visible: bool,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The notification the banner currently shows, if any.
    pub fn current(&self) -> Option<&Notification> {
        if self.items.is_empty() {
            return None;
        }
        self.items.get(self.cursor % self.items.len())
    }

    /// Installs a freshly fetched list.
    ///
    /// An empty list is a no-op so a flaky fetch never blanks a
    /// populated banner. A non-empty list makes the feed visible
    /// again; the cursor survives (clamped modulo the new length) when
    /// the previous list was also non-empty, and starts at zero when
    /// the feed was empty before.
    pub fn replace(&mut self, items: Vec<Notification>) {
        if items.is_empty() {
            return;
        }
        if self.items.is_empty() {
            self.cursor = 0;
        } else {
            self.cursor %= items.len();
        }
        self.items = items;
        self.visible = true;
    }

    /// Rotates the banner to the next notification, wrapping around.
    /// No-op when there is at most one item.
    pub fn advance(&mut self) {
        if self.items.len() <= 1 {
            return;
        }
        self.cursor = (self.cursor + 1) % self.items.len();
    }

    /// Hides the banner until the next successful non-empty fetch.
    pub fn dismiss(&mut self) {
        self.visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(message: &str) -> Notification {
        Notification {
            author: "TNP Admin".to_string(),
            message: message.to_string(),
            created_at: None,
        }
    }

    #[test]
    fn advance_wraps_around_at_length_two() {
        let mut feed = NotificationFeed::new();
        feed.replace(vec![note("a"), note("b")]);
        assert_eq!(feed.cursor(), 0);

        feed.advance();
        assert_eq!(feed.cursor(), 1);
        feed.advance();
        assert_eq!(feed.cursor(), 0);
    }

    #[test]
    fn advance_is_a_noop_on_short_feeds() {
        let mut feed = NotificationFeed::new();
        feed.advance();
        assert_eq!(feed.cursor(), 0);

        feed.replace(vec![note("only")]);
        feed.advance();
        assert_eq!(feed.cursor(), 0);
    }

    #[test]
    fn empty_replace_never_clears_a_populated_feed() {
        let mut feed = NotificationFeed::new();
        feed.replace(vec![note("a"), note("b")]);

        feed.replace(Vec::new());
        assert_eq!(feed.len(), 2);
        assert!(feed.is_visible());
    }

    #[test]
    fn replace_restores_visibility_after_dismissal() {
        let mut feed = NotificationFeed::new();
        feed.replace(vec![note("a")]);
        feed.dismiss();
        assert!(!feed.is_visible());

        feed.replace(vec![note("b")]);
        assert!(feed.is_visible());
        assert_eq!(feed.current().unwrap().message, "b");
    }

    #[test]
    fn dismissal_alone_keeps_items() {
        let mut feed = NotificationFeed::new();
        feed.replace(vec![note("a")]);
        feed.dismiss();
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn cursor_survives_refresh_of_a_nonempty_feed() {
        let mut feed = NotificationFeed::new();
        feed.replace(vec![note("a"), note("b"), note("c")]);
        feed.advance();
        feed.advance();
        assert_eq!(feed.cursor(), 2);

        // Refresh with a shorter list: cursor is clamped by modulo.
        feed.replace(vec![note("x"), note("y")]);
        assert_eq!(feed.cursor(), 0);

        feed.advance();
        feed.replace(vec![note("p"), note("q")]);
        assert_eq!(feed.cursor(), 1);
        assert_eq!(feed.current().unwrap().message, "q");
    }
}
