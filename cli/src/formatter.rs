//! Terminal rendering for the notification feed
//!
//! Badge, live indicator, relative timestamps and per-kind icons. Colours
//! come from `colored` and are skipped entirely when disabled.

use chrono::{DateTime, Utc};
use colored::{Color, Colorize};
use spendly_link::{ConnectionState, FeedSnapshot, Notification, NotificationKind};

/// Presentation attributes for one notification kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindStyle {
    pub icon: &'static str,
    pub label: &'static str,
    pub color: Color,
}

/// Icon/colour lookup. Unknown kinds use the `General` entry.
pub fn kind_style(kind: &NotificationKind) -> KindStyle {
    match kind.category() {
        NotificationKind::GoalAchieved => KindStyle {
            icon: "🎯",
            label: "Goal achieved",
            color: Color::Green,
        },
        NotificationKind::BudgetExceeded => KindStyle {
            icon: "⚠",
            label: "Budget exceeded",
            color: Color::Red,
        },
        NotificationKind::ReportReady => KindStyle {
            icon: "📄",
            label: "Report ready",
            color: Color::Blue,
        },
        NotificationKind::General | NotificationKind::Other(_) => KindStyle {
            icon: "🔔",
            label: "Notification",
            color: Color::Cyan,
        },
    }
}

/// Relative age of a notification: `Just now`, `Nm ago`, `Nh ago`, then the
/// calendar date.
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        at.format("%Y-%m-%d").to_string()
    }
}

/// Formats feed snapshots for display
pub struct NotificationFormatter {
    color: bool,
    max_badge: usize,
}

impl NotificationFormatter {
    pub fn new(color: bool, max_badge: usize) -> Self {
        Self {
            color,
            max_badge: max_badge.max(1),
        }
    }

    /// Unread badge text, empty when there is nothing unread.
    pub fn badge(&self, unread: usize) -> String {
        if unread == 0 {
            String::new()
        } else if unread > self.max_badge {
            format!("{}+", self.max_badge)
        } else {
            unread.to_string()
        }
    }

    pub fn status_label(&self, state: ConnectionState) -> String {
        let label = if state == ConnectionState::Connected {
            "● Live"
        } else {
            "○ Offline"
        };
        if !self.color {
            return label.to_string();
        }
        match state {
            ConnectionState::Connected => label.green().to_string(),
            ConnectionState::Connecting => label.yellow().to_string(),
            ConnectionState::Disconnected => label.dimmed().to_string(),
        }
    }

    /// One-line summary: live indicator plus unread badge.
    pub fn format_header(&self, snapshot: &FeedSnapshot) -> String {
        let badge = self.badge(snapshot.unread_count);
        let bell = if badge.is_empty() {
            "🔔".to_string()
        } else if self.color {
            format!("🔔 {}", format!("[{}]", badge).red().bold())
        } else {
            format!("🔔 [{}]", badge)
        };
        format!("{}  {}", self.status_label(snapshot.connection_state), bell)
    }

    pub fn format_notification(&self, n: &Notification, now: DateTime<Utc>) -> String {
        let style = kind_style(&n.kind);
        let marker = if n.read { " " } else { "•" };
        let age = relative_time(n.received_at, now);

        if !self.color {
            return format!(
                "{} #{:<4} {} {}: {} ({})",
                marker,
                n.id.as_u64(),
                style.icon,
                n.title,
                n.message,
                age
            );
        }

        let title = if n.read {
            n.title.normal()
        } else {
            n.title.bold()
        };
        format!(
            "{} #{:<4} {} {}: {} {}",
            marker.color(style.color),
            n.id.as_u64(),
            style.icon,
            title.color(style.color),
            n.message,
            format!("({})", age).dimmed()
        )
    }

    pub fn format_list(&self, snapshot: &FeedSnapshot, now: DateTime<Utc>) -> String {
        let mut out = self.format_header(snapshot);
        out.push('\n');
        if snapshot.notifications.is_empty() {
            let empty = "No notifications";
            out.push_str(&if self.color { empty.dimmed().to_string() } else { empty.to_string() });
            return out;
        }
        let lines: Vec<String> =
            snapshot.notifications.iter().map(|n| self.format_notification(n, now)).collect();
        out.push_str(&lines.join("\n"));
        out
    }

    /// Transient popup line for the newest arrival.
    pub fn format_toast(&self, n: &Notification) -> String {
        let style = kind_style(&n.kind);
        let head = format!("{} {}", style.icon, style.label);
        if self.color {
            format!("{}  {}: {}", head.color(style.color).bold(), n.title.bold(), n.message)
        } else {
            format!("{}  {}: {}", head, n.title, n.message)
        }
    }
}
