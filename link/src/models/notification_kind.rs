use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a pushed notification.
///
/// The server defines the set, so the client stays lenient: any literal it
/// does not recognise is kept verbatim in [`NotificationKind::Other`] rather
/// than rejected. Presentation code should key its icon/colour lookups on
/// [`NotificationKind::category`], which folds unknown kinds into
/// [`NotificationKind::General`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationKind {
    /// A savings goal reached its target (`GOAL_ACHIEVED`)
    GoalAchieved,
    /// Spending went over a budget limit (`BUDGET_EXCEEDED`)
    BudgetExceeded,
    /// An exported report finished generating (`REPORT_READY`)
    ReportReady,
    /// Anything else worth telling the user (`GENERAL`)
    #[default]
    General,
    /// A type this client does not know about yet.
    Other(String),
}

impl NotificationKind {
    /// Parse a wire literal. Matching is exact, like the server emits it.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "GOAL_ACHIEVED" => NotificationKind::GoalAchieved,
            "BUDGET_EXCEEDED" => NotificationKind::BudgetExceeded,
            "REPORT_READY" => NotificationKind::ReportReady,
            "GENERAL" => NotificationKind::General,
            other => NotificationKind::Other(other.to_string()),
        }
    }

    /// The wire literal for this kind.
    pub fn as_str(&self) -> &str {
        match self {
            NotificationKind::GoalAchieved => "GOAL_ACHIEVED",
            NotificationKind::BudgetExceeded => "BUDGET_EXCEEDED",
            NotificationKind::ReportReady => "REPORT_READY",
            NotificationKind::General => "GENERAL",
            NotificationKind::Other(raw) => raw,
        }
    }

    /// Whether this is one of the four kinds the dashboard knows.
    pub fn is_known(&self) -> bool {
        !matches!(self, NotificationKind::Other(_))
    }

    /// Display category: the kind itself when known, `General` otherwise.
    pub fn category(&self) -> NotificationKind {
        match self {
            NotificationKind::Other(_) => NotificationKind::General,
            known => known.clone(),
        }
    }
}

impl From<String> for NotificationKind {
    fn from(value: String) -> Self {
        NotificationKind::from_wire(&value)
    }
}

impl From<NotificationKind> for String {
    fn from(kind: NotificationKind) -> Self {
        match kind {
            NotificationKind::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
