//! Record kinds exposed by the remote service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of entity categories the service can be queried for.
///
/// # Examples
///
/// ```
/// use atws::RecordKind;
///
/// assert_eq!(RecordKind::TimeEntry.entity_name(), "TimeEntry");
/// assert_eq!("ticket".parse::<RecordKind>().unwrap(), RecordKind::Ticket);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// Customer accounts.
    Account,
    /// Staff resources.
    Resource,
    /// Billing roles.
    Role,
    /// Service tickets.
    Ticket,
    /// Logged time.
    TimeEntry,
}

impl RecordKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Account,
        Self::Resource,
        Self::Role,
        Self::Ticket,
        Self::TimeEntry,
    ];

    /// Name used in the `<entity>` element of a query document.
    #[must_use]
    pub const fn entity_name(self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Resource => "Resource",
            Self::Role => "Role",
            Self::Ticket => "Ticket",
            Self::TimeEntry => "TimeEntry",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entity_name())
    }
}

/// Unknown record kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown record kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for RecordKind {
    type Err = UnknownKind;

    /// Entity names are matched case-insensitively, as the service does.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.entity_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}
