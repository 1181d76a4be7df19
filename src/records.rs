//! Record types and their declared wire shapes.
//!
//! Each record kind declares a static table mapping wire element names to
//! struct fields. The mapper is driven entirely by these tables: elements
//! missing from a table are ignored, and element names are matched
//! case-sensitively.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::kind::RecordKind;

/// Wire format of date/time elements (no offset).
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parses `raw` and stores it into a record field.
pub type FieldSetter<R> = fn(&mut R, &str) -> Result<(), String>;

/// One entry of a record shape: wire element name and how to set it.
pub struct FieldSpec<R: 'static> {
    /// Wire element name, matched case-sensitively.
    pub element: &'static str,
    /// Parses the element text into the field.
    pub set: FieldSetter<R>,
}

impl<R: 'static> std::fmt::Debug for FieldSpec<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec").field("element", &self.element).finish()
    }
}

/// A record kind decodable from an `<Entity>` node.
pub trait Record: Default + Clone + 'static {
    /// Entity kind queried for this record type.
    const KIND: RecordKind;

    /// Declared element-to-field table.
    const SHAPE: &'static [FieldSpec<Self>];

    /// Server-assigned numeric identifier.
    fn id(&self) -> i64;

    /// Looks up the shape entry for a wire element.
    #[must_use]
    fn field_spec(element: &str) -> Option<&'static FieldSpec<Self>> {
        Self::SHAPE.iter().find(|spec| spec.element == element)
    }
}

/// Declares a record shape as a static table of named setters.
macro_rules! shape {
    ($record:ty { $($element:literal => $field:ident : $parse:ident),* $(,)? }) => {
        &[$(
            FieldSpec {
                element: $element,
                set: {
                    fn set(record: &mut $record, raw: &str) -> Result<(), String> {
                        record.$field = $parse(raw)?;
                        Ok(())
                    }
                    set
                },
            }
        ),*]
    };
}

fn number<T>(raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse::<T>().map_err(|e| e.to_string())
}

#[allow(clippy::unnecessary_wraps)]
fn text(raw: &str) -> Result<String, String> {
    Ok(raw.to_string())
}

fn timestamp(raw: &str) -> Result<Option<NaiveDateTime>, String> {
    NaiveDateTime::parse_from_str(raw.trim(), DATE_TIME_FORMAT)
        .map(Some)
        .map_err(|e| e.to_string())
}

/// A customer account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Account {
    /// Server-assigned identifier.
    pub id: i64,
    /// Account display name.
    pub account_name: String,
}

impl Record for Account {
    const KIND: RecordKind = RecordKind::Account;
    const SHAPE: &'static [FieldSpec<Self>] = shape!(Account {
        "id" => id: number,
        "AccountName" => account_name: text,
    });

    fn id(&self) -> i64 {
        self.id
    }
}

/// A staff member who can log time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resource {
    /// Server-assigned identifier.
    pub id: i64,
    /// `ResourceID` as reported by the server.
    pub resource_id: i64,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl Resource {
    /// First and last name joined by a single space.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Record for Resource {
    const KIND: RecordKind = RecordKind::Resource;
    const SHAPE: &'static [FieldSpec<Self>] = shape!(Resource {
        "id" => id: number,
        "ResourceID" => resource_id: number,
        "FirstName" => first_name: text,
        "LastName" => last_name: text,
    });

    fn id(&self) -> i64 {
        self.id
    }
}

/// A billing role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Role {
    /// Server-assigned identifier.
    pub id: i64,
    /// `RoleID` as reported by the server.
    pub role_id: i64,
    /// Role name.
    pub name: String,
}

impl Record for Role {
    const KIND: RecordKind = RecordKind::Role;
    const SHAPE: &'static [FieldSpec<Self>] = shape!(Role {
        "id" => id: number,
        "RoleID" => role_id: number,
        "Name" => name: text,
    });

    fn id(&self) -> i64 {
        self.id
    }
}

/// A service ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ticket {
    /// Server-assigned identifier.
    pub id: i64,
    /// Owning account.
    pub account_id: i64,
    /// Resource the ticket is assigned to.
    pub assigned_resource_id: i64,
    /// Human-readable ticket number.
    pub ticket_number: String,
    /// Short summary.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Numeric status code.
    pub status: i32,
}

impl Record for Ticket {
    const KIND: RecordKind = RecordKind::Ticket;
    const SHAPE: &'static [FieldSpec<Self>] = shape!(Ticket {
        "id" => id: number,
        "AccountID" => account_id: number,
        "AssignedResourceID" => assigned_resource_id: number,
        "TicketNumber" => ticket_number: text,
        "Title" => title: text,
        "Description" => description: text,
        "Status" => status: number,
    });

    fn id(&self) -> i64 {
        self.id
    }
}

/// Time logged by a resource, usually against a ticket.
///
/// `resource_name` and `role_name` are not on the wire; they are filled in
/// by enrichment. `ticket` and `account` are only set by an explicit join.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeEntry {
    /// Server-assigned identifier.
    pub id: i64,
    /// Hours logged.
    pub hours_worked: f64,
    /// Resource who logged the time.
    pub resource_id: i64,
    /// Role the time was billed under.
    pub role_id: i64,
    /// Ticket the time was logged against, or 0.
    pub ticket_id: i64,
    /// Start of the work; `None` if absent or unparseable.
    pub start_date_time: Option<NaiveDateTime>,

    /// Resource first and last name, or empty if not found.
    pub resource_name: String,
    /// Role name, or empty if not found.
    pub role_name: String,

    /// Referenced ticket, once attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Box<Ticket>>,
    /// Account of the attached ticket, once attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Box<Account>>,
}

impl Record for TimeEntry {
    const KIND: RecordKind = RecordKind::TimeEntry;
    const SHAPE: &'static [FieldSpec<Self>] = shape!(TimeEntry {
        "id" => id: number,
        "HoursWorked" => hours_worked: number,
        "ResourceID" => resource_id: number,
        "RoleID" => role_id: number,
        "TicketID" => ticket_id: number,
        "StartDateTime" => start_date_time: timestamp,
    });

    fn id(&self) -> i64 {
        self.id
    }
}
