//! Enrichment of time entries with data from related records.
//!
//! Lookups are best-effort: a reference that is not found produces an empty
//! derived field (or no back-reference), never an error.

use crate::index::{index_by_id, join_by_id};
use crate::records::{Account, Resource, Role, Ticket, TimeEntry};

/// Lookup counts from one enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    /// Entries whose key was found.
    pub matched: usize,
    /// Entries whose key was not found.
    pub missing: usize,
}

impl JoinStats {
    fn from_hits(total: usize, hits: usize) -> Self {
        Self {
            matched: hits,
            missing: total - hits,
        }
    }
}

/// Sets `resource_name` and `role_name` on every entry.
///
/// Resource names are first and last name joined by one space; role names
/// are copied verbatim. Returns the resource and role lookup counts.
pub fn enrich_time_entries(
    entries: &mut [TimeEntry],
    resources: &[Resource],
    roles: &[Role],
) -> (JoinStats, JoinStats) {
    let resource_index = index_by_id(resources);
    let role_index = index_by_id(roles);

    let resource_hits = join_by_id(entries, &resource_index, |e| e.resource_id, |entry, resource| {
        entry.resource_name = resource.map(Resource::display_name).unwrap_or_default();
    });
    let role_hits = join_by_id(entries, &role_index, |e| e.role_id, |entry, role| {
        entry.role_name = role.map(|r| r.name.clone()).unwrap_or_default();
    });

    let stats = (
        JoinStats::from_hits(entries.len(), resource_hits),
        JoinStats::from_hits(entries.len(), role_hits),
    );
    tracing::debug!(
        entries = entries.len(),
        resources_missing = stats.0.missing,
        roles_missing = stats.1.missing,
        "enriched time entries"
    );
    stats
}

/// Attaches the referenced ticket to each entry by `ticket_id`.
pub fn attach_tickets(entries: &mut [TimeEntry], tickets: &[Ticket]) -> JoinStats {
    let index = index_by_id(tickets);
    let hits = join_by_id(entries, &index, |e| e.ticket_id, |entry, ticket| {
        entry.ticket = ticket.cloned().map(Box::new);
    });
    JoinStats::from_hits(entries.len(), hits)
}

/// Attaches the account of each entry's attached ticket.
///
/// Entries without an attached ticket get no account.
pub fn attach_accounts(entries: &mut [TimeEntry], accounts: &[Account]) -> JoinStats {
    let index = index_by_id(accounts);
    join_by_id(
        entries,
        &index,
        |e| e.ticket.as_ref().map_or(0, |t| t.account_id),
        |entry, account| {
            entry.account = entry
                .ticket
                .as_ref()
                .and(account)
                .cloned()
                .map(Box::new);
        },
    );
    let hits = entries.iter().filter(|e| e.account.is_some()).count();
    JoinStats::from_hits(entries.len(), hits)
}
