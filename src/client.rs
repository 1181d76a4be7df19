//! Query client.
//!
//! Every fetch runs the same pipeline: build the query document, wrap it in
//! the envelope, send it, extract `<EntityResults>` and decode it with the
//! record kind's shape. The per-kind methods are thin instantiations of
//! [`Client::fetch`]. Nothing about a response is kept on the client.

use std::collections::BTreeSet;

use crate::enrich::{attach_accounts, attach_tickets, enrich_time_entries};
use crate::envelope;
use crate::error::{AtwsResult, LookupFailure};
use crate::extract::extract;
use crate::mapper::{decode, RecordSet};
use crate::query::{QueryCondition, QueryExpression};
use crate::records::{Account, Record, Resource, Role, Ticket, TimeEntry};
use crate::transport::Transport;

/// Typed client over a [`Transport`].
#[derive(Debug, Clone)]
pub struct Client<T> {
    transport: T,
}

#[cfg(feature = "http")]
impl Client<crate::transport::HttpTransport> {
    /// Creates a client that talks HTTP to the configured endpoint.
    #[must_use]
    pub fn connect(config: crate::config::Config) -> Self {
        Self::new(crate::transport::HttpTransport::new(config))
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client over `transport`.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetches all records of kind `R` matching `condition`.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, non-200 statuses, a response without
    /// `<EntityResults>`, or a structurally invalid result fragment.
    /// Unparseable fields are reported in [`RecordSet::warnings`].
    pub fn fetch<R, C>(&self, condition: &C) -> AtwsResult<RecordSet<R>>
    where
        R: Record,
        C: QueryCondition + ?Sized,
    {
        let doc = condition.to_query_xml(R::KIND);
        let envelope = envelope::wrap_query(&doc);
        tracing::debug!(kind = %R::KIND, query = %doc, "sending query");

        let body = self.transport.send(&envelope)?.into_body()?;
        let fragment = extract(&body)?;
        Ok(decode::<R>(&fragment)?)
    }

    /// Fetches accounts matching `condition`.
    ///
    /// # Errors
    ///
    /// See [`Client::fetch`].
    pub fn fetch_accounts<C>(&self, condition: &C) -> AtwsResult<RecordSet<Account>>
    where
        C: QueryCondition + ?Sized,
    {
        self.fetch(condition)
    }

    /// Fetches one account by id; `None` if the server returns none.
    ///
    /// # Errors
    ///
    /// See [`Client::fetch`].
    pub fn fetch_account_by_id(&self, id: i64) -> AtwsResult<Option<Account>> {
        self.fetch_by_id(id)
    }

    /// Fetches resources matching `condition`.
    ///
    /// # Errors
    ///
    /// See [`Client::fetch`].
    pub fn fetch_resources<C>(&self, condition: &C) -> AtwsResult<RecordSet<Resource>>
    where
        C: QueryCondition + ?Sized,
    {
        self.fetch(condition)
    }

    /// Fetches roles matching `condition`.
    ///
    /// # Errors
    ///
    /// See [`Client::fetch`].
    pub fn fetch_roles<C>(&self, condition: &C) -> AtwsResult<RecordSet<Role>>
    where
        C: QueryCondition + ?Sized,
    {
        self.fetch(condition)
    }

    /// Fetches tickets matching `condition`.
    ///
    /// # Errors
    ///
    /// See [`Client::fetch`].
    pub fn fetch_tickets<C>(&self, condition: &C) -> AtwsResult<RecordSet<Ticket>>
    where
        C: QueryCondition + ?Sized,
    {
        self.fetch(condition)
    }

    /// Fetches one ticket by id; `None` if the server returns none.
    ///
    /// # Errors
    ///
    /// See [`Client::fetch`].
    pub fn fetch_ticket_by_id(&self, id: i64) -> AtwsResult<Option<Ticket>> {
        self.fetch_by_id(id)
    }

    /// Fetches time entries and fills in resource and role names.
    ///
    /// Active resources and all roles are fetched after the entries, one
    /// request each. If either auxiliary fetch fails, the corresponding names
    /// stay empty and the failure is recorded in
    /// [`RecordSet::lookup_failures`]; only a failure of the main fetch is
    /// returned as an error.
    ///
    /// # Errors
    ///
    /// See [`Client::fetch`].
    pub fn fetch_time_entries<C>(&self, condition: &C) -> AtwsResult<RecordSet<TimeEntry>>
    where
        C: QueryCondition + ?Sized,
    {
        let mut set: RecordSet<TimeEntry> = self.fetch(condition)?;
        if set.is_empty() {
            return Ok(set);
        }

        let resources: Vec<Resource> =
            self.fetch_for_enrichment(&QueryExpression::equals("Active", "true"), &mut set);
        let roles: Vec<Role> =
            self.fetch_for_enrichment(&QueryExpression::greater_than("id", "0"), &mut set);

        enrich_time_entries(&mut set.records, &resources, &roles);
        Ok(set)
    }

    /// Attaches each entry's ticket and that ticket's account.
    ///
    /// Every distinct referenced ticket is fetched by id, then every
    /// distinct account of those tickets, sequentially. Identifiers the
    /// server does not return are left unattached.
    ///
    /// # Errors
    ///
    /// Fails if any of the by-id fetches fails. All fetches complete before
    /// anything is attached, so on error `entries` is unchanged.
    pub fn load_ticket_context(&self, entries: &mut [TimeEntry]) -> AtwsResult<()> {
        let ticket_ids: BTreeSet<i64> = entries
            .iter()
            .map(|e| e.ticket_id)
            .filter(|id| *id > 0)
            .collect();
        let mut tickets = Vec::with_capacity(ticket_ids.len());
        for id in ticket_ids {
            tickets.extend(self.fetch_ticket_by_id(id)?);
        }

        let account_ids: BTreeSet<i64> = tickets
            .iter()
            .map(|t| t.account_id)
            .filter(|id| *id > 0)
            .collect();
        let mut accounts = Vec::with_capacity(account_ids.len());
        for id in account_ids {
            accounts.extend(self.fetch_account_by_id(id)?);
        }

        attach_tickets(entries, &tickets);
        attach_accounts(entries, &accounts);
        Ok(())
    }

    fn fetch_by_id<R: Record>(&self, id: i64) -> AtwsResult<Option<R>> {
        let set: RecordSet<R> = self.fetch(&QueryExpression::id_equals(id))?;
        Ok(set.into_records().into_iter().next())
    }

    /// Runs an auxiliary fetch for `target`, merging its field warnings or
    /// recording its failure there.
    fn fetch_for_enrichment<R: Record>(
        &self,
        condition: &QueryExpression,
        target: &mut RecordSet<TimeEntry>,
    ) -> Vec<R> {
        match self.fetch::<R, _>(condition) {
            Ok(set) => {
                target.warnings.extend(set.warnings);
                set.records
            }
            Err(err) => {
                tracing::warn!(
                    kind = %R::KIND,
                    error = %err,
                    "enrichment fetch failed; derived fields left empty"
                );
                target.lookup_failures.push(LookupFailure::new(R::KIND, &err));
                Vec::new()
            }
        }
    }
}
