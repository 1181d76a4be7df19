use std::cell::RefCell;
use std::collections::HashMap;

use atws::{
    Client, QueryExpression, RawResponse, RecordKind, Transport, TransportError,
};
use chrono::NaiveDate;

/// Answers each request according to the `<entity>` it targets and records
/// every envelope it was sent.
#[derive(Default)]
struct StubTransport {
    responses: HashMap<&'static str, RawResponse>,
    sent: RefCell<Vec<String>>,
}

impl StubTransport {
    fn respond(mut self, kind: RecordKind, entities: &str) -> Self {
        self.responses
            .insert(kind.entity_name(), RawResponse::ok(soap_response(entities)));
        self
    }

    fn respond_raw(mut self, kind: RecordKind, response: RawResponse) -> Self {
        self.responses.insert(kind.entity_name(), response);
        self
    }

    fn sent(&self) -> Vec<String> {
        self.sent.borrow().clone()
    }
}

impl Transport for StubTransport {
    fn send(&self, envelope: &[u8]) -> Result<RawResponse, TransportError> {
        let envelope = String::from_utf8(envelope.to_vec()).expect("envelope is utf-8");
        self.sent.borrow_mut().push(envelope.clone());
        self.responses
            .iter()
            .find(|(entity, _)| envelope.contains(&format!("<entity>{entity}</entity>")))
            .map(|(_, response)| response.clone())
            .ok_or_else(|| TransportError::ConnectionFailed {
                message: "no stubbed response".to_string(),
            })
    }
}

fn soap_response(entities: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <soap:Body>
    <queryResponse xmlns="http://autotask.net/ATWS/v1_5/">
      <queryResult>
        <ReturnCode>1</ReturnCode>
        <EntityResults>{entities}</EntityResults>
        <Errors />
      </queryResult>
    </queryResponse>
  </soap:Body>
</soap:Envelope>"#
    )
}

const TIME_ENTRIES: &str = r#"
<Entity xsi:type="TimeEntry"><id>1</id><HoursWorked>2.25</HoursWorked><ResourceID>7</ResourceID><RoleID>3</RoleID><TicketID>10</TicketID><StartDateTime>2021-03-05T10:15:00</StartDateTime></Entity>
<Entity xsi:type="TimeEntry"><id>2</id><HoursWorked>1</HoursWorked><ResourceID>8</ResourceID><RoleID>4</RoleID><TicketID>11</TicketID><StartDateTime>not-a-date</StartDateTime></Entity>
"#;

const RESOURCES: &str = r#"
<Entity xsi:type="Resource"><id>7</id><FirstName>Grace</FirstName><LastName>Hopper</LastName></Entity>
"#;

const ROLES: &str = r#"
<Entity xsi:type="Role"><id>3</id><Name>Engineer</Name></Entity>
<Entity xsi:type="Role"><id>4</id><Name>Manager</Name></Entity>
"#;

#[test]
fn fetch_ticket_by_id_sends_expected_query() {
    let stub = StubTransport::default().respond(
        RecordKind::Ticket,
        "<Entity><id>42</id><AccountID>100</AccountID><TicketNumber>T2021.0042</TicketNumber><Title>VPN down</Title><Status>1</Status></Entity>",
    );
    let client = Client::new(stub);

    let ticket = client.fetch_ticket_by_id(42).unwrap().expect("ticket returned");
    assert_eq!(ticket.id, 42);
    assert_eq!(ticket.account_id, 100);
    assert_eq!(ticket.ticket_number, "T2021.0042");
    assert_eq!(ticket.status, 1);

    let sent = client.transport().sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].matches("<entity>Ticket</entity>").count(), 1);
    assert_eq!(sent[0].matches("op=\"equals\"").count(), 1);
    assert!(sent[0].contains("<field>id<expression op=\"equals\">42</expression></field>"));
}

#[test]
fn fetch_by_id_with_no_match_is_none() {
    let client = Client::new(StubTransport::default().respond(RecordKind::Account, ""));
    assert_eq!(client.fetch_account_by_id(5).unwrap(), None);
}

#[test]
fn time_entries_are_enriched() {
    let stub = StubTransport::default()
        .respond(RecordKind::TimeEntry, TIME_ENTRIES)
        .respond(RecordKind::Resource, RESOURCES)
        .respond(RecordKind::Role, ROLES);
    let client = Client::new(stub);

    let set = client
        .fetch_time_entries(&QueryExpression::equals("TicketID", "10"))
        .unwrap();

    assert_eq!(set.len(), 2);
    let first = &set.records[0];
    assert_eq!(first.resource_name, "Grace Hopper");
    assert_eq!(first.role_name, "Engineer");
    assert_eq!(
        first.start_date_time,
        Some(
            NaiveDate::from_ymd_opt(2021, 3, 5)
                .unwrap()
                .and_hms_opt(10, 15, 0)
                .unwrap()
        )
    );

    // Resource 8 is not among the active resources.
    let second = &set.records[1];
    assert_eq!(second.resource_name, "");
    assert_eq!(second.role_name, "Manager");
    assert_eq!(second.start_date_time, None);

    assert_eq!(set.warnings.len(), 1);
    assert_eq!(set.warnings[0].element, "StartDateTime");
    assert_eq!(set.warnings[0].record_index, 1);

    let sent = client.transport().sent();
    assert_eq!(sent.len(), 3);
    assert!(sent[1].contains("<entity>Resource</entity>"));
    assert!(sent[1].contains("<field>Active<expression op=\"equals\">true</expression></field>"));
    assert!(sent[2].contains("<entity>Role</entity>"));
    assert!(sent[2].contains("<field>id<expression op=\"greaterthan\">0</expression></field>"));
}

#[test]
fn failed_enrichment_fetch_does_not_fail_time_entries() {
    let stub = StubTransport::default()
        .respond(RecordKind::TimeEntry, TIME_ENTRIES)
        .respond_raw(
            RecordKind::Resource,
            RawResponse {
                status: 500,
                body: Vec::new(),
            },
        )
        .respond(RecordKind::Role, ROLES);
    let client = Client::new(stub);

    let set = client
        .fetch_time_entries(&QueryExpression::greater_than("id", "0"))
        .unwrap();

    assert!(set.records.iter().all(|e| e.resource_name.is_empty()));
    assert_eq!(set.records[0].role_name, "Engineer");

    assert!(!set.is_clean());
    assert_eq!(set.lookup_failures.len(), 1);
    let failure = &set.lookup_failures[0];
    assert_eq!(failure.kind, RecordKind::Resource);
    assert!(failure.transport);
    assert!(failure.retryable);
    assert!(failure.message.contains("500"));
}

#[test]
fn rejected_lookup_is_reported_not_hidden() {
    let transport = |envelope: &[u8]| {
        let body = String::from_utf8_lossy(envelope);
        if body.contains("<entity>TimeEntry</entity>") {
            Ok::<_, TransportError>(RawResponse::ok(soap_response(TIME_ENTRIES)))
        } else {
            Ok(RawResponse {
                status: 401,
                body: Vec::new(),
            })
        }
    };
    let set = Client::new(transport)
        .fetch_time_entries(&QueryExpression::id_equals(1))
        .unwrap();

    assert_eq!(set.len(), 2);
    assert_eq!(set.records[0].resource_name, "");
    let kinds: Vec<RecordKind> = set.lookup_failures.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![RecordKind::Resource, RecordKind::Role]);
    assert!(set
        .lookup_failures
        .iter()
        .all(|f| f.transport && !f.retryable && f.message.contains("401")));
}

#[test]
fn successful_lookups_report_no_failures() {
    let stub = StubTransport::default()
        .respond(RecordKind::TimeEntry, TIME_ENTRIES)
        .respond(RecordKind::Resource, RESOURCES)
        .respond(RecordKind::Role, ROLES);
    let set = Client::new(stub)
        .fetch_time_entries(&QueryExpression::id_equals(1))
        .unwrap();
    assert!(set.lookup_failures.is_empty());
}

#[test]
fn load_ticket_context_attaches_ticket_and_account() {
    let stub = StubTransport::default()
        .respond(RecordKind::TimeEntry, TIME_ENTRIES)
        .respond(RecordKind::Resource, RESOURCES)
        .respond(RecordKind::Role, ROLES)
        .respond(
            RecordKind::Ticket,
            "<Entity><id>10</id><AccountID>100</AccountID><Title>VPN down</Title></Entity>",
        )
        .respond(
            RecordKind::Account,
            "<Entity><id>100</id><AccountName>Acme</AccountName></Entity>",
        );
    let client = Client::new(stub);

    let mut set = client
        .fetch_time_entries(&QueryExpression::greater_than("id", "0"))
        .unwrap();
    client.load_ticket_context(&mut set.records).unwrap();

    // The stub answers every ticket query with ticket 10, so only the
    // entry referencing 10 gets a ticket.
    let first = &set.records[0];
    assert_eq!(first.ticket.as_ref().unwrap().title, "VPN down");
    assert_eq!(first.account.as_ref().unwrap().account_name, "Acme");
    assert!(set.records[1].ticket.is_none());
    assert!(set.records[1].account.is_none());
}

#[test]
fn failed_ticket_context_leaves_entries_untouched() {
    // Tickets resolve but the account lookup has no stubbed response.
    let stub = StubTransport::default()
        .respond(RecordKind::TimeEntry, TIME_ENTRIES)
        .respond(RecordKind::Resource, RESOURCES)
        .respond(RecordKind::Role, ROLES)
        .respond(
            RecordKind::Ticket,
            "<Entity><id>10</id><AccountID>100</AccountID><Title>VPN down</Title></Entity>",
        );
    let client = Client::new(stub);

    let mut set = client
        .fetch_time_entries(&QueryExpression::greater_than("id", "0"))
        .unwrap();
    let before = set.records.clone();

    let err = client.load_ticket_context(&mut set.records).unwrap_err();
    assert!(err.is_transport());
    assert_eq!(set.records, before);
    assert!(set.records.iter().all(|e| e.ticket.is_none() && e.account.is_none()));
}

#[test]
fn non_ok_statuses_are_typed_errors() {
    for (status, auth) in [(401, true), (403, true), (500, false), (404, false)] {
        let stub = StubTransport::default().respond_raw(
            RecordKind::Role,
            RawResponse {
                status,
                body: b"nope".to_vec(),
            },
        );
        let err = Client::new(stub)
            .fetch_roles(&QueryExpression::greater_than("id", "0"))
            .unwrap_err();
        assert!(err.is_transport());
        let rejected = matches!(
            err,
            atws::AtwsError::Transport(TransportError::Unauthorized { .. })
        );
        assert_eq!(rejected, auth, "status {status}");
    }
}

#[test]
fn connection_failure_is_typed_error() {
    let client = Client::new(StubTransport::default());
    let err = client.fetch_accounts(&QueryExpression::id_equals(1)).unwrap_err();
    assert!(err.is_transport());
    assert!(err.is_retryable());
}

#[test]
fn response_without_results_is_malformed() {
    let stub = StubTransport::default().respond_raw(
        RecordKind::Account,
        RawResponse::ok(
            "<soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\">\
             <soap:Body><queryResponse/></soap:Body></soap:Envelope>",
        ),
    );
    let err = Client::new(stub)
        .fetch_accounts(&QueryExpression::id_equals(1))
        .unwrap_err();
    assert!(err.is_malformed_response());
}

#[test]
fn closure_transport_drives_the_pipeline() {
    let transport = |envelope: &[u8]| {
        let body = String::from_utf8_lossy(envelope);
        assert!(body.contains("<entity>Resource</entity>"));
        Ok::<_, TransportError>(RawResponse::ok(soap_response(RESOURCES)))
    };
    let set = Client::new(transport)
        .fetch_resources(&QueryExpression::equals("Active", "true"))
        .unwrap();
    assert_eq!(set.records[0].display_name(), "Grace Hopper");
}
