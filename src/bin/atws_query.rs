//! atws-query
//!
//! Runs one query against the ATWS endpoint and prints the decoded records
//! as JSON. Credentials come from `ATWS_USERNAME` / `ATWS_PASSWORD`.

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use atws::{AtwsResult, Client, Config, QueryExpression, RecordKind, RecordSet};

#[derive(Debug, Parser)]
#[command(name = "atws-query", about = "Query ATWS records and print them as JSON")]
struct Args {
    /// Record kind (Account, Resource, Role, Ticket, TimeEntry)
    #[arg(long)]
    kind: RecordKind,

    /// Field to filter on
    #[arg(long, default_value = "id")]
    field: String,

    /// Comparison operator understood by the server
    #[arg(long, default_value = "greaterthan")]
    op: String,

    /// Comparison value
    #[arg(long, default_value = "0")]
    value: String,

    /// For time entries, also attach each entry's ticket and account
    #[arg(long)]
    ticket_context: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "query failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> AtwsResult<String> {
    let client = Client::connect(Config::from_env()?);
    let condition = QueryExpression::new(&args.field, &args.op, &args.value);

    match args.kind {
        RecordKind::Account => render(client.fetch_accounts(&condition)?),
        RecordKind::Resource => render(client.fetch_resources(&condition)?),
        RecordKind::Role => render(client.fetch_roles(&condition)?),
        RecordKind::Ticket => render(client.fetch_tickets(&condition)?),
        RecordKind::TimeEntry => {
            let mut set = client.fetch_time_entries(&condition)?;
            if args.ticket_context {
                client.load_ticket_context(&mut set.records)?;
            }
            render(set)
        }
    }
}

fn render<R: Serialize>(set: RecordSet<R>) -> AtwsResult<String> {
    for warning in &set.warnings {
        tracing::warn!(%warning, "field parse failure");
    }
    for failure in &set.lookup_failures {
        tracing::warn!(%failure, "lookup failure");
    }
    serde_json::to_string_pretty(&set.records)
        .map_err(|e| atws::AtwsError::internal(format!("serialize records: {e}")))
}
