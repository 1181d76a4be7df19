use std::fmt::Write;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use atws::extract::extract;
use atws::mapper::decode;
use atws::{enrich, QueryExpression, QueryCondition, RecordKind, Resource, Role, TimeEntry};

fn time_entry_response(count: usize) -> String {
    let mut entities = String::new();
    for i in 0..count {
        write!(
            entities,
            "<Entity xsi:type=\"TimeEntry\"><id>{i}</id><HoursWorked>1.5</HoursWorked>\
             <ResourceID>{}</ResourceID><RoleID>{}</RoleID><TicketID>{}</TicketID>\
             <StartDateTime>2021-03-05T10:15:00</StartDateTime></Entity>",
            i % 50,
            i % 10,
            i % 200
        )
        .unwrap();
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"><soap:Body>\
         <queryResponse xmlns=\"http://autotask.net/ATWS/v1_5/\"><queryResult>\
         <ReturnCode>1</ReturnCode><EntityResults>{entities}</EntityResults>\
         </queryResult></queryResponse></soap:Body></soap:Envelope>"
    )
}

fn bench_build_query(c: &mut Criterion) {
    let condition = QueryExpression::equals("TicketID", "12345");
    c.bench_function("pipeline/build_and_wrap", |b| {
        b.iter(|| atws::envelope::wrap_query(&condition.to_query_xml(RecordKind::TimeEntry)));
    });
}

fn bench_extract_decode(c: &mut Criterion) {
    let response = time_entry_response(1_000);
    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Bytes(response.len() as u64));

    group.bench_function("extract_1k", |b| {
        b.iter(|| extract(response.as_bytes()).unwrap());
    });

    let fragment = extract(response.as_bytes()).unwrap();
    group.bench_function("decode_1k_time_entries", |b| {
        b.iter(|| decode::<TimeEntry>(&fragment).unwrap());
    });
    group.finish();
}

fn bench_enrich(c: &mut Criterion) {
    let fragment = extract(time_entry_response(1_000).as_bytes()).unwrap();
    let entries = decode::<TimeEntry>(&fragment).unwrap().into_records();
    let resources: Vec<Resource> = (0..50)
        .map(|id| Resource {
            id,
            resource_id: id,
            first_name: format!("First{id}"),
            last_name: format!("Last{id}"),
        })
        .collect();
    let roles: Vec<Role> = (0..10)
        .map(|id| Role {
            id,
            role_id: id,
            name: format!("Role{id}"),
        })
        .collect();

    c.bench_function("pipeline/enrich_1k_time_entries", |b| {
        b.iter_batched(
            || entries.clone(),
            |mut batch| enrich::enrich_time_entries(&mut batch, &resources, &roles),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_build_query, bench_extract_decode, bench_enrich);
criterion_main!(benches);
