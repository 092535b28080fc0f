use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use tennis_odds::csv_out::to_csv;
use tennis_odds::extract::extract;
use tennis_odds::normalize::normalize;
use tennis_odds::odds_api::{CompetitionDescriptor, parse_odds_json};
use tennis_odds::rows::{NormalizedRow, SnapshotRow, to_records};

fn odds_payload(events: usize) -> String {
    let items: Vec<String> = (0..events)
        .map(|i| {
            format!(
                r#"{{"id":"ev{i}","commence_time":"2026-10-30T18:00:00Z","bookmakers":[
                {{"key":"unibet_eu","title":"Unibet","markets":[{{"key":"totals","outcomes":[{{"name":"Over","price":1.9}},{{"name":"Under","price":1.9}}]}}]}},
                {{"key":"pinnacle","title":"Pinnacle","markets":[{{"key":"h2h","outcomes":[{{"name":"Player {i}, A","price":{p1}}},{{"name":"Player \"{i}\" B","price":{p2}}}]}}]}}]}}"#,
                p1 = 1.2 + (i % 10) as f64 * 0.1,
                p2 = 4.0 - (i % 10) as f64 * 0.2,
            )
        })
        .collect();
    format!("[{}]", items.join(","))
}

fn bench_parse_and_extract(c: &mut Criterion) {
    let payload = odds_payload(200);
    c.bench_function("odds_parse_extract", |b| {
        b.iter(|| {
            let events = parse_odds_json(black_box(&payload)).unwrap();
            let kept = events.iter().filter_map(extract).count();
            black_box(kept);
        })
    });
}

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_h2h", |b| {
        b.iter(|| black_box(normalize(black_box(&[1.83, 2.07]))))
    });
}

fn bench_snapshot_csv(c: &mut Criterion) {
    let competition = CompetitionDescriptor {
        key: "tennis_atp_paris".to_string(),
        title: "ATP Paris Masters".to_string(),
        active: true,
    };
    let events = parse_odds_json(&odds_payload(500)).unwrap();
    let rows: Vec<SnapshotRow> = events
        .iter()
        .filter_map(extract)
        .map(|m| SnapshotRow::new(&competition, &NormalizedRow::new(m)))
        .collect();
    let records = to_records(&rows).unwrap();

    c.bench_function("snapshot_to_csv", |b| {
        b.iter(|| black_box(to_csv(black_box(&records)).len()))
    });
}

criterion_group!(benches, bench_parse_and_extract, bench_normalize, bench_snapshot_csv);
criterion_main!(benches);
