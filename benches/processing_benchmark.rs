use brc_processor::models::{Record, RunningStats};
use brc_processor::processors::AggregationStore;
use brc_processor::readers::{FieldTokenizer, SequentialReader};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::io::Write;
use tempfile::NamedTempFile;

const STATIONS: [&str; 8] = [
    "Hamburg",
    "Bulawayo",
    "Palembang",
    "St. John's",
    "Cracow",
    "Bridgetown",
    "Istanbul",
    "Roseau",
];

// Create test data for benchmarking
fn create_measurements(rows: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(rows * 16);
    for i in 0..rows {
        let station = STATIONS[i % STATIONS.len()];
        let value = ((i * 31) % 999) as f32 / 10.0 - 49.9;
        writeln!(data, "{};{:.1}", station, value).unwrap();
    }
    data
}

fn benchmark_tokenizer(c: &mut Criterion) {
    let data = create_measurements(10_000);
    let tokenizer = FieldTokenizer::default();

    c.bench_function("tokenize_10k_rows", |b| {
        b.iter(|| black_box(tokenizer.fields(black_box(&data)).count()))
    });
}

fn benchmark_record_parsing(c: &mut Criterion) {
    c.bench_function("parse_record", |b| {
        b.iter(|| Record::parse(black_box(b"Palembang;-12.7"), b';', 100))
    });
}

fn benchmark_store_insert(c: &mut Criterion) {
    let records: Vec<(&str, f32)> = (0..10_000)
        .map(|i| (STATIONS[i % STATIONS.len()], i as f32 / 100.0))
        .collect();

    c.bench_function("store_insert_10k", |b| {
        b.iter(|| {
            let store: AggregationStore<RunningStats> = AggregationStore::new();
            for (station, value) in &records {
                store.insert(station.as_bytes(), *value).unwrap();
            }
            black_box(store.snapshot().unwrap())
        })
    });
}

fn benchmark_sequential_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_reader");

    for rows in [1_000, 100_000] {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&create_measurements(rows)).unwrap();

        for use_mmap in [false, true] {
            let label = if use_mmap { "mmap" } else { "buffered" };
            group.bench_with_input(BenchmarkId::new(label, rows), &rows, |b, _| {
                let reader = SequentialReader::default().with_mmap(use_mmap);
                b.iter(|| black_box(reader.aggregate(file.path()).unwrap()))
            });
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_tokenizer,
    benchmark_record_parsing,
    benchmark_store_insert,
    benchmark_sequential_reader
);
criterion_main!(benches);
