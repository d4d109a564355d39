//! Pipeline Benchmarks
//!
//! Measures page parsing, address decomposition and batch write throughput.
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::runtime::Runtime;

use place_ingestion::normalize::{decompose_address, place_slug};
use place_ingestion::{
    parse_page, partition_batch, MemoryPlaceStore, PlaceRecord, SourceApi, SourceConfig, UpsertWriter,
};

fn tour_body(items: usize) -> Value {
    let items: Vec<Value> = (0..items)
        .map(|i| {
            json!({
                "contentid": format!("{}", 100_000 + i),
                "contenttypeid": "39",
                "title": format!("반려견 동반 식당 {i}"),
                "addr1": "경상남도 통영시 도남로 123",
                "mapx": "128.43",
                "mapy": "34.83",
                "tel": "055-000-0000"
            })
        })
        .collect();
    json!({
        "response": {
            "header": {"resultCode": "0000", "resultMsg": "OK"},
            "body": {"items": {"item": items}}
        }
    })
}

fn seoul_body(rows: usize) -> Value {
    let rows: Vec<Value> = (0..rows)
        .map(|i| {
            json!({
                "MGTNO": format!("3220000-101-{i}"),
                "BPLCNM": format!("동물병원 {i}"),
                "UPTAENM": "동물병원",
                "RDNWHLADDR": "서울특별시 강남구 테헤란로 152",
                "X": "1270360000",
                "Y": "375000000"
            })
        })
        .collect();
    json!({"LOCALDATA_020301": {"RESULT": {"CODE": "INFO-000"}, "row": rows}})
}

/// Benchmark parsing a full page per source shape
fn bench_page_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_parsing");
    group.throughput(Throughput::Elements(100));

    let tour = SourceConfig::new(SourceApi::KorPetTour, "https://bench.local", "/list", "k");
    let tour_page = tour_body(100);
    group.bench_function("kor_pet_tour_100", |b| {
        b.iter(|| parse_page(&tour, black_box(&tour_page)))
    });

    let seoul = SourceConfig::new(SourceApi::SeoulOpenApi, "https://bench.local", "/list", "k");
    let seoul_page = seoul_body(100);
    group.bench_function("seoul_open_api_100", |b| {
        b.iter(|| parse_page(&seoul, black_box(&seoul_page)))
    });

    group.finish();
}

/// Benchmark address decomposition and slug generation
fn bench_normalization(c: &mut Criterion) {
    let addresses = [
        "서울특별시 강남구 테헤란로 152",
        "경기 성남시 분당구 판교역로 235",
        "충북 청주시 상당구 상당로 155",
        "제주특별자치도 제주시 문연로 6",
        "주소 미상",
    ];

    c.bench_function("decompose_address", |b| {
        b.iter(|| {
            for address in addresses.iter() {
                black_box(decompose_address(black_box(address)));
            }
        })
    });

    let id = uuid::Uuid::new_v4();
    c.bench_function("place_slug", |b| {
        b.iter(|| place_slug(black_box("Happy Dog Cafe & 펫 라운지"), &id))
    });
}

/// Benchmark partition + write of a batch against the in-memory store
fn bench_batch_write(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("batch_write");
    group.throughput(Throughput::Elements(1_000));

    group.bench_function("memory_store_1000", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = Arc::new(MemoryPlaceStore::new());
                let batch: Vec<_> = (0..1_000)
                    .map(|i| {
                        PlaceRecord::new(SourceApi::DataGoKr, format!("{i}"), json!({"id": i}))
                            .with_name(format!("시설 {i}"))
                    })
                    .collect();

                let partition = partition_batch(store.as_ref(), batch).await.unwrap();
                black_box(UpsertWriter::new(store.clone()).write(partition).await)
            })
        })
    });

    group.finish();
}

criterion_group!(benches, bench_page_parsing, bench_normalization, bench_batch_write);

criterion_main!(benches);
