use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use eth_tx_parser::models::{Address, Transaction};
use eth_tx_parser::storage::LedgerIndex;

fn create_test_transaction(id: u64, owner: &Address) -> Transaction {
    Transaction {
        hash: format!("0x{:064x}", id),
        from: owner.clone(),
        to: Address::from(format!("0x{:040x}", id)),
        value: format!("0x{:x}", (id + 1) * 1_000_000_000),
        block_number: format!("0x{:x}", 1000 + id),
    }
}

fn watched_index(addresses: u64) -> (LedgerIndex, Vec<Address>) {
    let index = LedgerIndex::new();
    let watched: Vec<Address> = (0..addresses)
        .map(|i| Address::from(format!("0x{:040x}", 0xa000_0000u64 + i)))
        .collect();
    for address in &watched {
        index.subscribe(address.clone()).expect("Failed to subscribe");
    }
    (index, watched)
}

fn bench_index_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_index_record");

    for size in [1, 10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("fresh_hashes", size), size, |b, &size| {
            b.iter(|| {
                let (index, watched) = watched_index(1);
                for i in 0..size {
                    index.record(&watched[0], black_box(create_test_transaction(i, &watched[0])));
                }
            });
        });
    }

    let (index, watched) = watched_index(1);
    for i in 0..1000 {
        index.record(&watched[0], create_test_transaction(i, &watched[0]));
    }
    group.bench_function("duplicate_hash", |b| {
        b.iter(|| index.record(&watched[0], black_box(create_test_transaction(500, &watched[0]))));
    });

    group.finish();
}

fn bench_index_query(c: &mut Criterion) {
    let (index, watched) = watched_index(100);
    for (n, address) in watched.iter().enumerate() {
        for i in 0..100 {
            index.record(address, create_test_transaction(n as u64 * 1000 + i, address));
        }
    }
    let unwatched = Address::from("0x00000000000000000000000000000000000000ff");

    let mut group = c.benchmark_group("ledger_index_query");

    group.bench_function("is_watched_hit", |b| {
        b.iter(|| index.is_watched(black_box(&watched[42])));
    });

    group.bench_function("is_watched_miss", |b| {
        b.iter(|| index.is_watched(black_box(&unwatched)));
    });

    group.bench_function("history_100", |b| {
        b.iter(|| index.history(black_box(&watched[42])));
    });

    group.bench_function("progress", |b| {
        b.iter(|| index.progress());
    });

    group.finish();
}

criterion_group!(benches, bench_index_record, bench_index_query);
criterion_main!(benches);
