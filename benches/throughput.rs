use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};

use quizreel::{
    core::{
        ledger::UsageLedger,
        selector::QuestionSelector,
        store::{QuestionStore, ValidationPolicy},
    },
    persist::MemorySink,
};

fn document(n: i64) -> String {
    let records: Vec<Value> = (1..=n)
        .map(|id| {
            let difficulty = ["easy", "medium", "hard"][(id % 3) as usize];
            json!({
                "id": id,
                "difficulty": difficulty,
                "question": format!("Question number {id}?"),
                "options": ["one", "two", "three", "four"],
                "answer": "A",
                "explanation": "Because.",
                "captions": ["caption a", "caption b"],
                "descriptions": ["description"],
                "hashtags": ["#a", "#b", "#c", "#d", "#e", "#f"],
            })
        })
        .collect();
    Value::Array(records).to_string()
}

fn bench_load(c: &mut Criterion) {
    let doc = document(5_000);
    c.bench_function("store_load_5k", |b| {
        b.iter(|| QuestionStore::from_json_str("bench", &doc, ValidationPolicy::Strict).expect("load"));
    });
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_next");
    let store = QuestionStore::from_json_str("bench", &document(5_000), ValidationPolicy::Strict).expect("load");
    for used in [0i64, 2_500, 4_999] {
        let ledger = UsageLedger::open(MemorySink::with_ids(1..=used)).expect("ledger");
        group.bench_with_input(BenchmarkId::from_parameter(used), &used, |b, _| {
            b.iter(|| QuestionSelector::new(&store, &ledger).select_next().expect("select").id);
        });
    }
    group.finish();
}

fn bench_stats(c: &mut Criterion) {
    let store = QuestionStore::from_json_str("bench", &document(5_000), ValidationPolicy::Strict).expect("load");
    let ledger = UsageLedger::open(MemorySink::with_ids(1..=2_500)).expect("ledger");
    c.bench_function("stats_5k", |b| {
        b.iter(|| QuestionSelector::new(&store, &ledger).get_stats());
    });
}

criterion_group!(benches, bench_load, bench_select, bench_stats);
criterion_main!(benches);
