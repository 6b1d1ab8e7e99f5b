//! Benchmarks for the lookup and merge hot paths.
//!
//! Lookups should stay cheap even with many layers, because probing stops
//! at the first entry that has the key.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use std::hint::black_box;

use strata::merge::{JsonTree, MergeEngine};
use strata::{
    CompiledPath, ConfigurationEntry, ConfigurationRegistry, FetchStrategy, MergeOption,
    MergeOptions, RegistrySettings, Value,
};

fn layer(depth: usize) -> ConfigurationEntry {
    let mut doc = json!({
        "server": {"host": format!("host-{}", depth), "port": 8000 + depth},
    });
    doc[format!("only_{}", depth)] = json!(true);
    ConfigurationEntry::from_tree(Value::from(doc)).with_precedence(depth as i32)
}

fn registry(layers: usize, strategy: FetchStrategy) -> ConfigurationRegistry {
    let mut registry = ConfigurationRegistry::new(RegistrySettings::new().with_strategy(strategy));
    for depth in 0..layers {
        registry.add(layer(depth).in_namespace(if depth % 2 == 0 { "" } else { "odd" }));
    }
    registry
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    for layers in [1usize, 8, 64] {
        let strict = registry(layers, FetchStrategy::Strict);
        let lenient = registry(layers, FetchStrategy::Lenient);

        group.bench_with_input(BenchmarkId::new("strict_hit_first", layers), &strict, |b, reg| {
            b.iter(|| black_box(reg.get_int(black_box("server.port"))))
        });
        group.bench_with_input(BenchmarkId::new("strict_hit_last", layers), &strict, |b, reg| {
            b.iter(|| black_box(reg.get_bool(black_box("only_0"))))
        });
        group.bench_with_input(BenchmarkId::new("lenient_miss", layers), &lenient, |b, reg| {
            b.iter(|| black_box(reg.get_string(black_box("missing.key"))))
        });
    }

    group.finish();
}

fn bench_path_compile(c: &mut Criterion) {
    c.bench_function("compile_path", |b| {
        b.iter(|| CompiledPath::compile(black_box("$.cluster.nodes[3]['display name']")))
    });
}

fn bench_merge(c: &mut Criterion) {
    let items = |prefix: &str, n: usize| {
        (0..n)
            .map(|i| json!({"id": i, "owner": prefix, "tags": ["a", "b"]}))
            .collect::<Vec<_>>()
    };
    let hi = json!({"items": items("hi", 200), "settings": {"a": 1, "nested": {"x": true}}});
    let lo = json!({"items": items("lo", 400), "settings": {"b": 2, "nested": {"y": false}}});

    let keyed = MergeOptions::new().with(
        MergeOption::new("$.items", ["id"]).expect("valid merge option"),
    );
    let plain = MergeOptions::new();

    let mut group = c.benchmark_group("merge");
    group.bench_function("identity_keys", |b| {
        b.iter(|| MergeEngine::<JsonTree>::merge(black_box(&hi), black_box(&lo), 1, 0, &keyed))
    });
    group.bench_function("whole_value", |b| {
        b.iter(|| MergeEngine::<JsonTree>::merge(black_box(&hi), black_box(&lo), 1, 0, &plain))
    });
    group.finish();
}

criterion_group!(benches, bench_lookup, bench_path_compile, bench_merge);
criterion_main!(benches);
