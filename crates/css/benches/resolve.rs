//! Criterion benchmarks for cascade resolution.
//!
//! A flat list of `item` nodes is resolved against a global scope with
//! structural, attribute and function rules, measuring:
//! - Cold resolution with the memo disabled.
//! - Warm resolution served from the memo.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use css::{Declaration, NodeContext, ResolverConfig, StyleEngine, StyleFn, StyleMap};
use std::hint::black_box;

fn definition() -> StyleMap {
    StyleMap::new()
        .with(
            "item",
            StyleMap::new()
                .with("color", "gray")
                .with("&:first-child", StyleMap::new().with("color", "blue"))
                .with("&:nth-child(2n+1)", StyleMap::new().with("background", "white"))
                .with("&[data-state=\"open\"]", StyleMap::new().with("border", "1px")),
        )
        .with(
            "item:nth-child(3n)",
            StyleFn::new(|index, _| Some(Declaration::new().with("order", index as f64))),
        )
}

/// Build `n` sibling nodes, every third one carrying `data-state="open"`.
fn build_nodes(n: usize) -> Vec<NodeContext> {
    (1..=n)
        .map(|index| {
            let state = if index % 3 == 0 { "open" } else { "closed" };
            NodeContext::new(["item"])
                .at(index, n)
                .with_prop("data-state", state)
        })
        .collect()
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade_resolve");
    for &n in &[100usize, 1_000usize] {
        let nodes = build_nodes(n);

        let cold = StyleEngine::with_config(ResolverConfig::default().with_memo_capacity(0));
        cold.set_global_style(&definition());
        let cold_resolver = cold.resolver(None);
        group.bench_with_input(BenchmarkId::new("cold", n), &nodes, |b, nodes| {
            b.iter(|| {
                for node in nodes {
                    black_box(cold_resolver.resolve("item", node));
                }
            });
        });

        let warm = StyleEngine::new();
        warm.set_global_style(&definition());
        let warm_resolver = warm.resolver(None);
        for node in &nodes {
            warm_resolver.resolve("item", node);
        }
        group.bench_with_input(BenchmarkId::new("memoized", n), &nodes, |b, nodes| {
            b.iter(|| {
                for node in nodes {
                    black_box(warm_resolver.resolve("item", node));
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
