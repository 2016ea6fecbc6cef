use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;

use sifter::facet::{FacetCounts, FacetsConfig, TaxonomyReader, TaxonomyWriter};
use sifter::{Document, GroupingSearch, IndexSearcher, IndexSettings, IndexStore, QueryParser};

const WORDS: [&str; 8] = [
    "rust", "programming", "language", "systems", "search", "index", "query", "engine",
];

struct BenchEnv {
    _tmp: TempDir,
    _store: Arc<IndexStore>,
    taxonomy: TaxonomyReader,
    searcher: IndexSearcher,
}

fn build_env(doc_count: usize) -> BenchEnv {
    let tmp = TempDir::new().unwrap();
    let settings = IndexSettings::default().with_sync_on_commit(false);
    let store = IndexStore::open(tmp.path().join("index"), settings).unwrap();
    let taxonomy = TaxonomyWriter::in_memory();
    let config = FacetsConfig::new();

    let writer = store.writer().unwrap();
    for i in 0..doc_count {
        let content = format!(
            "{} {} {} doc{}",
            WORDS[i % WORDS.len()],
            WORDS[(i / 3) % WORDS.len()],
            WORDS[(i / 7) % WORDS.len()],
            i
        );
        let doc = Document::new()
            .with_text("content", content)
            .with_stored("bucket", format!("b{}", i % 20))
            .with_facet("category", [format!("c{}", i % 12)]);
        writer.add_document(config.build(&taxonomy, doc).unwrap()).unwrap();
        if i % 1_000 == 999 {
            writer.commit().unwrap();
        }
    }
    writer.commit().unwrap();
    taxonomy.commit().unwrap();

    let searcher = IndexSearcher::new(store.reader().unwrap());
    BenchEnv {
        _tmp: tmp,
        taxonomy: TaxonomyReader::open(&taxonomy),
        _store: store,
        searcher,
    }
}

fn bench_search(c: &mut Criterion) {
    let counts = [1_000usize, 10_000];
    let envs: Vec<(usize, BenchEnv)> = counts.iter().map(|&n| (n, build_env(n))).collect();
    let parser = QueryParser::new().with_default_field("content");

    let mut group = c.benchmark_group("search");
    for (name, input) in [
        ("term", "rust"),
        ("bool", "rust programming -systems"),
        ("fuzzy", "serch~2"),
    ] {
        let query = parser.parse(input).unwrap();
        for (count, env) in envs.iter() {
            group.bench_with_input(BenchmarkId::new(name, count), env, |b, env| {
                b.iter(|| black_box(env.searcher.search(&query, 10).unwrap()));
            });
        }
    }
    group.finish();

    let query = parser.parse("rust OR search").unwrap();
    let mut group = c.benchmark_group("post_processing");
    for (count, env) in envs.iter() {
        group.bench_with_input(BenchmarkId::new("grouping", count), env, |b, env| {
            b.iter(|| {
                black_box(
                    GroupingSearch::new("bucket")
                        .search(&env.searcher, &query, 0, 10)
                        .unwrap(),
                )
            });
        });
        group.bench_with_input(BenchmarkId::new("facets", count), env, |b, env| {
            b.iter(|| {
                black_box(
                    FacetCounts::search(&env.searcher, &env.taxonomy, &query, "category", 10)
                        .unwrap(),
                )
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
