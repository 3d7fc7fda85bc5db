// Performance benchmarks for matching and aggregation
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pantry_aggregate::schema::{quantity_column, required_observation_columns, unit_column, QUANTITY_STEMS, ALLERGEN_COLUMNS};
use pantry_aggregate::AggregationPlan;
use pantry_core::{HashEmbedder, SimilarityMatcher, StopwordSet, Table, TaxonomyIndex, TextNormalizer, Vector};
use rand::prelude::*;
use rand::rngs::StdRng;

fn random_vectors(rng: &mut StdRng, count: usize, dim: usize) -> Vec<Vector> {
    (0..count)
        .map(|_| Vector::new((0..dim).map(|_| rng.random_range(-1.0f32..1.0f32)).collect()))
        .collect()
}

fn benchmark_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("match");
    group.sample_size(20);

    let mut rng = StdRng::seed_from_u64(42);
    let dim = 768;
    let taxonomy = random_vectors(&mut rng, 2000, dim);
    let ids: Vec<i64> = (0..taxonomy.len() as i64).collect();
    let index = TaxonomyIndex::from_vectors(&taxonomy, &ids).unwrap();
    let matcher = SimilarityMatcher::new();

    for batch in [1, 64, 512].iter() {
        let queries = random_vectors(&mut rng, *batch, dim);
        group.bench_with_input(BenchmarkId::new("taxonomy_2000x768", batch), batch, |b, _| {
            b.iter(|| black_box(matcher.match_vectors(black_box(&queries), &index).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_normalize_embed(c: &mut Criterion) {
    let normalizer = TextNormalizer::new(StopwordSet::from_words(["bb", "x", "kg", "fresh", "frozen"]));
    let embedder = HashEmbedder::new(768).unwrap();
    let raw: Vec<String> = (0..512).map(|i| format!("Fresh Crab Meat BB X{}kg", i)).collect();

    c.bench_function("normalize_embed_512", |b| {
        b.iter(|| {
            let clean = normalizer.normalize(black_box(&raw));
            black_box(clean.iter().map(|t| embedder.embed_one(t)).count())
        });
    });
}

fn observation_table(rng: &mut StdRng, rows: usize, entities: i64) -> Table {
    let mut headers = required_observation_columns();
    headers.push("taxonomy_id".to_string());
    let mut table = Table::new(headers.clone());

    for i in 0..rows {
        let mut row = vec![None; headers.len()];
        let mut set = |name: &str, value: String| {
            if let Some(pos) = headers.iter().position(|h| h == name) {
                row[pos] = Some(value);
            }
        };
        set("ingredient_id", i.to_string());
        set("taxonomy_id", rng.random_range(0..entities).to_string());
        set("matched_score", format!("{:.5}", rng.random_range(0.5..1.0)));
        for stem in QUANTITY_STEMS {
            set(&quantity_column(stem), format!("{:.2}", rng.random_range(0.0..500.0)));
            set(&unit_column(stem), if rng.random_bool(0.2) { "mg" } else { "g" }.to_string());
        }
        for allergen in ALLERGEN_COLUMNS {
            set(allergen, (rng.random_bool(0.1) as u8).to_string());
        }
        table.push_row(row).unwrap();
    }
    table
}

fn benchmark_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    group.sample_size(10);

    let mut rng = StdRng::seed_from_u64(7);
    let plan = AggregationPlan::default();

    for rows in [1_000, 10_000].iter() {
        let table = observation_table(&mut rng, *rows, 200);
        group.bench_with_input(BenchmarkId::new("observations", rows), rows, |b, _| {
            b.iter(|| black_box(plan.run(black_box(&table)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_match, benchmark_normalize_embed, benchmark_aggregate);
criterion_main!(benches);
