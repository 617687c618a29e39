// Criterion benchmarks for the FilmMatch discover feed

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use filmmatch::core::DiscoverFeed;
use filmmatch::models::Movie;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn create_movie(id: i32) -> Movie {
    Movie {
        id,
        tmdb_id: Some(id + 10_000),
        title: format!("Movie {}", id),
        overview: Some("A film".to_string()),
        release_date: None,
        poster_path: Some(format!("/poster{}.jpg", id)),
        backdrop_path: None,
        vote_average: 5.0 + (id % 50) as f64 / 10.0,
        vote_count: id * 3,
        popularity: 1000.0 - id as f64,
        original_language: Some("en".to_string()),
        genres: vec!["Drama".to_string(), "Thriller".to_string()],
    }
}

fn bench_select(c: &mut Criterion) {
    let feed = DiscoverFeed::default();
    let mut group = c.benchmark_group("discover_select");

    for limit in [10usize, 20, 50].iter() {
        let pool = feed.pool_size(*limit, 0);
        let candidates: Vec<Movie> = (1..=pool as i32).map(create_movie).collect();

        group.bench_with_input(BenchmarkId::new("limit", limit), limit, |b, &limit| {
            let mut rng = StdRng::seed_from_u64(42);
            b.iter(|| {
                feed.select(
                    black_box(candidates.clone()),
                    black_box(&HashSet::new()),
                    limit,
                    &mut rng,
                )
            });
        });
    }

    group.finish();
}

fn bench_select_with_exclusions(c: &mut Criterion) {
    let feed = DiscoverFeed::default();
    let mut group = c.benchmark_group("discover_select_excluded");

    for excluded_count in [0usize, 50, 200].iter() {
        let pool = feed.pool_size(20, *excluded_count);
        let candidates: Vec<Movie> = (1..=pool as i32).map(create_movie).collect();
        let excluded: HashSet<i32> = (1..=*excluded_count as i32).map(|id| id * 2).collect();

        group.bench_with_input(
            BenchmarkId::new("excluded", excluded_count),
            excluded_count,
            |b, _| {
                let mut rng = StdRng::seed_from_u64(7);
                b.iter(|| {
                    feed.select(
                        black_box(candidates.clone()),
                        black_box(&excluded),
                        20,
                        &mut rng,
                    )
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_select, bench_select_with_exclusions);

criterion_main!(benches);
