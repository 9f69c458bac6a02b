use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ltsa::LocalTangentSpaceAlignment;
use ndarray::{Array, Array2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

fn generate_data(n_samples: usize, n_features: usize) -> Array2<f64> {
    Array::random((n_samples, n_features), Uniform::new(0., 10.))
}

fn bench_ltsa_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("LTSA_fit");

    for &(n_samples, n_features, n_neighbors) in
        [(200, 5, 12), (400, 5, 12), (200, 20, 15)].iter()
    {
        let data = generate_data(n_samples, n_features);
        group.throughput(Throughput::Elements((n_samples * n_features) as u64));
        group.bench_with_input(
            BenchmarkId::new("fit", format!("{}x{}", n_samples, n_features)),
            &data,
            |b, data_matrix| {
                b.iter_with_setup(
                    || LocalTangentSpaceAlignment::new(2, n_neighbors),
                    |mut model| model.fit(data_matrix).unwrap(),
                );
            },
        );
    }
    group.finish();
}

fn bench_ltsa_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("LTSA_transform");

    let data = generate_data(400, 5);
    let queries = generate_data(100, 5);
    let mut model = LocalTangentSpaceAlignment::new(2, 12);
    model.fit(&data).unwrap();

    group.throughput(Throughput::Elements(queries.nrows() as u64));
    group.bench_with_input(
        BenchmarkId::new("transform", "100x5"),
        &queries,
        |b, query_matrix| {
            b.iter(|| model.transform(query_matrix).unwrap());
        },
    );
    group.finish();
}

criterion_group!(benches, bench_ltsa_fit, bench_ltsa_transform);
criterion_main!(benches);
