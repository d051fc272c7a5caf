use cppy::{codegen::Module, translate};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

static HEADERS: [(&str, &str); 3] = [
    ("rockets", include_str!("../../demos/rockets.h")),
    ("school", include_str!("../../demos/school.h")),
    ("launchpad", include_str!("../../demos/launchpad.h")),
];

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate");
    for (name, src) in HEADERS {
        let module = Module::new(name, format!("{name}.h"));
        group.bench_with_input(BenchmarkId::from_parameter(name), src, |b, src| {
            b.iter(|| translate(black_box(src), &module).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
