use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridfill_autofill::{fill, FillOperation, MemoryGrid, PatternEngine};
use gridfill_primitives::{CellAddress, CellRange, FillDirection, Value};

fn series() -> Vec<(&'static str, Vec<Value>)> {
    vec![
        ("linear", [1.0, 2.0, 3.0, 4.0].map(Value::from).to_vec()),
        ("squares", [1.0, 4.0, 9.0, 16.0].map(Value::from).to_vec()),
        ("fibonacci", [1.0, 1.0, 2.0, 3.0, 5.0].map(Value::from).to_vec()),
        (
            "dates",
            ["2024-01-01", "2024-01-08", "2024-01-15"]
                .map(Value::from)
                .to_vec(),
        ),
        ("months", ["Jan", "Feb", "Mar"].map(Value::from).to_vec()),
        ("text", ["north", "south"].map(Value::from).to_vec()),
    ]
}

fn bench_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_all_patterns");
    let engine = PatternEngine::default();
    for (name, values) in series() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &values, |b, v| {
            b.iter(|| engine.detect_all_patterns(black_box(v), FillDirection::Down))
        });
    }
    group.finish();
}

fn bench_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill");
    for count in [10u32, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut grid = MemoryGrid::new();
                grid.set_column(CellAddress::new(0, 0), [1.0, 3.0, 5.0].map(Value::from))
                    .ok()?;
                grid.set_column(CellAddress::new(0, 1), ["=A1*2"; 3].map(Value::from))
                    .ok()?;
                let source = CellRange::new(CellAddress::new(0, 0), CellAddress::new(2, 1));
                let op = FillOperation::adjacent(source, FillDirection::Down, count);
                op.map(|op| fill(black_box(&op), &mut grid))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_detect, bench_fill);
criterion_main!(benches);
