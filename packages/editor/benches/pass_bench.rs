use criterion::{black_box, criterion_group, criterion_main, Criterion};
use interspy_editor::{Document, EvaluatorRegistry, Pipeline, SessionConfig};

fn script(lines: usize) -> String {
    let mut source = String::from("total = 0\nnames = []\n");
    for i in 0..lines {
        match i % 4 {
            0 => source.push_str(&format!("v{} = {} * 3 + total\n", i, i)),
            1 => source.push_str(&format!("total += v{}\n", i - 1)),
            2 => source.push_str(&format!("names.append('n{}')\n", i)),
            _ => source.push_str("len(names), total\n"),
        }
    }
    source
}

fn pipeline() -> Pipeline {
    Pipeline::for_language(
        &EvaluatorRegistry::default(),
        "source.python",
        &SessionConfig::default(),
    )
    .expect("python evaluator is registered")
}

fn first_pass(c: &mut Criterion) {
    let document = Document::new(script(200));

    c.bench_function("first_pass_200_lines", |b| {
        b.iter(|| {
            let mut pipeline = pipeline();
            pipeline.run(black_box(&document));
            pipeline
        })
    });
}

fn unchanged_pass(c: &mut Criterion) {
    let document = Document::new(script(200));
    let mut pipeline = pipeline();
    pipeline.run(&document);

    c.bench_function("unchanged_pass_200_lines", |b| {
        b.iter(|| pipeline.run(black_box(&document)))
    });
}

criterion_group!(benches, first_pass, unchanged_pass);
criterion_main!(benches);
