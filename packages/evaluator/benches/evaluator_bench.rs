use criterion::{black_box, criterion_group, criterion_main, Criterion};
use interspy_evaluator::EvalContext;

const SCRIPT: &str = r#"
prices = [3.5, 12.0, 7.25, 1.0]
names = ['tea', 'cake', 'pie', 'mint']
total = sum(prices)
total
count = len(prices)
average = total / count
average > 5
menu = {'tea': 3.5, 'cake': 12.0}
menu['cake'] * 2
cheapest = min(prices)
label = 'cheap' if cheapest < 2 else 'fine'
', '.join(sorted(names))
names.append('scone')
first, second = names[0], names[1]
broken = total +
missing + 1
"#;

fn evaluate_script(c: &mut Criterion) {
    c.bench_function("evaluate_script", |b| {
        b.iter(|| {
            let mut ctx = EvalContext::new();
            for line in black_box(SCRIPT).lines() {
                let _ = ctx.evaluate_line(line);
            }
            ctx
        })
    });
}

fn evaluate_arithmetic_line(c: &mut Criterion) {
    let mut ctx = EvalContext::new();
    ctx.evaluate_line("a = 12").ok();
    ctx.evaluate_line("b = 30").ok();

    c.bench_function("evaluate_arithmetic_line", |b| {
        b.iter(|| ctx.evaluate_line(black_box("(a * b + 7) // 3 - a ** 2 % 5")))
    });
}

fn evaluate_growing_list(c: &mut Criterion) {
    c.bench_function("evaluate_growing_list", |b| {
        b.iter(|| {
            let mut ctx = EvalContext::new();
            ctx.evaluate_line("xs = []").ok();
            for _ in 0..200 {
                ctx.evaluate_line(black_box("xs.append(len(xs))")).ok();
            }
            ctx
        })
    });
}

criterion_group!(benches, evaluate_script, evaluate_arithmetic_line, evaluate_growing_list);
criterion_main!(benches);
