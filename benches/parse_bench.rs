use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sqlscope::reparser::apply_change;
use sqlscope::{ContentChange, Engine, Position};

const QUERY: &str = "with base as (\n    select id, amount, created_at\n    from `proj.sales.orders`\n    where amount > 0\n)\nselect b.id, sum(b.amount) over (partition by b.id order by b.created_at desc) as total\nfrom base b\nleft join sales.customers c on c.id = b.id and c.active = true\nwhere b.created_at between '2024-01-01' and '2024-12-31'\norder by total desc\nlimit 100;\n";

fn large_document() -> String {
    QUERY.repeat(50)
}

fn bench_tokenize_small(c: &mut Criterion) {
    let engine = Engine::builtin().unwrap();
    c.bench_function("tokenize_small", |b| {
        b.iter(|| engine.tokenize(black_box(QUERY)).unwrap())
    });
}

fn bench_parse_small(c: &mut Criterion) {
    let engine = Engine::builtin().unwrap();
    c.bench_function("parse_small", |b| {
        b.iter(|| engine.parse_text(black_box(QUERY)).unwrap())
    });
}

fn bench_parse_large(c: &mut Criterion) {
    let engine = Engine::builtin().unwrap();
    let sql = large_document();
    c.bench_function("parse_large", |b| {
        b.iter(|| engine.parse_text(black_box(&sql)).unwrap())
    });
}

fn bench_single_line_edit(c: &mut Criterion) {
    let engine = Engine::builtin().unwrap();
    let cache = engine.tokenize(&large_document()).unwrap();
    let change = ContentChange::replace(Position::new(1, 11), Position::new(1, 13), "order_id");
    c.bench_function("edit_large", |b| {
        b.iter(|| {
            let mut cache = cache.clone();
            apply_change(engine.tokenizer(), &mut cache, black_box(&change)).unwrap();
            cache
        })
    });
}

criterion_group!(
    benches,
    bench_tokenize_small,
    bench_parse_small,
    bench_parse_large,
    bench_single_line_edit
);
criterion_main!(benches);
