//! Formula and session benchmarks
//!
//! Target: a keystroke on a 100-field form recomputes in well under 1ms.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sase_forms::{
    DerivationEvaluator, DerivedLogic, EngineConfig, FieldDefinition, FieldType, FieldValue,
    FormSchema, FormSession, ValueMap,
};

fn bench_evaluate(c: &mut Criterion) {
    let evaluator = DerivationEvaluator::new();
    let mut values = ValueMap::new();
    values.insert("price".into(), FieldValue::from(19.99));
    values.insert("qty".into(), FieldValue::from(3));
    values.insert("first".into(), FieldValue::from("Ada"));
    values.insert("dob".into(), FieldValue::from("1990-06-15"));

    let mut group = c.benchmark_group("evaluate");
    for (name, formula) in [
        ("arithmetic", "({price} * {qty}) * (1 + 0.2) - 5 / 2"),
        ("concat", "{first} + ' ' + 'Lovelace'"),
        ("age", "age_from_date({dob})"),
        ("unresolved", "{missing} * 2"),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| evaluator.evaluate(black_box(formula), black_box(&values)))
        });
    }
    group.finish();
}

fn bench_long_chain(c: &mut Criterion) {
    let evaluator = DerivationEvaluator::new();
    let values = ValueMap::new();

    let mut group = c.benchmark_group("long_chain");
    for terms in [10, 100, 1000].iter() {
        let formula = vec!["1"; *terms].join(" + ");
        group.bench_with_input(BenchmarkId::from_parameter(terms), &formula, |b, formula| {
            b.iter(|| evaluator.evaluate(black_box(formula), &values))
        });
    }
    group.finish();
}

/// `n` inputs, each feeding one derived field.
fn wide_form(n: u32) -> FormSchema {
    let mut form = FormSchema::create("Wide");
    for i in 0..n {
        let _ = form.add_field(FieldDefinition::new(FieldType::Number, i * 2).with_id(format!("in{}", i)));
        let _ = form.add_field(
            FieldDefinition::new(FieldType::Number, i * 2 + 1)
                .with_id(format!("out{}", i))
                .derived(DerivedLogic::inferred(format!("{{in{}}} * 2", i))),
        );
    }
    form
}

fn bench_set_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_value");
    for (name, config) in [
        ("full", EngineConfig::default()),
        ("selective", EngineConfig::selective()),
    ] {
        let mut session = FormSession::new(config);
        session.load_for_preview(wide_form(50));
        let mut n = 0i64;
        group.bench_function(name, |b| {
            b.iter(|| {
                n += 1;
                black_box(session.set_value("in7", n))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_long_chain, bench_set_value);
criterion_main!(benches);
