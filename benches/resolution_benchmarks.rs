//! Benchmarks for overload resolution and template instantiation.
//!
//! - Overload sets of growing size with a single best candidate
//! - Class template instantiation, cold and cached
//! - Built-in operator resolution
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sema::{
    ExprInfo, FunctionEntry, OperatorKind, PrimitiveKind, RecordEntry, Sema, TemplateArg, TemplateEntry,
    TemplateParam, Type, TypeHash,
};
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// `f(int)` plus `n - 1` overloads taking unrelated classes.
fn overload_set(n: usize) -> Sema {
    let mut sema = Sema::new();
    sema.register_function(FunctionEntry::free("f", vec![Type::int()], Type::void()))
        .unwrap();
    for i in 1..n {
        let rec = RecordEntry::class(format!("C{i}"));
        let ty = rec.as_type();
        sema.register_record(rec).unwrap();
        sema.register_function(FunctionEntry::free("f", vec![Type::reference_to(ty.with_const())], Type::void()))
            .unwrap();
    }
    sema
}

fn box_template(sema: &mut Sema) {
    let owner = TypeHash::from_template("Box");
    sema.register_template(TemplateEntry::class("Box", vec![TemplateParam::type_param(owner, 0, "T")]))
        .unwrap();
}

fn overload_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("overload/set_size");

    for n in [2usize, 8, 32, 128] {
        let mut sema = overload_set(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let call = sema
                    .resolve_call("f", vec![black_box(ExprInfo::rvalue(Type::prim(PrimitiveKind::Short)))])
                    .unwrap();
                end_profiling_frame();
                black_box(call.func_hash)
            });
        });
    }

    group.finish();
}

fn instantiation_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("template/instantiate");

    group.bench_function("cold", |b| {
        b.iter_batched(
            || {
                let mut sema = Sema::new();
                box_template(&mut sema);
                sema
            },
            |mut sema| {
                let inst = sema
                    .instantiate_class("Box", vec![TemplateArg::Type(Type::int())])
                    .unwrap();
                end_profiling_frame();
                black_box(inst.hash)
            },
            criterion::BatchSize::SmallInput,
        );
    });

    let mut sema = Sema::new();
    box_template(&mut sema);
    sema.instantiate_class("Box", vec![TemplateArg::Type(Type::int())])
        .unwrap();
    group.bench_function("cached", |b| {
        b.iter(|| {
            let inst = sema
                .instantiate_class("Box", black_box(vec![TemplateArg::Type(Type::int())]))
                .unwrap();
            end_profiling_frame();
            black_box(inst.hash)
        });
    });

    group.finish();
}

fn operator_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("operators/builtin");
    let mut sema = Sema::new();

    let cases = [
        ("add_int_double", OperatorKind::Add, Type::int(), Type::double()),
        ("less_char_long", OperatorKind::Less, Type::prim(PrimitiveKind::Char), Type::prim(PrimitiveKind::Long)),
        ("pointer_plus_int", OperatorKind::Add, Type::pointer_to(Type::int()), Type::int()),
    ];
    for (name, op, lhs, rhs) in cases {
        let operands = [ExprInfo::rvalue(lhs), ExprInfo::rvalue(rhs)];
        group.bench_function(name, |b| {
            b.iter(|| {
                let call = sema.resolve_operator(op, black_box(&operands)).unwrap();
                end_profiling_frame();
                black_box(call.func_hash)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, overload_benchmarks, instantiation_benchmarks, operator_benchmarks);
criterion_main!(benches);
