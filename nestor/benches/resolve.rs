#![allow(dead_code)]

use criterion::{criterion_group, criterion_main, Criterion};
use nestor::{Builder, CompiledInjector, Container, Describe, Inject, Injectable, Injector, Lifetime, ReflectionInjector};
use std::sync::Arc;

struct A(Arc<B>, Arc<C>);
struct B(i32);
struct C(Arc<CA>);
struct CA(Arc<CAA>);
struct CAA(Arc<CAAA>);
struct CAAA;

impl Injectable for A {
    fn describe(ty: &mut Describe<Self>) {
        ty.constructor(|Inject(b): Inject<B>, Inject(c): Inject<C>| A(b, c));
    }
}

impl Injectable for B {
    fn describe(ty: &mut Describe<Self>) {
        ty.constructor(|| B(2));
    }
}

impl Injectable for C {
    fn describe(ty: &mut Describe<Self>) {
        ty.constructor(|Inject(ca): Inject<CA>| C(ca));
    }
}

impl Injectable for CA {
    fn describe(ty: &mut Describe<Self>) {
        ty.constructor(|Inject(caa): Inject<CAA>| CA(caa));
    }
}

impl Injectable for CAA {
    fn describe(ty: &mut Describe<Self>) {
        ty.constructor(|Inject(caaa): Inject<CAAA>| CAA(caaa));
    }
}

impl Injectable for CAAA {
    fn describe(ty: &mut Describe<Self>) {
        ty.constructor(|| CAAA);
    }
}

fn container(injector: Arc<dyn Injector>, lifetime: Lifetime) -> Container {
    Builder::with_injector(injector)
        .register_self::<A>(lifetime)
        .register_self::<B>(lifetime)
        .register_self::<C>(lifetime)
        .register_self::<CA>(lifetime)
        .register_self::<CAA>(lifetime)
        .register_self::<CAAA>(lifetime)
        .build()
        .unwrap()
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("reflection_get_transient_many", |b| {
        let container = container(Arc::new(ReflectionInjector::new()), Lifetime::Transient);
        b.iter(|| container.get::<A>().unwrap());
    })
    .bench_function("compiled_get_transient_many", |b| {
        let container = container(Arc::new(CompiledInjector::new()), Lifetime::Transient);
        b.iter(|| container.get::<A>().unwrap());
    })
    .bench_function("get_singleton_many", |b| {
        let container = container(Arc::new(CompiledInjector::new()), Lifetime::Singleton);
        b.iter(|| container.get::<A>().unwrap());
    })
    .bench_function("get_scoped_in_new_scope", |b| {
        let container = container(Arc::new(CompiledInjector::new()), Lifetime::Scoped);
        b.iter(|| {
            let scope = container.create_scope().unwrap();
            scope.get::<A>().unwrap()
        });
    })
    .bench_function("build_root", |b| {
        b.iter(|| container(Arc::new(ReflectionInjector::new()), Lifetime::Singleton));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
