use criterion::{Criterion, criterion_group, criterion_main};
use skem_core::ast::{Clause, Node};
use skem_core::binding::Variable;
use skem_core::typ::Type;
use skem_core::{ExecMode, Session};
use std::hint::black_box;

fn make_body() -> Node {
    // (begin (set! n 0.0) (cond ((< n 1) (set! n (+ n 1))) (else (return n))) n)
    let n = Variable::local("n", Type::Float);
    let lt = Variable::global("<", Type::Any);
    let plus = Variable::global("+", Type::Any);
    Node::block(
        vec![n.clone()],
        vec![
            Node::assign(&n, Node::literal(0.0)).unwrap(),
            Node::cond(
                vec![Clause::new(
                    Node::call(Node::read(&lt), vec![Node::read(&n), Node::literal(1)]),
                    Node::assign(&n, Node::call(Node::read(&plus), vec![Node::read(&n), Node::literal(1)])).unwrap(),
                )],
                Some(Node::ret(Some(Node::read(&n)))),
            )
            .unwrap(),
            Node::read(&n),
        ],
    )
}

fn eval_vs_emit(c: &mut Criterion) {
    let mut session = Session::default();
    let unit = session.resolve(make_body()).unwrap();
    let compiled = session.compile(&unit).unwrap();

    c.bench_function("interpret_unit", |b| {
        b.iter(|| black_box(session.interpret(&unit).unwrap()))
    });

    c.bench_function("execute_compiled_unit", |b| {
        b.iter(|| black_box(session.execute(&compiled).unwrap()))
    });

    c.bench_function("resolve_and_run_both", |b| {
        b.iter(|| black_box(session.run(make_body(), ExecMode::Both).unwrap()))
    });
}

criterion_group!(benches, eval_vs_emit);
criterion_main!(benches);
