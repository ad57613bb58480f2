#[cfg(test)]
mod tests {
    use crate::ast::{Clause, Node};
    use crate::binding::{ModuleScope, Variable};
    use crate::builtins;
    use crate::error::{ErrorKind, error_kind};
    use crate::eval::Environment;
    use crate::resolve::Resolver;
    use crate::typ::Type;
    use crate::val::Val;
    use crate::vm::{EmitOptions, InstructionStream, Op, Vm};

    fn ret(v: i64) -> Node {
        Node::ret(Some(Node::literal(v)))
    }

    /// Run `body` interpreted and compiled on separate module scopes.
    fn both(body: Node, options: EmitOptions) -> (Val, ModuleScope, Val, ModuleScope) {
        let mut m1 = ModuleScope::default();
        builtins::install(&mut m1);
        let mut m2 = m1.clone();

        let unit = Resolver::resolve_unit(&m1, body).unwrap();
        let interpreted = unit.evaluate(&mut m1).unwrap();
        let compiled = unit.emit(options).unwrap();
        let mut env = Environment::new(&mut m2, compiled.n_slots);
        let executed = Vm::new().execute(&compiled, &mut env).unwrap();
        (interpreted, m1, executed, m2)
    }

    #[test]
    fn test_return_only_clause_elides_jump() {
        let node = Node::if_else(Node::literal(true), ret(1), None);
        let mut stream = InstructionStream::new(EmitOptions::default());
        node.emit(&mut stream).unwrap();

        assert!(!stream.code().iter().any(|op| matches!(op, Op::Jmp(_))));
        assert_eq!(stream.labels_defined(), 2);
        assert_eq!(stream.labels_marked(), 1, "end label never fixed");
    }

    #[test]
    fn test_all_exits_leave_end_label_unfixed() {
        let node = Node::if_else(Node::literal(true), ret(1), Some(ret(2)));
        let mut stream = InstructionStream::new(EmitOptions::default());
        node.emit(&mut stream).unwrap();

        assert_eq!(stream.code().iter().filter(|op| matches!(op, Op::Jmp(_))).count(), 0);
        assert_eq!(stream.labels_marked(), 1);
        let (a, _, b, _) = both(node, EmitOptions::default());
        assert_eq!((a, b), (Val::Int(1), Val::Int(1)));
    }

    #[test]
    fn test_plain_clause_jumps_to_end() {
        let node = Node::if_else(Node::literal(true), Node::literal(1), None);
        let mut stream = InstructionStream::new(EmitOptions::default());
        node.emit(&mut stream).unwrap();

        let jumps = stream.code().iter().filter(|op| matches!(op, Op::Jmp(_))).count();
        assert_eq!(jumps, 1);
        assert_eq!(stream.labels_marked(), 2, "end label fixed exactly once");
    }

    #[test]
    fn test_disabled_elision_keeps_jump_and_result() {
        let node = Node::if_else(Node::literal(false), ret(1), Some(Node::literal(2)));
        let (a, _, b, _) = both(node.clone(), EmitOptions { branch_elision: false });
        let (c, _, d, _) = both(node, EmitOptions::default());
        assert_eq!(a, Val::Int(2));
        assert_eq!((b, c, d), (Val::Int(2), Val::Int(2), Val::Int(2)));

        let node = Node::if_else(Node::literal(true), ret(1), None);
        let mut stream = InstructionStream::new(EmitOptions { branch_elision: false });
        node.emit(&mut stream).unwrap();
        assert!(stream.code().iter().any(|op| matches!(op, Op::Jmp(_))));
    }

    #[test]
    fn test_nested_if_without_else_keeps_outer_jump() {
        let inner = Node::if_else(Node::literal(true), ret(1), None);
        let outer = Node::if_else(Node::literal(true), inner, Some(Node::literal(3)));
        let mut stream = InstructionStream::new(EmitOptions::default());
        outer.emit(&mut stream).unwrap();
        let jumps = stream.code().iter().filter(|op| matches!(op, Op::Jmp(_))).count();
        assert_eq!(jumps, 1, "only the outer clause jumps");
    }

    #[test]
    fn test_global_assignment_agrees_on_both_paths() {
        let x = Variable::global("x", Type::Any);
        let node = Node::seq(vec![Node::assign(&x, Node::literal(5)).unwrap(), Node::read(&x)]);
        let (a, m1, b, m2) = both(node, EmitOptions::default());
        assert_eq!(a, Val::Int(5));
        assert_eq!(a, b);
        assert_eq!(m1.get("x").unwrap(), m2.get("x").unwrap());
    }

    #[test]
    fn test_if_side_effects_agree() {
        let a = Variable::global("a", Type::Any);
        let b = Variable::global("b", Type::Any);
        let node = Node::if_else(
            Node::literal(true),
            Node::assign(&a, Node::literal(1)).unwrap(),
            Some(Node::assign(&b, Node::literal(2)).unwrap()),
        );
        let (va, m1, vb, m2) = both(node, EmitOptions::default());
        assert_eq!(va, vb);
        for m in [&m1, &m2] {
            assert_eq!(m.get("a").unwrap(), Val::Int(1));
            assert!(!m.contains("b"));
        }
    }

    #[test]
    fn test_cond_locals_temps_and_calls_agree() {
        let n = Variable::local("n", Type::Float);
        let t = Variable::temporary("t", Type::Any);
        let g = Variable::generator_temporary("g", Type::Any);
        let lt = Variable::global("<", Type::Any);
        let plus = Variable::global("+", Type::Any);
        let body = Node::block(
            vec![n.clone(), t.clone(), g.clone()],
            vec![
                Node::assign(&n, Node::literal(4)).unwrap(),
                Node::assign(&t, Node::read(&n)).unwrap(),
                Node::assign(&g, Node::literal(Val::symbol("kept"))).unwrap(),
                Node::cond(
                    vec![
                        Clause::new(
                            Node::call(Node::read(&lt), vec![Node::read(&t), Node::literal(1)]),
                            Node::literal(Val::str("small")),
                        ),
                        Clause::new(
                            Node::call(Node::read(&lt), vec![Node::read(&t), Node::literal(10)]),
                            Node::call(Node::read(&plus), vec![Node::read(&n), Node::literal(1)]),
                        ),
                    ],
                    Some(Node::literal(Val::str("big"))),
                )
                .unwrap(),
            ],
        );
        let (a, _, b, _) = both(body, EmitOptions::default());
        assert_eq!(a, Val::Float(5.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_unassigned_local_agrees() {
        let x = Variable::local("x", Type::Any);
        let body = Node::block(vec![x.clone()], vec![Node::read(&x)]);
        let mut module = ModuleScope::default();
        let unit = Resolver::resolve_unit(&module, body).unwrap();

        let err = unit.evaluate(&mut module).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::UnassignedVariable));

        let compiled = unit.emit(EmitOptions::default()).unwrap();
        let mut env = Environment::new(&mut module, compiled.n_slots);
        let err = Vm::new().execute(&compiled, &mut env).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::UnassignedVariable));
        assert!(err.to_string().contains('x'));
    }

    #[test]
    fn test_emit_unresolved_reference_fails() {
        let x = Variable::global("x", Type::Any);
        let node = Node::assign(&x, Node::literal(1)).unwrap();
        let mut stream = InstructionStream::new(EmitOptions::default());
        let err = node.emit(&mut stream).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Emission));
        assert!(stream.is_empty(), "nothing emitted before the check");
    }

    #[test]
    fn test_coerce_only_for_typed_targets() {
        let module = ModuleScope::default();
        let f = Variable::local("f", Type::Float);
        let a = Variable::local("a", Type::Any);
        let body = Node::block(
            vec![f.clone(), a.clone()],
            vec![Node::assign(&f, Node::literal(1)).unwrap(), Node::assign(&a, Node::literal(1)).unwrap()],
        );
        let unit = Resolver::resolve_unit(&module, body).unwrap();
        let compiled = unit.emit(EmitOptions::default()).unwrap();
        let coerces = compiled.code.iter().filter(|op| matches!(op, Op::Coerce(_))).count();
        assert_eq!(coerces, 1);
        assert!(compiled.to_string().contains("COERCE"));
        assert!(compiled.to_string().contains("STORESLOT 0"));
    }

    #[test]
    fn test_too_many_constants_fails_instead_of_wrapping() {
        let module = ModuleScope::default();
        let body = Node::seq((0..70_000i64).map(Node::literal).collect());
        let unit = Resolver::resolve_unit(&module, body).unwrap();

        let mut scratch = module.clone();
        assert_eq!(unit.evaluate(&mut scratch).unwrap(), Val::Int(69_999));
        let err = unit.emit(EmitOptions::default()).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Emission));
    }

    #[test]
    fn test_too_many_call_arguments_fails_instead_of_wrapping() {
        let mut module = ModuleScope::default();
        builtins::install(&mut module);
        let plus = Variable::global("+", Type::Any);
        let args = vec![Node::literal(1); u16::MAX as usize + 2];
        let unit = Resolver::resolve_unit(&module, Node::call(Node::read(&plus), args)).unwrap();

        assert_eq!(unit.evaluate(&mut module).unwrap(), Val::Int(65_537));
        let err = unit.emit(EmitOptions::default()).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Emission));

        let at_limit = vec![Node::literal(1); u16::MAX as usize];
        let unit = Resolver::resolve_unit(&module, Node::call(Node::read(&plus), at_limit)).unwrap();
        let compiled = unit.emit(EmitOptions::default()).unwrap();
        let mut env = Environment::new(&mut module, compiled.n_slots);
        assert_eq!(Vm::new().execute(&compiled, &mut env).unwrap(), Val::Int(65_535));
    }

    #[test]
    fn test_continue_is_rejected_by_the_vm() {
        let module = ModuleScope::default();
        let unit = Resolver::resolve_unit(&module, Node::Continue).unwrap();
        let compiled = unit.emit(EmitOptions::default()).unwrap();
        let mut module = module;
        let mut env = Environment::new(&mut module, 0);
        let err = Vm::new().execute(&compiled, &mut env).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Structural));
    }
}
