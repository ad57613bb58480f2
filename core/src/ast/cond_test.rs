#[cfg(test)]
mod tests {
    use crate::ast::{Clause, If, Node, falls_through};
    use crate::error::ErrorKind;
    use crate::typ::Type;

    fn ret() -> Node {
        Node::ret(Some(Node::literal(1)))
    }

    #[test]
    fn test_zero_clauses_is_structural() {
        let err = If::new(Vec::new(), None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Structural);
        assert_eq!(&*err.who, "cond");
        assert!(Node::cond(Vec::new(), Some(Node::literal(1))).is_err());
    }

    #[test]
    fn test_exit_nodes_do_not_fall_through() {
        assert!(!falls_through(&ret()));
        assert!(!falls_through(&Node::Continue));
        assert!(falls_through(&Node::literal(1)));
        assert!(!falls_through(&Node::seq(vec![Node::literal(1), ret()])));
        assert!(falls_through(&Node::seq(vec![ret(), Node::literal(1)])));
        assert!(falls_through(&Node::seq(Vec::new())));
    }

    #[test]
    fn test_nested_if_needs_every_branch_to_exit() {
        let both = Node::if_else(Node::literal(true), ret(), Some(ret()));
        assert!(!falls_through(&both));

        let no_else = Node::if_else(Node::literal(true), ret(), None);
        assert!(falls_through(&no_else), "missing else falls through");

        let one_side = Node::if_else(Node::literal(true), ret(), Some(Node::literal(2)));
        assert!(falls_through(&one_side));

        let cond = Node::cond(
            vec![Clause::new(Node::literal(true), ret()), Clause::new(Node::literal(false), Node::literal(0))],
            Some(ret()),
        )
        .unwrap();
        assert!(falls_through(&cond), "second clause body falls through");
    }

    #[test]
    fn test_set_else_replaces() {
        let mut node = If::single(Node::literal(true), Node::literal(1), None);
        assert!(node.else_body().is_none());
        assert!(node.set_else(Node::literal(2)).is_none());
        assert_eq!(node.set_else(Node::literal(3)), Some(Node::literal(2)));
        assert_eq!(node.clauses().len(), 1);
    }

    #[test]
    fn test_static_type_joins_branches() {
        let node = Node::if_else(Node::literal(true), Node::literal(1), Some(Node::literal(2.5)));
        assert_eq!(node.static_type(), Type::Float);
        let no_else = Node::if_else(Node::literal(true), Node::literal(1), None);
        assert_eq!(no_else.static_type(), Type::Any);
    }

    #[test]
    fn test_deserialize_rejects_empty_clause_list() {
        let json = r#"{ "If": { "clauses": [] } }"#;
        assert!(serde_json::from_str::<Node>(json).is_err());
        let json = r#"{ "If": { "clauses": [ { "test": { "Literal": { "Bool": true } }, "body": { "Literal": "Nil" } } ] } }"#;
        assert!(matches!(serde_json::from_str::<Node>(json).unwrap(), Node::If(_)));
    }
}
