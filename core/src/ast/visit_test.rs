#[cfg(test)]
mod tests {
    use crate::ast::{Node, VariableUses, Visitor};
    use crate::binding::Variable;
    use crate::typ::Type;

    #[derive(Default)]
    struct Trace {
        events: Vec<String>,
        skip_assign_children: bool,
    }

    impl Visitor for Trace {
        fn walk(&mut self, node: &Node) -> bool {
            self.events.push(format!("walk {}", node.kind_name()));
            !(self.skip_assign_children && matches!(node, Node::Assign(_)))
        }

        fn post_walk(&mut self, node: &Node) {
            self.events.push(format!("post {}", node.kind_name()));
        }
    }

    fn sample() -> (Variable, Node) {
        let x = Variable::global("x", Type::Any);
        let node = Node::assign(&x, Node::if_else(Node::read(&x), Node::literal(1), None)).unwrap();
        (x, node)
    }

    #[test]
    fn test_walk_then_children_then_post_walk() {
        let (_, node) = sample();
        let mut trace = Trace::default();
        node.accept(&mut trace);
        assert_eq!(
            trace.events,
            vec![
                "walk set!", "walk if", "walk read", "post read", "walk literal", "post literal", "post if",
                "post set!",
            ]
        );
    }

    #[test]
    fn test_false_from_walk_skips_children_but_not_post_walk() {
        let (_, node) = sample();
        let mut trace = Trace {
            skip_assign_children: true,
            ..Trace::default()
        };
        node.accept(&mut trace);
        assert_eq!(trace.events, vec!["walk set!", "post set!"]);
    }

    #[test]
    fn test_variable_uses() {
        let (x, node) = sample();
        let y = Variable::global("y", Type::Any);
        let uses = VariableUses::collect(&node);
        let count = uses.get(&x);
        assert_eq!((count.reads, count.writes), (1, 1));
        assert_eq!(uses.get(&y).reads, 0);
        assert_eq!(uses.iter().count(), 1);
    }
}
