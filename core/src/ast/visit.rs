use crate::ast::Node;

/// Read-only traversal hook.
///
/// `walk` runs before a node's children (return `false` to skip them),
/// `post_walk` after. Children are visited in evaluation order.
pub trait Visitor {
    fn walk(&mut self, _node: &Node) -> bool {
        true
    }

    fn post_walk(&mut self, _node: &Node) {}
}

impl Node {
    /// Pre-order traversal: self, then children left to right.
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        if visitor.walk(self) {
            match self {
                Node::Literal(_) | Node::Read(_) | Node::Continue => {}
                Node::Assign(assign) => assign.value().accept(visitor),
                Node::If(cond) => {
                    for clause in cond.clauses() {
                        clause.test.accept(visitor);
                        clause.body.accept(visitor);
                    }
                    if let Some(otherwise) = cond.else_body() {
                        otherwise.accept(visitor);
                    }
                }
                Node::Block(block) => {
                    for stmt in &block.body {
                        stmt.accept(visitor);
                    }
                }
                Node::Call { callee, args } => {
                    callee.accept(visitor);
                    for arg in args {
                        arg.accept(visitor);
                    }
                }
                Node::Return(value) => {
                    if let Some(v) = value {
                        v.accept(visitor);
                    }
                }
            }
        }
        visitor.post_walk(self);
    }
}
