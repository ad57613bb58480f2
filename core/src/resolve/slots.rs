//! Binding pass: assigns storage to block locals and resolves every use-site.
//!
//! Locals of a unit share one flat slot index space in declaration order,
//! temporaries are keyed by identity, and globals by name. Each `Read` and
//! `Assign` reference is bound exactly once; running the pass over an
//! already-resolved tree fails.

use tracing::debug;

use crate::ast::Node;
use crate::binding::{ModuleScope, Scope, StorageKind, StorageLocation, Variable};
use crate::error::CoreError;
use crate::unit::Unit;

/// A declared block local and where it was placed.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub variable: Variable,
    pub location: StorageLocation,
    /// Block nesting depth at declaration time (1 = outermost block).
    pub block_depth: u16,
}

/// Storage layout of one compiled unit's frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameLayout {
    /// Declarations in allocation order.
    pub decls: Vec<Decl>,
    /// Number of frame slots needed by `Local` variables.
    pub total_slots: u16,
}

impl FrameLayout {
    pub fn slot_of(&self, variable: &Variable) -> Option<u16> {
        self.decls.iter().find_map(|d| match d.location {
            StorageLocation::Slot(i) if d.variable == *variable => Some(i),
            _ => None,
        })
    }
}

#[derive(Debug)]
pub struct Resolver<'m> {
    module: &'m ModuleScope,
    next_slot: u16,
    decls: Vec<Decl>,
}

impl<'m> Resolver<'m> {
    pub fn new(module: &'m ModuleScope) -> Self {
        Self {
            module,
            next_slot: 0,
            decls: Vec::new(),
        }
    }

    /// Resolve `body` as a compilation unit against `module`.
    ///
    /// A root that is not a block is wrapped in one, so every unit carries a
    /// resolved block and a second pass over it always fails.
    pub fn resolve_unit(module: &ModuleScope, body: Node) -> Result<Unit, CoreError> {
        let mut body = match body {
            Node::Block(_) => body,
            other => Node::seq(vec![other]),
        };
        let mut resolver = Resolver::new(module);
        let root = Scope::root(module);
        resolver.resolve_node(&mut body, &root)?;
        let layout = resolver.finish();
        debug!(
            module = module.name(),
            slots = layout.total_slots,
            decls = layout.decls.len(),
            "unit resolved"
        );
        Ok(Unit::new(body, layout))
    }

    pub fn finish(self) -> FrameLayout {
        FrameLayout {
            decls: self.decls,
            total_slots: self.next_slot,
        }
    }

    fn alloc_slot(&mut self, variable: &Variable) -> Result<u16, CoreError> {
        let idx = self.next_slot;
        self.next_slot = idx.checked_add(1).ok_or_else(|| {
            CoreError::structural(variable.name().clone(), "too many locals in one unit")
        })?;
        Ok(idx)
    }

    pub fn resolve_node(&mut self, node: &mut Node, scope: &Scope<'_>) -> Result<(), CoreError> {
        match node {
            Node::Literal(_) | Node::Continue => Ok(()),
            Node::Read(read) => {
                let reference = scope.resolve(&read.variable)?;
                read.reference.bind(reference)
            }
            Node::Assign(assign) => {
                let reference = scope.resolve(assign.variable())?;
                assign.bind(reference)?;
                self.resolve_node(assign.value_mut(), scope)
            }
            Node::If(cond) => {
                for clause in cond.clauses_mut() {
                    self.resolve_node(&mut clause.test, scope)?;
                    self.resolve_node(&mut clause.body, scope)?;
                }
                if let Some(otherwise) = cond.else_body_mut() {
                    self.resolve_node(otherwise, scope)?;
                }
                Ok(())
            }
            Node::Block(block) => {
                if block.resolved {
                    return Err(CoreError::structural("begin", "block is already resolved"));
                }
                block.resolved = true;
                let mut inner = scope.child();
                let block_depth = inner.depth() as u16;
                for variable in &block.locals {
                    if inner.binds_locally(variable.name()) {
                        return Err(CoreError::structural(
                            variable.name().clone(),
                            "duplicate binding in one block",
                        ));
                    }
                    let location = match variable.kind() {
                        StorageKind::Local => StorageLocation::Slot(self.alloc_slot(variable)?),
                        StorageKind::Temporary | StorageKind::GeneratorTemporary => {
                            StorageLocation::Temp(variable.id())
                        }
                        StorageKind::Global => StorageLocation::Global(variable.name().clone()),
                    };
                    self.decls.push(Decl {
                        variable: variable.clone(),
                        location: location.clone(),
                        block_depth,
                    });
                    inner.define(variable.clone(), location);
                }
                for stmt in &mut block.body {
                    self.resolve_node(stmt, &inner)?;
                }
                Ok(())
            }
            Node::Call { callee, args } => {
                self.resolve_node(callee, scope)?;
                for arg in args {
                    self.resolve_node(arg, scope)?;
                }
                Ok(())
            }
            Node::Return(value) => match value {
                Some(v) => self.resolve_node(v, scope),
                None => Ok(()),
            },
        }
    }
}
