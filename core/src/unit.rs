//! A resolved compilation unit, ready to interpret or lower.

use anyhow::Result;
use tracing::debug;

use crate::ast::{Node, UnresolvedReferences};
use crate::binding::ModuleScope;
use crate::error::CoreError;
use crate::eval::Environment;
use crate::resolve::FrameLayout;
use crate::val::Val;
use crate::vm::{CompiledUnit, EmitOptions, InstructionStream};

#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    body: Node,
    layout: FrameLayout,
}

impl Unit {
    pub fn new(body: Node, layout: FrameLayout) -> Self {
        Self { body, layout }
    }

    pub fn body(&self) -> &Node {
        &self.body
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    /// Interpret the unit in a fresh frame.
    pub fn evaluate(&self, module: &mut ModuleScope) -> Result<Val> {
        let mut env = Environment::new(module, self.layout.total_slots);
        self.body.evaluate(&mut env)
    }

    /// Lower the unit. Unresolved references are reported before any code is emitted.
    pub fn emit(&self, options: EmitOptions) -> Result<CompiledUnit> {
        let unresolved = UnresolvedReferences::collect(&self.body);
        if let Some(first) = unresolved.variables.first() {
            return Err(CoreError::emission(
                first.name().clone(),
                format!("{} reference(s) were never resolved, first {}", unresolved.variables.len(), first),
            )
            .into());
        }

        let mut stream = InstructionStream::new(options);
        self.body.emit(&mut stream)?;
        debug!(
            ops = stream.len(),
            labels = stream.labels_defined(),
            fixed = stream.labels_marked(),
            "unit emitted"
        );
        Ok(stream.finish(&self.layout)?)
    }
}
