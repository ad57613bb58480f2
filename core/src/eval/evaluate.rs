use anyhow::Result;
use tracing::trace;

use crate::ast::{Assign, Block, If, Node};
use crate::binding::StorageKind;
use crate::error::CoreError;
use crate::eval::Environment;
use crate::val::Val;

/// Outcome of executing a node: a value, or an early exit still unwinding.
#[derive(Debug)]
enum Flow {
    Value(Val),
    Return(Val),
    Continue,
}

/// Unwrap a plain value, or pass an early exit up to the caller.
macro_rules! value {
    ($flow:expr) => {
        match $flow {
            Flow::Value(v) => v,
            other => return Ok(other),
        }
    };
}

impl Node {
    /// Evaluate the tree directly against `env`.
    ///
    /// A `return` anywhere in the tree ends evaluation with its value.
    pub fn evaluate(&self, env: &mut Environment<'_>) -> Result<Val> {
        match self.exec(env)? {
            Flow::Value(v) | Flow::Return(v) => Ok(v),
            Flow::Continue => Err(CoreError::structural("continue", "continue outside of loop").into()),
        }
    }

    fn exec(&self, env: &mut Environment<'_>) -> Result<Flow> {
        match self {
            Node::Literal(v) => Ok(Flow::Value(v.clone())),
            Node::Read(read) => Ok(Flow::Value(env.load(&read.variable, read.reference.get())?)),
            Node::Assign(assign) => assign.exec(env),
            Node::If(cond) => cond.exec(env),
            Node::Block(block) => {
                let flow = block.exec_body(env);
                for local in &block.locals {
                    if local.kind() == StorageKind::Temporary {
                        env.drop_temp(local.id());
                    }
                }
                flow
            }
            Node::Call { callee, args } => {
                let callee = value!(callee.exec(env)?);
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(value!(arg.exec(env)?));
                }
                match callee {
                    Val::Builtin(builtin) => {
                        trace!(builtin = %builtin.name, argc = values.len(), "call");
                        Ok(Flow::Value(builtin.invoke(&values, env.module_mut())?))
                    }
                    other => Err(CoreError::type_error("apply", format!("{} is not a procedure", other)).into()),
                }
            }
            Node::Return(value) => {
                let v = match value {
                    Some(node) => value!(node.exec(env)?),
                    None => Val::Unspecified,
                };
                Ok(Flow::Return(v))
            }
            Node::Continue => Ok(Flow::Continue),
        }
    }
}

impl Assign {
    fn exec(&self, env: &mut Environment<'_>) -> Result<Flow> {
        let value = value!(self.value().exec(env)?);
        // Same coercion the emitted `Coerce` instruction applies.
        let value = self.variable().ty().coerce(value, "set!")?;
        env.store(self.variable(), self.reference().get(), value.clone())?;
        trace!(var = %self.variable(), definition = self.is_definition(), "assigned");
        Ok(Flow::Value(value))
    }
}

impl If {
    fn exec(&self, env: &mut Environment<'_>) -> Result<Flow> {
        for (idx, clause) in self.clauses().iter().enumerate() {
            let test = value!(clause.test.exec(env)?);
            if test.is_true() {
                trace!(clause = idx, "cond clause taken");
                return clause.body.exec(env);
            }
        }
        match self.else_body() {
            Some(otherwise) => otherwise.exec(env),
            None => Ok(Flow::Value(Val::Unspecified)),
        }
    }
}

impl Block {
    fn exec_body(&self, env: &mut Environment<'_>) -> Result<Flow> {
        let mut last = Val::Unspecified;
        for stmt in &self.body {
            last = value!(stmt.exec(env)?);
        }
        Ok(Flow::Value(last))
    }
}
