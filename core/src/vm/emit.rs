use anyhow::Result;
use tracing::{debug, trace};

use crate::ast::{Assign, Block, If, Node, falls_through};
use crate::binding::{StorageKind, StorageLocation, VariableReference};
use crate::error::CoreError;
use crate::typ::Type;
use crate::val::Val;
use crate::vm::{InstructionStream, Op};

impl Node {
    /// Lower the node into `stream`. Every node leaves exactly one value on
    /// the stack unless it exits early.
    pub fn emit(&self, stream: &mut InstructionStream) -> Result<()> {
        match self {
            Node::Literal(v) => {
                let k = stream.k(v.clone())?;
                stream.emit(Op::LoadK(k));
            }
            Node::Read(read) => {
                let reference = read.reference.expect_resolved(&read.variable)?;
                emit_load(stream, reference)?;
            }
            Node::Assign(assign) => assign.emit(stream)?,
            Node::If(cond) => cond.emit(stream)?,
            Node::Block(block) => block.emit(stream)?,
            Node::Call { callee, args } => {
                let argc = u16::try_from(args.len()).map_err(|_| {
                    CoreError::emission("call", format!("{} arguments exceed the operand limit", args.len()))
                })?;
                callee.emit(stream)?;
                for arg in args {
                    arg.emit(stream)?;
                }
                stream.emit(Op::Call(argc));
            }
            Node::Return(value) => {
                match value {
                    Some(v) => v.emit(stream)?,
                    None => emit_unspecified(stream)?,
                }
                stream.emit(Op::Ret);
            }
            Node::Continue => stream.emit(Op::Continue),
        }
        Ok(())
    }
}

impl Assign {
    /// value, coerce, dup, store: the duplicate is the expression's own result.
    fn emit(&self, stream: &mut InstructionStream) -> Result<()> {
        let reference = self.reference().expect_resolved(self.variable())?;
        self.value().emit(stream)?;
        let ty = self.variable().ty();
        if *ty != Type::Any {
            let t = stream.type_index(ty)?;
            stream.emit(Op::Coerce(t));
        }
        stream.emit(Op::Dup);
        emit_store(stream, reference)?;
        Ok(())
    }
}

impl If {
    /// Branch cascade. After each clause body, jump to the shared end label
    /// unless the body never falls through; the end label is only fixed when
    /// some clause jumped to it.
    fn emit(&self, stream: &mut InstructionStream) -> Result<()> {
        let elide = stream.options().branch_elision;
        let end = stream.define_label();
        let mut end_used = false;

        for (idx, clause) in self.clauses().iter().enumerate() {
            let next = stream.define_label();
            clause.test.emit(stream)?;
            stream.emit_branch_false(next);
            clause.body.emit(stream)?;
            if !elide || falls_through(&clause.body) {
                end_used = true;
                stream.emit_jump(end);
            } else {
                debug!(clause = idx, "jump to end of conditional elided");
            }
            stream.mark_label(next)?;
        }

        match self.else_body() {
            Some(otherwise) => otherwise.emit(stream)?,
            None => emit_unspecified(stream)?,
        }

        if end_used {
            stream.mark_label(end)?;
        }
        Ok(())
    }
}

impl Block {
    fn emit(&self, stream: &mut InstructionStream) -> Result<()> {
        if self.body.is_empty() {
            emit_unspecified(stream)?;
        }
        let last = self.body.len().saturating_sub(1);
        for (idx, stmt) in self.body.iter().enumerate() {
            stmt.emit(stream)?;
            if idx < last {
                stream.emit(Op::Pop);
            }
        }
        for local in self.locals.iter().filter(|v| v.kind() == StorageKind::Temporary) {
            let t = stream.temp_index(local)?;
            stream.emit(Op::DropTemp(t));
        }
        Ok(())
    }
}

fn emit_unspecified(stream: &mut InstructionStream) -> Result<(), CoreError> {
    let k = stream.k(Val::Unspecified)?;
    stream.emit(Op::LoadK(k));
    Ok(())
}

fn emit_load(stream: &mut InstructionStream, reference: &VariableReference) -> Result<(), CoreError> {
    trace!(var = %reference.variable, location = %reference.location, "load");
    match &reference.location {
        StorageLocation::Slot(i) => stream.emit(Op::LoadSlot(*i)),
        StorageLocation::Temp(_) => {
            let t = stream.temp_index(&reference.variable)?;
            stream.emit(Op::LoadTemp(t));
        }
        StorageLocation::Global(name) => {
            let k = stream.global_name(name)?;
            stream.emit(Op::LoadGlobal(k));
        }
    }
    Ok(())
}

fn emit_store(stream: &mut InstructionStream, reference: &VariableReference) -> Result<(), CoreError> {
    trace!(var = %reference.variable, location = %reference.location, "store");
    match &reference.location {
        StorageLocation::Slot(i) => stream.emit(Op::StoreSlot(*i)),
        StorageLocation::Temp(_) => {
            let t = stream.temp_index(&reference.variable)?;
            stream.emit(Op::StoreTemp(t));
        }
        StorageLocation::Global(name) => {
            let k = stream.global_name(name)?;
            stream.emit(Op::StoreGlobal(k));
        }
    }
    Ok(())
}
