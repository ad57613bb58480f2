use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::binding::{StorageLocation, VarId, Variable};
use crate::error::CoreError;
use crate::resolve::FrameLayout;
use crate::typ::Type;
use crate::util::fast_map::FastHashMap;
use crate::val::Val;
use crate::vm::{CompiledUnit, Op};

/// Branch target. Defined first, fixed to a position at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(u32);

impl Label {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Emitter switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitOptions {
    /// Skip the jump to a conditional's end after clauses that never fall through.
    pub branch_elision: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self { branch_elision: true }
    }
}

/// Hashable identity of a constant. Floats are keyed by their bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstKey {
    Unspecified,
    Nil,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(Arc<str>),
    Symbol(Arc<str>),
    Builtin(Arc<str>),
}

impl From<&Val> for ConstKey {
    fn from(v: &Val) -> Self {
        match v {
            Val::Unspecified => ConstKey::Unspecified,
            Val::Nil => ConstKey::Nil,
            Val::Bool(b) => ConstKey::Bool(*b),
            Val::Int(i) => ConstKey::Int(*i),
            Val::Float(f) => ConstKey::Float(f.to_bits()),
            Val::Str(s) => ConstKey::Str(s.clone()),
            Val::Symbol(s) => ConstKey::Symbol(s.clone()),
            Val::Builtin(b) => ConstKey::Builtin(b.name.clone()),
        }
    }
}

/// Index of the next entry in a pool of `len` entries, if it still fits an operand.
fn pool_index(len: usize, pool: &str) -> Result<u16, CoreError> {
    u16::try_from(len).map_err(|_| {
        CoreError::emission(
            "emit",
            format!("{} pool exceeds {} entries", pool, u16::MAX as usize + 1),
        )
    })
}

/// Append-only instruction stream for one unit.
#[derive(Debug, Default)]
pub struct InstructionStream {
    options: EmitOptions,
    code: Vec<Op>,
    consts: Vec<Val>,
    const_ids: FastHashMap<ConstKey, u16>,
    types: Vec<Type>,
    type_ids: FastHashMap<Type, u16>,
    temps: Vec<Variable>,
    temp_ids: FastHashMap<VarId, u16>,
    /// Position of each label, once fixed.
    labels: Vec<Option<usize>>,
    /// Jump instructions waiting for their label's position.
    fixups: Vec<(usize, Label)>,
}

impl InstructionStream {
    pub fn new(options: EmitOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> EmitOptions {
        self.options
    }

    pub fn code(&self) -> &[Op] {
        &self.code
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn emit(&mut self, op: Op) {
        self.code.push(op);
    }

    pub fn define_label(&mut self) -> Label {
        self.labels.push(None);
        Label((self.labels.len() - 1) as u32)
    }

    /// Fix `label` at the current position. Fixing twice is an error.
    pub fn mark_label(&mut self, label: Label) -> Result<(), CoreError> {
        let here = self.code.len();
        let Some(slot) = self.labels.get_mut(label.index()) else {
            return Err(CoreError::emission(
                "mark-label",
                format!("label L{} was not defined by this stream", label.0),
            ));
        };
        if let Some(at) = *slot {
            return Err(CoreError::emission(
                "mark-label",
                format!("label L{} already fixed at {}", label.0, at),
            ));
        }
        *slot = Some(here);
        Ok(())
    }

    pub fn is_marked(&self, label: Label) -> bool {
        matches!(self.labels.get(label.index()), Some(Some(_)))
    }

    pub fn labels_defined(&self) -> usize {
        self.labels.len()
    }

    pub fn labels_marked(&self) -> usize {
        self.labels.iter().filter(|l| l.is_some()).count()
    }

    pub fn emit_jump(&mut self, label: Label) {
        self.fixups.push((self.code.len(), label));
        self.emit(Op::Jmp(0));
    }

    pub fn emit_branch_false(&mut self, label: Label) {
        self.fixups.push((self.code.len(), label));
        self.emit(Op::JmpFalse(0));
    }

    /// Constant pool index, reusing an equal constant.
    pub fn k(&mut self, v: Val) -> Result<u16, CoreError> {
        let key = ConstKey::from(&v);
        if let Some(&i) = self.const_ids.get(&key) {
            return Ok(i);
        }
        let i = pool_index(self.consts.len(), "constant")?;
        self.consts.push(v);
        self.const_ids.insert(key, i);
        Ok(i)
    }

    pub fn global_name(&mut self, name: &Arc<str>) -> Result<u16, CoreError> {
        self.k(Val::Symbol(name.clone()))
    }

    pub fn type_index(&mut self, ty: &Type) -> Result<u16, CoreError> {
        if let Some(&i) = self.type_ids.get(ty) {
            return Ok(i);
        }
        let i = pool_index(self.types.len(), "type")?;
        self.types.push(ty.clone());
        self.type_ids.insert(ty.clone(), i);
        Ok(i)
    }

    pub fn temp_index(&mut self, variable: &Variable) -> Result<u16, CoreError> {
        if let Some(&i) = self.temp_ids.get(&variable.id()) {
            return Ok(i);
        }
        let i = pool_index(self.temps.len(), "temporary")?;
        self.temps.push(variable.clone());
        self.temp_ids.insert(variable.id(), i);
        Ok(i)
    }

    /// Patch jumps into relative offsets. Any jump to a never-fixed label fails.
    pub fn finish(mut self, layout: &FrameLayout) -> Result<CompiledUnit, CoreError> {
        for (pos, label) in std::mem::take(&mut self.fixups) {
            let target = self.labels.get(label.index()).copied().flatten().ok_or_else(|| {
                CoreError::emission("finish", format!("jump at {} targets label L{} which was never fixed", pos, label.0))
            })?;
            let ofs = i32::try_from(target as i64 - pos as i64).map_err(|_| {
                CoreError::emission("finish", format!("jump at {} is too far from its target", pos))
            })?;
            match self.code.get_mut(pos) {
                Some(Op::Jmp(o)) | Some(Op::JmpFalse(o)) => *o = ofs,
                _ => {
                    return Err(CoreError::emission(
                        "finish",
                        format!("fix-up at {} is not a jump", pos),
                    ));
                }
            }
        }

        let mut slot_names: Vec<Arc<str>> = vec![Arc::from("?"); layout.total_slots as usize];
        for decl in &layout.decls {
            if let StorageLocation::Slot(i) = decl.location
                && let Some(name) = slot_names.get_mut(i as usize)
            {
                *name = decl.variable.name().clone();
            }
        }

        Ok(CompiledUnit {
            consts: self.consts,
            types: self.types,
            temps: self.temps,
            code: self.code,
            slot_names,
            n_slots: layout.total_slots,
        })
    }
}
