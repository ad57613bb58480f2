use std::fmt;
use std::sync::Arc;

use crate::binding::Variable;
use crate::error::CoreError;
use crate::typ::Type;
use crate::val::Val;

/// Stack-machine instruction. Stores consume the top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    LoadK(u16 /*kidx*/),
    Dup,
    Pop,
    LoadSlot(u16 /*slot*/),
    StoreSlot(u16 /*slot*/),
    LoadTemp(u16 /*temp idx*/),
    StoreTemp(u16 /*temp idx*/),
    // End of the declaring block; ordinary temporaries only
    DropTemp(u16 /*temp idx*/),
    LoadGlobal(u16 /*kidx of name*/),
    StoreGlobal(u16 /*kidx of name*/),
    // Apply declared-type coercion to the top of the stack
    Coerce(u16 /*type idx*/),
    Jmp(i32 /*ofs*/),
    // Pops the test; jumps when it is #f
    JmpFalse(i32 /*ofs*/),
    Call(u16 /*argc*/),
    Ret,
    Continue,
}

/// Finished, label-free instruction list of one unit.
#[derive(Debug, Clone, Default)]
pub struct CompiledUnit {
    pub consts: Vec<Val>,
    pub types: Vec<Type>,
    pub temps: Vec<Variable>,
    pub code: Vec<Op>,
    /// Name of the local living in each slot, for diagnostics.
    pub slot_names: Vec<Arc<str>>,
    pub n_slots: u16,
}

impl CompiledUnit {
    pub fn slot_name(&self, slot: u16) -> Arc<str> {
        self.slot_names
            .get(slot as usize)
            .cloned()
            .unwrap_or_else(|| Arc::from(format!("slot{}", slot)))
    }

    pub(crate) fn global_name(&self, kidx: u16) -> Result<&Arc<str>, CoreError> {
        match self.consts.get(kidx as usize) {
            Some(Val::Symbol(name)) => Ok(name),
            _ => Err(CoreError::emission("vm", format!("constant {} is not a global name", kidx))),
        }
    }

    /// Jump instructions in the code (used to check elision).
    pub fn jump_count(&self) -> usize {
        self.code.iter().filter(|op| matches!(op, Op::Jmp(_))).count()
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::LoadK(k) => write!(f, "LOADK {}", k),
            Op::Dup => write!(f, "DUP"),
            Op::Pop => write!(f, "POP"),
            Op::LoadSlot(s) => write!(f, "LOADSLOT {}", s),
            Op::StoreSlot(s) => write!(f, "STORESLOT {}", s),
            Op::LoadTemp(t) => write!(f, "LOADTEMP {}", t),
            Op::StoreTemp(t) => write!(f, "STORETEMP {}", t),
            Op::DropTemp(t) => write!(f, "DROPTEMP {}", t),
            Op::LoadGlobal(k) => write!(f, "LOADGLOBAL {}", k),
            Op::StoreGlobal(k) => write!(f, "STOREGLOBAL {}", k),
            Op::Coerce(t) => write!(f, "COERCE {}", t),
            Op::Jmp(ofs) => write!(f, "JMP {:+}", ofs),
            Op::JmpFalse(ofs) => write!(f, "JMPF {:+}", ofs),
            Op::Call(argc) => write!(f, "CALL {}", argc),
            Op::Ret => write!(f, "RET"),
            Op::Continue => write!(f, "CONTINUE"),
        }
    }
}

impl fmt::Display for CompiledUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "; {} slots, {} consts, {} temps",
            self.n_slots,
            self.consts.len(),
            self.temps.len()
        )?;
        for (pc, op) in self.code.iter().enumerate() {
            let note = match op {
                Op::LoadK(k) | Op::LoadGlobal(k) | Op::StoreGlobal(k) => {
                    self.consts.get(*k as usize).map(|v| v.to_string())
                }
                Op::LoadSlot(s) | Op::StoreSlot(s) => Some(self.slot_name(*s).to_string()),
                Op::LoadTemp(t) | Op::StoreTemp(t) | Op::DropTemp(t) => {
                    self.temps.get(*t as usize).map(|v| v.to_string())
                }
                Op::Coerce(t) => self.types.get(*t as usize).map(|t| t.to_string()),
                Op::Jmp(ofs) | Op::JmpFalse(ofs) => Some(format!("-> {:04}", pc as i64 + *ofs as i64)),
                _ => None,
            };
            let text = op.to_string();
            match note {
                Some(note) => writeln!(f, "{:04}  {:<16} ; {}", pc, text, note)?,
                None => writeln!(f, "{:04}  {}", pc, text)?,
            }
        }
        Ok(())
    }
}
