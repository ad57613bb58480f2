use anyhow::Result;
use tracing::trace;

use crate::binding::Variable;
use crate::error::CoreError;
use crate::eval::Environment;
use crate::val::Val;
use crate::vm::{CompiledUnit, Op};

/// Stack machine for [`CompiledUnit`]s.
#[derive(Debug, Default)]
pub struct Vm {
    stack: Vec<Val>,
}

impl Vm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `unit` in `env` and return the value it produces.
    pub fn execute(&mut self, unit: &CompiledUnit, env: &mut Environment<'_>) -> Result<Val> {
        self.stack.clear();
        let mut pc: usize = 0;

        while let Some(op) = unit.code.get(pc).copied() {
            trace!(pc, op = %op, depth = self.stack.len(), "step");
            pc += 1;
            match op {
                Op::LoadK(k) => {
                    let v = unit
                        .consts
                        .get(k as usize)
                        .cloned()
                        .ok_or_else(|| CoreError::emission("vm", format!("constant {} out of range", k)))?;
                    self.stack.push(v);
                }
                Op::Dup => {
                    let top = self.peek()?.clone();
                    self.stack.push(top);
                }
                Op::Pop => {
                    self.pop()?;
                }
                Op::LoadSlot(s) => match env.load_slot(s) {
                    Some(Some(v)) => self.stack.push(v.clone()),
                    Some(None) => return Err(CoreError::unassigned(unit.slot_name(s)).into()),
                    None => return Err(Self::bad_slot(s).into()),
                },
                Op::StoreSlot(s) => {
                    let v = self.pop()?;
                    if !env.store_slot(s, v) {
                        return Err(Self::bad_slot(s).into());
                    }
                }
                Op::LoadTemp(t) => {
                    let var = Self::temp_var(unit, t)?;
                    let v = env
                        .temp(var.id())
                        .cloned()
                        .ok_or_else(|| CoreError::unassigned(var.name().clone()))?;
                    self.stack.push(v);
                }
                Op::StoreTemp(t) => {
                    let var = Self::temp_var(unit, t)?;
                    let v = self.pop()?;
                    env.set_temp(var.id(), var.kind(), v);
                }
                Op::DropTemp(t) => {
                    let var = Self::temp_var(unit, t)?;
                    env.drop_temp(var.id());
                }
                Op::LoadGlobal(k) => {
                    let name = unit.global_name(k)?;
                    let v = env.module().get(name)?;
                    self.stack.push(v);
                }
                Op::StoreGlobal(k) => {
                    let name = unit.global_name(k)?;
                    let v = self.pop()?;
                    env.module_mut().set(name, v);
                }
                Op::Coerce(t) => {
                    let ty = unit
                        .types
                        .get(t as usize)
                        .ok_or_else(|| CoreError::emission("vm", format!("type {} out of range", t)))?;
                    let v = self.pop()?;
                    self.stack.push(ty.coerce(v, "set!")?);
                }
                Op::Jmp(ofs) => pc = Self::target(pc - 1, ofs, unit.code.len())?,
                Op::JmpFalse(ofs) => {
                    if !self.pop()?.is_true() {
                        pc = Self::target(pc - 1, ofs, unit.code.len())?;
                    }
                }
                Op::Call(argc) => {
                    let argc = argc as usize;
                    if self.stack.len() < argc + 1 {
                        return Err(Self::underflow().into());
                    }
                    let args = self.stack.split_off(self.stack.len() - argc);
                    match self.pop()? {
                        Val::Builtin(builtin) => {
                            trace!(builtin = %builtin.name, argc, "call");
                            let v = builtin.invoke(&args, env.module_mut())?;
                            self.stack.push(v);
                        }
                        other => {
                            return Err(CoreError::type_error("apply", format!("{} is not a procedure", other)).into());
                        }
                    }
                }
                Op::Ret => return Ok(self.pop()?),
                Op::Continue => {
                    return Err(CoreError::structural("continue", "continue outside of loop").into());
                }
            }
        }

        Ok(self.stack.pop().unwrap_or_default())
    }

    fn pop(&mut self) -> Result<Val, CoreError> {
        self.stack.pop().ok_or_else(Self::underflow)
    }

    fn peek(&self) -> Result<&Val, CoreError> {
        self.stack.last().ok_or_else(Self::underflow)
    }

    fn temp_var(unit: &CompiledUnit, t: u16) -> Result<&Variable, CoreError> {
        unit.temps
            .get(t as usize)
            .ok_or_else(|| CoreError::emission("vm", format!("temporary {} out of range", t)))
    }

    fn target(at: usize, ofs: i32, len: usize) -> Result<usize, CoreError> {
        let to = at as i64 + ofs as i64;
        if to < 0 || to as usize > len {
            return Err(CoreError::emission("vm", format!("jump from {} lands outside the code at {}", at, to)));
        }
        Ok(to as usize)
    }

    fn underflow() -> CoreError {
        CoreError::emission("vm", "operand stack underflow")
    }

    fn bad_slot(s: u16) -> CoreError {
        CoreError::structural("vm", format!("slot {} is outside the frame", s))
    }
}
