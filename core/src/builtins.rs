//! Native procedures seeded into a module scope.

use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;

use crate::binding::ModuleScope;
use crate::error::CoreError;
use crate::typ::{NumericClass, NumericHierarchy};
use crate::val::{Arity, Builtin, Val};

static BUILTINS: Lazy<Vec<Builtin>> = Lazy::new(|| {
    vec![
        Builtin::new("+", Arity::AtLeast(0), add),
        Builtin::new("-", Arity::AtLeast(1), sub),
        Builtin::new("*", Arity::AtLeast(0), mul),
        Builtin::new("<", Arity::Exact(2), less),
        Builtin::new("=", Arity::Exact(2), num_eq),
        Builtin::new("not", Arity::Exact(1), not),
        Builtin::new("void", Arity::AtLeast(0), void),
        Builtin::new("symbol-value", Arity::Exact(1), symbol_value),
        Builtin::new("set-symbol-value!", Arity::Exact(2), set_symbol_value),
        Builtin::new("defined?", Arity::Exact(1), defined),
    ]
});

pub fn all() -> &'static [Builtin] {
    &BUILTINS
}

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| &*b.name == name)
}

/// Bind every builtin as a global of `module`.
pub fn install(module: &mut ModuleScope) {
    for builtin in BUILTINS.iter() {
        module.set(&builtin.name, Val::Builtin(builtin.clone()));
    }
}

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(who: &str, v: &Val) -> Result<Num, CoreError> {
        match v {
            Val::Int(i) => Ok(Num::Int(*i)),
            Val::Float(f) => Ok(Num::Float(*f)),
            other => Err(CoreError::type_error(who, format!("expected a number, got {}", other.type_name()))),
        }
    }

    fn class(self) -> NumericClass {
        match self {
            Num::Int(_) => NumericClass::Int,
            Num::Float(_) => NumericClass::Float,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn into_val(self) -> Val {
        match self {
            Num::Int(i) => Val::Int(i),
            Num::Float(f) => Val::Float(f),
        }
    }
}

fn arith(
    who: &str,
    acc: Num,
    rhs: &Val,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Num, CoreError> {
    let rhs = Num::of(who, rhs)?;
    match (NumericHierarchy::result(acc.class(), rhs.class()), acc, rhs) {
        (NumericClass::Int, Num::Int(a), Num::Int(b)) => int_op(a, b)
            .map(Num::Int)
            .ok_or_else(|| CoreError::type_error(who, "integer overflow")),
        _ => Ok(Num::Float(float_op(acc.as_f64(), rhs.as_f64()))),
    }
}

fn add(args: &[Val], _: &mut ModuleScope) -> Result<Val> {
    let mut acc = Num::Int(0);
    for arg in args {
        acc = arith("+", acc, arg, i64::checked_add, |a, b| a + b)?;
    }
    Ok(acc.into_val())
}

fn mul(args: &[Val], _: &mut ModuleScope) -> Result<Val> {
    let mut acc = Num::Int(1);
    for arg in args {
        acc = arith("*", acc, arg, i64::checked_mul, |a, b| a * b)?;
    }
    Ok(acc.into_val())
}

fn sub(args: &[Val], _: &mut ModuleScope) -> Result<Val> {
    let (first, rest) = match args.split_first() {
        Some(split) => split,
        None => return Ok(Val::Int(0)),
    };
    if rest.is_empty() {
        return Ok(arith("-", Num::Int(0), first, i64::checked_sub, |a, b| a - b)?.into_val());
    }
    let mut acc = Num::of("-", first)?;
    for arg in rest {
        acc = arith("-", acc, arg, i64::checked_sub, |a, b| a - b)?;
    }
    Ok(acc.into_val())
}

/// `None` when either side is NaN.
fn compare(who: &str, args: &[Val]) -> Result<Option<Ordering>, CoreError> {
    let a = Num::of(who, &args[0])?;
    let b = Num::of(who, &args[1])?;
    Ok(match (a, b) {
        (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
        _ => a.as_f64().partial_cmp(&b.as_f64()),
    })
}

fn less(args: &[Val], _: &mut ModuleScope) -> Result<Val> {
    Ok(Val::Bool(compare("<", args)? == Some(Ordering::Less)))
}

fn num_eq(args: &[Val], _: &mut ModuleScope) -> Result<Val> {
    Ok(Val::Bool(compare("=", args)? == Some(Ordering::Equal)))
}

fn not(args: &[Val], _: &mut ModuleScope) -> Result<Val> {
    Ok(Val::Bool(!args[0].is_true()))
}

fn void(_: &[Val], _: &mut ModuleScope) -> Result<Val> {
    Ok(Val::Unspecified)
}

fn symbol_name(who: &str, v: &Val) -> Result<Arc<str>, CoreError> {
    match v {
        Val::Symbol(name) => Ok(name.clone()),
        other => Err(CoreError::type_error(who, format!("expected a symbol, got {}", other.type_name()))),
    }
}

fn symbol_value(args: &[Val], module: &mut ModuleScope) -> Result<Val> {
    let name = symbol_name("symbol-value", &args[0])?;
    Ok(module.get(&name)?)
}

fn set_symbol_value(args: &[Val], module: &mut ModuleScope) -> Result<Val> {
    let name = symbol_name("set-symbol-value!", &args[0])?;
    module.set(&name, args[1].clone());
    Ok(Val::Unspecified)
}

fn defined(args: &[Val], module: &mut ModuleScope) -> Result<Val> {
    let name = symbol_name("defined?", &args[0])?;
    Ok(Val::Bool(module.contains(&name)))
}
