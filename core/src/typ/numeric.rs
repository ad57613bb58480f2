use crate::typ::Type;
use crate::val::Val;

/// Numeric tower used by assignment coercion. Ordering is widening order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum NumericClass {
    Int,
    Float,
}

pub struct NumericHierarchy;

impl NumericHierarchy {
    /// Classify a type into the numeric hierarchy if possible.
    pub fn classify(ty: &Type) -> Option<NumericClass> {
        match ty {
            Type::Int => Some(NumericClass::Int),
            Type::Float => Some(NumericClass::Float),
            _ => None,
        }
    }

    pub fn classify_val(val: &Val) -> Option<NumericClass> {
        match val {
            Val::Int(_) => Some(NumericClass::Int),
            Val::Float(_) => Some(NumericClass::Float),
            _ => None,
        }
    }

    /// Combine two numeric classes and return the resulting class after promotion.
    pub fn result(lhs: NumericClass, rhs: NumericClass) -> NumericClass {
        lhs.max(rhs)
    }

    /// Whether a value of class `from` may be implicitly widened to `to`.
    pub fn widens_to(from: NumericClass, to: NumericClass) -> bool {
        from <= to
    }

    /// Widen a numeric value to `to`. Returns `None` for narrowing or non-numeric input.
    pub fn widen(val: Val, to: NumericClass) -> Option<Val> {
        match (val, to) {
            (Val::Int(i), NumericClass::Int) => Some(Val::Int(i)),
            (Val::Int(i), NumericClass::Float) => Some(Val::Float(i as f64)),
            (Val::Float(f), NumericClass::Float) => Some(Val::Float(f)),
            _ => None,
        }
    }
}
