use std::sync::Arc;

use crate::binding::Variable;
use crate::error::CoreError;
use crate::typ::Type;
use crate::util::fast_map::{FastHashMap, fast_hash_map_new};
use crate::val::Val;

/// 模块级（全局）作用域。
///
/// Terminal frame of every scope chain. Owned by the hosting session and
/// lent to environments explicitly; nothing here is process-global.
#[derive(Debug, Clone)]
pub struct ModuleScope {
    name: Arc<str>,
    declared: FastHashMap<Arc<str>, Variable>,
    values: FastHashMap<Arc<str>, Val>,
}

impl Default for ModuleScope {
    fn default() -> Self {
        Self::new("user")
    }
}

impl ModuleScope {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            declared: fast_hash_map_new(),
            values: fast_hash_map_new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a global binding without assigning it. Redeclaring returns the existing variable.
    pub fn declare(&mut self, name: &str, ty: Type) -> Variable {
        if let Some(existing) = self.declared.get(name) {
            return existing.clone();
        }
        let var = Variable::global(name, ty);
        self.declared.insert(var.name().clone(), var.clone());
        var
    }

    /// Declared global variable for `name`, if any.
    pub fn lookup_variable(&self, name: &str) -> Option<&Variable> {
        self.declared.get(name)
    }

    /// Whether `name` currently holds a value.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Read a global. Undeclared names are unbound; declared-but-empty ones are unassigned.
    pub fn get(&self, name: &str) -> Result<Val, CoreError> {
        match self.values.get(name) {
            Some(v) => Ok(v.clone()),
            None if self.declared.contains_key(name) => Err(CoreError::unassigned(name)),
            None => Err(CoreError::unbound(name)),
        }
    }

    /// Write a global, replacing any prior value. Undeclared names are declared as `Any`.
    pub fn set(&mut self, name: &Arc<str>, value: Val) -> Option<Val> {
        if !self.declared.contains_key(name.as_ref()) {
            let var = Variable::global(name, Type::Any);
            self.declared.insert(name.clone(), var);
        }
        self.values.insert(name.clone(), value)
    }

    /// Assigned globals in arbitrary order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Val)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
