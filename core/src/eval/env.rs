use crate::binding::{ModuleScope, StorageKind, StorageLocation, VarId, Variable, VariableReference};
use crate::error::CoreError;
use crate::util::fast_map::{FastHashMap, fast_hash_map_new};
use crate::val::Val;

/// Activation record of one unit.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    slots: Vec<Option<Val>>,
    temps: FastHashMap<VarId, Val>,
    generator_temps: FastHashMap<VarId, Val>,
}

impl Frame {
    pub fn new(n_slots: u16) -> Self {
        Self {
            slots: vec![None; n_slots as usize],
            temps: fast_hash_map_new(),
            generator_temps: fast_hash_map_new(),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

/// 运行期环境：当前帧加上借用的模块作用域。
///
/// Both execution paths read and write storage only through this type, so
/// interpreted and compiled code observe the same frame and module state.
#[derive(Debug)]
pub struct Environment<'m> {
    module: &'m mut ModuleScope,
    frame: Frame,
}

impl<'m> Environment<'m> {
    pub fn new(module: &'m mut ModuleScope, n_slots: u16) -> Self {
        Self {
            module,
            frame: Frame::new(n_slots),
        }
    }

    /// Reattach a frame produced by [`Environment::suspend`].
    pub fn resume(module: &'m mut ModuleScope, frame: Frame) -> Self {
        Self { module, frame }
    }

    /// Detach the frame across a suspension. Ordinary temporaries are dropped;
    /// slots and generator temporaries are kept.
    pub fn suspend(self) -> Frame {
        let mut frame = self.frame;
        frame.temps.clear();
        frame
    }

    pub fn module(&self) -> &ModuleScope {
        &*self.module
    }

    pub fn module_mut(&mut self) -> &mut ModuleScope {
        &mut *self.module
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Read `variable`. `Local` storage needs the resolved reference.
    pub fn load(&self, variable: &Variable, reference: Option<&VariableReference>) -> Result<Val, CoreError> {
        match variable.kind() {
            StorageKind::Temporary => self.load_temp(variable),
            StorageKind::GeneratorTemporary => self.load_temp(variable),
            StorageKind::Global => self.module.get(variable.name()),
            StorageKind::Local => {
                let reference = Self::require(variable, reference)?;
                self.load_location(variable, &reference.location)
            }
        }
    }

    /// Write `variable`, replacing any previous value.
    pub fn store(
        &mut self,
        variable: &Variable,
        reference: Option<&VariableReference>,
        value: Val,
    ) -> Result<(), CoreError> {
        match variable.kind() {
            StorageKind::Temporary | StorageKind::GeneratorTemporary => {
                self.store_temp(variable, value);
                Ok(())
            }
            StorageKind::Global => {
                self.module.set(variable.name(), value);
                Ok(())
            }
            StorageKind::Local => {
                let reference = Self::require(variable, reference)?;
                self.store_location(variable, &reference.location, value)
            }
        }
    }

    fn load_location(&self, variable: &Variable, location: &StorageLocation) -> Result<Val, CoreError> {
        match location {
            StorageLocation::Slot(idx) => match self.frame.slots.get(*idx as usize) {
                Some(Some(v)) => Ok(v.clone()),
                Some(None) => Err(CoreError::unassigned(variable.name().clone())),
                None => Err(Self::bad_slot(variable, *idx)),
            },
            StorageLocation::Temp(_) => self.load_temp(variable),
            StorageLocation::Global(name) => self.module.get(name),
        }
    }

    fn store_location(
        &mut self,
        variable: &Variable,
        location: &StorageLocation,
        value: Val,
    ) -> Result<(), CoreError> {
        match location {
            StorageLocation::Slot(idx) => match self.frame.slots.get_mut(*idx as usize) {
                Some(slot) => {
                    *slot = Some(value);
                    Ok(())
                }
                None => Err(Self::bad_slot(variable, *idx)),
            },
            StorageLocation::Temp(_) => {
                self.store_temp(variable, value);
                Ok(())
            }
            StorageLocation::Global(name) => {
                self.module.set(name, value);
                Ok(())
            }
        }
    }

    pub(crate) fn load_slot(&self, idx: u16) -> Option<&Option<Val>> {
        self.frame.slots.get(idx as usize)
    }

    pub(crate) fn store_slot(&mut self, idx: u16, value: Val) -> bool {
        match self.frame.slots.get_mut(idx as usize) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    pub(crate) fn temp(&self, id: VarId) -> Option<&Val> {
        self.frame
            .temps
            .get(&id)
            .or_else(|| self.frame.generator_temps.get(&id))
    }

    pub(crate) fn set_temp(&mut self, id: VarId, kind: StorageKind, value: Val) {
        if kind == StorageKind::GeneratorTemporary {
            self.frame.generator_temps.insert(id, value);
        } else {
            self.frame.temps.insert(id, value);
        }
    }

    /// Discard an ordinary temporary at the end of its block.
    pub(crate) fn drop_temp(&mut self, id: VarId) {
        self.frame.temps.remove(&id);
    }

    fn load_temp(&self, variable: &Variable) -> Result<Val, CoreError> {
        self.temp(variable.id())
            .cloned()
            .ok_or_else(|| CoreError::unassigned(variable.name().clone()))
    }

    fn store_temp(&mut self, variable: &Variable, value: Val) {
        self.set_temp(variable.id(), variable.kind(), value);
    }

    fn require<'r>(
        variable: &Variable,
        reference: Option<&'r VariableReference>,
    ) -> Result<&'r VariableReference, CoreError> {
        reference.ok_or_else(|| {
            CoreError::structural(
                variable.name().clone(),
                format!("local {} has no resolved storage", variable),
            )
        })
    }

    fn bad_slot(variable: &Variable, idx: u16) -> CoreError {
        CoreError::structural(
            variable.name().clone(),
            format!("slot {} is outside the frame", idx),
        )
    }
}
