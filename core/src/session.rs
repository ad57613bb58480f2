//! Host-facing entry point: one module scope plus the options that drive it.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ast::Node;
use crate::binding::ModuleScope;
use crate::builtins;
use crate::eval::Environment;
use crate::resolve::Resolver;
use crate::unit::Unit;
use crate::val::Val;
use crate::vm::{CompiledUnit, EmitOptions, Vm};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    pub module_name: String,
    pub branch_elision: bool,
    pub install_builtins: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            module_name: "user".to_string(),
            branch_elision: true,
            install_builtins: true,
        }
    }
}

impl SessionOptions {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid session options")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            branch_elision: self.branch_elision,
        }
    }
}

/// Which execution path(s) `Session::run` takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    #[default]
    Interpret,
    Compile,
    /// Run both paths on separate copies of the module and require equal results.
    Both,
}

impl FromStr for ExecMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "interpret" => Ok(ExecMode::Interpret),
            "compile" => Ok(ExecMode::Compile),
            "both" => Ok(ExecMode::Both),
            other => bail!("unknown mode '{}', expected interpret, compile or both", other),
        }
    }
}

#[derive(Debug)]
pub struct Session {
    options: SessionOptions,
    module: ModuleScope,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        let mut module = ModuleScope::new(&options.module_name);
        if options.install_builtins {
            builtins::install(&mut module);
        }
        debug!(module = %options.module_name, globals = module.len(), "session created");
        Self { options, module }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn module(&self) -> &ModuleScope {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut ModuleScope {
        &mut self.module
    }

    pub fn resolve(&self, body: Node) -> Result<Unit> {
        Ok(Resolver::resolve_unit(&self.module, body)?)
    }

    pub fn interpret(&mut self, unit: &Unit) -> Result<Val> {
        unit.evaluate(&mut self.module)
    }

    pub fn compile(&self, unit: &Unit) -> Result<CompiledUnit> {
        unit.emit(self.options.emit_options())
    }

    pub fn execute(&mut self, compiled: &CompiledUnit) -> Result<Val> {
        let mut env = Environment::new(&mut self.module, compiled.n_slots);
        Vm::new().execute(compiled, &mut env)
    }

    /// Resolve `body` and run it.
    ///
    /// In [`ExecMode::Both`] the compiled path runs on a snapshot of the module
    /// taken before interpretation; values and the final global tables must match.
    pub fn run(&mut self, body: Node, mode: ExecMode) -> Result<Val> {
        let unit = self.resolve(body)?;
        match mode {
            ExecMode::Interpret => self.interpret(&unit),
            ExecMode::Compile => {
                let compiled = self.compile(&unit)?;
                self.execute(&compiled)
            }
            ExecMode::Both => {
                let compiled = self.compile(&unit)?;
                let mut shadow = self.module.clone();
                let interpreted = self.interpret(&unit)?;
                let executed = {
                    let mut env = Environment::new(&mut shadow, compiled.n_slots);
                    Vm::new().execute(&compiled, &mut env)?
                };
                if interpreted != executed {
                    bail!("interpreted result {} differs from compiled result {}", interpreted, executed);
                }
                if self.module.len() != shadow.len() {
                    bail!("execution paths assigned different sets of globals");
                }
                for (name, value) in self.module.iter() {
                    let other = shadow.get(name).ok();
                    if other.as_ref() != Some(value) {
                        bail!("global {} differs between execution paths", name);
                    }
                }
                info!(result = %interpreted, "both execution paths agree");
                Ok(interpreted)
            }
        }
    }
}
