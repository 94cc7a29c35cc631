//! Machine state: value stack, call frames and the function table.
//!
//! The evaluator only talks to the [`Machine`] trait. [`MachineState`] is
//! the one implementation; it is exclusively owned by a single evaluation
//! and never shared between concurrent runs.

use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::code::{Function, FunctionEntry, FunctionTable};
use crate::error::{Result, VmError};
use crate::value::Value;
use tonal_ast::Path;

/// Default bound on nested calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Interpreter limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Calls nested deeper than this fail with [`VmError::CallDepthExceeded`]
    pub max_call_depth: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// Operations the evaluator needs from the machine.
pub trait Machine {
    /// Pushes a [`Value`] onto the value stack.
    fn push(&mut self, value: Value) -> Result<()>;

    /// Pops the top [`Value`] from the value stack.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::StackUnderflow`] if the stack is empty.
    fn pop(&mut self) -> Result<Value>;

    /// Current value stack depth.
    fn stack_depth(&self) -> usize;

    /// Number of active frames.
    fn call_depth(&self) -> usize;

    /// Opens a frame for `function` with storage for every local.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::CallDepthExceeded`] past the configured depth.
    fn enter_frame(&mut self, function: &Function) -> Result<()>;

    /// Closes the active frame, restoring the caller's cells.
    fn leave_frame(&mut self) -> Result<()>;

    /// Creates (or overwrites) a cell in the active frame.
    fn declare(&mut self, name: &str, value: Value) -> Result<()>;

    /// Reads a cell of the active frame.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::UnknownReference`] if the frame has no such cell.
    fn load(&self, name: &str) -> Result<Value>;

    /// Writes an existing cell of the active frame.
    fn store(&mut self, name: &str, value: Value) -> Result<()>;

    /// Resolves a callee to its lowered body.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::ExternalCall`] for external declarations and
    /// [`VmError::UnknownFunction`] for names that were never lowered.
    fn function(&self, name: &Path) -> Result<Rc<Function>>;
}

#[derive(Debug, Default)]
struct Frame {
    cells: IndexMap<String, Value>,
}

/// The interpreter's state for one evaluation.
#[derive(Debug)]
pub struct MachineState {
    stack: Vec<Value>,
    frames: Vec<Frame>,
    functions: FunctionTable,
    config: MachineConfig,
}

impl MachineState {
    pub fn new(functions: FunctionTable, config: MachineConfig) -> Self {
        Self {
            stack: Vec::with_capacity(64),
            frames: Vec::new(),
            functions,
            config,
        }
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    fn frame(&self) -> Result<&Frame> {
        self.frames.last().ok_or(VmError::NoFrame)
    }

    fn frame_mut(&mut self) -> Result<&mut Frame> {
        self.frames.last_mut().ok_or(VmError::NoFrame)
    }
}

impl Machine for MachineState {
    fn push(&mut self, value: Value) -> Result<()> {
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value> {
        self.stack.pop().ok_or(VmError::StackUnderflow)
    }

    fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    fn call_depth(&self) -> usize {
        self.frames.len()
    }

    fn enter_frame(&mut self, function: &Function) -> Result<()> {
        if self.frames.len() >= self.config.max_call_depth {
            return Err(VmError::CallDepthExceeded {
                limit: self.config.max_call_depth,
            });
        }
        let cells = function
            .locals
            .iter()
            .map(|(name, zero)| (name.clone(), zero.deep_copy()))
            .collect();
        self.frames.push(Frame { cells });
        Ok(())
    }

    fn leave_frame(&mut self) -> Result<()> {
        self.frames.pop().map(|_| ()).ok_or(VmError::NoFrame)
    }

    fn declare(&mut self, name: &str, value: Value) -> Result<()> {
        self.frame_mut()?.cells.insert(name.to_string(), value);
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Value> {
        self.frame()?
            .cells
            .get(name)
            .cloned()
            .ok_or_else(|| VmError::UnknownReference {
                name: name.to_string(),
            })
    }

    fn store(&mut self, name: &str, value: Value) -> Result<()> {
        let cell = self
            .frame_mut()?
            .cells
            .get_mut(name)
            .ok_or_else(|| VmError::UnknownReference {
                name: name.to_string(),
            })?;
        *cell = value;
        Ok(())
    }

    fn function(&self, name: &Path) -> Result<Rc<Function>> {
        match self.functions.get(name) {
            Some(FunctionEntry::Defined(f)) => Ok(Rc::clone(f)),
            Some(FunctionEntry::External { link_name }) => Err(VmError::ExternalCall {
                name: name.clone(),
                link_name: link_name.clone(),
            }),
            None => Err(VmError::UnknownFunction { name: name.clone() }),
        }
    }
}
