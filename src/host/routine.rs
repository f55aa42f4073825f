//! The host's routine table and a small interpreter for routine bodies.

use std::collections::HashMap;

use tracing::{trace, warn};

use crate::error::{HostError, StartupError};
use crate::hooks::splice::{Callable, Frame, Instruction, PatchableRoutines, RoutineBody};
use crate::hooks::HookRegistry;

/// Routine bodies and the symbols they call.
///
/// Patchable until [`RoutineTable::seal`] is called, which the server does
/// once startup completes.
#[derive(Default)]
pub struct RoutineTable {
    routines: HashMap<String, RoutineBody>,
    symbols: HashMap<String, Callable>,
    sealed: bool,
}

impl RoutineTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host side: add a routine.
    pub fn define_routine(&mut self, body: RoutineBody) {
        self.routines.insert(body.name.clone(), body);
    }

    /// Host side: add a native symbol.
    pub fn define_symbol(&mut self, symbol: &str, callable: Callable) {
        self.symbols.insert(symbol.to_string(), callable);
    }

    pub fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Run routine `name` against `frame`.
    pub fn execute(
        &self,
        name: &str,
        frame: &mut Frame,
        hooks: &HookRegistry,
    ) -> Result<(), HostError> {
        let body = self
            .routines
            .get(name)
            .ok_or_else(|| HostError::UnknownSymbol(name.to_string()))?;

        let mut stack: Vec<usize> = Vec::new();
        for instruction in &body.instructions {
            match instruction {
                Instruction::LoadLocal(slot) => stack.push(*slot),
                Instruction::Call(symbol) => {
                    let callee = self
                        .symbols
                        .get(symbol)
                        .ok_or_else(|| HostError::UnknownSymbol(symbol.clone()))?;
                    if stack.len() < callee.arity {
                        return Err(HostError::StackUnderflow {
                            symbol: symbol.clone(),
                            expected: callee.arity,
                            actual: stack.len(),
                        });
                    }
                    let args = stack.split_off(stack.len() - callee.arity);
                    trace!(routine = name, symbol = %symbol, ?args, "call");
                    callee.call(frame, &args, hooks)?;
                }
                Instruction::Return => break,
                Instruction::Nop => {}
            }
        }
        Ok(())
    }
}

impl PatchableRoutines for RoutineTable {
    fn routine(&self, name: &str) -> Option<&RoutineBody> {
        if self.sealed {
            return None;
        }
        self.routines.get(name)
    }

    fn replace_routine(&mut self, body: RoutineBody) -> Result<(), StartupError> {
        if self.sealed || !self.routines.contains_key(&body.name) {
            return Err(StartupError::RoutineUnavailable(body.name));
        }
        self.routines.insert(body.name.clone(), body);
        Ok(())
    }

    fn bind_symbol(&mut self, symbol: &str, callable: Callable) -> Result<(), StartupError> {
        if self.sealed {
            return Err(StartupError::RoutineUnavailable(symbol.to_string()));
        }
        if self.symbols.contains_key(symbol) {
            warn!(symbol, "Symbol already bound, refusing to rebind");
            return Err(StartupError::SymbolAlreadyBound(symbol.to_string()));
        }
        self.symbols.insert(symbol.to_string(), callable);
        Ok(())
    }
}
