//! Call-site splicing inside host routine bodies.
//!
//! Some host sub-operations are only ever called from inside a larger
//! routine that cannot be replaced wholesale. The host exposes such routines
//! as instruction sequences; a splice finds the single call to the target
//! symbol and inserts a call to an observer right after it, passing two of
//! the routine's locals. The original call keeps its operands and the
//! routine's control flow is unchanged.

use std::any::{type_name, Any};
use std::fmt;

use tracing::{debug, info};

use super::HookRegistry;
use crate::error::{HostError, StartupError};

// ---------------------------------------------------------------------------
// Routine bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Push a reference to local slot `n` onto the argument stack.
    LoadLocal(usize),
    /// Pop the callee's arity worth of arguments and call it.
    Call(String),
    Return,
    Nop,
}

impl Instruction {
    pub fn call(symbol: impl Into<String>) -> Self {
        Instruction::Call(symbol.into())
    }

    pub fn is_call_to(&self, symbol: &str) -> bool {
        matches!(self, Instruction::Call(s) if s == symbol)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::LoadLocal(n) => write!(f, "ldloc.{n}"),
            Instruction::Call(s) => write!(f, "call {s}"),
            Instruction::Return => write!(f, "ret"),
            Instruction::Nop => write!(f, "nop"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineBody {
    pub name: String,
    pub instructions: Vec<Instruction>,
}

impl RoutineBody {
    pub fn new(name: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self {
            name: name.into(),
            instructions,
        }
    }

    /// Indices of every `Call(symbol)` in the body.
    pub fn call_sites(&self, symbol: &str) -> Vec<usize> {
        self.instructions
            .iter()
            .enumerate()
            .filter(|(_, ins)| ins.is_call_to(symbol))
            .map(|(i, _)| i)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Execution frame & callables
// ---------------------------------------------------------------------------

/// Locals of one routine invocation.
pub struct Frame {
    locals: Vec<Box<dyn Any + Send>>,
}

impl Frame {
    pub fn new(locals: Vec<Box<dyn Any + Send>>) -> Self {
        Self { locals }
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }

    pub fn local_mut<T: Any>(&mut self, slot: usize) -> Result<&mut T, HostError> {
        self.locals
            .get_mut(slot)
            .and_then(|l| l.downcast_mut::<T>())
            .ok_or(HostError::LocalType {
                slot,
                expected: type_name::<T>(),
            })
    }

    /// Two distinct locals borrowed mutably at once.
    pub fn pair_mut<A: Any, B: Any>(
        &mut self,
        a: usize,
        b: usize,
    ) -> Result<(&mut A, &mut B), HostError> {
        if a == b {
            return Err(HostError::LocalType {
                slot: b,
                expected: type_name::<B>(),
            });
        }
        let len = self.locals.len();
        if a >= len {
            return Err(HostError::LocalType { slot: a, expected: type_name::<A>() });
        }
        if b >= len {
            return Err(HostError::LocalType { slot: b, expected: type_name::<B>() });
        }

        let (first, second) = if a < b {
            let (lo, hi) = self.locals.split_at_mut(b);
            (&mut lo[a], &mut hi[0])
        } else {
            let (lo, hi) = self.locals.split_at_mut(a);
            (&mut hi[0], &mut lo[b])
        };
        let first = first
            .downcast_mut::<A>()
            .ok_or(HostError::LocalType { slot: a, expected: type_name::<A>() })?;
        let second = second
            .downcast_mut::<B>()
            .ok_or(HostError::LocalType { slot: b, expected: type_name::<B>() })?;
        Ok((first, second))
    }

    pub fn into_locals(self) -> Vec<Box<dyn Any + Send>> {
        self.locals
    }
}

pub type NativeFn =
    dyn Fn(&mut Frame, &[usize], &HookRegistry) -> Result<(), HostError> + Send + Sync;

/// A symbol body callable from a routine. Arguments are local slot indices;
/// the host's registry is passed along so native symbols can route through
/// it.
pub struct Callable {
    pub arity: usize,
    f: Box<NativeFn>,
}

impl Callable {
    pub fn new<F>(arity: usize, f: F) -> Self
    where
        F: Fn(&mut Frame, &[usize], &HookRegistry) -> Result<(), HostError> + Send + Sync + 'static,
    {
        Self {
            arity,
            f: Box::new(f),
        }
    }

    pub fn call(
        &self,
        frame: &mut Frame,
        args: &[usize],
        hooks: &HookRegistry,
    ) -> Result<(), HostError> {
        (self.f)(frame, args, hooks)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable").field("arity", &self.arity).finish()
    }
}

/// Host routines that may be rewritten before the host starts serving.
pub trait PatchableRoutines {
    fn routine(&self, name: &str) -> Option<&RoutineBody>;

    fn replace_routine(&mut self, body: RoutineBody) -> Result<(), StartupError>;

    /// Make `callable` reachable from routine bodies as `symbol`. Binding
    /// a name that is already taken is an error.
    fn bind_symbol(&mut self, symbol: &str, callable: Callable) -> Result<(), StartupError>;
}

// ---------------------------------------------------------------------------
// Splicing
// ---------------------------------------------------------------------------

/// A copy of `body` with `LoadLocal(a), LoadLocal(b), Call(observer)`
/// inserted right after the only `Call(target)`.
///
/// Zero or several call sites is an error; the body is never guessed at.
pub fn splice_after_call(
    body: &RoutineBody,
    target: &str,
    locals: [usize; 2],
    observer: &str,
) -> Result<RoutineBody, StartupError> {
    let sites = body.call_sites(target);
    let site = match sites.as_slice() {
        [only] => *only,
        [] => {
            return Err(StartupError::PatternNotFound {
                routine: body.name.clone(),
                target: target.to_string(),
            })
        }
        many => {
            return Err(StartupError::PatternAmbiguous {
                routine: body.name.clone(),
                target: target.to_string(),
                matches: many.len(),
            })
        }
    };

    let mut patched = body.clone();
    let insert = [
        Instruction::LoadLocal(locals[0]),
        Instruction::LoadLocal(locals[1]),
        Instruction::call(observer),
    ];
    patched
        .instructions
        .splice(site + 1..site + 1, insert);
    debug!(routine = %body.name, target, observer, at = site, "Call site spliced");
    Ok(patched)
}

/// Bind `callable` as `observer` and splice a call to it after the unique
/// call to `target` in `routine`.
pub fn install_call_observer(
    routines: &mut dyn PatchableRoutines,
    routine: &str,
    target: &str,
    locals: [usize; 2],
    observer: &str,
    callable: Callable,
) -> Result<(), StartupError> {
    let body = routines
        .routine(routine)
        .ok_or_else(|| StartupError::RoutineUnavailable(routine.to_string()))?;
    let patched = splice_after_call(body, target, locals, observer)?;

    routines.bind_symbol(observer, callable)?;
    routines.replace_routine(patched)?;
    info!(routine, target, observer, "Call observer installed");
    Ok(())
}
