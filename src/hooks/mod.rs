//! Host operation overrides.
//!
//! The host declares the operations it routes through a [`HookRegistry`]
//! ("exposes" them), each identified by an [`Operation`] type. Mods install
//! at most one [`OverrideHandler`] per operation before the host starts
//! serving; the host then calls [`HookRegistry::invoke`] with its own
//! implementation as the fallback.
//!
//! When a sub-operation is only reachable from inside a larger host routine,
//! [`splice`] patches the routine body instead.

pub mod splice;

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::error::StartupError;

/// A host operation that can be overridden.
pub trait Operation: 'static {
    /// Stable identifier, e.g. `RagfairSellHelper.calculateSellChance`.
    const ID: &'static str;
    type Input: 'static;
    type Output: 'static;
}

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

/// Identity and shape of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSignature {
    pub id: &'static str,
    input: TypeId,
    input_name: &'static str,
    output: TypeId,
    output_name: &'static str,
}

impl OperationSignature {
    pub fn of<Op: Operation>() -> Self {
        Self {
            id: Op::ID,
            input: TypeId::of::<Op::Input>(),
            input_name: type_name::<Op::Input>(),
            output: TypeId::of::<Op::Output>(),
            output_name: type_name::<Op::Output>(),
        }
    }

    /// Same id and same input/output types.
    pub fn matches(&self, other: &OperationSignature) -> bool {
        self.id == other.id && self.input == other.input && self.output == other.output
    }
}

impl fmt::Display for OperationSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn(&mut {}) -> {}", self.input_name, self.output_name)
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub type ReplaceFn<Op> =
    Box<dyn Fn(&mut <Op as Operation>::Input) -> <Op as Operation>::Output + Send + Sync>;

pub type ObserverFn<Op> =
    Box<dyn Fn(&mut <Op as Operation>::Input, &<Op as Operation>::Output) + Send + Sync>;

/// How an installed handler relates to the host's implementation.
pub enum OverrideHandler<Op: Operation> {
    /// Runs instead of the host implementation.
    Replace(ReplaceFn<Op>),
    /// Runs after the host implementation with the same input and the
    /// produced output. The host's output is returned unchanged.
    AugmentAfter(ObserverFn<Op>),
}

impl<Op: Operation> OverrideHandler<Op> {
    pub fn kind(&self) -> HandlerKind {
        match self {
            OverrideHandler::Replace(_) => HandlerKind::Replace,
            OverrideHandler::AugmentAfter(_) => HandlerKind::AugmentAfter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Replace,
    AugmentAfter,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKind::Replace => write!(f, "replace"),
            HandlerKind::AugmentAfter => write!(f, "augment-after"),
        }
    }
}

struct Installed {
    kind: HandlerKind,
    handler: Box<dyn Any + Send + Sync>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Exposed operations and the handlers installed against them.
#[derive(Default)]
pub struct HookRegistry {
    exposed: HashMap<&'static str, OperationSignature>,
    handlers: HashMap<&'static str, Installed>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host side: declare that `Op` is routed through this registry.
    pub fn expose<Op: Operation>(&mut self) {
        let signature = OperationSignature::of::<Op>();
        debug!(operation = Op::ID, signature = %signature, "Operation exposed");
        self.exposed.insert(Op::ID, signature);
    }

    pub fn is_exposed(&self, id: &str) -> bool {
        self.exposed.contains_key(id)
    }

    /// Kind of the handler currently installed for `id`, if any.
    pub fn installed(&self, id: &str) -> Option<HandlerKind> {
        self.handlers.get(id).map(|h| h.kind)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Install `handler` for `Op`. A later registration for the same id
    /// replaces the earlier one.
    pub fn register<Op: Operation>(
        &mut self,
        handler: OverrideHandler<Op>,
    ) -> Result<(), StartupError> {
        let wanted = OperationSignature::of::<Op>();
        let exposed = self
            .exposed
            .get(Op::ID)
            .ok_or_else(|| StartupError::OperationNotExposed(Op::ID.to_string()))?;
        if !exposed.matches(&wanted) {
            return Err(StartupError::SignatureMismatch {
                id: Op::ID.to_string(),
                expected: exposed.to_string(),
                actual: wanted.to_string(),
            });
        }

        let kind = handler.kind();
        let previous = self.handlers.insert(
            Op::ID,
            Installed {
                kind,
                handler: Box::new(handler),
            },
        );
        match previous {
            Some(old) => warn!(
                operation = Op::ID,
                previous = %old.kind,
                current = %kind,
                "Handler re-registered, previous one discarded"
            ),
            None => info!(operation = Op::ID, kind = %kind, "Handler installed"),
        }
        Ok(())
    }

    pub fn replace<Op, F>(&mut self, f: F) -> Result<(), StartupError>
    where
        Op: Operation,
        F: Fn(&mut Op::Input) -> Op::Output + Send + Sync + 'static,
    {
        self.register::<Op>(OverrideHandler::Replace(Box::new(f)))
    }

    pub fn augment_after<Op, F>(&mut self, f: F) -> Result<(), StartupError>
    where
        Op: Operation,
        F: Fn(&mut Op::Input, &Op::Output) + Send + Sync + 'static,
    {
        self.register::<Op>(OverrideHandler::AugmentAfter(Box::new(f)))
    }

    /// Host side: run `Op` with whatever handler is installed.
    ///
    /// No handler runs `original`. `Replace` runs only the handler.
    /// `AugmentAfter` runs `original`, then the observer, and returns
    /// `original`'s output.
    pub fn invoke<Op, F>(&self, input: &mut Op::Input, original: F) -> Op::Output
    where
        Op: Operation,
        F: FnOnce(&mut Op::Input) -> Op::Output,
    {
        let Some(installed) = self.handlers.get(Op::ID) else {
            return original(input);
        };
        let Some(handler) = installed.handler.downcast_ref::<OverrideHandler<Op>>() else {
            warn!(operation = Op::ID, "Installed handler belongs to another operation type");
            return original(input);
        };

        match handler {
            OverrideHandler::Replace(f) => f(input),
            OverrideHandler::AugmentAfter(observe) => {
                let output = original(input);
                observe(input, &output);
                output
            }
        }
    }
}
