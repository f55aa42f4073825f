//! Error taxonomy for the override engine.
//!
//! Three families, matching how each is handled:
//! - [`StartupError`] is fatal and aborts initialization before the host
//!   serves any traffic.
//! - [`DataGap`] is recoverable: the affected unit of work is logged and
//!   skipped.
//! - [`HostError`] covers failures of host primitives; a failed item
//!   construction excludes only that item.

use thiserror::Error;

/// Engine result type.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Any error raised while installing or running tweaks.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("startup configuration error: {0}")]
    Startup(#[from] StartupError),

    #[error("data gap: {0}")]
    DataGap(#[from] DataGap),

    #[error("construction failed: {0}")]
    Construction(#[from] HostError),
}

impl EngineError {
    /// Whether this error must abort host initialization.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Startup(_))
    }
}

/// Interceptor construction failures. Always fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartupError {
    #[error("call to `{target}` not found in routine `{routine}`")]
    PatternNotFound { routine: String, target: String },

    #[error("call to `{target}` is ambiguous in routine `{routine}`: {matches} matches")]
    PatternAmbiguous {
        routine: String,
        target: String,
        matches: usize,
    },

    #[error("routine `{0}` is not available for patching")]
    RoutineUnavailable(String),

    #[error("symbol `{0}` is already bound")]
    SymbolAlreadyBound(String),

    #[error("operation `{0}` is not exposed by the host")]
    OperationNotExposed(String),

    #[error("operation `{id}` expects {expected}, handler provides {actual}")]
    SignatureMismatch {
        id: String,
        expected: String,
        actual: String,
    },
}

/// Missing or unusable data; the unit of work is skipped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataGap {
    #[error("spawn point `{0}` has no item template")]
    MissingTemplate(String),

    #[error("spawn point `{0}` has no candidates left after filtering")]
    NoCandidates(String),

    #[error("item `{0}` not found in database")]
    UnknownItem(String),

    #[error("bot type `{0}` not found in database")]
    UnknownBot(String),

    #[error("trader `{0}` not found in database")]
    UnknownTrader(String),

    #[error("no health template for edition `{edition}` side `{side}`")]
    MissingHealthTemplate { edition: String, side: String },
}

/// Failures reported by host primitives and request entry points.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("cannot construct item `{item_key}`: {reason}")]
    ItemConstruction { item_key: String, reason: String },

    #[error("server is not serving requests")]
    NotServing,

    #[error("unknown symbol `{0}`")]
    UnknownSymbol(String),

    #[error("symbol `{symbol}` expects {expected} arguments, stack holds {actual}")]
    StackUnderflow {
        symbol: String,
        expected: usize,
        actual: usize,
    },

    #[error("local slot {slot} does not hold a `{expected}`")]
    LocalType { slot: usize, expected: &'static str },

    #[error("unknown location `{0}`")]
    UnknownLocation(String),

    #[error("unknown session `{0}`")]
    UnknownSession(String),

    #[error("no chat command handles `{0}`")]
    UnknownCommand(String),

    #[error("item `{0}` cannot be repaired")]
    NotRepairable(String),
}
