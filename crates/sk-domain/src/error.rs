use chrono::{DateTime, Utc};

/// What kind of registry entry a config error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryKind {
    Strategy,
    Exchange,
    Frame,
    Risk,
}

impl core::fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            RegistryKind::Strategy => "strategy",
            RegistryKind::Exchange => "exchange",
            RegistryKind::Frame => "frame",
            RegistryKind::Risk => "risk",
        };
        write!(f, "{s}")
    }
}

/// The single error type every crate boundary in the kernel converts into
/// (§7). Crate-local error enums (e.g. the gateway's `GatewayError`) stay
/// small and specific, and implement `From<Local> for KernelError` at the
/// point they cross into the Lifecycle Engine — callers of the engine only
/// ever see `KernelError`.
#[derive(Clone, Debug, PartialEq)]
pub enum KernelError {
    // --- Config ---
    NotRegistered { kind: RegistryKind, name: String },
    DuplicateRegistration { kind: RegistryKind, name: String },
    ColumnValidation { message: String },

    // --- Contract ---
    InvalidSignal { reason: String },
    /// Unreachable through the static API (every gateway call takes a
    /// `&TemporalContext` parameter, so "missing context" cannot type-check),
    /// kept for parity with adapters that lose that guarantee behind `dyn`
    /// dispatch and must report the same condition at runtime.
    MissingContext,

    // --- Adapter ---
    AdapterInvariantViolation { message: String },
    AdapterTimeout { elapsed_ms: u64 },
    LookaheadRequested { requested: DateTime<Utc>, when: DateTime<Utc> },

    // --- Runtime ---
    UserCallbackError { message: String },
    PersistenceError { message: String },

    // --- Fatal ---
    Fatal { message: String },
}

impl core::fmt::Display for KernelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            KernelError::NotRegistered { kind, name } => {
                write!(f, "{kind} '{name}' is not registered")
            }
            KernelError::DuplicateRegistration { kind, name } => {
                write!(f, "{kind} '{name}' is already registered")
            }
            KernelError::ColumnValidation { message } => write!(f, "validation failed: {message}"),
            KernelError::InvalidSignal { reason } => write!(f, "invalid signal: {reason}"),
            KernelError::MissingContext => write!(f, "no temporal context bound for this call"),
            KernelError::AdapterInvariantViolation { message } => {
                write!(f, "adapter invariant violation: {message}")
            }
            KernelError::AdapterTimeout { elapsed_ms } => {
                write!(f, "adapter call timed out after {elapsed_ms}ms")
            }
            KernelError::LookaheadRequested { requested, when } => write!(
                f,
                "look-ahead requested: {requested} is after current time {when}"
            ),
            KernelError::UserCallbackError { message } => {
                write!(f, "user callback error: {message}")
            }
            KernelError::PersistenceError { message } => write!(f, "persistence error: {message}"),
            KernelError::Fatal { message } => write!(f, "fatal: {message}"),
        }
    }
}

impl std::error::Error for KernelError {}

impl KernelError {
    /// `true` for the error kinds §7 says a live driver should report and
    /// continue past, rather than exit on.
    pub fn is_recoverable_in_live(&self) -> bool {
        matches!(
            self,
            KernelError::AdapterTimeout { .. }
                | KernelError::PersistenceError { .. }
                | KernelError::UserCallbackError { .. }
        )
    }
}
