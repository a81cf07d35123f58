//! Stream error recovery policy
//!
//! Fatal engine errors map to a fixed action by kind. Network and media
//! failures are retried on the existing engine; everything else ends the
//! session.

use crate::{ErrorKind, StreamError};

/// What a session does in response to an engine error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Non-fatal: log and carry on
    Ignore,
    /// Re-issue segment loading on the same engine
    RestartLoad,
    /// Run the engine's decoder recovery
    RecoverMedia,
    /// Tear the session down
    Teardown,
}

impl RecoveryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryAction::Ignore => "ignore",
            RecoveryAction::RestartLoad => "restart_load",
            RecoveryAction::RecoverMedia => "recover_media",
            RecoveryAction::Teardown => "teardown",
        }
    }
}

impl std::fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal error policy by kind
const FATAL_POLICY: &[(ErrorKind, RecoveryAction)] = &[
    (ErrorKind::Network, RecoveryAction::RestartLoad),
    (ErrorKind::Media, RecoveryAction::RecoverMedia),
];

/// Action for a fatal error of the given kind
pub fn fatal_action(kind: ErrorKind) -> RecoveryAction {
    FATAL_POLICY
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, action)| *action)
        .unwrap_or(RecoveryAction::Teardown)
}

/// Action for an engine error
pub fn recovery_action(error: &StreamError) -> RecoveryAction {
    if error.fatal {
        fatal_action(error.kind)
    } else {
        RecoveryAction::Ignore
    }
}
