/*
[INPUT]:  Current SignInState and a SignInAction
[OUTPUT]: Validated state transitions for a sign-in attempt
[POS]:    Auth layer - state machine for the sign-in lifecycle
[UPDATE]: When sign-in steps or failure handling change
*/

use thiserror::Error;

use super::error::SignInErrorKind;
use crate::types::Session;

/// UI-visible state of a sign-in attempt
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SignInState {
    #[default]
    Idle,
    AwaitingSignature,
    Verifying,
    Authenticated(Session),
    Failed(SignInErrorKind),
}

impl SignInState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SignInState::Authenticated(_) | SignInState::Failed(_))
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, SignInState::AwaitingSignature | SignInState::Verifying)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SignInState::Idle => "idle",
            SignInState::AwaitingSignature => "awaiting_signature",
            SignInState::Verifying => "verifying",
            SignInState::Authenticated(_) => "authenticated",
            SignInState::Failed(_) => "failed",
        }
    }
}

/// Actions that can trigger sign-in state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInAction {
    Start,
    Signed,
    Verified(Session),
    Fail(SignInErrorKind),
    Reset,
}

/// Errors occurring during state transitions
#[derive(Debug, Clone, Error)]
pub enum StateError {
    #[error("Invalid transition: {from} -> {action:?}")]
    InvalidTransition {
        from: &'static str,
        action: SignInAction,
    },
}

/// State machine for one account's sign-in
#[derive(Debug, Default)]
pub struct SignInStateMachine {
    current_state: SignInState,
}

impl SignInStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the action is valid from the current state
    pub fn can_transition(&self, action: &SignInAction) -> bool {
        match (&self.current_state, action) {
            (_, SignInAction::Reset) => true,
            (SignInState::Idle, SignInAction::Start) => true,
            (SignInState::Idle, SignInAction::Fail(SignInErrorKind::ConfigurationError)) => true,
            (SignInState::AwaitingSignature, SignInAction::Signed) => true,
            (
                SignInState::AwaitingSignature,
                SignInAction::Fail(
                    SignInErrorKind::UserRejected
                    | SignInErrorKind::TransportError
                    | SignInErrorKind::ConfigurationError,
                ),
            ) => true,
            (SignInState::Verifying, SignInAction::Verified(_)) => true,
            (
                SignInState::Verifying,
                SignInAction::Fail(
                    SignInErrorKind::VerificationError
                    | SignInErrorKind::TransportError
                    | SignInErrorKind::ConfigurationError,
                ),
            ) => true,
            _ => false,
        }
    }

    /// Perform a state transition
    pub fn transition(&mut self, action: SignInAction) -> Result<&SignInState, StateError> {
        if !self.can_transition(&action) {
            return Err(StateError::InvalidTransition {
                from: self.current_state.name(),
                action,
            });
        }

        self.current_state = match action {
            SignInAction::Reset => SignInState::Idle,
            SignInAction::Start => SignInState::AwaitingSignature,
            SignInAction::Signed => SignInState::Verifying,
            SignInAction::Verified(session) => SignInState::Authenticated(session),
            SignInAction::Fail(kind) => SignInState::Failed(kind),
        };
        Ok(&self.current_state)
    }

    /// Get the current state
    pub fn state(&self) -> &SignInState {
        &self.current_state
    }
}
