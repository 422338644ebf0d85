//! Reader session state machine.
//!
//! # States
//!
//! - `IdleDisconnected`: no reader attached; card data is never valid here
//! - `IdleConnectedNoCard`: reader attached, no card data available
//! - `ConnectedHasCard`: reader attached and a complete card read is published
//!
//! # Valid Transitions
//!
//! - any state → IdleDisconnected (reader removed)
//! - any state → IdleConnectedNoCard (reader attached, card removed, read
//!   started or failed)
//! - IdleConnectedNoCard → ConnectedHasCard (read committed)
//!
//! # Examples
//!
//! ```
//! use thaiid_session::{SessionState, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! assert_eq!(machine.current_state(), &SessionState::IdleDisconnected);
//!
//! machine.transition_to(SessionState::IdleConnectedNoCard).unwrap();
//! machine.transition_to(SessionState::ConnectedHasCard).unwrap();
//! assert_eq!(machine.history().len(), 2);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use thaiid_core::constants::MAX_HISTORY_SIZE;
use thaiid_core::{Error, Result};

/// Externally observable state of the reader session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No reader attached.
    #[default]
    IdleDisconnected,

    /// Reader attached, no card data available.
    IdleConnectedNoCard,

    /// Reader attached and card data published.
    ConnectedHasCard,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            SessionState::IdleDisconnected => "IdleDisconnected",
            SessionState::IdleConnectedNoCard => "IdleConnectedNoCard",
            SessionState::ConnectedHasCard => "ConnectedHasCard",
        };
        write!(f, "{}", state_str)
    }
}

impl SessionState {
    /// Whether a reader is attached.
    pub fn is_connected(&self) -> bool {
        !matches!(self, SessionState::IdleDisconnected)
    }

    /// Whether card data is published.
    pub fn has_data(&self) -> bool {
        matches!(self, SessionState::ConnectedHasCard)
    }

    /// Check if transition to target state is valid from this state.
    ///
    /// Staying in the same state is not a transition.
    ///
    /// # Examples
    ///
    /// ```
    /// use thaiid_session::SessionState;
    ///
    /// assert!(SessionState::IdleConnectedNoCard.can_transition_to(&SessionState::ConnectedHasCard));
    /// assert!(!SessionState::IdleDisconnected.can_transition_to(&SessionState::ConnectedHasCard));
    /// ```
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        matches!(
            (self, target),
            (
                SessionState::IdleConnectedNoCard | SessionState::ConnectedHasCard,
                SessionState::IdleDisconnected
            ) | (
                SessionState::IdleDisconnected | SessionState::ConnectedHasCard,
                SessionState::IdleConnectedNoCard
            ) | (
                SessionState::IdleConnectedNoCard,
                SessionState::ConnectedHasCard
            )
        )
    }
}

/// A single state transition with timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: SessionState,

    /// The state transitioned to.
    pub to: SessionState,

    /// When the transition occurred.
    pub timestamp: Instant,
}

impl StateTransition {
    /// Create a new state transition record with the current timestamp.
    pub fn new(from: SessionState, to: SessionState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Get the duration since this transition occurred.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

impl fmt::Display for StateTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Session state machine with bounded transition history.
///
/// Not thread-safe; owned by the single task that consumes reader events.
#[derive(Debug)]
pub struct StateMachine {
    /// Current session state.
    current_state: SessionState,

    /// When the current state was entered.
    state_entered_at: Instant,

    /// History of state transitions (limited to MAX_HISTORY_SIZE).
    history: VecDeque<StateTransition>,
}

impl StateMachine {
    /// Create a new state machine in the IdleDisconnected state.
    pub fn new() -> Self {
        Self {
            current_state: SessionState::IdleDisconnected,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Get the current state of the machine.
    pub fn current_state(&self) -> &SessionState {
        &self.current_state
    }

    /// Get the time elapsed in the current state.
    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Recent state transitions, ordered from oldest to newest.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Get the last N state transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    /// Move to `new_state`.
    ///
    /// Returns `Ok(None)` when already in `new_state`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the transition is not valid
    /// from the current state.
    pub fn transition_to(&mut self, new_state: SessionState) -> Result<Option<StateTransition>> {
        if new_state == self.current_state {
            return Ok(None);
        }

        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);

        self.current_state = new_state;
        self.state_entered_at = transition.timestamp;

        if self.history.len() >= MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(transition.clone());

        Ok(Some(transition))
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
