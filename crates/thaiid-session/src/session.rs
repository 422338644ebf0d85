//! Reader session: the single owner of connectivity and card data.
//!
//! A [`Session`] consumes reader events one at a time. Every change it makes
//! is published as a whole through a `watch` channel, so a [`SessionView`]
//! always sees either the previous or the next complete state and never a
//! half-written record.
//!
//! Events that arrive while a card is being read wait in the reader channel.
//! A removal during a read is therefore applied only after the read has
//! finished, and briefly publishes the record of a card that is already out.

use crate::pipeline::read_person;
use crate::state::{SessionState, StateMachine, StateTransition};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use thaiid_core::{Error, PersonRecord, Result};
use thaiid_hardware::{IdCard, ReaderEvent, ReaderHandle};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Connectivity and data availability, as answered to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// A reader is attached.
    pub connected: bool,

    /// A complete card read is available.
    pub has_data: bool,

    /// Current session state.
    pub state: SessionState,
}

impl From<SessionState> for SessionStatus {
    fn from(state: SessionState) -> Self {
        Self {
            connected: state.is_connected(),
            has_data: state.has_data(),
            state,
        }
    }
}

/// Value carried by the watch channel.
#[derive(Debug, Clone, Default)]
struct Published {
    state: SessionState,
    snapshot: Option<Arc<PersonRecord>>,
}

/// Owns the session state and the card snapshot.
///
/// # Examples
///
/// ```
/// use thaiid_hardware::ReaderEvent;
/// use thaiid_session::{Session, SessionState};
///
/// #[tokio::main]
/// async fn main() {
///     let (mut session, view) = Session::new();
///     assert!(!view.status().connected);
///
///     session
///         .handle_event(ReaderEvent::DeviceActivated { reader: "ACR39U".into() })
///         .await;
///
///     assert_eq!(view.status().state, SessionState::IdleConnectedNoCard);
///     assert!(view.snapshot().is_none());
/// }
/// ```
pub struct Session {
    machine: StateMachine,
    published: watch::Sender<Published>,
}

impl Session {
    /// Create a session in the disconnected state with no card data.
    pub fn new() -> (Self, SessionView) {
        let (published, receiver) = watch::channel(Published::default());

        let session = Self {
            machine: StateMachine::new(),
            published,
        };

        (session, SessionView { receiver })
    }

    /// Another view onto this session.
    pub fn view(&self) -> SessionView {
        SessionView {
            receiver: self.published.subscribe(),
        }
    }

    /// Current session state.
    pub fn current_state(&self) -> SessionState {
        *self.machine.current_state()
    }

    /// Recent state transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        self.machine.history()
    }

    /// The last `count` state transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.machine.last_transitions(count)
    }

    /// Apply one reader event.
    ///
    /// Returns the last transition the event caused, if any. Failures are
    /// logged and leave the session in a consistent state; none of them
    /// escape.
    pub async fn handle_event(&mut self, event: ReaderEvent) -> Option<StateTransition> {
        match event {
            ReaderEvent::DeviceActivated { reader } => {
                info!(reader = %reader, "Reader attached, waiting for a card");
                self.publish(SessionState::IdleConnectedNoCard, None)
            }
            ReaderEvent::DeviceDeactivated { reader } => {
                info!(reader = %reader, "Reader removed, please reconnect it");
                self.publish(SessionState::IdleDisconnected, None)
            }
            ReaderEvent::CardInserted(mut card) => {
                if !self.current_state().is_connected() {
                    warn!(reader = %card.reader(), "Card inserted while no reader is attached, ignoring");
                    return None;
                }

                info!(reader = %card.reader(), "Card inserted, reading");
                let cleared = self.publish(SessionState::IdleConnectedNoCard, None);

                match read_person(&mut card).await {
                    Ok(record) => self
                        .publish(SessionState::ConnectedHasCard, Some(Arc::new(record)))
                        .or(cleared),
                    Err(e) => {
                        error!(error = %e, "Card read failed");
                        cleared
                    }
                }
            }
            ReaderEvent::CardRemoved { reader } => {
                if !self.current_state().is_connected() {
                    debug!(reader = %reader, "Card removed while disconnected");
                    return None;
                }
                info!(reader = %reader, "Card removed, insert a card to continue");
                self.publish(SessionState::IdleConnectedNoCard, None)
            }
            ReaderEvent::Error(message) => {
                error!(error = %message, "Reader error");
                None
            }
            other => {
                debug!(event = other.kind(), "Unhandled reader event");
                None
            }
        }
    }

    /// Consume reader events until the reader stops.
    ///
    /// When the event stream ends the reader is gone, so the session falls
    /// back to disconnected.
    pub async fn run(&mut self, mut events: ReaderHandle) {
        while let Some(event) = events.recv().await {
            if let Some(transition) = self.handle_event(event).await {
                debug!(%transition, "Session transition");
            }
        }

        warn!("Reader event stream ended");
        self.publish(SessionState::IdleDisconnected, None);

        if let Err(e) = events.shutdown().await {
            warn!(error = %e, "Reader shutdown failed");
        }
    }

    fn publish(
        &mut self,
        state: SessionState,
        snapshot: Option<Arc<PersonRecord>>,
    ) -> Option<StateTransition> {
        match self.machine.transition_to(state) {
            Ok(Some(transition)) => {
                self.published.send_replace(Published { state, snapshot });
                Some(transition)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Session transition rejected");
                None
            }
        }
    }
}

/// Read-only handle onto the published session state.
///
/// Cheap to clone; reads never wait on an in-flight card read.
#[derive(Debug, Clone)]
pub struct SessionView {
    receiver: watch::Receiver<Published>,
}

impl SessionView {
    /// Current connectivity and data availability.
    pub fn status(&self) -> SessionStatus {
        self.receiver.borrow().state.into()
    }

    /// The published card record, if any.
    pub fn snapshot(&self) -> Option<Arc<PersonRecord>> {
        self.receiver.borrow().snapshot.clone()
    }

    /// The published card record, or why there is none.
    ///
    /// Status and record are taken from the same publication.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceUnavailable` when no reader is attached and
    /// `Error::NoCardData` when no card has been read.
    pub fn person(&self) -> Result<Arc<PersonRecord>> {
        let published = self.receiver.borrow();

        if !published.state.is_connected() {
            return Err(Error::DeviceUnavailable);
        }
        published.snapshot.clone().ok_or(Error::NoCardData)
    }

    /// Wait for the next publication.
    ///
    /// Returns `None` once the session has been dropped.
    pub async fn changed(&mut self) -> Option<SessionStatus> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().state.into())
    }

    /// Wait until the published status satisfies `condition`.
    ///
    /// Returns `None` if the session is dropped first.
    pub async fn wait_for(
        &mut self,
        mut condition: impl FnMut(&SessionStatus) -> bool,
    ) -> Option<SessionStatus> {
        let published = self
            .receiver
            .wait_for(|published| condition(&published.state.into()))
            .await
            .ok()?;
        Some(published.state.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thaiid_hardware::AnyIdCard;
    use thaiid_hardware::mock::{CardFixture, MockCard};

    fn activated() -> ReaderEvent {
        ReaderEvent::DeviceActivated {
            reader: "Test Reader".to_string(),
        }
    }

    fn inserted(card: MockCard) -> ReaderEvent {
        ReaderEvent::CardInserted(AnyIdCard::Mock(card))
    }

    fn sample_card() -> MockCard {
        MockCard::new("Test Reader", CardFixture::sample())
    }

    #[test]
    fn test_new_session_is_disconnected() {
        let (session, view) = Session::new();

        assert_eq!(session.current_state(), SessionState::IdleDisconnected);
        assert_eq!(
            view.status(),
            SessionStatus {
                connected: false,
                has_data: false,
                state: SessionState::IdleDisconnected,
            }
        );
        assert!(view.snapshot().is_none());
        assert!(matches!(view.person(), Err(Error::DeviceUnavailable)));
    }

    #[tokio::test]
    async fn test_activation_then_read() {
        let (mut session, view) = Session::new();

        let transition = session.handle_event(activated()).await.unwrap();
        assert_eq!(transition.to, SessionState::IdleConnectedNoCard);
        assert!(matches!(view.person(), Err(Error::NoCardData)));

        let transition = session.handle_event(inserted(sample_card())).await.unwrap();
        assert_eq!(transition.from, SessionState::IdleConnectedNoCard);
        assert_eq!(transition.to, SessionState::ConnectedHasCard);

        let record = view.person().unwrap();
        assert_eq!(record.cid, "1101700203451");
        assert!(view.status().has_data);
    }

    #[tokio::test]
    async fn test_status_serialization() {
        let (mut session, view) = Session::new();
        session.handle_event(activated()).await;

        let json = serde_json::to_value(view.status()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "connected": true,
                "hasData": false,
                "state": "idle_connected_no_card"
            })
        );
    }

    #[tokio::test]
    async fn test_error_event_changes_nothing() {
        let (mut session, view) = Session::new();
        session.handle_event(activated()).await;
        session.handle_event(inserted(sample_card())).await;

        let before = view.snapshot();
        assert!(
            session
                .handle_event(ReaderEvent::Error("transmit failed".into()))
                .await
                .is_none()
        );
        assert_eq!(view.snapshot(), before);
        assert_eq!(session.current_state(), SessionState::ConnectedHasCard);
    }

    #[tokio::test]
    async fn test_view_from_session() {
        let (mut session, _) = Session::new();
        let view = session.view();

        session.handle_event(activated()).await;
        assert!(view.status().connected);
    }
}
