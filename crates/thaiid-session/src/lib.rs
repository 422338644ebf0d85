//! Reader session for the Thai ID bridge.
//!
//! The [`Session`] consumes reader events one at a time, runs the card
//! extraction [`pipeline`] on insertion and publishes the resulting state.
//! Query code holds a [`SessionView`] and only ever reads.
//!
//! ```no_run
//! use thaiid_hardware::{AnyCardReader, ReaderManager, ReaderManagerConfig};
//! use thaiid_hardware::mock::MockReader;
//! use thaiid_session::Session;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (reader, _mock) = MockReader::new();
//!     let mut manager = ReaderManager::new(ReaderManagerConfig::default());
//!     manager.register_reader(AnyCardReader::Mock(reader));
//!
//!     let (mut session, view) = Session::new();
//!     tokio::spawn(async move { session.run(manager.start()).await });
//!
//!     println!("{:?}", view.status());
//! }
//! ```

pub mod pipeline;
pub mod session;
pub mod state;

pub use pipeline::read_person;
pub use session::{Session, SessionStatus, SessionView};
pub use state::{SessionState, StateMachine, StateTransition};
