//! PC/SC smart-card reader driver.
//!
//! A dedicated monitor thread blocks in `SCardGetStatusChange`, watching the
//! PnP pseudo-reader for readers being plugged in and every matching reader
//! for card insertion and removal. Observed changes are sent to the async
//! side over the same kind of channel the mock reader uses.

mod apdu;
mod card;

pub use card::PcscCard;

use crate::{
    HardwareError, Result,
    devices::AnyIdCard,
    traits::{CardReader, ReaderEvent},
    types::ReaderInfo,
};
use pcsc::{Context, Protocols, ReaderState, Scope, ShareMode, State};
use std::ffi::{CStr, CString};
use std::thread::JoinHandle;
use std::time::Duration;
use thaiid_core::constants::EVENT_CHANNEL_CAPACITY;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Pause after a failed status query before trying again.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on one `SCardGetStatusChange` wait, so a lost cancel still
/// lets the monitor notice the receiver is gone.
const STATUS_TIMEOUT: Duration = Duration::from_secs(1);

/// PC/SC card reader.
///
/// Watches every reader whose name contains the configured filter, or all
/// readers when no filter is set.
pub struct PcscReader {
    event_rx: mpsc::Receiver<ReaderEvent>,
    context: Context,
    filter: Option<String>,
    monitor: Option<JoinHandle<()>>,
}

impl PcscReader {
    /// Connect to the PC/SC service and start watching readers.
    ///
    /// # Errors
    ///
    /// Returns an initialization error if the PC/SC service is unavailable,
    /// or an I/O error if the monitor thread cannot be spawned.
    pub fn open(filter: Option<String>) -> Result<Self> {
        let context = Context::establish(Scope::User)
            .map_err(|e| HardwareError::initialization(format!("PC/SC context: {e}")))?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let monitor = Monitor {
            context: context.clone(),
            filter: filter.clone(),
            event_tx,
        };

        let monitor = std::thread::Builder::new()
            .name("pcsc-monitor".to_string())
            .spawn(move || monitor.run())?;

        info!(filter = ?filter, "PC/SC reader monitor started");

        Ok(Self {
            event_rx,
            context,
            filter,
            monitor: Some(monitor),
        })
    }
}

impl CardReader for PcscReader {
    async fn next_event(&mut self) -> Result<ReaderEvent> {
        self.event_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected("PC/SC monitor stopped"))
    }

    async fn reader_info(&self) -> Result<ReaderInfo> {
        let context = self.context.clone();
        let filter = self.filter.clone();

        let names = tokio::task::spawn_blocking(move || {
            list_readers(&context)
                .map(|names| matching(names, filter.as_deref()).collect::<Vec<_>>())
        })
        .await??;

        let name = names
            .first()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "PC/SC (no reader attached)".to_string());

        Ok(ReaderInfo::new(name, "pcsc")
            .with_protocols(vec!["T=0".to_string(), "T=1".to_string()]))
    }
}

impl std::fmt::Debug for PcscReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcscReader")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl Drop for PcscReader {
    fn drop(&mut self) {
        self.event_rx.close();
        // Wakes the monitor out of SCardGetStatusChange
        if let Err(e) = self.context.cancel() {
            debug!(error = %e, "PC/SC cancel failed");
        }
        if let Some(monitor) = self.monitor.take()
            && monitor.join().is_err()
        {
            warn!("PC/SC monitor thread panicked");
        }
    }
}

/// The async side went away.
struct Closed;

/// Blocking loop that turns PC/SC state changes into reader events.
struct Monitor {
    context: Context,
    filter: Option<String>,
    event_tx: mpsc::Sender<ReaderEvent>,
}

impl Monitor {
    fn run(self) {
        let mut states = vec![ReaderState::new(pcsc::PNP_NOTIFICATION(), State::UNAWARE)];

        loop {
            if self.refresh_readers(&mut states).is_err() {
                break;
            }

            for state in &mut states {
                state.sync_current_state();
            }

            let result = self
                .context
                .get_status_change(Some(STATUS_TIMEOUT), &mut states);
            match next_step(result, self.event_tx.is_closed()) {
                Step::Dispatch => {}
                Step::Poll => continue,
                Step::Stop => break,
                Step::Retry(e) => {
                    warn!(error = %e, "PC/SC status query failed");
                    if self.emit(ReaderEvent::Error(e.to_string())).is_err() {
                        break;
                    }
                    std::thread::sleep(RETRY_DELAY);
                    continue;
                }
            }

            if self.dispatch_card_changes(&states).is_err() {
                break;
            }
        }

        debug!("PC/SC monitor stopped");
    }

    /// Drop vanished readers and start watching new ones.
    fn refresh_readers(&self, states: &mut Vec<ReaderState>) -> std::result::Result<(), Closed> {
        let mut vanished = Vec::new();
        states.retain(|state| {
            let gone = !is_pnp(state)
                && state
                    .event_state()
                    .intersects(State::UNKNOWN | State::IGNORE);
            if gone {
                vanished.push(state.name().to_string_lossy().into_owned());
            }
            !gone
        });
        for reader in vanished {
            info!(reader = %reader, "Reader removed");
            self.emit(ReaderEvent::DeviceDeactivated { reader })?;
        }

        let names = match list_readers(&self.context) {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Cannot list PC/SC readers");
                self.emit(ReaderEvent::Error(e.to_string()))?;
                Vec::new()
            }
        };

        for name in matching(names, self.filter.as_deref()) {
            if states.iter().any(|state| state.name() == name.as_c_str()) {
                continue;
            }
            let reader = name.to_string_lossy().into_owned();
            info!(reader = %reader, "Reader attached");
            states.push(ReaderState::new(name, State::UNAWARE));
            self.emit(ReaderEvent::DeviceActivated { reader })?;
        }

        Ok(())
    }

    /// Report insertions and removals seen by the last status query.
    fn dispatch_card_changes(&self, states: &[ReaderState]) -> std::result::Result<(), Closed> {
        for state in states.iter().filter(|state| !is_pnp(state)) {
            let was_present = state.current_state().contains(State::PRESENT);
            let is_present = state.event_state().contains(State::PRESENT);
            let reader = state.name().to_string_lossy().into_owned();

            match (was_present, is_present) {
                (false, true) => {
                    let event = self.connect(state.name(), state.atr(), reader);
                    self.emit(event)?;
                }
                (true, false) => self.emit(ReaderEvent::CardRemoved { reader })?,
                _ => {}
            }
        }

        Ok(())
    }

    fn connect(&self, name: &CStr, atr: &[u8], reader: String) -> ReaderEvent {
        let card = self
            .context
            .connect(name, ShareMode::Shared, Protocols::ANY)
            .map_err(HardwareError::from)
            .and_then(|card| PcscCard::select(card, reader.clone(), atr));

        match card {
            Ok(card) => ReaderEvent::CardInserted(AnyIdCard::Pcsc(card)),
            Err(e) => {
                warn!(reader = %reader, error = %e, "Cannot open inserted card");
                ReaderEvent::Error(format!("{reader}: {e}"))
            }
        }
    }

    fn emit(&self, event: ReaderEvent) -> std::result::Result<(), Closed> {
        self.event_tx.blocking_send(event).map_err(|_| Closed)
    }
}

/// What the monitor does after one status query.
#[derive(Debug, PartialEq)]
enum Step {
    /// Something changed; report it.
    Dispatch,
    /// Nothing changed within the timeout; wait again.
    Poll,
    Stop,
    Retry(pcsc::Error),
}

fn next_step(result: std::result::Result<(), pcsc::Error>, closed: bool) -> Step {
    match result {
        Ok(()) => Step::Dispatch,
        Err(pcsc::Error::Cancelled) => Step::Stop,
        Err(pcsc::Error::Timeout) if closed => Step::Stop,
        Err(pcsc::Error::Timeout) => Step::Poll,
        Err(e) => Step::Retry(e),
    }
}

fn is_pnp(state: &ReaderState) -> bool {
    state.name() == pcsc::PNP_NOTIFICATION()
}

fn list_readers(context: &Context) -> Result<Vec<CString>> {
    match context.list_readers_owned() {
        Ok(names) => Ok(names),
        Err(pcsc::Error::NoReadersAvailable) => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

fn matching(names: Vec<CString>, filter: Option<&str>) -> impl Iterator<Item = CString> + '_ {
    names
        .into_iter()
        .filter(move |name| filter.is_none_or(|f| name.to_string_lossy().contains(f)))
}
