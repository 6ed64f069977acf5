//! # Sampling Session
//!
//! Runs a [`Sampler`] on a background task: pause, run a reporting cycle, hand the result to the
//! receiver, repeat. The task is the only owner of the sampler, so cycles never overlap.
//!
//! A stop request is honoured between cycles only; a cycle that has started always runs to
//! completion or failure. A failed cycle is forwarded like any other result and ends the session.
//!
//! ```no_run
//! # async fn run<S, A>(sampler: statsbar::sampler::Sampler<S, A>) -> statsbar::Result<()>
//! # where
//! #     S: statsbar::source::CounterSource + 'static,
//! #     A: statsbar::auxiliary::AuxiliaryReaders + 'static,
//! # {
//! use statsbar::session::SamplingSession;
//!
//! let mut session = SamplingSession::spawn(sampler);
//! while let Some(update) = session.next_update().await {
//!     let metrics = update?;
//!     println!("{:.2} W", metrics.all_power());
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::auxiliary::AuxiliaryReaders;
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::sampler::Sampler;
use crate::source::CounterSource;

/// Updates buffered before the sampling task waits for the receiver
const UPDATE_BUFFER: usize = 8;

/// How long [`SamplingSession::stop`] waits for the running cycle to finish
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sampling,
}

/// Handle to a running sampling task.
///
/// Dropping the handle aborts the task.
pub struct SamplingSession {
    state: Arc<Mutex<SessionState>>,
    stop_tx: mpsc::Sender<()>,
    task: Option<JoinHandle<()>>,
    update_rx: mpsc::Receiver<Result<Metrics>>,
}

impl SamplingSession {
    /// Move `sampler` onto a new task and start sampling. Must be called within a tokio runtime.
    pub fn spawn<S, A>(mut sampler: Sampler<S, A>) -> Self
    where
        S: CounterSource + 'static,
        A: AuxiliaryReaders + 'static,
    {
        let (update_tx, update_rx) = mpsc::channel(UPDATE_BUFFER);
        let (stop_tx, mut stop_rx) = mpsc::channel(1);
        let state = Arc::new(Mutex::new(SessionState::Sampling));
        let task_state = Arc::clone(&state);
        let pause = sampler.config().pause();

        let task = tokio::spawn(async move {
            info!(chip = %sampler.soc().chip_name, "sampling session started");

            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.recv() => break,
                    _ = tokio::time::sleep(pause) => {},
                }

                let update = sampler.get_metrics().await;
                let failed = update.is_err();
                if let Err(err) = &update {
                    warn!(%err, "sampling cycle failed, ending session");
                }

                if update_tx.send(update).await.is_err() || failed {
                    break;
                }
            }

            *task_state.lock() = SessionState::Idle;
            info!("sampling session stopped");
        });

        Self {
            state,
            stop_tx,
            task: Some(task),
            update_rx,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Wait for the next cycle result. `None` once the session has ended and every buffered
    /// update was received.
    pub async fn next_update(&mut self) -> Option<Result<Metrics>> {
        self.update_rx.recv().await
    }

    /// Ask the task to stop after the current cycle and wait for it to finish.
    ///
    /// Updates not yet received are discarded.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.task.take() else {
            return Ok(());
        };

        let _ = self.stop_tx.try_send(());
        self.update_rx.close();

        match tokio::time::timeout(STOP_TIMEOUT, handle).await {
            Ok(joined) => joined.map_err(|err| Error::system(format!("sampling task failed: {err}"))),
            Err(_) => Err(Error::system("timed out waiting for the sampling task to stop")),
        }
    }
}

impl Drop for SamplingSession {
    fn drop(&mut self) {
        if let Some(handle) = self.task.take() {
            handle.abort();
        }
    }
}
