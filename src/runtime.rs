//! Runtime for executing intake dialogues
//!
//! Inbound messages are queued and handled one at a time, each run to
//! completion before the next starts.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{IntakeRuntime, Outgoing};
pub use traits::*;

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = IntakeRuntime<DatabaseStore<SystemClock>, InMemorySessionStore>;

const QUEUE_DEPTH: usize = 256;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Dispatcher is not running")]
    Stopped,
    #[error("Dispatcher dropped the reply")]
    NoReply,
}

/// One queued inbound message and where to send its replies
#[derive(Debug)]
struct Inbound {
    user: UserId,
    text: String,
    reply_tx: oneshot::Sender<Vec<Outgoing>>,
}

/// Cloneable handle for submitting messages to the dispatcher task
#[derive(Clone)]
pub struct Dispatcher {
    inbound_tx: mpsc::Sender<Inbound>,
}

impl Dispatcher {
    /// Spawn the dispatcher task that owns the runtime
    pub fn spawn<R, S>(runtime: Arc<IntakeRuntime<R, S>>) -> Self
    where
        R: RecordStore + 'static,
        S: SessionStore + 'static,
    {
        let (inbound_tx, inbound_rx) = mpsc::channel(QUEUE_DEPTH);
        tokio::spawn(run(runtime, inbound_rx));
        Self { inbound_tx }
    }

    /// Queue a message and wait for its replies
    pub async fn dispatch(
        &self,
        user: UserId,
        text: String,
    ) -> Result<Vec<Outgoing>, DispatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inbound_tx
            .send(Inbound {
                user,
                text,
                reply_tx,
            })
            .await
            .map_err(|_| DispatchError::Stopped)?;
        reply_rx.await.map_err(|_| DispatchError::NoReply)
    }
}

async fn run<R, S>(runtime: Arc<IntakeRuntime<R, S>>, mut inbound_rx: mpsc::Receiver<Inbound>)
where
    R: RecordStore,
    S: SessionStore,
{
    tracing::info!("Starting intake dispatcher");

    // Process messages in a loop - each one to completion
    loop {
        tokio::select! {
            Some(message) = inbound_rx.recv() => {
                let outgoing = runtime.handle_message(message.user, &message.text).await;
                if message.reply_tx.send(outgoing).is_err() {
                    tracing::warn!(
                        user_id = %message.user,
                        "Caller went away before replies were ready"
                    );
                }
            }
            else => break,
        }
    }

    tracing::info!("Intake dispatcher stopped");
}
