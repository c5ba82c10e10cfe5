use super::surface::PageSurface;
use crate::content_id::{self, ContentId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Single producer of content-identifier-change events.
///
/// Structural mutation notifications and a bounded poll both wake the same
/// dedupe step, so overlapping observers can never register duplicate
/// blockers. Addresses without a derivable identifier are skipped. The
/// producer is cancellable and a fresh one can be started after cancel;
/// dropping the signal cancels it too.
pub struct NavigationSignal {
    events: mpsc::Receiver<ContentId>,
    cancel: CancellationToken,
}

impl NavigationSignal {
    pub fn start(surface: Arc<dyn PageSurface>, poll_interval: Duration) -> Self {
        let (tx, events) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let mutations = surface.subscribe_mutations();

        tokio::spawn(produce(surface, mutations, poll_interval, tx, token));

        Self { events, cancel }
    }

    /// Next identifier change. `None` once the producer has stopped.
    pub async fn next_change(&mut self) -> Option<ContentId> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for NavigationSignal {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn produce(
    surface: Arc<dyn PageSurface>,
    mutations: broadcast::Receiver<()>,
    poll_interval: Duration,
    tx: mpsc::Sender<ContentId>,
    cancel: CancellationToken,
) {
    let mut mutations = Some(mutations);
    let mut last_seen: Option<ContentId> = None;
    let mut poll = tokio::time::interval(poll_interval);
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = poll.tick() => {}
            () = next_mutation(&mut mutations) => {}
        }

        let Some(address) = surface.current_address() else {
            continue;
        };
        let Some(id) = content_id::derive(&address) else {
            continue;
        };
        if last_seen.as_ref() == Some(&id) {
            continue;
        }
        last_seen = Some(id.clone());
        if tx.send(id).await.is_err() {
            break;
        }
    }
}

/// Wait for one mutation notification. A lagged subscriber just wakes (the
/// notification carries no payload); a closed stream parks this branch and
/// leaves polling as the only wakeup source.
async fn next_mutation(mutations: &mut Option<broadcast::Receiver<()>>) {
    match mutations {
        Some(rx) => match rx.recv().await {
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => {
                *mutations = None;
                std::future::pending().await
            }
        },
        None => std::future::pending().await,
    }
}
