use crate::events::AppEvent;
use crate::spin::{SpinId, SpinTicket};
use async_channel::Sender;
use tokio::task::JoinHandle;

/// Posts `SpinFinished` once the ticket's duration has elapsed.
pub struct SpinTimer {
    id: SpinId,
    handle: JoinHandle<()>,
}

impl SpinTimer {
    pub fn schedule(ticket: &SpinTicket, tx: Sender<AppEvent>) -> Self {
        let (id, duration) = (ticket.id, ticket.duration);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if tx.send(AppEvent::SpinFinished(id)).await.is_err() {
                log::debug!("Event loop gone before {} finished", id);
            }
        });
        Self { id, handle }
    }

    pub fn id(&self) -> SpinId {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(self) {
        log::debug!("Cancelling timer for {}", self.id);
        self.handle.abort();
    }
}
