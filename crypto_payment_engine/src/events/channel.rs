//! Stateless pub-sub for engine events
//!
//! Handlers receive the event and nothing else. They have no access to engine state, but they can be async, and
//! several can run at once.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, listener) = mpsc::channel(buffer_size.max(1));
        Self { listener, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Dispatch events until the last producer is dropped, then wait for in-flight handlers to finish.
    pub async fn start_handler(self) {
        let Self { mut listener, sender, handler } = self;
        debug!("📬️ Starting event handler");
        // Only producers may keep the channel open
        drop(sender);
        let mut jobs = JoinSet::new();
        while let Some(ev) = listener.recv().await {
            trace!("📬️ Handling event");
            jobs.spawn((handler)(ev));
            // reap finished jobs so the set doesn't grow without bound
            while let Some(res) = jobs.try_join_next() {
                log_join_result(res);
            }
        }
        debug!("📬️ All producers are gone. Waiting for {} handler(s) to complete", jobs.len());
        while let Some(res) = jobs.join_next().await {
            log_join_result(res);
        }
        debug!("📬️ Event handler has shut down");
    }
}

fn log_join_result(res: Result<(), tokio::task::JoinError>) {
    match res {
        Ok(()) => trace!("📬️ Event handled"),
        Err(e) => warn!("📬️ An event handler did not complete. {e}"),
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Wait for room in the queue, then publish.
    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }

    /// Publish without waiting. If the queue is full (its handler is slow, or was never started) the event is dropped.
    /// Returns whether the event was queued.
    pub fn try_publish_event(&self, event: E) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("📬️ Event queue is full. The event was dropped");
                false
            },
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("📬️ Failed to send event: the handler has shut down");
                false
            },
        }
    }
}
