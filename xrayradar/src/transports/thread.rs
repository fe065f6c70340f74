use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use xrayradar_core::radar_debug;

use crate::protocol::Event;

// Bound on events queued for delivery.  The capture call must never block
// on the transport, so when the queue is full new events are dropped
// instead of applying backpressure.
const QUEUE_DEPTH: usize = 30;

enum Task {
    SendEvent(Event),
    Flush(SyncSender<()>),
    Shutdown,
}

pub struct TransportThread {
    sender: SyncSender<Task>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TransportThread {
    pub fn new<SendFn>(mut send: SendFn) -> Self
    where
        SendFn: FnMut(Event) + Send + 'static,
    {
        let (sender, receiver) = sync_channel(QUEUE_DEPTH);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_worker = shutdown.clone();
        let handle = thread::Builder::new()
            .name("xrayradar-transport".into())
            .spawn(move || {
                for task in receiver.into_iter() {
                    if shutdown_worker.load(Ordering::SeqCst) {
                        return;
                    }
                    match task {
                        Task::SendEvent(event) => send(event),
                        Task::Flush(rendezvous) => {
                            rendezvous.send(()).ok();
                        }
                        Task::Shutdown => return,
                    }
                }
            })
            .ok();

        Self {
            sender,
            shutdown,
            handle,
        }
    }

    pub fn send(&self, event: Event) {
        if let Err(TrySendError::Full(Task::SendEvent(event))) =
            self.sender.try_send(Task::SendEvent(event))
        {
            radar_debug!(
                "[TransportThread] queue full, dropping event {}",
                event.event_id
            );
        }
    }

    pub fn flush(&self, timeout: Duration) -> bool {
        let (rendezvous, done) = sync_channel(1);
        if self.sender.send(Task::Flush(rendezvous)).is_err() {
            return false;
        }
        done.recv_timeout(timeout).is_ok()
    }
}

impl Drop for TransportThread {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // a full queue is fine: the worker checks the flag on its next task
        self.sender.try_send(Task::Shutdown).ok();
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}
