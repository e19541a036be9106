use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use super::{Completion, Event, MountId, PollHandle, PollTarget, Runtime, Ticket, execute};
use crate::api::{Backend, RequestFailed};

/// Production [`Runtime`]: each request runs on its own short-lived worker
/// thread and reports back over the event channel.
///
/// Cheap to clone; every clone feeds the same channel.
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn Backend>,
    tx: Sender<Event>,
}

impl Dispatcher {
    /// Create a dispatcher and the receiving end the owning thread drains.
    pub fn new(backend: Arc<dyn Backend>) -> (Self, Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        (Self { backend, tx }, rx)
    }

    /// Another producer for the same channel (terminal input, tests).
    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }
}

impl Runtime for Dispatcher {
    fn issue(&mut self, ticket: Ticket) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let Ticket { mount, seq, request } = ticket;
        let kind = request.kind();

        let spawned = thread::Builder::new()
            .name("nexus-fetch".to_string())
            .spawn(move || {
                let result = execute(backend.as_ref(), &request);
                // The receiver is gone only when the dashboard is shutting down.
                let _ = tx.send(Event::Completed(Completion {
                    mount,
                    seq,
                    kind,
                    result,
                }));
            });

        if let Err(e) = spawned {
            let _ = self.tx.send(Event::Completed(Completion {
                mount,
                seq,
                kind,
                result: Err(RequestFailed::new(
                    kind.method(),
                    kind.label(),
                    format!("failed to start request worker: {e}"),
                )),
            }));
        }
    }

    fn every(&mut self, interval: Duration, mount: MountId, target: PollTarget) -> PollHandle {
        PollHandle::spawn(interval, mount, target, self.tx.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::fake::FakeBackend;
    use crate::runtime::{Payload, Request, RequestKind};

    #[test]
    fn issued_ticket_completes_on_channel() {
        let backend = FakeBackend::new().with("GET", "/tools", json!({"tools": []}));
        let (mut dispatcher, events) = Dispatcher::new(Arc::new(backend));

        dispatcher.issue(Ticket {
            mount: MountId(3),
            seq: 9,
            request: Request::Tools,
        });

        match events.recv_timeout(Duration::from_secs(5)).unwrap() {
            Event::Completed(done) => {
                assert_eq!(done.mount, MountId(3));
                assert_eq!(done.seq, 9);
                assert_eq!(done.kind, RequestKind::Tools);
                assert_eq!(done.result, Ok(Payload::Tools(vec![])));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn failures_complete_too() {
        let (mut dispatcher, events) = Dispatcher::new(Arc::new(FakeBackend::new()));
        dispatcher.issue(Ticket {
            mount: MountId(1),
            seq: 1,
            request: Request::Health,
        });
        match events.recv_timeout(Duration::from_secs(5)).unwrap() {
            Event::Completed(done) => assert!(done.result.is_err()),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
