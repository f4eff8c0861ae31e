//! Request registrar: bridges synchronous callers to asynchronous,
//! timer- and event-driven results.
//!
//! Every inbound operation registers its caller-chosen request id and
//! receives a [`RequestTicket`] that resolves exactly once - with the
//! operation's response, or with `SHUTTING_DOWN` when the engine drains.
//! A result that arrives before its registration lands is buffered, never
//! dropped.
//!
//! The registrar lock is never held across an await; ticket waits happen
//! entirely outside the actor exclusion domains.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use common::types::RequestId;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::errors::{EngineError, ResponseCode};
use crate::response::Response;

enum Slot {
    /// Registration landed first; the resolver completes the sender.
    Waiting(oneshot::Sender<Response>),
    /// The result arrived before registration; held until claimed.
    Buffered(Response),
}

struct State {
    slots: HashMap<RequestId, Slot>,
    shut_down: bool,
}

/// A single-resolution wait handle for one registered request.
#[derive(Debug)]
pub struct RequestTicket {
    receiver: oneshot::Receiver<Response>,
}

impl RequestTicket {
    /// Wait for the response. A dropped slot (only possible once the
    /// registrar itself is gone) reads as shutdown.
    pub async fn wait(self) -> Response {
        self.receiver
            .await
            .unwrap_or_else(|_| Response::code_only(ResponseCode::ShuttingDown))
    }
}

/// Concurrent map from pending request id to its single-resolution slot.
pub struct RequestRegistrar {
    state: Mutex<State>,
}

impl Default for RequestRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestRegistrar {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                slots: HashMap::new(),
                shut_down: false,
            }),
        }
    }

    /// Register a request id and obtain its wait handle.
    ///
    /// Fails with `DuplicateRequest` while another slot with the same id is
    /// pending, and with `ShuttingDown` after [`RequestRegistrar::shutdown`].
    /// If the result already arrived, the ticket resolves immediately.
    pub fn register(&self, request_id: &RequestId) -> Result<RequestTicket, EngineError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.shut_down {
            return Err(EngineError::ShuttingDown);
        }

        let (sender, receiver) = oneshot::channel();
        match state.slots.remove(request_id) {
            None => {
                state.slots.insert(request_id.clone(), Slot::Waiting(sender));
            }
            Some(Slot::Buffered(response)) => {
                // The resolver won the race; hand its result straight over.
                debug!(
                    target: "sl.registrar",
                    request_id = %request_id,
                    "Claiming early-resolved result"
                );
                let _ = sender.send(response);
            }
            Some(waiting @ Slot::Waiting(_)) => {
                state.slots.insert(request_id.clone(), waiting);
                return Err(EngineError::DuplicateRequest(request_id.clone()));
            }
        }
        Ok(RequestTicket { receiver })
    }

    /// Complete a pending slot exactly once. Resolving an already-resolved
    /// id is a no-op; resolving an id that has not registered yet buffers
    /// the result until the registration lands.
    pub fn resolve(&self, request_id: &RequestId, response: Response) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.slots.remove(request_id) {
            Some(Slot::Waiting(sender)) => {
                // The waiter may have given up; a failed send is fine.
                let _ = sender.send(response);
            }
            Some(buffered @ Slot::Buffered(_)) => {
                // Already resolved and never claimed; keep the first result.
                state.slots.insert(request_id.clone(), buffered);
            }
            None => {
                if state.shut_down {
                    return;
                }
                state
                    .slots
                    .insert(request_id.clone(), Slot::Buffered(response));
            }
        }
    }

    /// Resolve every pending slot with `SHUTTING_DOWN` and reject all
    /// future registrations with the same signal. Idempotent.
    pub fn shutdown(&self) {
        let drained: Vec<(RequestId, Slot)> = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.shut_down {
                return;
            }
            state.shut_down = true;
            state.slots.drain().collect()
        };

        let pending = drained.len();
        for (request_id, slot) in drained {
            if let Slot::Waiting(sender) = slot {
                debug!(
                    target: "sl.registrar",
                    request_id = %request_id,
                    "Resolving pending request with shutdown signal"
                );
                let _ = sender.send(Response::code_only(ResponseCode::ShuttingDown));
            }
        }
        if pending > 0 {
            warn!(
                target: "sl.registrar",
                pending, "Registrar drained pending requests on shutdown"
            );
        }
    }

    /// Whether shutdown has been signalled.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .shut_down
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::response::ResponseBody;

    #[tokio::test]
    async fn test_register_then_resolve() {
        let registrar = RequestRegistrar::new();
        let id = RequestId::from("r-1");

        let ticket = registrar.register(&id).unwrap();
        registrar.resolve(&id, Response::ok());

        assert!(ticket.wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_pending_id_rejected() {
        let registrar = RequestRegistrar::new();
        let id = RequestId::from("r-1");

        let _ticket = registrar.register(&id).unwrap();
        let result = registrar.register(&id);

        assert!(matches!(result, Err(EngineError::DuplicateRequest(_))));
    }

    #[tokio::test]
    async fn test_id_reusable_after_resolution() {
        let registrar = RequestRegistrar::new();
        let id = RequestId::from("r-1");

        let ticket = registrar.register(&id).unwrap();
        registrar.resolve(&id, Response::ok());
        assert!(ticket.wait().await.is_ok());

        // The slot is gone; the id may be reused.
        let ticket = registrar.register(&id).unwrap();
        registrar.resolve(&id, Response::code_only(ResponseCode::GameOver));
        assert_eq!(ticket.wait().await.code, ResponseCode::GameOver);
    }

    #[tokio::test]
    async fn test_early_resolve_is_buffered_not_dropped() {
        let registrar = RequestRegistrar::new();
        let id = RequestId::from("r-1");

        // Result arrives before registration.
        registrar.resolve(&id, Response::ok_with(ResponseBody::PoolCancelled));

        let ticket = registrar.register(&id).unwrap();
        let response = ticket.wait().await;
        assert!(response.is_ok());
        assert_eq!(response.body, Some(ResponseBody::PoolCancelled));
    }

    #[tokio::test]
    async fn test_double_resolve_keeps_first_result() {
        let registrar = RequestRegistrar::new();
        let id = RequestId::from("r-1");

        registrar.resolve(&id, Response::ok());
        registrar.resolve(&id, Response::code_only(ResponseCode::GameOver));

        let ticket = registrar.register(&id).unwrap();
        assert!(ticket.wait().await.is_ok());
    }

    #[tokio::test]
    async fn test_resolve_after_waiter_resolved_is_noop() {
        let registrar = RequestRegistrar::new();
        let id = RequestId::from("r-1");

        let ticket = registrar.register(&id).unwrap();
        registrar.resolve(&id, Response::ok());
        assert!(ticket.wait().await.is_ok());

        // Second resolve of the same id after completion: buffered for a
        // potential re-registration, but never delivered twice to the
        // original waiter (it is consumed).
        registrar.resolve(&id, Response::code_only(ResponseCode::GameOver));
    }

    #[tokio::test]
    async fn test_shutdown_resolves_pending_and_rejects_new() {
        let registrar = RequestRegistrar::new();
        let pending = registrar.register(&RequestId::from("r-1")).unwrap();

        registrar.shutdown();

        assert_eq!(pending.wait().await.code, ResponseCode::ShuttingDown);
        assert!(matches!(
            registrar.register(&RequestId::from("r-2")),
            Err(EngineError::ShuttingDown)
        ));
        assert!(registrar.is_shut_down());
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let registrar = RequestRegistrar::new();
        registrar.shutdown();
        registrar.shutdown();
        assert!(registrar.is_shut_down());
    }

    #[tokio::test]
    async fn test_resolve_after_shutdown_is_dropped() {
        let registrar = RequestRegistrar::new();
        registrar.shutdown();

        // Nothing to deliver to and no future registration can claim it.
        registrar.resolve(&RequestId::from("r-9"), Response::ok());
        assert!(registrar.is_shut_down());
    }
}
