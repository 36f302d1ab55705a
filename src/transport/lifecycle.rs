//! Lifecycle callback forwarding.
//!
//! Every non-traffic callback becomes the bus event of the same name. The
//! server handle comes first, followed by the callback's own arguments in
//! their native order.

use crate::engine::{EngineCallback, ServerInfo};
use crate::event::{Arg, Event, EventBus, PublishReport};

/// Event name and positional payload for a lifecycle callback.
///
/// Traffic callbacks have no lifecycle event and return `None`, as does
/// `worker_exit` unless `reload_async` is enabled.
pub fn event_for(callback: &EngineCallback<'_>, info: ServerInfo) -> Option<(Event, Vec<Arg>)> {
    let reload_async = info.settings.reload_async();
    let server = Arg::Server(info);
    let forwarded = match callback {
        EngineCallback::Start => (Event::Start, vec![server]),
        EngineCallback::ManagerStart => (Event::ManagerStart, vec![server]),
        EngineCallback::WorkerStart { worker_id } => {
            (Event::WorkerStart, vec![server, Arg::from(*worker_id)])
        }
        EngineCallback::Task {
            task_id,
            src_worker_id,
            data,
        } => (
            Event::Task,
            vec![
                server,
                Arg::from(*task_id),
                Arg::from(*src_worker_id),
                Arg::Bytes(data.clone()),
            ],
        ),
        EngineCallback::PipeMessage {
            src_worker_id,
            message,
        } => (
            Event::PipeMessage,
            vec![server, Arg::from(*src_worker_id), Arg::Bytes(message.clone())],
        ),
        EngineCallback::ManagerStop => (Event::ManagerStop, vec![server]),
        EngineCallback::WorkerStop { worker_id } => {
            (Event::WorkerStop, vec![server, Arg::from(*worker_id)])
        }
        EngineCallback::Finish { task_id, data } => (
            Event::Finish,
            vec![server, Arg::from(*task_id), Arg::Bytes(data.clone())],
        ),
        EngineCallback::WorkerError {
            worker_id,
            worker_pid,
            exit_code,
            signal,
        } => (
            Event::WorkerError,
            vec![
                server,
                Arg::from(*worker_id),
                Arg::from(*worker_pid),
                Arg::from(*exit_code),
                Arg::from(*signal),
            ],
        ),
        EngineCallback::WorkerExit { worker_id } => {
            if !reload_async {
                tracing::debug!(worker_id, "worker_exit needs reload_async, ignoring");
                return None;
            }
            (Event::WorkerExit, vec![server, Arg::from(*worker_id)])
        }
        EngineCallback::Shutdown => (Event::Shutdown, vec![server]),
        EngineCallback::Connect { .. }
        | EngineCallback::Receive { .. }
        | EngineCallback::Request { .. }
        | EngineCallback::Close { .. } => return None,
    };
    Some(forwarded)
}

/// Publish the lifecycle event for `callback`, if it has one.
pub fn forward(
    callback: &EngineCallback<'_>,
    bus: &EventBus,
    info: ServerInfo,
) -> Option<PublishReport> {
    let (event, args) = event_for(callback, info)?;
    Some(bus.publish(event, &args))
}
