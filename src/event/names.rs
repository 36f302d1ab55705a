//! Event names published by the runtime.

use std::fmt;

/// Every event the runtime publishes. Listeners may also subscribe to
/// arbitrary names; those are simply never published by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Start,
    ManagerStart,
    WorkerStart,
    Connect,
    /// Published before a request is executed.
    Request,
    /// Published after a response has been produced, before it is sent.
    Response,
    Task,
    PipeMessage,
    ManagerStop,
    WorkerStop,
    Finish,
    Close,
    WorkerError,
    WorkerExit,
    Shutdown,
}

impl Event {
    pub const ALL: [Event; 15] = [
        Event::Start,
        Event::ManagerStart,
        Event::WorkerStart,
        Event::Connect,
        Event::Request,
        Event::Response,
        Event::Task,
        Event::PipeMessage,
        Event::ManagerStop,
        Event::WorkerStop,
        Event::Finish,
        Event::Close,
        Event::WorkerError,
        Event::WorkerExit,
        Event::Shutdown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::ManagerStart => "manager_start",
            Event::WorkerStart => "worker_start",
            Event::Connect => "connect",
            Event::Request => "request",
            Event::Response => "response",
            Event::Task => "task",
            Event::PipeMessage => "pipe_message",
            Event::ManagerStop => "manager_stop",
            Event::WorkerStop => "worker_stop",
            Event::Finish => "finish",
            Event::Close => "close",
            Event::WorkerError => "worker_error",
            Event::WorkerExit => "worker_exit",
            Event::Shutdown => "shutdown",
        }
    }

    /// Reverse lookup from a published name.
    pub fn from_name(name: &str) -> Option<Event> {
        Event::ALL.into_iter().find(|e| e.as_str() == name)
    }
}

impl AsRef<str> for Event {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
