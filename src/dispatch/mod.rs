//! Event intake and notification dispatch

mod dispatcher;
mod events;

pub use dispatcher::{
    DeliverySummary, DispatchEntry, DispatchOutcome, DispatchReport, EventDispatcher,
};
pub use events::{Actor, DomainEvent, ReplyTarget};
