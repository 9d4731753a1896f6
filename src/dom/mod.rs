//! In-memory document tree.
//!
//! A small arena DOM: elements, text and comment nodes, ordered children,
//! per-node event listeners and synchronous bubbling dispatch.

mod core;
mod events;
mod selector;

pub use self::core::{Document, DomError, NodeData, NodeId};
pub use events::{
    DispatchContext, DispatchReport, DomEvent, EventFlow, EventListener, ListenerId,
    MAX_DISPATCH_DEPTH,
};
pub use selector::Selector;
