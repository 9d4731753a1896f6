//! DOM relocation for component trees.
//!
//! A portal renders one subtree into an element elsewhere in the document
//! while its logical position keeps an empty placeholder host. Custom events
//! raised inside the relocated subtree are tunneled back through the
//! placeholder so logical ancestors keep observing them; native events bubble
//! along the physical tree as usual.

pub mod dom;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod portal;
pub mod registry;
pub mod render;
pub mod vdom;

pub use dom::{
    DispatchContext, DispatchReport, Document, DomError, DomEvent, EventFlow, EventListener,
    ListenerId, NodeData, NodeId, Selector,
};
pub use error::{PortalError, Result};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{MetricSnapshot, PortalMetrics};
pub use portal::audit::{
    BufferedPortalAudit, NullPortalAudit, PortalAudit, PortalAuditEvent, PortalAuditEventBuilder,
    PortalAuditStage,
};
pub use portal::{
    DocumentResolver, EventTunnel, Lifecycle, NullLifecycle, PLACEHOLDER_TAG, PORTAL_LOG_TARGET,
    Portal, PortalConfig, PortalContext, TargetResolver,
};
pub use registry::HandledEventRegistry;
pub use render::{MarkupRenderer, RendererSettings};
pub use vdom::{ComponentId, PatchStats, Patcher, TreePatcher, VNode, VNodeKind};
