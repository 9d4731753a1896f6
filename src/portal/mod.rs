//! Relocation controller.
//!
//! A [`Portal`] renders a single subtree into an external target element
//! while its logical position keeps only an empty placeholder host. The
//! relocated subtree is still diffed on every render through the injected
//! [`Patcher`], and custom events raised inside it are tunneled back to the
//! placeholder so logical ancestors observe them as if nothing moved.

use serde_json::json;

use crate::dom::{Document, NodeId};
use crate::error::{PortalError, Result};
use crate::logging::{LogLevel, json_kv};
use crate::registry::HandledEventRegistry;
use crate::vdom::{ComponentId, Patcher, VNode};

pub mod audit;
mod config;
pub mod content;
mod lifecycle;
mod target;
pub mod tunnel;


pub use audit::{
    BufferedPortalAudit, NullPortalAudit, PortalAudit, PortalAuditEvent, PortalAuditEventBuilder,
    PortalAuditStage,
};
pub use config::{PORTAL_LOG_TARGET, PortalConfig};
pub use content::{PLACEHOLDER_TAG, SlotSplit, split_slot};
pub use lifecycle::{Lifecycle, NullLifecycle};
pub use target::{DocumentResolver, TargetResolver};
pub use tunnel::{EventTunnel, TunnelListener};

/// Collaborators for one render, update or teardown pass.
pub struct PortalContext<'a> {
    pub doc: &'a mut Document,
    pub patcher: &'a mut dyn Patcher,
    pub lifecycle: &'a mut dyn Lifecycle,
    pub resolver: &'a dyn TargetResolver,
}

impl<'a> PortalContext<'a> {
    pub fn new(
        doc: &'a mut Document,
        patcher: &'a mut dyn Patcher,
        lifecycle: &'a mut dyn Lifecycle,
        resolver: &'a dyn TargetResolver,
    ) -> Self {
        Self {
            doc,
            patcher,
            lifecycle,
            resolver,
        }
    }
}

#[derive(Debug)]
struct Deployment {
    target: NodeId,
    placeholder: NodeId,
    subtree: VNode,
}

#[derive(Debug)]
enum PortalState {
    Pending,
    Deployed(Deployment),
    Destroyed,
}

pub struct Portal {
    config: PortalConfig,
    state: PortalState,
    tunnel: EventTunnel,
}

impl Portal {
    pub fn new(config: PortalConfig) -> Self {
        Self {
            config,
            state: PortalState::Pending,
            tunnel: EventTunnel::new(),
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn is_deployed(&self) -> bool {
        matches!(self.state, PortalState::Deployed(_))
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self.state, PortalState::Destroyed)
    }

    pub fn target(&self) -> Option<NodeId> {
        self.deployment().map(|deployment| deployment.target)
    }

    pub fn placeholder(&self) -> Option<NodeId> {
        self.deployment().map(|deployment| deployment.placeholder)
    }

    pub fn relocated_root(&self) -> Option<NodeId> {
        self.deployment()
            .and_then(|deployment| deployment.subtree.elm)
    }

    /// Descriptor currently rendered into the target.
    pub fn relocated_subtree(&self) -> Option<&VNode> {
        self.deployment().map(|deployment| &deployment.subtree)
    }

    pub fn handled_events(&self) -> &HandledEventRegistry {
        self.tunnel.registry()
    }

    fn deployment(&self) -> Option<&Deployment> {
        match &self.state {
            PortalState::Deployed(deployment) => Some(deployment),
            _ => None,
        }
    }

    /// Render `slot` for this pass.
    ///
    /// `anchor` is the element holding the portal's logical position; it is
    /// only used by the first successful render, which mounts the placeholder
    /// there. The returned descriptor is the placeholder host with an empty
    /// child list, ready for the generic patch step.
    pub fn render(
        &mut self,
        ctx: &mut PortalContext<'_>,
        anchor: NodeId,
        slot: Vec<VNode>,
    ) -> Result<VNode> {
        if self.is_destroyed() {
            return Err(PortalError::Destroyed);
        }

        let result = content::split_slot(slot).and_then(|split| {
            if self.is_deployed() {
                self.update(ctx, split)
            } else {
                self.deploy(ctx, anchor, split)
            }
        });

        if let Err(
            PortalError::TargetNotFound { .. } | PortalError::InvalidContentArity { .. },
        ) = &result
        {
            self.config.record_metrics(|metrics| metrics.record_rejected_render());
        }
        result
    }

    fn deploy(
        &mut self,
        ctx: &mut PortalContext<'_>,
        anchor: NodeId,
        split: SlotSplit,
    ) -> Result<VNode> {
        let selector = self.config.selector;
        let target = ctx
            .resolver
            .resolve(ctx.doc, selector)
            .filter(|target| ctx.doc.is_connected(*target))
            .ok_or_else(|| PortalError::TargetNotFound {
                selector: selector.to_string(),
            })?;
        self.config.audit(
            PortalAuditStage::TargetResolved,
            [
                json_kv("selector", json!(selector)),
                json_kv("target", json!(target)),
            ],
        );

        let SlotSplit { mut host, mut subtree } = split;
        let root = ctx.patcher.create(ctx.doc, &mut subtree)?;

        let placeholder = ctx.doc.create_element(PLACEHOLDER_TAG);
        ctx.doc.append_child(anchor, placeholder)?;
        host.elm = Some(placeholder);
        self.config.audit(
            PortalAuditStage::PlaceholderCreated,
            [
                json_kv("placeholder", json!(placeholder)),
                json_kv("anchor", json!(anchor)),
            ],
        );

        if let Err(err) = ctx.doc.append_child(target, root) {
            // Created above, so it is a known node and detach cannot fail.
            let _ = ctx.doc.detach(placeholder);
            return Err(err.into());
        }
        self.config.audit(
            PortalAuditStage::SubtreeAttached,
            [
                json_kv("root", json!(root)),
                json_kv("target", json!(target)),
            ],
        );

        let attached = self.tunnel.bind(ctx.doc, root, placeholder)?;
        self.note_listeners(&attached, root);

        let components = subtree.components();
        for (component, element) in &components {
            self.notify_mounted(ctx, *component, *element);
        }

        self.state = PortalState::Deployed(Deployment {
            target,
            placeholder,
            subtree,
        });
        self.config.record_metrics(|metrics| metrics.record_deploy());
        self.config.log(
            LogLevel::Info,
            "portal_deployed",
            [
                json_kv("selector", json!(selector)),
                json_kv("target", json!(target)),
                json_kv("placeholder", json!(placeholder)),
                json_kv("components", json!(components.len())),
            ],
        );
        Ok(host)
    }

    fn update(&mut self, ctx: &mut PortalContext<'_>, split: SlotSplit) -> Result<VNode> {
        let PortalState::Deployed(deployment) = &mut self.state else {
            return Err(PortalError::Destroyed);
        };
        let SlotSplit { mut host, mut subtree } = split;
        let previous_root = deployment.subtree.elm;

        let root = ctx.patcher.patch(ctx.doc, &deployment.subtree, &mut subtree)?;
        host.elm = Some(deployment.placeholder);

        // The root may have been detached from the target outside this portal.
        if ctx.doc.parent(root) != Some(deployment.target) {
            ctx.doc.append_child(deployment.target, root)?;
            self.config.audit(
                PortalAuditStage::SubtreeAttached,
                [
                    json_kv("root", json!(root)),
                    json_kv("target", json!(deployment.target)),
                    json_kv("reattached", json!(true)),
                ],
            );
        }

        let before = deployment.subtree.components();
        let after = subtree.components();
        deployment.subtree = subtree;

        self.config.audit(
            PortalAuditStage::SubtreePatched,
            [
                json_kv("root", json!(root)),
                json_kv("rebuilt", json!(previous_root != Some(root))),
            ],
        );

        if previous_root != Some(root) {
            let migrated = self.tunnel.rebind(ctx.doc, root)?;
            if !migrated.is_empty() {
                self.config.audit(
                    PortalAuditStage::ListenersMigrated,
                    [
                        json_kv("root", json!(root)),
                        json_kv("event_types", json!(migrated)),
                    ],
                );
                self.config.log(
                    LogLevel::Debug,
                    "portal_listeners_migrated",
                    [
                        json_kv("root", json!(root)),
                        json_kv("count", json!(migrated.len())),
                    ],
                );
            }
        }

        // A component whose element was rebuilt counts as destroyed and mounted.
        for (component, _) in before.iter().filter(|entry| !after.contains(entry)) {
            self.notify_destroyed(ctx, *component);
        }
        for (component, element) in after.iter().filter(|entry| !before.contains(entry)) {
            self.notify_mounted(ctx, *component, *element);
        }

        self.config.record_metrics(|metrics| metrics.record_update());
        self.config.log(
            LogLevel::Debug,
            "portal_updated",
            [json_kv("root", json!(root))],
        );
        Ok(host)
    }

    /// Declare interest in `event_type` on behalf of a logical ancestor.
    ///
    /// Returns `true` only the first time a type is observed. Types observed
    /// before the first successful render are tunneled from deployment on.
    pub fn observe(&mut self, doc: &mut Document, event_type: &str) -> Result<bool> {
        if self.is_destroyed() {
            return Err(PortalError::Destroyed);
        }
        let added = self.tunnel.observe(doc, event_type)?;
        if added {
            if let Some(root) = self.tunnel.root() {
                self.note_listeners(&[event_type.to_string()], root);
            }
        }
        Ok(added)
    }

    /// Tear the portal down.
    ///
    /// Detaches the relocated root from wherever it currently lives (nothing
    /// to do if something else already removed it), drops the tunnel
    /// listeners, removes the placeholder, then reports every component of
    /// the relocated subtree as destroyed. Safe to call repeatedly and before
    /// the first successful render.
    pub fn destroy(&mut self, ctx: &mut PortalContext<'_>) {
        let state = std::mem::replace(&mut self.state, PortalState::Destroyed);
        let deployment = match state {
            PortalState::Deployed(deployment) => deployment,
            PortalState::Pending => {
                self.config.log(LogLevel::Debug, "portal_destroyed_undeployed", std::iter::empty());
                return;
            }
            PortalState::Destroyed => return,
        };

        let listeners = self.tunnel.unbind(ctx.doc).unwrap_or(0);

        if let Some(root) = deployment.subtree.elm {
            let was_attached = ctx.doc.detach(root).unwrap_or(false);
            self.config.audit(
                PortalAuditStage::SubtreeDetached,
                [
                    json_kv("root", json!(root)),
                    json_kv("was_attached", json!(was_attached)),
                ],
            );
        }
        let placeholder_removed = ctx.doc.detach(deployment.placeholder).unwrap_or(false);

        for (component, _) in deployment.subtree.components() {
            self.notify_destroyed(ctx, component);
        }

        self.config.audit(
            PortalAuditStage::PortalDestroyed,
            [
                json_kv("listeners_removed", json!(listeners)),
                json_kv("placeholder_removed", json!(placeholder_removed)),
            ],
        );
        self.config.record_metrics(|metrics| metrics.record_teardown());
        self.config.log(
            LogLevel::Info,
            "portal_destroyed",
            [
                json_kv("target", json!(deployment.target)),
                json_kv("listeners_removed", json!(listeners)),
            ],
        );
    }

    fn notify_mounted(
        &self,
        ctx: &mut PortalContext<'_>,
        component: ComponentId,
        element: Option<NodeId>,
    ) {
        ctx.lifecycle.descendant_mounted(component, element, ctx.doc);
        self.config.audit(
            PortalAuditStage::DescendantMounted,
            [json_kv("component", json!(component))],
        );
    }

    fn notify_destroyed(&self, ctx: &mut PortalContext<'_>, component: ComponentId) {
        ctx.lifecycle.descendant_destroyed(component, ctx.doc);
        self.config.audit(
            PortalAuditStage::DescendantDestroyed,
            [json_kv("component", json!(component))],
        );
    }

    fn note_listeners(&self, event_types: &[String], root: NodeId) {
        if event_types.is_empty() {
            return;
        }
        for event_type in event_types {
            self.config.audit(
                PortalAuditStage::ListenerAttached,
                [
                    json_kv("event_type", json!(event_type)),
                    json_kv("root", json!(root)),
                ],
            );
        }
        self.config
            .record_metrics(|metrics| metrics.record_listeners(event_types.len()));
        self.config.log(
            LogLevel::Debug,
            "portal_listeners_attached",
            [json_kv("event_types", json!(event_types))],
        );
    }
}
