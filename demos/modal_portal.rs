use std::rc::Rc;
use std::sync::Arc;

use room_portal::{
    BufferedPortalAudit, ComponentId, DispatchContext, Document, DocumentResolver, DomEvent,
    EventFlow, EventListener, Lifecycle, Logger, MarkupRenderer, MemorySink, NodeId, Portal,
    PortalConfig, PortalContext, Result, TreePatcher, VNode,
};
use serde_json::json;

const MODAL_ROOT: &str = "#modal-root";
const SAVE_COMPONENT: ComponentId = ComponentId(3);

/// Prints lifecycle notifications as they arrive.
struct PrintLifecycle;

impl Lifecycle for PrintLifecycle {
    fn descendant_mounted(&mut self, component: ComponentId, element: Option<NodeId>, doc: &Document) {
        let connected = element.is_some_and(|id| doc.is_connected(id));
        println!("  mounted   {component} (connected: {connected})");
    }

    fn descendant_destroyed(&mut self, component: ComponentId, _doc: &Document) {
        println!("  destroyed {component}");
    }
}

fn modal(title: &str) -> Vec<VNode> {
    vec![
        VNode::text("\n"),
        VNode::component(ComponentId(1), "div")
            .attr("class", "modal")
            .child(VNode::component(ComponentId(2), "h2").child(VNode::text(title)))
            .child(VNode::component(SAVE_COMPONENT, "button").child(VNode::text("Save"))),
        VNode::comment("modal end"),
    ]
}

fn main() -> Result<()> {
    let mut doc = Document::new();
    let form = doc.create_element("form");
    let modal_root = doc.create_element("div");
    doc.set_attribute(modal_root, "id", "modal-root")?;
    doc.append_child(doc.body(), form)?;
    doc.append_child(doc.body(), modal_root)?;

    let on_saved: Rc<dyn EventListener> =
        Rc::new(|ctx: &mut DispatchContext<'_>, event: &DomEvent| {
            println!(
                "  form heard '{}' at {} from {:?} with {}",
                event.event_type,
                ctx.current_target(),
                event.origin,
                event.detail
            );
            EventFlow::Continue
        });
    doc.add_event_listener(form, "saved", on_saved)?;

    let sink = MemorySink::new();
    let audit = Arc::new(BufferedPortalAudit::new());
    let mut config = PortalConfig::new(MODAL_ROOT)
        .with_logger(Logger::new(sink.clone()))
        .with_audit(audit.clone());
    config.enable_metrics();
    let metrics = config.metrics_handle();
    let mut portal = Portal::new(config);

    let mut patcher = TreePatcher::new();
    let mut lifecycle = PrintLifecycle;
    let renderer = MarkupRenderer::with_default();

    println!("first render");
    {
        let mut ctx = PortalContext::new(&mut doc, &mut patcher, &mut lifecycle, &DocumentResolver);
        portal.render(&mut ctx, form, modal("Unsaved changes"))?;
    }
    println!("{}", renderer.outer_markup(&doc, doc.body())?);

    portal.observe(&mut doc, "saved")?;
    if let Some(button) = portal
        .relocated_subtree()
        .and_then(|subtree| subtree.children[1].elm)
    {
        println!("dispatch from the relocated button");
        let event = DomEvent::custom("saved", json!({"draft": 12})).from_component(SAVE_COMPONENT);
        doc.dispatch_event(button, event)?;
    }

    println!("second render");
    {
        let mut ctx = PortalContext::new(&mut doc, &mut patcher, &mut lifecycle, &DocumentResolver);
        portal.render(&mut ctx, form, modal("All changes saved"))?;
    }
    println!("{}", renderer.inner_markup(&doc, modal_root)?);

    println!("teardown");
    {
        let mut ctx = PortalContext::new(&mut doc, &mut patcher, &mut lifecycle, &DocumentResolver);
        portal.destroy(&mut ctx);
    }
    println!("{}", renderer.outer_markup(&doc, doc.body())?);

    println!("audit trail");
    for stage in audit.stages() {
        println!("  {stage:?}");
    }
    println!("log");
    for event in sink.events() {
        println!("  [{:?}] {} {}", event.level, event.message, json!(event.fields));
    }
    if let Some(metrics) = metrics {
        if let Ok(guard) = metrics.lock() {
            println!("{}", json!(guard.snapshot().as_fields()));
        }
    }
    Ok(())
}
