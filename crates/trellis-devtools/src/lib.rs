use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use web_time::Instant;

use trellis_core::{Component, Diagnostic, Document, ElementId, NodeKind, RenderEvent};

pub struct Hud {
    pub inspector_enabled: bool,
    render_count: u64,
    render_started: Option<Instant>,
    last_render: Option<Instant>,
    rate_smooth: f32,
    pub metrics: Metrics,
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}

impl Hud {
    pub fn new() -> Self {
        Self {
            inspector_enabled: false,
            render_count: 0,
            render_started: None,
            last_render: None,
            rate_smooth: 0.0,
            metrics: Metrics::default(),
        }
    }

    pub fn toggle_inspector(&mut self) {
        self.inspector_enabled = !self.inspector_enabled;
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Renders per second, smoothed.
    pub fn render_rate(&self) -> f32 {
        self.rate_smooth
    }

    fn record(&mut self, event: &RenderEvent) {
        match event {
            RenderEvent::Started => self.render_started = Some(Instant::now()),
            RenderEvent::Rendered { changed } => {
                let now = Instant::now();
                if let Some(start) = self.render_started.take() {
                    self.metrics.last_render_ms = (now - start).as_secs_f32() * 1000.0;
                }
                if let Some(prev) = self.last_render.replace(now) {
                    let dt = (now - prev).as_secs_f32();
                    if dt > 0.0 {
                        let rate = 1.0 / dt;
                        // simple EMA
                        let a = 0.2;
                        self.rate_smooth = if self.rate_smooth == 0.0 {
                            rate
                        } else {
                            (1.0 - a) * self.rate_smooth + a * rate
                        };
                    }
                }
                self.render_count += 1;
                self.metrics.last_changed = changed.to_vec();
            }
            RenderEvent::Skipped => self.metrics.skipped += 1,
            RenderEvent::Diagnostic(d) => self.metrics.diagnostics.push(d.clone()),
        }
    }

    /// One-line summary of what has been recorded so far.
    pub fn overlay(&self) -> String {
        let mut lines = vec![
            format!("renders: {}", self.render_count),
            format!("skipped: {}", self.metrics.skipped),
            format!("rate: {:.1}/s", self.rate_smooth),
            format!("last render: {:.2} ms", self.metrics.last_render_ms),
        ];
        if !self.metrics.last_changed.is_empty() {
            lines.push(format!("changed: {}", self.metrics.last_changed.join(", ")));
        }
        if !self.metrics.diagnostics.is_empty() {
            lines.push(format!("diagnostics: {}", self.metrics.diagnostics.len()));
        }
        lines.join("  |  ")
    }
}

#[derive(Clone, Debug, Default)]
pub struct Metrics {
    pub last_render_ms: f32,
    pub skipped: u64,
    pub last_changed: Vec<&'static str>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Watches one component's renders.
pub struct Inspector {
    pub hud: Rc<RefCell<Hud>>,
    component: Component,
}

impl Inspector {
    pub fn attach(component: &Component) -> Self {
        let hud = Rc::new(RefCell::new(Hud::new()));
        let sink = hud.clone();
        component.observe(move |c, event| {
            if let RenderEvent::Diagnostic(d) = event {
                log::debug!("{:?}: {d}", c.host());
            }
            sink.borrow_mut().record(event);
        });
        Self {
            hud,
            component: component.clone(),
        }
    }

    pub fn render_count(&self) -> u64 {
        self.hud.borrow().render_count()
    }

    pub fn metrics(&self) -> Metrics {
        self.hud.borrow().metrics.clone()
    }

    /// Summary line followed by the host's tree, or `None` while the
    /// inspector is switched off.
    pub fn frame(&self) -> Option<String> {
        let hud = self.hud.borrow();
        if !hud.inspector_enabled {
            return None;
        }
        let doc = self.component.document();
        Some(format!(
            "{}\n{}",
            hud.overlay(),
            describe(doc, self.component.host())
        ))
    }
}

/// Indented dump of `node` and everything below it, shadow trees included.
pub fn describe(doc: &Document, node: ElementId) -> String {
    let mut out = String::new();
    describe_into(doc, node, 0, &mut out);
    out
}

fn describe_into(doc: &Document, node: ElementId, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    match doc.kind(node) {
        Some(NodeKind::Element { tag }) => {
            let _ = write!(out, "{pad}<{tag}");
            for (name, value) in doc.attributes(node) {
                let _ = write!(out, " {name}=\"{value}\"");
            }
            let classes = doc.classes(node);
            if !classes.is_empty() {
                let _ = write!(out, " class=\"{}\"", classes.join(" "));
            }
            let style = doc.style(node);
            if !style.is_empty() {
                let style: Vec<String> = style.iter().map(|(p, v)| format!("{p}: {v}")).collect();
                let _ = write!(out, " style=\"{}\"", style.join("; "));
            }
            out.push_str(">\n");
            for (name, value) in doc.properties(node) {
                let _ = writeln!(out, "{pad}  .{name} = {value}");
            }
        }
        Some(NodeKind::Text(text)) => {
            let _ = writeln!(out, "{pad}{:?}", text);
        }
        Some(NodeKind::Comment(text)) => {
            let _ = writeln!(out, "{pad}<!--{text}-->");
        }
        Some(NodeKind::ShadowRoot) => {
            let _ = writeln!(out, "{pad}#shadow-root");
        }
        None => {
            let _ = writeln!(out, "{pad}<destroyed {node:?}>");
            return;
        }
    }
    if let Some(root) = doc.shadow_root(node) {
        describe_into(doc, root, depth + 1, out);
    }
    for child in doc.children(node) {
        describe_into(doc, child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{ComponentBuilder, Patch, turn};
    use trellis_ui::{SELECTED_INDEX, list_box};

    #[test]
    fn test_inspector_counts_renders() {
        let doc = Document::new();
        let list = list_box(&doc).build(&doc);
        for _ in 0..2 {
            doc.append_child(list.host(), doc.create_element("div"));
        }
        let inspector = Inspector::attach(&list);

        turn(|| list.attach(Some(doc.body())));
        turn(|| {
            list.set_state(Patch::new().set(SELECTED_INDEX, 1));
            list.set_state(Patch::new().set(SELECTED_INDEX, 0));
        });
        assert_eq!(inspector.render_count(), 2);
        assert_eq!(inspector.metrics().last_changed, vec![SELECTED_INDEX, "selectedItem"]);
        assert!(inspector.metrics().last_render_ms >= 0.0);

        assert_eq!(inspector.frame(), None);
        inspector.hud.borrow_mut().toggle_inspector();
        let frame = inspector.frame().unwrap_or_default();
        assert!(frame.starts_with("renders: 2"));
        assert!(frame.contains("<trellis-list-box "));
        assert!(frame.contains("role=\"listbox\""));
        assert!(frame.contains("#shadow-root"));
    }

    struct Broken;

    impl trellis_core::Behavior for Broken {
        fn name(&self) -> &'static str {
            "Broken"
        }

        fn update(&self, _state: &trellis_core::State) -> Option<trellis_core::Descriptor> {
            Some(trellis_core::Descriptor::new().attribute("not valid", "x"))
        }
    }

    #[test]
    fn test_inspector_collects_diagnostics() {
        let doc = Document::new();
        let c = ComponentBuilder::new("x-bad").unit(Broken).build(&doc);
        let inspector = Inspector::attach(&c);
        turn(|| c.attach(Some(doc.body())));

        let diagnostics = inspector.metrics().diagnostics;
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(diagnostics[0], Diagnostic::Apply(_)));
        assert_eq!(inspector.render_count(), 1);
    }

    #[test]
    fn test_describe_tree() {
        let doc = Document::new();
        let div = doc.create_element("div");
        doc.set_attribute(div, "id", "a").unwrap();
        doc.toggle_class(div, "x", true).unwrap();
        doc.append_child(div, doc.create_text("hi"));
        doc.append_child(doc.body(), div);

        let dump = describe(&doc, doc.body());
        assert_eq!(dump, "<body>\n  <div id=\"a\" class=\"x\">\n    \"hi\"\n");
    }
}
