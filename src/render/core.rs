use std::io::Write;

use crate::dom::{Document, NodeData, NodeId};
use crate::error::Result;

/// Serializer parameters.
#[derive(Debug, Clone)]
pub struct RendererSettings {
    pub include_comments: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            include_comments: true,
        }
    }
}

/// Writes document subtrees as HTML-like markup.
pub struct MarkupRenderer {
    settings: RendererSettings,
}

impl MarkupRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    pub fn with_default() -> Self {
        Self::new(RendererSettings::default())
    }

    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    /// Markup for `node` itself and everything below it.
    pub fn render(&self, writer: &mut impl Write, doc: &Document, node: NodeId) -> Result<()> {
        match doc.data(node)? {
            NodeData::Text(text) => write!(writer, "{}", escape_text(text))?,
            NodeData::Comment(text) => {
                if self.settings.include_comments {
                    write!(writer, "<!--{text}-->")?;
                }
            }
            NodeData::Element { tag, attrs } => {
                write!(writer, "<{tag}")?;
                for (name, value) in attrs {
                    write!(writer, " {name}=\"{}\"", escape_attr(value))?;
                }
                write!(writer, ">")?;
                self.render_children(writer, doc, node)?;
                write!(writer, "</{tag}>")?;
            }
        }
        Ok(())
    }

    /// Markup for the children of `node` only.
    pub fn render_children(
        &self,
        writer: &mut impl Write,
        doc: &Document,
        node: NodeId,
    ) -> Result<()> {
        for child in doc.children(node) {
            self.render(writer, doc, *child)?;
        }
        Ok(())
    }

    pub fn outer_markup(&self, doc: &Document, node: NodeId) -> Result<String> {
        let mut out = Vec::new();
        self.render(&mut out, doc, node)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    pub fn inner_markup(&self, doc: &Document, node: NodeId) -> Result<String> {
        let mut out = Vec::new();
        self.render_children(&mut out, doc, node)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

fn escape_text(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(raw: &str) -> String {
    escape_text(raw).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_markup() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.set_attribute(div, "class", "modal").unwrap();
        let text = doc.create_text("a < b & c");
        doc.append_child(div, text).unwrap();
        doc.append_child(doc.body(), div).unwrap();

        let renderer = MarkupRenderer::with_default();
        assert_eq!(
            renderer.outer_markup(&doc, div).unwrap(),
            "<div class=\"modal\">a &lt; b &amp; c</div>"
        );
        assert_eq!(
            renderer.inner_markup(&doc, doc.body()).unwrap(),
            "<div class=\"modal\">a &lt; b &amp; c</div>"
        );
    }

    #[test]
    fn comments_can_be_suppressed() {
        let mut doc = Document::new();
        let comment = doc.create_comment("hole");
        doc.append_child(doc.body(), comment).unwrap();

        let mut renderer = MarkupRenderer::with_default();
        assert_eq!(renderer.inner_markup(&doc, doc.body()).unwrap(), "<!--hole-->");
        renderer.settings_mut().include_comments = false;
        assert_eq!(renderer.inner_markup(&doc, doc.body()).unwrap(), "");
    }

    #[test]
    fn attribute_quotes_are_escaped() {
        let mut doc = Document::new();
        let span = doc.create_element("span");
        doc.set_attribute(span, "title", "say \"hi\"").unwrap();
        let renderer = MarkupRenderer::with_default();
        assert_eq!(
            renderer.outer_markup(&doc, span).unwrap(),
            "<span title=\"say &quot;hi&quot;\"></span>"
        );
    }
}
