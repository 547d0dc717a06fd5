//! Document Tree
//!
//! Two halves:
//! - [`Element`] / [`Node`]: plain value trees assembled off-document by the
//!   renderer. Nothing observes them until they are materialized.
//! - [`Document`]: the live page, an arena of nodes addressed by [`NodeId`].
//!   Subtrees enter it in one call ([`Document::replace_children`],
//!   [`Document::append`]) so readers never see a half-built letter.
//!   Replaced subtrees are released and their slots reused; a [`NodeId`]
//!   into a replaced subtree is no longer valid.

use std::fmt::Write as _;

use indexmap::IndexMap;

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// Elements whose text is emitted without entity escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

// ============================================================================
// Value Trees
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) => el.children.iter().for_each(|c| c.collect_text(out)),
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out, false);
        out
    }

    fn write_html(&self, out: &mut String, raw: bool) {
        match self {
            Node::Text(t) if raw => out.push_str(&t.replace("</", "<\\/")),
            Node::Text(t) => out.push_str(&escape_text(t)),
            Node::Element(el) => el.write_html(out),
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::Text(text.to_string())
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

/// Builder-style element value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Appends to the class list.
    pub fn class(mut self, class: &str) -> Self {
        let entry = self.attrs.entry("class".to_string()).or_default();
        if !entry.is_empty() {
            entry.push(' ');
        }
        entry.push_str(class);
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    /// Depth-first search over this element and its descendants.
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find_map(|child| child.find(pred))
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        write_open_tag(out, &self.tag, self.attrs.iter());
        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return;
        }
        let raw = RAW_TEXT_ELEMENTS.contains(&self.tag.as_str());
        for child in &self.children {
            child.write_html(out, raw);
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

// ============================================================================
// Live Document
// ============================================================================

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    /// Released slots, reused by the next allocation.
    free: Vec<usize>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
}

impl Document {
    /// Empty `<html><head><title/></head><body/></html>` document.
    pub fn new(title: &str) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
        };
        doc.root = doc.create(Element::new("html").attr("lang", "en").into());
        doc.head = doc.append(
            doc.root,
            Element::new("head")
                .child(Element::new("meta").attr("charset", "utf-8"))
                .child(
                    Element::new("meta")
                        .attr("name", "viewport")
                        .attr("content", "width=device-width, initial-scale=1"),
                )
                .child(Element::new("title").text(title))
                .into(),
        );
        doc.body = doc.append(doc.root, Element::new("body").into());
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Materialize a detached subtree and return its root.
    pub fn create(&mut self, node: Node) -> NodeId {
        match node {
            Node::Text(text) => self.alloc(NodeKind::Text(text)),
            Node::Element(el) => {
                let id = self.alloc(NodeKind::Element {
                    tag: el.tag,
                    attrs: el.attrs,
                });
                for child in el.children {
                    let child_id = self.create(child);
                    self.attach(id, child_id);
                }
                id
            }
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData {
            parent: None,
            children: Vec::new(),
            kind,
        };
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = data;
                NodeId(slot)
            }
            None => {
                self.nodes.push(data);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Return a detached subtree's slots to the free list.
    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let data = &mut self.nodes[n.0];
            stack.append(&mut data.children);
            data.parent = None;
            data.kind = NodeKind::Text(String::new());
            self.free.push(n.0);
        }
    }

    /// Nodes currently allocated, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn append(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.create(node);
        self.attach(parent, id);
        id
    }

    /// Swap out every child of `parent` for the given nodes in one step.
    pub fn replace_children(&mut self, parent: NodeId, nodes: Vec<Node>) -> Vec<NodeId> {
        let created: Vec<NodeId> = nodes.into_iter().map(|n| self.create(n)).collect();
        let old = std::mem::take(&mut self.nodes[parent.0].children);
        for child in old {
            self.release(child);
        }
        for &child in &created {
            self.attach(parent, child);
        }
        created
    }

    /// Replace the contents of `id` with a single text run. A lone existing
    /// text child is rewritten in place.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if text.is_empty() {
            self.replace_children(id, Vec::new());
            return;
        }
        if let [only] = self.nodes[id.0].children[..] {
            if let NodeKind::Text(existing) = &mut self.nodes[only.0].kind {
                existing.clear();
                existing.push_str(text);
                return;
            }
        }
        self.replace_children(id, vec![Node::text(text)]);
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(prev) = self.nodes[child.0].parent {
            self.nodes[prev.0].children.retain(|c| *c != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// `id` followed by each ancestor up to the root.
    pub fn ancestors_or_self(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |n| self.parent(*n))
    }

    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors_or_self(node).any(|n| n == ancestor)
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Pre-order list of `scope` and every element beneath it.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![scope];
        while let Some(id) = stack.pop() {
            if self.is_element(id) {
                out.push(id);
            }
            stack.extend(self.nodes[id.0].children.iter().rev());
        }
        out
    }

    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.attr(n, "id") == Some(element_id))
    }

    pub fn find_by_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&n| self.has_class(n, class))
    }

    pub fn find_all_by_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.has_class(n, class))
            .collect()
    }

    pub fn find_all_with_attr(&self, scope: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.has_attr(n, name))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Element Data
    // ------------------------------------------------------------------------

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Element { .. })
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            NodeKind::Text(_) => None,
        }
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id.0].kind {
            attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id.0].kind {
            attrs.shift_remove(name);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|list| list.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let list = match self.attr(id, "class") {
            Some(list) if !list.trim().is_empty() => format!("{} {class}", list.trim()),
            _ => class.to_string(),
        };
        self.set_attr(id, "class", &list);
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let Some(list) = self.attr(id, "class") else {
            return;
        };
        let kept: Vec<&str> = list.split_whitespace().filter(|c| *c != class).collect();
        let kept = kept.join(" ");
        self.set_attr(id, "class", &kept);
    }

    /// Set one property of the inline `style` attribute.
    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) {
        let mut props: IndexMap<String, String> = self
            .attr(id, "style")
            .unwrap_or_default()
            .split(';')
            .filter_map(|decl| {
                let (k, v) = decl.split_once(':')?;
                Some((k.trim().to_string(), v.trim().to_string()))
            })
            .collect();
        props.insert(property.to_string(), value.to_string());
        let style = props
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr(id, "style", &style);
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<String> {
        self.attr(id, "style")?.split(';').find_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            (k.trim() == property).then(|| v.trim().to_string())
        })
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) => out.push_str(t),
            NodeKind::Element { .. } => {
                for &child in &self.nodes[id.0].children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------------

    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n");
        self.write_html(self.root, &mut out, false);
        out.push('\n');
        out
    }

    /// Outer HTML of one node.
    pub fn node_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out, false);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String, raw: bool) {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) if raw => out.push_str(&t.replace("</", "<\\/")),
            NodeKind::Text(t) => out.push_str(&escape_text(t)),
            NodeKind::Element { tag, attrs } => {
                write_open_tag(out, tag, attrs.iter());
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                let raw = RAW_TEXT_ELEMENTS.contains(&tag.as_str());
                for &child in &self.nodes[id.0].children {
                    self.write_html(child, out, raw);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

fn write_open_tag<'a>(
    out: &mut String,
    tag: &str,
    attrs: impl Iterator<Item = (&'a String, &'a String)>,
) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in attrs {
        let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
    }
    out.push('>');
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            // Serialized markup must never read as a reference tag.
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            c => out.push(c),
        }
    }
    out
}

pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("section")
            .class("letter-body")
            .child(
                Element::new("p")
                    .text("Dear ")
                    .child(
                        Element::new("span")
                            .class("character-ref")
                            .attr("data-character", "rothbart")
                            .text("Rothbart"),
                    )
                    .text(","),
            )
    }

    #[test]
    fn test_builder_serializes_with_escaping() {
        let el = Element::new("p")
            .attr("title", "a \"quoted\" <value>")
            .text("1 < 2 & 3");
        assert_eq!(
            el.to_html(),
            "<p title=\"a &quot;quoted&quot; &lt;value&gt;\">1 &lt; 2 &amp; 3</p>"
        );
    }

    #[test]
    fn test_class_appends() {
        let el = Element::new("div").class("a").class("b");
        assert_eq!(el.get_attr("class"), Some("a b"));
        assert!(el.has_class("b"));
    }

    #[test]
    fn test_void_and_raw_text_elements() {
        let el = Element::new("head")
            .child(Element::new("meta").attr("charset", "utf-8"))
            .child(
                Element::new("script")
                    .attr("type", "application/json")
                    .text(r#"{"a":"<b>","c":"</script>"}"#),
            );
        assert_eq!(
            el.to_html(),
            r#"<head><meta charset="utf-8"><script type="application/json">{"a":"<b>","c":"<\/script>"}</script></head>"#
        );
    }

    #[test]
    fn test_document_materializes_and_queries() {
        let mut doc = Document::new("Letter");
        let section = doc.append(doc.body(), sample().into());

        let span = doc.find_by_class(section, "character-ref").unwrap();
        assert_eq!(doc.attr(span, "data-character"), Some("rothbart"));
        assert_eq!(doc.text_content(section), "Dear Rothbart,");
        assert!(doc.contains(section, span));
        assert!(doc.is_attached(span));
    }

    #[test]
    fn test_replace_children_detaches_old_nodes() {
        let mut doc = Document::new("Letter");
        let container = doc.append(doc.body(), Element::new("main").id("app-container").into());
        let old = doc.append(container, Element::new("p").text("old").into());

        doc.replace_children(container, vec![sample().into()]);

        assert!(!doc.is_attached(old));
        assert_eq!(doc.children(container).len(), 1);
        assert_eq!(doc.get_element_by_id("app-container"), Some(container));
    }

    #[test]
    fn test_replaced_nodes_are_reused() {
        let mut doc = Document::new("Letter");
        let container = doc.append(doc.body(), Element::new("main").into());
        doc.replace_children(container, vec![sample().into()]);
        let settled = doc.node_count();

        for _ in 0..50 {
            doc.replace_children(container, vec![sample().into()]);
        }
        assert_eq!(doc.node_count(), settled);
        assert_eq!(doc.text_content(container), "Dear Rothbart,");
    }

    #[test]
    fn test_set_text_rewrites_in_place() {
        let mut doc = Document::new("Letter");
        let slot = doc.append(doc.body(), Element::new("span").into());
        doc.set_text(slot, "first");
        let before = doc.node_count();

        doc.set_text(slot, "second");
        doc.set_text(slot, "");
        doc.set_text(slot, "third");
        assert_eq!(doc.text_content(slot), "third");
        assert_eq!(doc.node_count(), before);
    }

    #[test]
    fn test_braces_are_escaped() {
        let el = Element::new("span").attr("data-tooltip", "{a}").text("{item:x}");
        assert_eq!(
            el.to_html(),
            r#"<span data-tooltip="&#123;a&#125;">&#123;item:x&#125;</span>"#
        );
    }

    #[test]
    fn test_class_and_style_helpers() {
        let mut doc = Document::new("Letter");
        let div = doc.append(doc.body(), Element::new("div").class("tooltip").into());

        doc.add_class(div, "visible");
        doc.add_class(div, "visible");
        assert_eq!(doc.attr(div, "class"), Some("tooltip visible"));
        doc.remove_class(div, "tooltip");
        assert_eq!(doc.attr(div, "class"), Some("visible"));

        doc.set_style(div, "left", "10px");
        doc.set_style(div, "top", "20px");
        doc.set_style(div, "left", "15px");
        assert_eq!(doc.attr(div, "style"), Some("left: 15px; top: 20px"));
        assert_eq!(doc.style(div, "top").as_deref(), Some("20px"));
    }

    #[test]
    fn test_document_html_shape() {
        let doc = Document::new("A & B");
        let html = doc.to_html();
        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"en\"><head>"));
        assert!(html.contains("<title>A &amp; B</title>"));
        assert!(html.contains("<body></body>"));
    }
}
