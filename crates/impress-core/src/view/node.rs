use std::collections::BTreeSet;
use std::fmt::Write;

use serde_json::{Map, Value};

use crate::plugin_system::traits::Capability;

/// Properties of an element or component
pub type Props = Map<String, Value>;

/// A node of a rendered view tree
///
/// Component nodes are only built by a
/// [`CapabilityRegistry`](crate::plugin_system::CapabilityRegistry), so every
/// component in a tree refers to an installed capability.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewNode {
    Element {
        tag: String,
        attrs: Props,
        children: Vec<ViewNode>,
    },
    Component {
        tag: String,
        capability: Capability,
        props: Props,
        children: Vec<ViewNode>,
    },
    Text(String),
}

impl ViewNode {
    pub fn element(tag: impl Into<String>) -> Self {
        ViewNode::Element {
            tag: tag.into(),
            attrs: Props::new(),
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        ViewNode::Text(content.into())
    }

    /// Set an attribute (element) or prop (component); no-op on text.
    pub fn with_attr(mut self, key: &str, value: Value) -> Self {
        match &mut self {
            ViewNode::Element { attrs: map, .. } | ViewNode::Component { props: map, .. } => {
                map.insert(key.to_string(), value);
            }
            ViewNode::Text(_) => {}
        }
        self
    }

    /// Append a child; text nodes have no children and ignore it.
    pub fn with_child(mut self, child: ViewNode) -> Self {
        if let Some(children) = self.children_mut() {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: impl IntoIterator<Item = ViewNode>) -> Self {
        if let Some(children) = self.children_mut() {
            children.extend(new_children);
        }
        self
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            ViewNode::Element { tag, .. } | ViewNode::Component { tag, .. } => Some(tag),
            ViewNode::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[ViewNode] {
        match self {
            ViewNode::Element { children, .. } | ViewNode::Component { children, .. } => children,
            ViewNode::Text(_) => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<ViewNode>> {
        match self {
            ViewNode::Element { children, .. } | ViewNode::Component { children, .. } => Some(children),
            ViewNode::Text(_) => None,
        }
    }

    /// Number of component nodes in this tree, this node included.
    pub fn count_components(&self) -> usize {
        let own = usize::from(matches!(self, ViewNode::Component { .. }));
        own + self.children().iter().map(ViewNode::count_components).sum::<usize>()
    }

    /// Capabilities referenced anywhere in this tree.
    pub fn capabilities_used(&self) -> BTreeSet<Capability> {
        let mut used = BTreeSet::new();
        self.collect_capabilities(&mut used);
        used
    }

    fn collect_capabilities(&self, used: &mut BTreeSet<Capability>) {
        if let ViewNode::Component { capability, .. } = self {
            used.insert(*capability);
        }
        for child in self.children() {
            child.collect_capabilities(used);
        }
    }

    /// Indented one-line-per-node rendering of the tree.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(&mut out, 0);
        out
    }

    fn write_outline(&self, out: &mut String, depth: usize) {
        if !out.is_empty() {
            out.push('\n');
        }
        let indent = "  ".repeat(depth);
        // Writing into a String cannot fail
        let _ = match self {
            ViewNode::Element { tag, .. } => write!(out, "{indent}<{tag}>"),
            ViewNode::Component { tag, capability, .. } => write!(out, "{indent}<{tag}> [{capability}]"),
            ViewNode::Text(text) => write!(out, "{indent}{text:?}"),
        };
        for child in self.children() {
            child.write_outline(out, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn button() -> ViewNode {
        ViewNode::Component {
            tag: "a-button".to_string(),
            capability: Capability::Button,
            props: Props::new(),
            children: Vec::new(),
        }
    }

    #[test]
    fn test_builders_and_outline() {
        let tree = ViewNode::element("div")
            .with_attr("id", json!("root"))
            .with_child(button().with_child(ViewNode::text("Go")))
            .with_child(ViewNode::text("done"));

        assert_eq!(tree.tag(), Some("div"));
        assert_eq!(tree.children().len(), 2);
        assert_eq!(tree.outline(), "<div>\n  <a-button> [button]\n    \"Go\"\n  \"done\"");
    }

    #[test]
    fn test_count_components_and_capabilities() {
        let tree = ViewNode::element("div").with_children(vec![button(), button(), ViewNode::text("x")]);
        assert_eq!(tree.count_components(), 2);
        assert_eq!(tree.capabilities_used().into_iter().collect::<Vec<_>>(), vec![Capability::Button]);
    }

    #[test]
    fn test_text_nodes_ignore_children_and_attrs() {
        let text = ViewNode::text("t").with_child(button()).with_attr("k", json!(1));
        assert_eq!(text, ViewNode::text("t"));
        assert_eq!(text.count_components(), 0);
    }
}
