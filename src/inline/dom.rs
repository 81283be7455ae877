//! DOM plumbing over `markup5ever_rcdom`: parsing, attribute access, node
//! creation and serialization.

use std::cell::RefCell;
use std::rc::Rc;

use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{parse_document, Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};

use crate::error::{MhtmlError, Result};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// The "parse HTML text into a document tree" capability.
pub trait HtmlParser {
    fn parse_html(&self, html: &str) -> RcDom;
}

/// Spec-compliant HTML5 parsing with html5ever.
#[derive(Debug, Clone, Copy, Default)]
pub struct Html5everParser;

impl HtmlParser for Html5everParser {
    fn parse_html(&self, html: &str) -> RcDom {
        parse_document(RcDom::default(), Default::default()).one(html)
    }
}

/// Lower-case local name of an element, `None` for other nodes.
pub fn node_name(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}

pub fn get_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// Set an attribute, adding it if missing.
pub fn set_attr(node: &Handle, attr_name: &str, value: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let mut attrs = attrs.borrow_mut();
        match attrs
            .iter_mut()
            .find(|attr| &*attr.name.local == attr_name)
        {
            Some(attr) => attr.value = StrTendril::from(value),
            None => attrs.push(attribute(attr_name, value)),
        }
    }
}

/// Remove every occurrence of an attribute. Returns whether one was present.
pub fn remove_attr(node: &Handle, attr_name: &str) -> bool {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            let mut attrs = attrs.borrow_mut();
            let before = attrs.len();
            attrs.retain(|attr| &*attr.name.local != attr_name);
            attrs.len() != before
        }
        _ => false,
    }
}

fn attribute(name: &str, value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
        value: StrTendril::from(value),
    }
}

/// Create a detached HTML element.
pub fn create_element(name: &str, attrs: &[(&str, &str)]) -> Handle {
    Node::new(NodeData::Element {
        name: QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(name)),
        attrs: RefCell::new(attrs.iter().map(|(k, v)| attribute(k, v)).collect()),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

/// Create a detached text node.
pub fn create_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(text)),
    })
}

/// Insert `child` as the first child of `parent`.
pub fn prepend_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().insert(0, child);
}

/// Append `child` as the last child of `parent`.
pub fn append_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// Put `new` where `old` sits among `parent`'s children. Returns `false` if
/// `old` is not a child of `parent`.
pub fn replace_child(parent: &Handle, old: &Handle, new: Handle) -> bool {
    let mut children = parent.children.borrow_mut();
    let Some(pos) = children.iter().position(|c| Rc::ptr_eq(c, old)) else {
        return false;
    };
    old.parent.set(None);
    new.parent.set(Some(Rc::downgrade(parent)));
    children[pos] = new;
    true
}

/// Concatenated text of the direct text children.
pub fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    for child in node.children.borrow().iter() {
        if let NodeData::Text { contents } = &child.data {
            text.push_str(&contents.borrow());
        }
    }
    text
}

/// Replace all children with a single text node.
pub fn set_text_content(node: &Handle, text: &str) {
    for child in node.children.borrow().iter() {
        child.parent.set(None);
    }
    node.children.borrow_mut().clear();
    append_child(node, create_text(text));
}

/// Serialize a node and its descendants to HTML.
pub fn serialize_node(node: &Handle) -> Result<String> {
    let mut buf: Vec<u8> = Vec::new();
    serialize(
        &mut buf,
        &SerializableHandle::from(node.clone()),
        SerializeOpts::default(),
    )
    .map_err(|e| MhtmlError::Serialize(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| MhtmlError::Serialize(e.to_string()))
}

/// Every element in the tree with the given local name, in document order.
pub fn find_elements(root: &Handle, name: &str) -> Vec<Handle> {
    let mut found = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if node_name(&node) == Some(name) {
            found.push(node.clone());
        }
        for child in node.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> RcDom {
        Html5everParser.parse_html(html)
    }

    #[test]
    fn test_attribute_roundtrip() {
        let dom = parse("<img src=\"a.png\" integrity=\"sha256-x\">");
        let img = &find_elements(&dom.document, "img")[0];
        assert_eq!(get_attr(img, "src").as_deref(), Some("a.png"));

        set_attr(img, "src", "data:image/png;base64,Zm9v");
        assert_eq!(get_attr(img, "src").as_deref(), Some("data:image/png;base64,Zm9v"));

        set_attr(img, "alt", "logo");
        assert_eq!(get_attr(img, "alt").as_deref(), Some("logo"));

        assert!(remove_attr(img, "integrity"));
        assert!(!remove_attr(img, "integrity"));
        assert_eq!(get_attr(img, "integrity"), None);
    }

    #[test]
    fn test_prepend_and_serialize() {
        let dom = parse("<html><head><title>t</title></head><body></body></html>");
        let head = &find_elements(&dom.document, "head")[0];
        prepend_child(head, create_element("base", &[("target", "_parent")]));
        let html = serialize_node(&dom.document).unwrap();
        assert!(html.contains("<head><base target=\"_parent\"><title>t</title>"));
    }

    #[test]
    fn test_replace_child_and_text() {
        let dom = parse("<html><head><link href=\"a.css\"></head></html>");
        let head = &find_elements(&dom.document, "head")[0];
        let link = &find_elements(&dom.document, "link")[0];
        let style = create_element("style", &[("type", "text/css")]);
        set_text_content(&style, "body { color: red }");
        assert!(replace_child(head, link, style.clone()));
        assert_eq!(text_content(&style), "body { color: red }");
        assert!(find_elements(&dom.document, "link").is_empty());
        assert!(!replace_child(head, link, create_text("x")));
    }

    #[test]
    fn test_node_name() {
        let dom = parse("<p>hi</p>");
        assert_eq!(node_name(&dom.document), None);
        assert_eq!(find_elements(&dom.document, "p").len(), 1);
        assert_eq!(node_name(&find_elements(&dom.document, "body")[0]), Some("body"));
    }
}
