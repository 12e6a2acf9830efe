//! Turns XML text into a [`Node`] tree.
//!
//! Deliberately naive: qualified names such as `rdf:about` are kept as opaque
//! strings, namespaces are never resolved and nothing is validated beyond
//! well-formedness.

use std::collections::BTreeMap;
use std::str::FromStr;

use exn::{OptionExt, ResultExt};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, ErrorKind, Result};
use crate::tree::{ATTRIBUTES_KEY, Node, TEXT_KEY};

/// An element whose end tag hasn't been seen yet.
#[derive(Debug)]
struct OpenElement {
    name: String,
    attributes: BTreeMap<String, Node>,
    children: BTreeMap<String, Vec<Node>>,
    text: String,
}

impl OpenElement {
    fn new(start: &BytesStart) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = BTreeMap::new();
        for attribute in start.attributes() {
            let attribute = attribute.or_raise(|| ErrorKind::MalformedXml(format!("bad attribute on <{name}>")))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .or_raise(|| ErrorKind::MalformedXml(format!("bad attribute value for `{key}` on <{name}>")))?;
            attributes.insert(key, Node::Scalar(value.into_owned()));
        }
        Ok(Self { name, attributes, children: BTreeMap::new(), text: String::new() })
    }

    /// Closes the element, collapsing it to a scalar when it carries nothing
    /// but (possibly empty) text.
    fn close(self) -> (String, Node) {
        let text = self.text.trim();
        if self.attributes.is_empty() && self.children.is_empty() {
            return (self.name, Node::Scalar(text.to_string()));
        }
        let mut map: BTreeMap<String, Node> =
            self.children.into_iter().map(|(name, nodes)| (name, Node::Sequence(nodes))).collect();
        if !self.attributes.is_empty() {
            map.insert(ATTRIBUTES_KEY.to_string(), Node::Mapping(self.attributes));
        }
        if !text.is_empty() {
            map.insert(TEXT_KEY.to_string(), Node::Scalar(text.to_string()));
        }
        (self.name, Node::Mapping(map))
    }
}

/// Parses an XML document into a tree.
///
/// The returned node is a mapping with a single entry: the root element's
/// name pointing at the root element.
///
/// # Errors
///
/// Returns [`ErrorKind::MalformedXml`] if the text is not well-formed: syntax
/// errors, mismatched or unclosed tags, no root element, or more than one.
pub fn parse(xml: &str) -> Result<Node> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<(String, Node)> = None;

    loop {
        let event = reader.read_event().or_raise(|| {
            ErrorKind::MalformedXml(format!("syntax error at byte {}", reader.error_position()))
        })?;
        match event {
            Event::Start(start) => {
                if root.is_some() {
                    exn::bail!(ErrorKind::MalformedXml("more than one root element".to_string()));
                }
                stack.push(OpenElement::new(&start)?);
            },
            Event::Empty(start) => {
                if root.is_some() {
                    exn::bail!(ErrorKind::MalformedXml("more than one root element".to_string()));
                }
                let element = OpenElement::new(&start)?;
                close_into(&mut stack, &mut root, element);
            },
            Event::End(_) => {
                // Reader checks that end names match their start tags, so a
                // pop failure can only mean a stray end tag.
                let Some(element) = stack.pop() else {
                    exn::bail!(ErrorKind::MalformedXml("unexpected closing tag".to_string()));
                };
                close_into(&mut stack, &mut root, element);
            },
            Event::Text(text) => {
                if let Some(open) = stack.last_mut() {
                    let text = text.unescape().or_raise(|| ErrorKind::MalformedXml("bad text content".to_string()))?;
                    open.text.push_str(&text);
                }
            },
            Event::CData(data) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            },
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes
            // carry no data we care about.
            _ => {},
        }
    }

    if let Some(open) = stack.last() {
        exn::bail!(ErrorKind::MalformedXml(format!("unclosed element <{}>", open.name)));
    }
    let (name, node) = root.ok_or_raise(|| ErrorKind::MalformedXml("no root element".to_string()))?;
    Ok(Node::Mapping(BTreeMap::from([(name, node)])))
}

fn close_into(stack: &mut [OpenElement], root: &mut Option<(String, Node)>, element: OpenElement) {
    let (name, node) = element.close();
    match stack.last_mut() {
        Some(parent) => parent.children.entry(name).or_default().push(node),
        None => *root = Some((name, node)),
    }
}

impl FromStr for Node {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}
