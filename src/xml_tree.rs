//! Minimal element tree over quick-xml events.
//!
//! ANBIMA documents carry their data in attributes, so the tree only keeps
//! element names, attributes and children. Text content is dropped.

use crate::error::{Error, Result};
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Read;

/// An XML element with its attributes and child elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn new(name: String, attributes: Vec<(String, String)>) -> Self {
        Self {
            name,
            attributes,
            children: Vec::new(),
        }
    }

    fn from_start(start: &BytesStart<'_>, decoder: Decoder) -> Result<Self> {
        let name = decode(decoder, start.name().as_ref())?;

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::XmlError(e.to_string()))?;
            let key = decode(decoder, attr.key.as_ref())?;
            let value = attr
                .decode_and_unescape_value(decoder)
                .map_err(|e| Error::XmlError(e.to_string()))?
                .to_string();
            attributes.push((key, value));
        }

        Ok(Self::new(name, attributes))
    }

    /// Tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Attribute value, if present.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute value, failing with [`Error::MissingAttribute`] when absent.
    pub fn attr(&self, name: &str) -> Result<&str> {
        self.get_attr(name).ok_or_else(|| Error::MissingAttribute {
            element: self.name.clone(),
            attribute: name.to_string(),
        })
    }

    /// All descendants whose tag name satisfies `matches`, in document order.
    pub fn find_all<F>(&self, matches: F) -> Vec<&XmlNode>
    where
        F: Fn(&str) -> bool,
    {
        let mut found = Vec::new();
        collect_descendants(self, &matches, &mut found);
        found
    }

    /// All descendants with exactly this tag name, in document order.
    pub fn find_all_named(&self, name: &str) -> Vec<&XmlNode> {
        self.find_all(|tag| tag == name)
    }

    /// First descendant with exactly this tag name.
    pub fn find_first(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find_map(|child| {
            if child.name == name {
                Some(child)
            } else {
                child.find_first(name)
            }
        })
    }
}

fn decode(decoder: Decoder, bytes: &[u8]) -> Result<String> {
    decoder
        .decode(bytes)
        .map(|text| text.to_string())
        .map_err(|e| Error::XmlError(e.to_string()))
}

fn collect_descendants<'a, F>(node: &'a XmlNode, matches: &F, found: &mut Vec<&'a XmlNode>)
where
    F: Fn(&str) -> bool,
{
    for child in &node.children {
        if matches(&child.name) {
            found.push(child);
        }
        collect_descendants(child, matches, found);
    }
}

/// A parsed XML document.
///
/// The document node itself is nameless; its only child is the root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlPage {
    document: XmlNode,
}

impl XmlPage {
    /// Parse a document held in memory.
    pub fn parse(xml: &str) -> Result<Self> {
        Self::from_bytes(xml.as_bytes())
    }

    /// Parse raw bytes, decoding them as the XML declaration (or BOM) says.
    ///
    /// Documents without a declaration are read as UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);

        let mut stack = vec![XmlNode::new(String::new(), Vec::new())];
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => stack.push(XmlNode::from_start(&e, reader.decoder())?),
                Event::Empty(e) => {
                    let node = XmlNode::from_start(&e, reader.decoder())?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    }
                }
                Event::End(_) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| Error::XmlError("unbalanced end tag".to_string()))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => return Err(Error::XmlError("unbalanced end tag".to_string())),
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if stack.len() != 1 {
            return Err(Error::XmlError(format!(
                "unexpected end of document inside <{}>",
                stack.last().map(|n| n.name.as_str()).unwrap_or_default()
            )));
        }

        let document = stack.pop().unwrap_or_else(|| XmlNode::new(String::new(), Vec::new()));
        if document.children.is_empty() {
            return Err(Error::XmlError("document has no root element".to_string()));
        }

        Ok(Self { document })
    }

    /// Parse a document from any source implementing `Read`.
    pub fn from_read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// The root element.
    pub fn root(&self) -> Option<&XmlNode> {
        self.document.children.first()
    }

    /// All elements whose tag name satisfies `matches`, in document order.
    pub fn find_all<F>(&self, matches: F) -> Vec<&XmlNode>
    where
        F: Fn(&str) -> bool,
    {
        self.document.find_all(matches)
    }

    /// All elements with exactly this tag name, in document order.
    pub fn find_all_named(&self, name: &str) -> Vec<&XmlNode> {
        self.document.find_all_named(name)
    }
}
