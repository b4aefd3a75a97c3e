//! A minimal owned XML tree, just enough for the SBLGNT files.

use exn::{OptionExt, ResultExt};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{ErrorKind, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}
impl XmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn elements_named<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a XmlElement> + use<'a, 'n> {
        self.elements().filter(move |e| e.name == name)
    }

    /// Exactly one child element with the given name.
    pub fn one(&self, name: &str) -> Result<&XmlElement> {
        let mut matches = self.elements_named(name);
        match (matches.next(), matches.next()) {
            (Some(element), None) => Ok(element),
            _ => exn::bail!(ErrorKind::MalformedSource(format!(
                "expected exactly one <{name}> in <{}>",
                self.name
            ))),
        }
    }

    /// Concatenation of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Concatenation of all descendant text, in document order.
    pub fn deep_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
            }
        }
    }
}

/// Parses a document and returns its root element.
pub(crate) fn parse(xml: &str) -> Result<XmlElement> {
    let malformed = |detail: &str| ErrorKind::MalformedSource(format!("invalid XML: {detail}"));
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;
    loop {
        let event = reader
            .read_event()
            .or_raise(|| malformed(&format!("at byte {}", reader.buffer_position())))?;
        match event {
            Event::Start(start) => stack.push(element(&start)?),
            Event::Empty(start) => attach(&mut stack, &mut root, element(&start)?),
            Event::End(_) => {
                let finished = stack.pop().ok_or_raise(|| malformed("unbalanced end tag"))?;
                attach(&mut stack, &mut root, finished);
            },
            Event::Text(text) => {
                let text = text.unescape().or_raise(|| malformed("bad escape"))?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Text(text.into_owned()));
                }
            },
            Event::CData(data) => {
                let text = String::from_utf8(data.into_inner().into_owned()).or_raise(|| malformed("CDATA"))?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Text(text));
                }
            },
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes
            // carry no text.
            _ => {},
        }
    }
    if !stack.is_empty() {
        exn::bail!(malformed("unclosed element"));
    }
    root.ok_or_raise(|| malformed("no root element"))
}

fn element(start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.or_raise(|| ErrorKind::MalformedSource(format!("bad attribute on <{name}>")))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .or_raise(|| ErrorKind::MalformedSource(format!("bad attribute value on <{name}>")))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => *root = Some(element),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree() {
        let root = parse(
            r#"<?xml version="1.0"?><root><book id="Mt"><title>ΚΑΤΑ &amp; ΜΑΘΘΑΙΟΝ</title><p>a <b>b</b> c</p><empty/></book></root>"#,
        )
        .unwrap();
        assert_eq!(root.name, "root");
        let book = root.one("book").unwrap();
        assert_eq!(book.attr("id"), Some("Mt"));
        assert_eq!(book.one("title").unwrap().text(), "ΚΑΤΑ & ΜΑΘΘΑΙΟΝ");
        let p = book.one("p").unwrap();
        assert_eq!(p.text(), "a  c");
        assert_eq!(p.deep_text(), "a b c");
        assert_eq!(book.elements().count(), 3);
    }

    #[test]
    fn test_one_rejects_duplicates() {
        let root = parse("<root><title>a</title><title>b</title></root>").unwrap();
        let err = root.one("title").unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedSource(_)));
    }

    #[test]
    fn test_parse_rejects_mismatched_tags() {
        let err = parse("<root><p></root>").unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedSource(_)));
    }
}
