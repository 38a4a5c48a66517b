//! A small owned XML tree on top of `quick-xml`.
//!
//! Documents are read into [`XmlTree`] in full, edited in memory and written
//! back in one pass. Node order is preserved; whitespace-only text between
//! sibling elements is not, since output layout is produced by
//! [`pretty_print`].

use std::io::Write;

use quick_xml::{
    Reader, Writer,
    events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event},
};

use crate::{error::Error, options::WriteOptions};

/// The `<?xml ...?>` prolog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Default for Declaration {
    fn default() -> Self {
        Declaration {
            version: "1.0".to_string(),
            encoding: Some("UTF-8".to_string()),
            standalone: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Unescaped character data.
    Text(String),
    /// Character data that is already escaped and is written verbatim.
    EscapedText(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Element::default()
        }
    }

    /// Creates `<name>text</name>`.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Element::new(name);
        element.push_text(text);
        element
    }

    /// Name without a namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .rsplit_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn push_element(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
    }

    /// Direct element children, in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    /// First direct child whose local name equals `name`, ignoring ASCII case.
    pub fn find_child_ignore_case(&self, name: &str) -> Option<&Element> {
        self.child_elements()
            .find(|child| child.local_name().eq_ignore_ascii_case(name))
    }

    /// First direct child whose local name equals `name` exactly.
    pub fn find_child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|child| child.local_name() == name)
    }

    /// Concatenated character data of this element and all descendants.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) | Node::CData(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
                _ => {}
            }
        }
    }

    fn has_element_children(&self) -> bool {
        self.children
            .iter()
            .any(|node| matches!(node, Node::Element(_)))
    }

    fn drop_indentation(&mut self) {
        if self.has_element_children() {
            self.children
                .retain(|node| !matches!(node, Node::Text(text) if text.trim().is_empty()));
        }
    }
}

/// A whole XML document: optional declaration, nodes before the root, the
/// root element and nodes after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlTree {
    pub declaration: Option<Declaration>,
    pub prolog: Vec<Node>,
    pub root: Element,
    pub epilog: Vec<Node>,
}

impl XmlTree {
    /// Parses a complete document.
    pub fn parse(source: &str) -> Result<Self, Error> {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(false);

        let mut declaration = None;
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<Element> = None;
        let mut stack: Vec<Element> = Vec::new();

        loop {
            let node = match reader.read_event()? {
                Event::Decl(e) => {
                    if root.is_none() && stack.is_empty() && prolog.is_empty() {
                        declaration = Some(parse_declaration(&e)?);
                    }
                    continue;
                }
                Event::Start(e) => {
                    stack.push(element_from_start(&e)?);
                    continue;
                }
                Event::End(_) => {
                    let mut element = stack.pop().ok_or_else(|| {
                        Error::invalid_document("closing tag without a matching opening tag")
                    })?;
                    element.drop_indentation();
                    Node::Element(element)
                }
                Event::Empty(e) => Node::Element(element_from_start(&e)?),
                Event::Text(e) => {
                    if stack.is_empty() {
                        // Whitespace around the root carries no meaning.
                        continue;
                    }
                    Node::Text(e.unescape()?.into_owned())
                }
                Event::CData(e) => Node::CData(utf8(&e)?),
                Event::Comment(e) => Node::Comment(utf8(&e)?),
                Event::PI(e) => Node::ProcessingInstruction(utf8(&e)?),
                Event::DocType(e) => Node::DocType(utf8(&e)?),
                Event::Eof => break,
            };

            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
                continue;
            }
            match node {
                Node::Element(element) => {
                    if root.is_some() {
                        return Err(Error::invalid_document(format!(
                            "unexpected second root element <{}>",
                            element.name
                        )));
                    }
                    root = Some(element);
                }
                other if root.is_none() => prolog.push(other),
                other => epilog.push(other),
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::invalid_document(format!(
                "unexpected end of document inside <{}>",
                open.name
            )));
        }
        let root = root.ok_or_else(|| Error::invalid_document("document has no root element"))?;

        Ok(XmlTree {
            declaration,
            prolog,
            root,
            epilog,
        })
    }

    /// Writes the tree without any added whitespace.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut xml_writer = Writer::new(writer);
        if let Some(declaration) = &self.declaration {
            xml_writer.write_event(Event::Decl(BytesDecl::new(
                &declaration.version,
                declaration.encoding.as_deref(),
                declaration.standalone.as_deref(),
            )))?;
        }
        for node in &self.prolog {
            write_node(&mut xml_writer, node)?;
        }
        write_element(&mut xml_writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut xml_writer, node)?;
        }
        Ok(())
    }

    /// Serializes the tree without any added whitespace.
    pub fn to_compact_string(&self) -> Result<String, Error> {
        let mut out = Vec::new();
        self.to_writer(&mut out)?;
        String::from_utf8(out).map_err(|e| Error::invalid_document(e.to_string()))
    }
}

/// Serializes a single element (and its subtree) without added whitespace.
pub fn element_to_string(element: &Element) -> Result<String, Error> {
    let mut out = Vec::new();
    let mut xml_writer = Writer::new(&mut out);
    write_element(&mut xml_writer, element)?;
    String::from_utf8(out).map_err(|e| Error::invalid_document(e.to_string()))
}

/// Breaks compact markup into one tag per line.
///
/// A line break is inserted between every adjacent `>` `<` pair and every line
/// after the first receives the same indent, independent of nesting depth.
pub fn pretty_print(compact: &str, options: &WriteOptions) -> String {
    let separator = format!(">{}{}<", options.line_ending, options.indent);
    compact.replace("><", &separator).trim().to_string()
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &Node) -> Result<(), Error> {
    match node {
        Node::Element(element) => write_element(writer, element)?,
        Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        Node::EscapedText(text) => {
            writer.write_event(Event::Text(BytesText::from_escaped(text.as_str())))?
        }
        Node::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str())))?,
        Node::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?
        }
        Node::ProcessingInstruction(content) => {
            writer.write_event(Event::PI(BytesPI::new(content.as_str())))?
        }
        Node::DocType(content) => {
            writer.write_event(Event::DocType(BytesText::from_escaped(content.as_str())))?
        }
    }
    Ok(())
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<(), Error> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

fn element_from_start(e: &BytesStart) -> Result<Element, Error> {
    let mut element = Element::new(utf8(e.name().as_ref())?);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::invalid_document(e.to_string()))?;
        let key = utf8(attr.key.as_ref())?;
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn parse_declaration(e: &BytesDecl) -> Result<Declaration, Error> {
    let version = e
        .version()
        .map_err(|err| Error::invalid_document(err.to_string()))?;
    let encoding = e
        .encoding()
        .transpose()
        .map_err(|err| Error::invalid_document(err.to_string()))?;
    let standalone = e
        .standalone()
        .transpose()
        .map_err(|err| Error::invalid_document(err.to_string()))?;

    Ok(Declaration {
        version: utf8(&version)?,
        encoding: encoding.map(|value| utf8(&value)).transpose()?,
        standalone: standalone.map(|value| utf8(&value)).transpose()?,
    })
}

fn utf8(bytes: &[u8]) -> Result<String, Error> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| Error::invalid_document(e.to_string()))
}
