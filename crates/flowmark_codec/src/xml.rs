// SPDX-License-Identifier: MIT OR Apache-2.0
//! XML syntax for the markup surface, backed by `quick-xml`.

use crate::error::{CodecError, Result};
use crate::markup::{Element, MarkupSink};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;

/// Parse an XML document into an [`Element`] tree.
///
/// Comments, processing instructions and the declaration are dropped.
/// Text is kept as written, except whitespace-only runs inside elements
/// that have child elements.
pub fn parse(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Open> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Open::new(element_from(&start)?)),
            Event::Empty(start) => {
                let element = element_from(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let open = stack
                    .pop()
                    .ok_or(CodecError::Unbalanced("end tag without start tag"))?;
                attach(&mut stack, &mut root, open.finish())?;
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                append_text(&mut stack, &text);
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data).into_owned();
                append_text(&mut stack, &text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(CodecError::Unbalanced("document ended inside an element"));
    }
    root.ok_or(CodecError::MissingRoot)
}

/// An element whose end tag has not been read yet
struct Open {
    element: Element,
    segments: Vec<String>,
}

impl Open {
    fn new(element: Element) -> Self {
        Self {
            element,
            segments: Vec::new(),
        }
    }

    fn finish(mut self) -> Element {
        let has_children = !self.element.children.is_empty();
        let text: String = self
            .segments
            .into_iter()
            .filter(|segment| !(has_children && segment.trim().is_empty()))
            .collect();
        if !text.is_empty() {
            self.element.text = Some(text);
        }
        self.element
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.insert(key, value);
    }
    Ok(element)
}

fn attach(stack: &mut [Open], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.element.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(CodecError::Unbalanced("more than one root element")),
    }
    Ok(())
}

fn append_text(stack: &mut [Open], text: &str) {
    if text.is_empty() {
        return;
    }
    // text outside the root element is ignored
    if let Some(current) = stack.last_mut() {
        current.segments.push(text.to_string());
    }
}

/// A [`MarkupSink`] that streams XML to any writer.
///
/// The start tag of the open element is held back until its first child,
/// text, or end, so attributes may be added after `start_element` returns
/// and elements without content come out as empty tags.
pub struct XmlSink<W: Write> {
    writer: Writer<W>,
    pending: Option<BytesStart<'static>>,
    open: Vec<String>,
}

impl<W: Write> XmlSink<W> {
    /// Create a sink; `indent` spaces per level, or compact output with 0
    pub fn new(inner: W, indent: usize) -> Self {
        let writer = if indent == 0 {
            Writer::new(inner)
        } else {
            Writer::new_with_indent(inner, b' ', indent)
        };
        Self {
            writer,
            pending: None,
            open: Vec::new(),
        }
    }

    /// Write the `<?xml ...?>` declaration
    pub fn declaration(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        Ok(())
    }

    /// Finish writing and return the inner writer
    pub fn into_inner(self) -> Result<W> {
        if !self.open.is_empty() {
            return Err(CodecError::Unbalanced("element left open at end of document"));
        }
        Ok(self.writer.into_inner())
    }

    fn flush_start(&mut self) -> Result<()> {
        if let Some(start) = self.pending.take() {
            self.writer.write_event(Event::Start(start))?;
        }
        Ok(())
    }
}

impl<W: Write> MarkupSink for XmlSink<W> {
    fn start_element(&mut self, name: &str) -> Result<()> {
        self.flush_start()?;
        self.pending = Some(BytesStart::new(name.to_string()));
        self.open.push(name.to_string());
        Ok(())
    }

    fn attribute(&mut self, name: &str, value: &str) -> Result<()> {
        let start = self
            .pending
            .as_mut()
            .ok_or(CodecError::Unbalanced("attribute after element content"))?;
        start.push_attribute((name, value));
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        if self.open.is_empty() {
            return Err(CodecError::Unbalanced("text outside of any element"));
        }
        self.flush_start()?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn end_element(&mut self) -> Result<()> {
        let name = self
            .open
            .pop()
            .ok_or(CodecError::Unbalanced("end without start"))?;
        match self.pending.take() {
            Some(start) => self.writer.write_event(Event::Empty(start))?,
            None => self.writer.write_event(Event::End(BytesEnd::new(name)))?,
        }
        Ok(())
    }
}

/// Serialize an element tree as an XML document
pub fn to_string(element: &Element, indent: usize) -> Result<String> {
    let mut sink = XmlSink::new(Vec::new(), indent);
    sink.declaration()?;
    element.write_to(&mut sink)?;
    let bytes = sink.into_inner()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
