// SPDX-License-Identifier: MIT OR Apache-2.0
//! Syntax-neutral markup surface.
//!
//! The codec only needs three primitives: an element name, an ordered set
//! of textual attributes, and either ordered child elements or a text body.
//! The reader consumes [`Element`] trees; the writer drives a
//! [`MarkupSink`], which may build a tree ([`ElementBuilder`]) or stream
//! syntax directly (see [`crate::xml::XmlSink`]).

use crate::error::{CodecError, Result};
use indexmap::IndexMap;

/// One markup element
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Local name
    pub name: String,
    /// Attributes in document order
    pub attributes: IndexMap<String, String>,
    /// Child elements in document order
    pub children: Vec<Element>,
    /// Text body, if any
    pub text: Option<String>,
}

impl Element {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add an attribute (builder style)
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Add a child element (builder style)
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Set the text body (builder style)
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Look up an attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Replay this element into a sink
    pub fn write_to(&self, sink: &mut dyn MarkupSink) -> Result<()> {
        sink.start_element(&self.name)?;
        for (name, value) in &self.attributes {
            sink.attribute(name, value)?;
        }
        if let Some(text) = &self.text {
            sink.text(text)?;
        }
        for child in &self.children {
            child.write_to(sink)?;
        }
        sink.end_element()
    }

    /// Total number of elements in this subtree, including this one
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Element::count).sum::<usize>()
    }
}

/// Receiver of generated markup.
///
/// Attributes always apply to the most recently started element that has
/// not yet been ended.
pub trait MarkupSink {
    /// Open a new element
    fn start_element(&mut self, name: &str) -> Result<()>;

    /// Add an attribute to the open element
    fn attribute(&mut self, name: &str, value: &str) -> Result<()>;

    /// Add body text to the open element
    fn text(&mut self, text: &str) -> Result<()>;

    /// Close the open element
    fn end_element(&mut self) -> Result<()>;
}

/// A sink that builds an [`Element`] tree in memory
#[derive(Debug, Default)]
pub struct ElementBuilder {
    open: Vec<Element>,
    finished: Vec<Element>,
}

impl ElementBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the completed top-level element
    pub fn finish(mut self) -> Result<Element> {
        if !self.open.is_empty() {
            return Err(CodecError::Unbalanced("element left open at end of document"));
        }
        self.finished.pop().ok_or(CodecError::MissingRoot)
    }

    fn current(&mut self) -> Result<&mut Element> {
        self.open
            .last_mut()
            .ok_or(CodecError::Unbalanced("content outside of any element"))
    }
}

impl MarkupSink for ElementBuilder {
    fn start_element(&mut self, name: &str) -> Result<()> {
        self.open.push(Element::new(name));
        Ok(())
    }

    fn attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.current()?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        let current = self.current()?;
        match &mut current.text {
            Some(existing) => existing.push_str(text),
            None => current.text = Some(text.to_string()),
        }
        Ok(())
    }

    fn end_element(&mut self) -> Result<()> {
        let done = self
            .open
            .pop()
            .ok_or(CodecError::Unbalanced("end without start"))?;
        match self.open.last_mut() {
            Some(parent) => parent.children.push(done),
            None => self.finished.push(done),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_nesting() {
        let mut builder = ElementBuilder::new();
        builder.start_element("flow").unwrap();
        builder.attribute("name", "demo").unwrap();
        builder.start_element("node").unwrap();
        builder.attribute("id", "0").unwrap();
        builder.end_element().unwrap();
        builder.start_element("note").unwrap();
        builder.text("hello ").unwrap();
        builder.text("world").unwrap();
        builder.end_element().unwrap();
        builder.end_element().unwrap();

        let root = builder.finish().unwrap();
        assert_eq!(root.name, "flow");
        assert_eq!(root.attribute("name"), Some("demo"));
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.child("note").unwrap().text.as_deref(), Some("hello world"));
        assert_eq!(root.count(), 3);
    }

    #[test]
    fn test_builder_misuse() {
        let mut builder = ElementBuilder::new();
        assert!(builder.attribute("a", "b").is_err());
        assert!(builder.end_element().is_err());
        assert!(matches!(builder.finish(), Err(CodecError::MissingRoot)));

        let mut builder = ElementBuilder::new();
        builder.start_element("open").unwrap();
        assert!(builder.finish().is_err());
    }

    #[test]
    fn test_replay() {
        let original = Element::new("a")
            .with_attribute("x", "1")
            .with_child(Element::new("b").with_text("t"));
        let mut builder = ElementBuilder::new();
        original.write_to(&mut builder).unwrap();
        assert_eq!(builder.finish().unwrap(), original);
    }
}
