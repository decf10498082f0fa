//! Message part tree
//!
//! Backends that store snapshots as structured messages expose the message
//! body as a tree of [`Part`]s: composite parts hold sub-parts, leaf parts hold
//! data. Locating the content is a depth-first search for the first part
//! matching a predicate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content transfer encoding of a leaf part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferEncoding {
    SevenBit,
    EightBit,
    Binary,
    Base64,
    QuotedPrintable,
}

/// `attribute=value` pair from a content-type or disposition header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub attribute: String,
    pub value: String,
}

impl Parameter {
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

/// One node of a message body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// MIME type, e.g. `multipart/mixed`
    pub content_type: String,
    pub encoding: TransferEncoding,
    /// Content-Type parameters
    pub parameters: Vec<Parameter>,
    /// Content-Disposition parameters
    pub disposition: Vec<Parameter>,
    /// Encoded body (empty for composite parts)
    pub body: Vec<u8>,
    /// Sub-parts (empty for leaf parts)
    pub parts: Vec<Part>,
}

impl Part {
    /// Leaf part carrying `body` as-is
    pub fn leaf(content_type: impl Into<String>, encoding: TransferEncoding, body: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            encoding,
            parameters: Vec::new(),
            disposition: Vec::new(),
            body,
            parts: Vec::new(),
        }
    }

    /// Composite part wrapping `parts`
    pub fn composite(content_type: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            content_type: content_type.into(),
            encoding: TransferEncoding::SevenBit,
            parameters: Vec::new(),
            disposition: Vec::new(),
            body: Vec::new(),
            parts,
        }
    }

    pub fn with_parameter(mut self, attribute: &str, value: &str) -> Self {
        self.parameters.push(Parameter::new(attribute, value));
        self
    }

    pub fn with_disposition(mut self, attribute: &str, value: &str) -> Self {
        self.disposition.push(Parameter::new(attribute, value));
        self
    }

    /// Value of `attribute` from disposition or content-type parameters
    /// (case-insensitive, disposition first)
    pub fn attribute(&self, attribute: &str) -> Option<&str> {
        self.disposition
            .iter()
            .chain(self.parameters.iter())
            .find(|p| p.attribute.eq_ignore_ascii_case(attribute))
            .map(|p| p.value.as_str())
    }

    /// Leaf carrying a file (has a `filename` attribute)
    pub fn is_attachment(&self) -> bool {
        self.attribute("filename").is_some()
    }

    /// First part in depth-first order (this part included) matching
    /// `predicate`, with its section number
    pub fn find_first<P>(&self, predicate: P) -> Option<(Section, &Part)>
    where
        P: Fn(&Part) -> bool,
    {
        find_in(self, &predicate, Section::root())
    }
}

fn find_in<'a, P>(part: &'a Part, predicate: &P, section: Section) -> Option<(Section, &'a Part)>
where
    P: Fn(&Part) -> bool,
{
    if predicate(part) {
        return Some((section, part));
    }
    part.parts
        .iter()
        .enumerate()
        .find_map(|(i, child)| find_in(child, predicate, section.child(i + 1)))
}

/// First matching part among top-level `parts` (numbered from 1)
pub fn find_first_in<'a, P>(parts: &'a [Part], predicate: P) -> Option<(Section, &'a Part)>
where
    P: Fn(&Part) -> bool,
{
    parts
        .iter()
        .enumerate()
        .find_map(|(i, part)| find_in(part, &predicate, Section::root().child(i + 1)))
}

/// IMAP-style section number (`1`, `1.2`, ...); empty for the whole message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Section(Vec<usize>);

impl Section {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, number: usize) -> Self {
        let mut path = self.0.clone();
        path.push(number);
        Self(path)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("TEXT");
        }
        let parts: Vec<String> = self.0.iter().map(|n| n.to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(body: &str) -> Part {
        Part::leaf("text/plain", TransferEncoding::SevenBit, body.as_bytes().to_vec())
    }

    fn file(name: &str, body: &str) -> Part {
        Part::leaf("application/octet-stream", TransferEncoding::Binary, body.as_bytes().to_vec())
            .with_disposition("filename", name)
    }

    #[test]
    fn finds_nested_attachment_depth_first() {
        let parts = vec![
            text("cover note"),
            Part::composite(
                "multipart/alternative",
                vec![text("plain"), file("first.bin", "one")],
            ),
            file("second.bin", "two"),
        ];

        let (section, found) = find_first_in(&parts, Part::is_attachment).unwrap();
        assert_eq!(found.attribute("filename"), Some("first.bin"));
        assert_eq!(section.to_string(), "2.2");
    }

    #[test]
    fn filename_attribute_is_case_insensitive_and_checks_parameters() {
        let part = Part::leaf("application/octet-stream", TransferEncoding::Base64, Vec::new())
            .with_parameter("FileName", "backup.bin");
        assert!(part.is_attachment());
        assert_eq!(part.attribute("filename"), Some("backup.bin"));
    }

    #[test]
    fn no_match_returns_none() {
        let message = Part::composite("multipart/mixed", vec![text("a"), text("b")]);
        assert!(message.find_first(Part::is_attachment).is_none());
    }

    #[test]
    fn whole_message_can_match() {
        let single = file("only.bin", "x");
        let (section, _) = single.find_first(Part::is_attachment).unwrap();
        assert_eq!(section, Section::root());
    }
}
