//! A minimal owned XML element tree.
//!
//! Parsing uses `quick-xml` events and resolves namespace prefixes itself,
//! keeping both the namespace URI and the prefix of every name. Serialization
//! re-declares namespaces wherever the output scope does not already bind a
//! prefix to the right URI, so subtrees lifted out of one document can be
//! embedded into another.

use super::escape::{escape_xml, resolve_reference, unescape_xml};
use crate::common::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Namespace bound to the reserved `xml` prefix.
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A qualified name: namespace URI, the prefix used to write it, local part.
#[derive(Debug, Clone)]
pub struct XmlName {
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub local: String,
}

impl XmlName {
    pub fn new(namespace: Option<&str>, prefix: Option<&str>, local: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
        }
    }

    /// Whether this name is `local` in `namespace`.
    #[inline]
    pub fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == namespace
    }

    /// The `prefix:local` form used in documents.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }

    /// Whether this is an `xmlns` or `xmlns:*` declaration.
    fn is_declaration(&self) -> bool {
        self.namespace.is_none()
            && match &self.prefix {
                Some(prefix) => prefix == "xmlns",
                None => self.local == "xmlns",
            }
    }

    /// Prefix-independent form (`{namespace}local`).
    fn expanded(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{{{}}}{}", ns, self.local),
            None => self.local.clone(),
        }
    }
}

/// An attribute of an [`XmlElement`].
#[derive(Debug, Clone)]
pub struct XmlAttribute {
    pub name: XmlName,
    pub value: String,
}

/// A child node: element or character data.
#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone)]
pub struct XmlElement {
    pub name: XmlName,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an empty element.
    pub fn new(namespace: Option<&str>, prefix: Option<&str>, local: &str) -> Self {
        Self {
            name: XmlName::new(namespace, prefix, local),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(
        mut self,
        namespace: Option<&str>,
        prefix: Option<&str>,
        local: &str,
        value: &str,
    ) -> Self {
        self.set_attribute(namespace, prefix, local, value);
        self
    }

    /// Builder-style text child.
    pub fn with_text(mut self, text: &str) -> Self {
        self.children.push(XmlNode::Text(text.to_string()));
        self
    }

    /// Builder-style element child.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Set an attribute, replacing an existing one with the same name.
    pub fn set_attribute(
        &mut self,
        namespace: Option<&str>,
        prefix: Option<&str>,
        local: &str,
        value: &str,
    ) {
        if let Some(existing) = self
            .attributes
            .iter_mut()
            .find(|a| a.name.is(namespace, local))
        {
            existing.value = value.to_string();
            return;
        }
        self.attributes.push(XmlAttribute {
            name: XmlName::new(namespace, prefix, local),
            value: value.to_string(),
        });
    }

    /// Declare `prefix` for `namespace` on this element.
    ///
    /// Descendants using the prefix then need no declaration of their own.
    pub fn declare_namespace(&mut self, prefix: &str, namespace: &str) {
        self.set_attribute(None, Some("xmlns"), prefix, namespace);
    }

    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    #[inline]
    pub fn is(&self, namespace: Option<&str>, local: &str) -> bool {
        self.name.is(namespace, local)
    }

    /// Value of the attribute `local` in `namespace`.
    pub fn attribute(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.is(namespace, local))
            .map(|a| a.value.as_str())
    }

    /// Direct element children.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// All descendant elements (excluding `self`) named `local` in
    /// `namespace`, in document order.
    pub fn descendants(&self, namespace: Option<&str>, local: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(namespace, local, &mut found);
        found
    }

    fn collect_descendants<'a>(
        &'a self,
        namespace: Option<&str>,
        local: &str,
        found: &mut Vec<&'a XmlElement>,
    ) {
        for child in self.child_elements() {
            if child.is(namespace, local) {
                found.push(child);
            }
            child.collect_descendants(namespace, local, found);
        }
    }

    /// First descendant named `local` in `namespace`.
    pub fn first_descendant(&self, namespace: Option<&str>, local: &str) -> Option<&XmlElement> {
        self.child_elements().find_map(|child| {
            if child.is(namespace, local) {
                Some(child)
            } else {
                child.first_descendant(namespace, local)
            }
        })
    }

    /// Concatenated direct character data.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut scopes: Vec<Vec<Binding>> = Vec::new();
        let mut text = String::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    flush_text(&mut text, &mut stack);
                    let (element, bindings) = start_element(e, &scopes)?;
                    scopes.push(bindings);
                    stack.push(element);
                },
                Event::Empty(ref e) => {
                    flush_text(&mut text, &mut stack);
                    let (element, _) = start_element(e, &scopes)?;
                    attach(element, &mut stack, &mut root)?;
                },
                Event::End(_) => {
                    flush_text(&mut text, &mut stack);
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::XmlError("unexpected closing tag".to_string()))?;
                    scopes.pop();
                    attach(element, &mut stack, &mut root)?;
                },
                Event::Text(ref t) => {
                    if !stack.is_empty() {
                        text.push_str(&unescape_xml(std::str::from_utf8(t)?));
                    }
                },
                Event::CData(ref c) => {
                    if !stack.is_empty() {
                        text.push_str(std::str::from_utf8(c)?);
                    }
                },
                Event::GeneralRef(ref r) => {
                    if !stack.is_empty() {
                        text.push_str(&resolve_reference(std::str::from_utf8(r)?));
                    }
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(Error::XmlError("unexpected end of document".to_string()));
        }
        root.ok_or_else(|| Error::XmlError("document has no root element".to_string()))
    }

    /// Serialize this element as a standalone, indented document.
    pub fn to_document(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let mut scope = Vec::new();
        self.write(&mut out, &mut scope, Some(0));
        out.push('\n');
        out
    }

    /// Serialize this element as a fragment, declaring every namespace it uses.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        let mut scope = Vec::new();
        self.write(&mut out, &mut scope, None);
        out
    }

    /// Prefix-independent serialization used for equality checks.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name.expanded());
        let mut attrs: Vec<(String, &str)> = self
            .attributes
            .iter()
            .filter(|a| !a.name.is_declaration())
            .map(|a| (a.name.expanded(), a.value.as_str()))
            .collect();
        attrs.sort();
        for (name, value) in attrs {
            out.push(' ');
            out.push_str(&name);
            out.push_str("=\"");
            out.push_str(&escape_xml(value));
            out.push('"');
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(e) => e.write_canonical(out),
                XmlNode::Text(t) => out.push_str(&escape_xml(t)),
            }
        }
        out.push_str("</");
        out.push_str(&self.name.expanded());
        out.push('>');
    }

    /// Write the element. `indent` is the nesting depth for pretty output,
    /// `None` for compact output.
    fn write(&self, out: &mut String, scope: &mut Vec<Binding>, indent: Option<usize>) {
        let scope_len = scope.len();
        let mut declarations: Vec<Binding> = Vec::new();

        for attribute in self.attributes.iter().filter(|a| a.name.is_declaration()) {
            let prefix = match attribute.name.prefix {
                Some(_) => Some(attribute.name.local.clone()),
                None => None,
            };
            scope.push(Binding {
                prefix,
                namespace: attribute.value.clone(),
            });
        }

        let mut names: Vec<&XmlName> = vec![&self.name];
        names.extend(self.attributes.iter().map(|a| &a.name));
        for (i, name) in names.iter().enumerate() {
            let is_element = i == 0;
            let wanted = name.namespace.clone();
            // unprefixed attributes never carry a namespace
            if !is_element && name.prefix.is_none() {
                continue;
            }
            if wanted.is_none() && name.prefix.is_some() {
                continue;
            }
            if name.prefix.as_deref() == Some("xml") {
                continue;
            }
            let bound = lookup(scope, name.prefix.as_deref());
            let satisfied = match (&wanted, bound) {
                (Some(ns), Some(b)) => ns == b,
                (None, None) => true,
                (None, Some(b)) => b.is_empty(),
                (Some(_), None) => false,
            };
            if !satisfied {
                let binding = Binding {
                    prefix: name.prefix.clone(),
                    namespace: wanted.unwrap_or_default(),
                };
                scope.push(binding.clone());
                declarations.push(binding);
            }
        }

        out.push('<');
        out.push_str(&self.name.qualified());
        for declaration in &declarations {
            match &declaration.prefix {
                Some(prefix) => out.push_str(&format!(" xmlns:{}=\"", prefix)),
                None => out.push_str(" xmlns=\""),
            }
            out.push_str(&escape_xml(&declaration.namespace));
            out.push('"');
        }
        for attribute in &self.attributes {
            out.push(' ');
            out.push_str(&attribute.name.qualified());
            out.push_str("=\"");
            out.push_str(&escape_xml(&attribute.value));
            out.push('"');
        }

        if self.children.is_empty() {
            out.push_str("/>");
            scope.truncate(scope_len);
            return;
        }
        out.push('>');

        let has_elements = self.child_elements().next().is_some();
        let mixed = self
            .children
            .iter()
            .any(|c| matches!(c, XmlNode::Text(t) if !t.trim().is_empty()));

        match indent {
            Some(depth) if has_elements && !mixed => {
                for child in self.child_elements() {
                    out.push('\n');
                    out.push_str(&"  ".repeat(depth + 1));
                    child.write(out, scope, Some(depth + 1));
                }
                out.push('\n');
                out.push_str(&"  ".repeat(depth));
            },
            _ => {
                for child in &self.children {
                    match child {
                        XmlNode::Element(e) => e.write(out, scope, None),
                        XmlNode::Text(t) => out.push_str(&escape_xml(t)),
                    }
                }
            },
        }

        out.push_str("</");
        out.push_str(&self.name.qualified());
        out.push('>');
        scope.truncate(scope_len);
    }
}

/// A prefix → namespace declaration in effect.
#[derive(Debug, Clone)]
struct Binding {
    prefix: Option<String>,
    namespace: String,
}

fn lookup<'a>(scope: &'a [Binding], prefix: Option<&str>) -> Option<&'a str> {
    scope
        .iter()
        .rev()
        .find(|b| b.prefix.as_deref() == prefix)
        .map(|b| b.namespace.as_str())
}

fn lookup_nested<'a>(
    own: &'a [Binding],
    scopes: &'a [Vec<Binding>],
    prefix: Option<&str>,
) -> Option<&'a str> {
    lookup(own, prefix).or_else(|| scopes.iter().rev().find_map(|s| lookup(s, prefix)))
}

fn split_qname(raw: &str) -> (Option<&str>, &str) {
    match raw.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, raw),
    }
}

/// Build an element from a start tag, resolving prefixes against the
/// enclosing scopes and the tag's own declarations.
fn start_element(e: &BytesStart, scopes: &[Vec<Binding>]) -> Result<(XmlElement, Vec<Binding>)> {
    let mut bindings = Vec::new();
    let mut raw_attributes = Vec::new();

    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.to_string();
        if key == "xmlns" {
            bindings.push(Binding {
                prefix: None,
                namespace: value,
            });
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            bindings.push(Binding {
                prefix: Some(prefix.to_string()),
                namespace: value,
            });
        } else {
            raw_attributes.push((key, value));
        }
    }

    let resolve = |prefix: Option<&str>| -> Result<Option<String>> {
        if prefix == Some("xml") {
            return Ok(Some(XML_NAMESPACE.to_string()));
        }
        match lookup_nested(&bindings, scopes, prefix) {
            Some(ns) if !ns.is_empty() => Ok(Some(ns.to_string())),
            Some(_) | None if prefix.is_none() => Ok(None),
            _ => Err(Error::XmlError(format!(
                "unbound namespace prefix: {}",
                prefix.unwrap_or_default()
            ))),
        }
    };

    let raw_name = std::str::from_utf8(e.name().as_ref())?.to_string();
    let (prefix, local) = split_qname(&raw_name);
    let namespace = resolve(prefix)?;
    let mut element = XmlElement::new(namespace.as_deref(), prefix, local);

    for (key, value) in raw_attributes {
        let (prefix, local) = split_qname(&key);
        let namespace = match prefix {
            Some(_) => resolve(prefix)?,
            None => None,
        };
        element.attributes.push(XmlAttribute {
            name: XmlName::new(namespace.as_deref(), prefix, local),
            value,
        });
    }

    Ok((element, bindings))
}

fn flush_text(text: &mut String, stack: &mut [XmlElement]) {
    if text.is_empty() {
        return;
    }
    if !text.trim().is_empty()
        && let Some(parent) = stack.last_mut()
    {
        parent.children.push(XmlNode::Text(text.clone()));
    }
    text.clear();
}

fn attach(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Element(element));
            Ok(())
        },
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        },
        None => Err(Error::XmlError(
            "document has more than one root element".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    const DC: &str = "http://purl.org/dc/terms/";

    #[test]
    fn test_parse_resolves_namespaces() {
        let xml = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:dcterms="http://purl.org/dc/terms/">
  <rdf:Description rdf:about="/a.txt">
    <dcterms:description>a &amp; b</dcterms:description>
  </rdf:Description>
</rdf:RDF>"#;
        let root = XmlElement::parse(xml).unwrap();
        assert!(root.is(Some(RDF), "RDF"));

        let descriptions = root.descendants(Some(RDF), "Description");
        assert_eq!(descriptions.len(), 1);
        assert_eq!(descriptions[0].attribute(Some(RDF), "about"), Some("/a.txt"));
        // unprefixed lookup must not match the namespaced attribute
        assert_eq!(descriptions[0].attribute(None, "about"), None);

        let text = descriptions[0].first_descendant(Some(DC), "description").unwrap();
        assert_eq!(text.text(), "a & b");
    }

    #[test]
    fn test_default_namespace_applies_to_elements_only() {
        let xml = r#"<omexManifest xmlns="urn:m"><content location="." format="x"/></omexManifest>"#;
        let root = XmlElement::parse(xml).unwrap();
        let content = root.descendants(Some("urn:m"), "content");
        assert_eq!(content.len(), 1);
        assert_eq!(content[0].attribute(None, "location"), Some("."));
    }

    #[test]
    fn test_unbound_prefix_is_error() {
        assert!(XmlElement::parse("<a:b/>").is_err());
    }

    #[test]
    fn test_malformed_documents() {
        assert!(XmlElement::parse("").is_err());
        assert!(XmlElement::parse("<a><b></a>").is_err());
        assert!(XmlElement::parse("<a>").is_err());
    }

    #[test]
    fn test_fragment_redeclares_namespaces() {
        let xml = r#"<r xmlns:x="urn:x"><x:item x:id="1">v</x:item></r>"#;
        let root = XmlElement::parse(xml).unwrap();
        let item = root.first_descendant(Some("urn:x"), "item").unwrap();
        let fragment = item.to_xml_string();
        assert_eq!(fragment, r#"<x:item xmlns:x="urn:x" x:id="1">v</x:item>"#);

        let reparsed = XmlElement::parse(&fragment).unwrap();
        assert_eq!(reparsed.canonical(), item.canonical());
    }

    #[test]
    fn test_document_roundtrip_is_stable() {
        let element = XmlElement::new(Some(RDF), Some("rdf"), "RDF").with_child(
            XmlElement::new(Some(RDF), Some("rdf"), "Description")
                .with_attribute(Some(RDF), Some("rdf"), "about", "/a.txt#frag")
                .with_child(XmlElement::new(Some(DC), Some("dcterms"), "description").with_text("<b>")),
        );
        let document = element.to_document();
        let reparsed = XmlElement::parse(&document).unwrap();
        assert_eq!(reparsed.canonical(), element.canonical());
        assert_eq!(reparsed.to_document(), document);
    }

    #[test]
    fn test_canonical_ignores_prefixes() {
        let a = XmlElement::parse(r#"<p:a xmlns:p="urn:n"/>"#).unwrap();
        let b = XmlElement::parse(r#"<q:a xmlns:q="urn:n"/>"#).unwrap();
        assert_eq!(a.canonical(), b.canonical());
    }
}
