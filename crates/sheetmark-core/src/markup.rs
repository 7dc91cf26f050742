//! Namespace-aware markup tree
//!
//! Charts and worksheets keep the element tree they were read from so that
//! graders can look past the typed view when it is incomplete. Names are
//! resolved to namespace URIs at read time, so queries never depend on the
//! prefixes a producer chose.

use std::fmt;

/// Namespace URIs used by spreadsheet packages
pub mod ns {
    /// SpreadsheetML main namespace (worksheets, workbook, styles)
    pub const SPREADSHEETML: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
    /// DrawingML chart namespace (`c:`)
    pub const CHART: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
    /// DrawingML main namespace (`a:`)
    pub const DRAWINGML: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
    /// Spreadsheet drawing namespace (`xdr:`)
    pub const SPREADSHEET_DRAWING: &str =
        "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
    /// Office document relationships namespace (`r:`)
    pub const RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    /// Package relationships namespace (`.rels` parts)
    pub const PACKAGE_RELATIONSHIPS: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships";
}

/// A resolved element or attribute name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI, if the name is qualified
    pub ns: Option<String>,
    /// Local part of the name
    pub local: String,
}

impl QName {
    /// Create a namespaced name
    pub fn new(ns: &str, local: &str) -> Self {
        Self {
            ns: Some(ns.to_string()),
            local: local.to_string(),
        }
    }

    /// Create a name without namespace
    pub fn local(local: &str) -> Self {
        Self {
            ns: None,
            local: local.to_string(),
        }
    }

    /// Check namespace and local name
    pub fn is(&self, ns: &str, local: &str) -> bool {
        self.local == local && self.ns.as_deref() == Some(ns)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// An element of a markup tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupNode {
    /// Element name
    pub name: QName,
    /// Attributes in document order
    pub attributes: Vec<(QName, String)>,
    /// Concatenated character data directly inside this element
    pub text: String,
    /// Child elements in document order
    pub children: Vec<MarkupNode>,
}

impl MarkupNode {
    /// Create an element in a namespace
    pub fn new(ns: &str, local: &str) -> Self {
        Self::with_name(QName::new(ns, local))
    }

    /// Create an element from a resolved name
    pub fn with_name(name: QName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Add an unqualified attribute
    pub fn attr_value(mut self, local: &str, value: impl Into<String>) -> Self {
        self.attributes.push((QName::local(local), value.into()));
        self
    }

    /// Add a child element
    pub fn child_node(mut self, child: MarkupNode) -> Self {
        self.children.push(child);
        self
    }

    /// Set the text content
    pub fn text_value(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Check this element's name
    pub fn is(&self, ns: &str, local: &str) -> bool {
        self.name.is(ns, local)
    }

    /// First attribute with this local name, in any namespace
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.local == local)
            .map(|(_, value)| value.as_str())
    }

    /// Attribute with an exact namespaced name
    pub fn attr_ns(&self, ns: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.is(ns, local))
            .map(|(_, value)| value.as_str())
    }

    /// First direct child with this name
    pub fn child(&self, ns: &str, local: &str) -> Option<&MarkupNode> {
        self.children.iter().find(|c| c.is(ns, local))
    }

    /// All direct children with this name
    pub fn children_named<'a>(
        &'a self,
        ns: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = &'a MarkupNode> + 'a {
        self.children.iter().filter(move |c| c.is(ns, local))
    }

    /// Follow a chain of child steps from this element
    pub fn path(&self, steps: &[(&str, &str)]) -> Option<&MarkupNode> {
        steps
            .iter()
            .try_fold(self, |node, (ns, local)| node.child(ns, local))
    }

    /// This element and all elements below it, in document order
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// First element (self included) with this name, in document order
    pub fn descendant(&self, ns: &str, local: &str) -> Option<&MarkupNode> {
        self.descendants().find(|n| n.is(ns, local))
    }

    /// All elements (self included) with this name
    pub fn descendants_named<'a>(
        &'a self,
        ns: &'a str,
        local: &'a str,
    ) -> impl Iterator<Item = &'a MarkupNode> + 'a {
        self.descendants().filter(move |n| n.is(ns, local))
    }

    /// First element with this local name in any namespace
    pub fn descendant_by_local_name(&self, local: &str) -> Option<&MarkupNode> {
        self.descendants().find(|n| n.name.local == local)
    }

    /// Text of this element and all descendants, concatenated
    pub fn inner_text(&self) -> String {
        self.descendants().map(|n| n.text.as_str()).collect()
    }
}

/// Pre-order iterator over a markup subtree
pub struct Descendants<'a> {
    stack: Vec<&'a MarkupNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a MarkupNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
