//! Builds [`MarkupNode`] trees from package parts

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{QName as XmlName, ResolveResult};
use quick_xml::reader::NsReader;

use crate::error::{XlsxError, XlsxResult};
use sheetmark_core::{MarkupNode, QName};

/// Parse a part into a namespace-resolved tree.
///
/// Elements whose local name is listed in `skip` are kept, but without
/// attributes' children or text; their content is read past unparsed.
pub(crate) fn read_markup<R: BufRead>(reader: R, skip: &[&str]) -> XlsxResult<MarkupNode> {
    let mut xml_reader = NsReader::from_reader(reader);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();
    let mut stack: Vec<MarkupNode> = Vec::new();
    let mut root: Option<MarkupNode> = None;

    loop {
        let (ns, event) = xml_reader.read_resolved_event_into(&mut buf)?;
        let ns = namespace_uri(ns);
        match event {
            Event::Start(e) => {
                let node = start_node(&xml_reader, ns, &e);
                if skip.contains(&node.name.local.as_str()) {
                    let end = e.name().as_ref().to_vec();
                    xml_reader.read_to_end_into(XmlName(&end), &mut skip_buf)?;
                    skip_buf.clear();
                    attach(&mut stack, &mut root, node);
                } else {
                    stack.push(node);
                }
            }
            Event::Empty(e) => {
                let node = start_node(&xml_reader, ns, &e);
                attach(&mut stack, &mut root, node);
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| XlsxError::Parse("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, node);
            }
            Event::Text(t) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(XlsxError::Parse("unexpected end of document".into()));
    }
    root.ok_or_else(|| XlsxError::Parse("document has no root element".into()))
}

fn namespace_uri(ns: ResolveResult<'_>) -> Option<String> {
    match ns {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        _ => None,
    }
}

fn start_node<R>(reader: &NsReader<R>, ns: Option<String>, e: &BytesStart<'_>) -> MarkupNode {
    let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut node = MarkupNode::with_name(QName { ns, local });

    for attr in e.attributes().flatten() {
        // namespace declarations are resolved already
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let (attr_ns, local) = reader.resolve_attribute(attr.key);
        let name = QName {
            ns: namespace_uri(attr_ns),
            local: String::from_utf8_lossy(local.as_ref()).into_owned(),
        };
        if let Ok(value) = attr.unescape_value() {
            node.attributes.push((name, value.into_owned()));
        }
    }

    node
}

fn attach(stack: &mut [MarkupNode], root: &mut Option<MarkupNode>, node: MarkupNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => *root = Some(node),
    }
}
