use super::{Dom, NodeData};
use crate::html::{AttributeNamespace, Namespace};
use crate::tree_builder::{NodeId, TreeSink};
use std::fmt::Write;

fn attribute_prefix(ns: AttributeNamespace) -> &'static str {
    match ns {
        AttributeNamespace::None => "",
        AttributeNamespace::XLink => "xlink ",
        AttributeNamespace::Xml => "xml ",
        AttributeNamespace::Xmlns => "xmlns ",
    }
}

fn write_indent(out: &mut String, depth: usize) {
    out.push_str("| ");

    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn serialize_node(dom: &Dom, id: NodeId, depth: usize, out: &mut String) {
    write_indent(out, depth);

    // NOTE: writing into a `String` can't fail.
    let _ = match &dom.node(id).data {
        NodeData::Document | NodeData::DocumentFragment => Ok(()),
        NodeData::Doctype {
            name,
            public_id,
            system_id,
        } => {
            if public_id.is_empty() && system_id.is_empty() {
                writeln!(out, "<!DOCTYPE {name}>")
            } else {
                writeln!(out, "<!DOCTYPE {name} \"{public_id}\" \"{system_id}\">")
            }
        }
        NodeData::Text(text) => writeln!(out, "\"{text}\""),
        NodeData::Comment(text) => writeln!(out, "<!-- {text} -->"),
        NodeData::Element {
            name,
            namespace,
            attributes,
            template_contents,
        } => {
            let _ = match namespace {
                Namespace::Html => writeln!(out, "<{name}>"),
                Namespace::Svg => writeln!(out, "<svg {name}>"),
                Namespace::MathML => writeln!(out, "<math {name}>"),
            };

            let mut attributes: Vec<_> = attributes
                .iter()
                .map(|attr| {
                    let local_name = match attr.namespace {
                        AttributeNamespace::None => attr.name.as_str(),
                        _ => attr
                            .name
                            .rsplit_once(':')
                            .map_or(attr.name.as_str(), |(_, local)| local),
                    };

                    (attribute_prefix(attr.namespace), local_name, &attr.value)
                })
                .collect();

            attributes.sort();

            for (prefix, name, value) in attributes {
                write_indent(out, depth + 1);
                let _ = writeln!(out, "{prefix}{name}=\"{value}\"");
            }

            if let Some(contents) = template_contents {
                write_indent(out, depth + 1);
                out.push_str("content\n");

                for child in dom.children(*contents) {
                    serialize_node(dom, child, depth + 2, out);
                }

                return;
            }

            Ok(())
        }
    };

    for child in dom.children(id) {
        serialize_node(dom, child, depth + 1, out);
    }
}

/// Serializes the document in the format of the html5lib tree construction
/// tests, e.g.:
///
/// ```text
/// | <html>
/// |   <head>
/// |   <body>
/// |     "Hi"
/// ```
pub fn serialize_for_test(dom: &Dom) -> String {
    let mut out = String::new();

    for child in dom.children(dom.document()) {
        serialize_node(dom, child, 0, &mut out);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Attribute;

    #[test]
    fn html5lib_format() {
        let mut dom = Dom::new();
        let doc = dom.document();

        dom.append_doctype("html", "", "");

        let html = dom.create_element("html", Namespace::Html, &[]);
        let svg = dom.create_element(
            "svg",
            Namespace::Svg,
            &[Attribute::new("viewBox", "0 0 1 1"), Attribute::new("class", "x")],
        );
        let comment = dom.create_comment("c");

        dom.append(doc, html);
        dom.append(html, svg);
        dom.append(html, comment);
        dom.append_text(html, "t");

        assert_eq!(
            serialize_for_test(&dom),
            "| <!DOCTYPE html>\n\
             | <html>\n\
             |   <svg svg>\n\
             |     class=\"x\"\n\
             |     viewBox=\"0 0 1 1\"\n\
             |   <!-- c -->\n\
             |   \"t\"\n"
        );
    }
}
