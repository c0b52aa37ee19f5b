//! Text renderers for instances.
//!
//! - [pretty_dict]: mapping literal that [crate::literal::parse] reads back.
//! - [render]: annotated debug view with type tags and enum labels.

use crate::{
    field::FieldType,
    instance::{Instance, Node, Place},
    value::Value,
};

/// Scalar arrays longer than this are split into commented lines.
const CHUNK: usize = 10;

const RESERVED_WARNING: &str = "# WARNING: non-zero RSVD field";

impl Instance {
    /// See [pretty_dict].
    pub fn pretty_dict(&self, wrap: bool) -> String {
        pretty_dict(self, wrap)
    }

    /// See [render].
    pub fn render(&self) -> String {
        render(self)
    }
}

/// Renders the instance as a reloadable mapping literal with hexadecimal numbers.
///
/// With `wrap == false` the entries are returned without the enclosing braces, which is
/// how members of reserved anonymous records are spliced into their parent.
pub fn pretty_dict(instance: &Instance, wrap: bool) -> String {
    pretty_record(&instance.root(), instance.as_bytes(), wrap)
}

/// Renders the instance for humans: one line per field with its type tag and value.
pub fn render(instance: &Instance) -> String {
    render_record(&instance.root(), instance.as_bytes())
}

fn hex(value: Option<Value>) -> String {
    value.and_then(|v| v.to_hex()).unwrap_or_default()
}

/// `[0x1, 0x2]`, or lines of ten with a running count for longer arrays.
fn hex_list(items: &[String]) -> String {
    if items.len() <= CHUNK {
        return format!("[{}]", items.join(", "));
    }

    let mut out = String::from("[");
    for (i, chunk) in items.chunks(CHUNK).enumerate() {
        out.push_str(&chunk.join(", "));
        out.push_str(&format!(",     #### {}\n", i * CHUNK + chunk.len()));
    }
    out.push(']');
    out
}

fn scalar_elements(place: &Place<'_>, data: &[u8]) -> Option<Vec<String>> {
    let Node::Array(_, FieldType::Scalar(_)) = place.node else {
        return None;
    };
    Some(place.elements().iter().map(|e| hex(e.scalar(data))).collect())
}

fn indent(s: &str) -> String {
    s.replace('\n', "\n\t")
}

fn wrap_entries(entries: &[String], wrap: bool) -> String {
    match (entries.len() <= 1, wrap) {
        (true, true) => format!("{{{}}}", entries.concat().trim()),
        (true, false) => entries.concat(),
        (false, true) => format!("{{\n{}\n}}", entries.join("\n")),
        (false, false) => entries.join("\n"),
    }
}

fn pretty_record(place: &Place<'_>, data: &[u8], wrap: bool) -> String {
    let Node::Record(record) = place.node else {
        return pretty_value(place, data);
    };

    let mut entries = Vec::new();
    for field in record.fields() {
        let child = place.field(field);

        if field.reserved {
            if field.ty.is_anonymous_record() {
                let body = pretty_record(&child, data, false);
                if !body.is_empty() {
                    entries.push(body);
                }
            }
            continue;
        }

        if let FieldType::Array(0, _) = field.ty {
            continue;
        }

        let body = pretty_value(&child, data);
        entries.push(indent(&format!("\t'{}': {},", field.name, body)));
    }

    wrap_entries(&entries, wrap)
}

fn pretty_value(place: &Place<'_>, data: &[u8]) -> String {
    match place.node {
        Node::Scalar(..) => hex(place.scalar(data)),
        Node::Record(_) => pretty_record(place, data, true),
        Node::Array(..) => match scalar_elements(place, data) {
            Some(items) => hex_list(&items),
            None => {
                let items: Vec<String> = place
                    .elements()
                    .iter()
                    .map(|e| indent(&pretty_value(e, data)))
                    .collect();
                format!("[\n\t{}\n]", items.join(",\n\t"))
            }
        },
    }
}

fn render_record(place: &Place<'_>, data: &[u8]) -> String {
    let Node::Record(record) = place.node else {
        return render_value(place, data);
    };

    let mut lines = Vec::new();
    for field in record.fields() {
        let child = place.field(field);
        let bits = field.bit_width().map(|w| format!(":{}", w)).unwrap_or_default();
        let type_tag = format!("{}{}", field.ty.type_name(), bits);
        let display_name = if field.reserved { "" } else { field.name.as_str() };

        let mut warning = "";
        let body = match child.node {
            Node::Scalar(..) => {
                let value = child.scalar(data);
                let raw = value.as_ref().and_then(Value::as_raw).unwrap_or(0);
                let mut body = hex(value);
                if field.reserved {
                    if raw != 0 {
                        warning = RESERVED_WARNING;
                    }
                } else if let Some(label) = record.enum_label(&field.name) {
                    body.push_str(&format!(" <{}>", label.labels.label(raw as i64)));
                }
                body
            }
            _ => render_value(&child, data),
        };

        let mut line = format!(" \t{} <{}> = {}", display_name, type_tag, body);
        if !warning.is_empty() {
            line.push_str("  ");
            line.push_str(warning);
        }
        lines.push(indent(&line));
    }

    if lines.len() <= 1 {
        format!("{}{{{}}}", record.name(), lines.concat())
    } else {
        format!("{}{{\n{}\n}}", record.name(), lines.join("\n"))
    }
}

fn render_value(place: &Place<'_>, data: &[u8]) -> String {
    match place.node {
        Node::Scalar(..) => hex(place.scalar(data)),
        Node::Record(_) => render_record(place, data),
        Node::Array(..) => match scalar_elements(place, data) {
            Some(items) => hex_list(&items),
            None => {
                let items: Vec<String> = place
                    .elements()
                    .iter()
                    .enumerate()
                    .map(|(i, e)| indent(&format!("{}=> {}", i, render_value(e, data))))
                    .collect();
                format!("[\n\t{}\n]", items.join("\n\t"))
            }
        },
    }
}
