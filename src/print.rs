//! Human-readable rendering of documents for tests and tooling. Not
//! performance-sensitive.

use std::fmt::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;
use crate::limits::DecodeLimits;
use crate::value::{DocumentValue, Value};

/// Renders a document as an indented field tree, header first.
pub fn render(doc: &[u8]) -> Result<String> {
    render_with_limits(doc, DecodeLimits::default())
}

pub fn render_with_limits(doc: &[u8], limits: DecodeLimits) -> Result<String> {
    let dv = DocumentValue::parse_with_limits(doc, limits)?;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "glint document: {} bytes, flags {:#04x}, schema hash {}",
        doc.len(),
        dv.flags,
        dv.hash
    );
    for (name, value) in &dv.fields {
        render_field(&mut out, 1, name, value);
    }
    Ok(out)
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn render_field(out: &mut String, depth: usize, name: &str, value: &Value) {
    indent(out, depth);
    let _ = write!(out, "{name}: ");
    render_value(out, depth, value);
    out.push('\n');
}

fn render_value(out: &mut String, depth: usize, value: &Value) {
    match value {
        Value::Nil => out.push_str("nil"),
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Value::Int(v) => {
            let _ = write!(out, "{v}");
        }
        Value::Uint(v) => {
            let _ = write!(out, "{v}");
        }
        Value::Float(v) => {
            let _ = write!(out, "{v}");
        }
        Value::String(s) => {
            let _ = write!(out, "{s:?}");
        }
        Value::Bytes(b) => {
            let _ = write!(out, "{} bytes:", b.len());
            for byte in b.iter().take(16) {
                let _ = write!(out, " {byte:02x}");
            }
            if b.len() > 16 {
                out.push_str(" …");
            }
        }
        Value::Time(t) => render_time(out, *t),
        Value::Array(items) => {
            let _ = write!(out, "[{}]", items.len());
            for item in items {
                out.push('\n');
                indent(out, depth + 1);
                out.push_str("- ");
                render_value(out, depth + 1, item);
            }
        }
        Value::Map(pairs) => {
            let _ = write!(out, "{{{}}}", pairs.len());
            for (k, v) in pairs {
                out.push('\n');
                indent(out, depth + 1);
                render_value(out, depth + 1, k);
                out.push_str(" => ");
                render_value(out, depth + 1, v);
            }
        }
        Value::Struct(fields) => {
            out.push_str("{");
            out.push('\n');
            for (name, v) in fields {
                render_field(out, depth + 1, name, v);
            }
            indent(out, depth);
            out.push('}');
        }
    }
}

fn render_time(out: &mut String, t: SystemTime) {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => {
            let _ = write!(out, "time({}.{:09}s)", d.as_secs(), d.subsec_nanos());
        }
        Err(e) => {
            let d = e.duration();
            let _ = write!(out, "time(-{}.{:09}s)", d.as_secs(), d.subsec_nanos());
        }
    }
}
