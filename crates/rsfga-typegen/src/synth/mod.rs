//! TypeScript synthesis from the symbol table.
//!
//! - `types`   - object-type constants, relation groups, tuple-key union
//! - `helpers` - format/parse/build/validate, emitted and as a Rust mirror

mod helpers;
mod types;

pub use helpers::{render_helpers, TupleKeyHelpers};
pub use types::{render_object_types, render_relation_groups, render_tuple_keys};

/// Line-oriented text buffer with two-space indentation.
#[derive(Debug, Default)]
pub(crate) struct CodeWriter {
    buf: String,
    indent: usize,
}

impl CodeWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.buf.push_str("  ");
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
        self
    }

    pub(crate) fn blank(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    pub(crate) fn indent(&mut self) -> &mut Self {
        self.indent += 1;
        self
    }

    pub(crate) fn dedent(&mut self) -> &mut Self {
        self.indent = self.indent.saturating_sub(1);
        self
    }

    pub(crate) fn finish(self) -> String {
        self.buf
    }
}

/// Double-quoted TypeScript string literal.
pub(crate) fn ts_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Object-literal property key for an already-rendered identifier or string.
///
/// A plain `__proto__` key sets the object's prototype instead of defining a
/// property, so it is written as the computed key `["__proto__"]`.
pub(crate) fn ts_property_key(key: &str) -> String {
    if key == "__proto__" || key == "\"__proto__\"" {
        "[\"__proto__\"]".to_string()
    } else {
        key.to_string()
    }
}

/// `[ "a", "b" ]` as a single-line array literal.
pub(crate) fn ts_string_array<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let items: Vec<String> = values.into_iter().map(ts_string).collect();
    format!("[{}]", items.join(", "))
}

/// Escapes text for use inside a template literal type.
pub(crate) fn ts_template_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '`' | '$' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
