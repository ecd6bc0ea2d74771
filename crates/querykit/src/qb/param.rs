//! Shared parameter sink threaded through a render pass.

use crate::dialect::Dialect;
use crate::value::Value;

/// Ordered list of bound values.
///
/// Every placeholder written to the SQL text is produced by [`ParamList::bind`],
/// so the k-th placeholder in the text always binds the k-th value here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamList {
    values: Vec<Value>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Add a value and return its 1-based index.
    pub fn push(&mut self, value: Value) -> usize {
        self.values.push(value);
        self.values.len()
    }

    /// Add a value and return the dialect placeholder that binds it.
    pub fn bind(&mut self, dialect: &dyn Dialect, value: Value) -> String {
        let idx = self.push(value);
        dialect.placeholder(idx)
    }

    /// Get the current parameter count.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the bound values in placeholder order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Take the bound values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Rewrite `?` markers in caller-supplied SQL to dialect placeholders, binding
/// `values` in order. Markers inside quoted literals or identifiers and markers
/// beyond `values.len()` are left untouched.
pub(crate) fn bind_template(
    sql: &str,
    values: &[Value],
    dialect: &dyn Dialect,
    params: &mut ParamList,
) -> String {
    let mut result = String::with_capacity(sql.len());
    let mut pending = values.iter();
    let mut quote: Option<char> = None;
    for ch in sql.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' | '`' => quote = Some(ch),
                '?' => {
                    if let Some(value) = pending.next() {
                        result.push_str(&params.bind(dialect, value.clone()));
                        continue;
                    }
                }
                _ => {}
            },
        }
        result.push(ch);
    }
    result
}
