//! Closed filter AST shared by every vector driver.
//!
//! A `Filter` tree is built once by the semantic gateway and handed to
//! whichever backend is active; each backend either evaluates it directly
//! (as this module's `matches` does for the local/flat backend) or compiles
//! it into its own query language (see `DriverRegistry::compile_expr`).
//! Closing the set of variants here, instead of keeping the old string-keyed
//! DSL dict, means a backend can match exhaustively and the compiler catches
//! a backend that forgets a case.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// A filter condition tree.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Field equals one of several JSON scalars.
    Eq { field: String, values: Vec<Value> },
    /// Field's array value intersects `values`, or a scalar field equals one of them.
    In { field: String, values: Vec<Value> },
    /// String field starts with `prefix`.
    Prefix { field: String, prefix: String },
    /// Numeric/string field falls within the given bounds.
    Range {
        field: String,
        gt: Option<Value>,
        gte: Option<Value>,
        lt: Option<Value>,
        lte: Option<Value>,
    },
    /// String field contains `substring`.
    Contains { field: String, substring: String },
    /// String field matches a regular expression.
    Regex { field: String, pattern: String },
    /// `DateTime` field falls within `[from, to]` (RFC3339, either bound optional).
    TimeRange {
        field: String,
        from: Option<String>,
        to: Option<String>,
    },
    /// Escape hatch: a backend-native query fragment passed through verbatim.
    /// Only the backend named in `backend` understands it; every other
    /// backend treats it as non-matching rather than erroring, so a mixed
    /// fleet degrades gracefully instead of failing the whole request.
    RawDsl { backend: String, expr: Value },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    /// Parse a filter from a JSON value (wire format used by the HTTP surface).
    pub fn from_json(v: &Value) -> Option<Self> {
        let obj = v.as_object()?;
        let op = obj.get("op")?.as_str()?;
        match op {
            "eq" => {
                let field = obj.get("field")?.as_str()?.to_string();
                let values = obj.get("values")?.as_array()?.clone();
                Some(Filter::Eq { field, values })
            }
            "in" => {
                let field = obj.get("field")?.as_str()?.to_string();
                let values = obj.get("values")?.as_array()?.clone();
                Some(Filter::In { field, values })
            }
            "prefix" => {
                let field = obj.get("field")?.as_str()?.to_string();
                let prefix = obj.get("prefix")?.as_str()?.to_string();
                Some(Filter::Prefix { field, prefix })
            }
            "range" => {
                let field = obj.get("field")?.as_str()?.to_string();
                Some(Filter::Range {
                    field,
                    gt: obj.get("gt").cloned(),
                    gte: obj.get("gte").cloned(),
                    lt: obj.get("lt").cloned(),
                    lte: obj.get("lte").cloned(),
                })
            }
            "contains" => {
                let field = obj.get("field")?.as_str()?.to_string();
                let substring = obj.get("substring")?.as_str()?.to_string();
                Some(Filter::Contains { field, substring })
            }
            "regex" => {
                let field = obj.get("field")?.as_str()?.to_string();
                let pattern = obj.get("pattern")?.as_str()?.to_string();
                Some(Filter::Regex { field, pattern })
            }
            "time_range" => {
                let field = obj.get("field")?.as_str()?.to_string();
                Some(Filter::TimeRange {
                    field,
                    from: obj.get("from").and_then(|v| v.as_str()).map(str::to_string),
                    to: obj.get("to").and_then(|v| v.as_str()).map(str::to_string),
                })
            }
            "raw" => {
                let backend = obj.get("backend")?.as_str()?.to_string();
                let expr = obj.get("expr")?.clone();
                Some(Filter::RawDsl { backend, expr })
            }
            "and" => {
                let conds = obj.get("conds")?.as_array()?;
                let filters: Vec<Filter> = conds.iter().filter_map(Filter::from_json).collect();
                Some(Filter::And(filters))
            }
            "or" => {
                let conds = obj.get("conds")?.as_array()?;
                let filters: Vec<Filter> = conds.iter().filter_map(Filter::from_json).collect();
                Some(Filter::Or(filters))
            }
            "not" => {
                let inner = Filter::from_json(obj.get("cond")?)?;
                Some(Filter::Not(Box::new(inner)))
            }
            _ => None,
        }
    }

    /// Evaluate the filter against a set of field values. `RawDsl` always
    /// evaluates to `false` here since only a compiled backend understands it.
    pub fn matches(&self, fields: &HashMap<String, Value>) -> bool {
        match self {
            Filter::Eq { field, values } => match fields.get(field) {
                Some(field_val) => {
                    if let Some(arr) = field_val.as_array() {
                        values.iter().any(|v| arr.contains(v))
                    } else {
                        values.iter().any(|v| values_match(field_val, v))
                    }
                }
                None => false,
            },
            Filter::In { field, values } => match fields.get(field) {
                Some(field_val) => {
                    if let Some(arr) = field_val.as_array() {
                        values.iter().any(|v| arr.contains(v))
                    } else {
                        values.iter().any(|v| values_match(field_val, v))
                    }
                }
                None => false,
            },
            Filter::Range { field, gt, gte, lt, lte } => match fields.get(field) {
                Some(field_val) => {
                    range_check(field_val, gt.as_ref(), gte.as_ref(), lt.as_ref(), lte.as_ref())
                }
                None => false,
            },
            Filter::Prefix { field, prefix } => fields
                .get(field)
                .and_then(|v| v.as_str())
                .map(|s| s.starts_with(prefix.as_str()))
                .unwrap_or(false),
            Filter::Contains { field, substring } => fields
                .get(field)
                .and_then(|v| v.as_str())
                .map(|s| s.contains(substring.as_str()))
                .unwrap_or(false),
            Filter::Regex { field, pattern } => {
                let Some(s) = fields.get(field).and_then(|v| v.as_str()) else {
                    return false;
                };
                Regex::new(pattern).map(|re| re.is_match(s)).unwrap_or(false)
            }
            Filter::TimeRange { field, from, to } => {
                let Some(s) = fields.get(field).and_then(|v| v.as_str()) else {
                    return false;
                };
                let Ok(ts) = chrono::DateTime::parse_from_rfc3339(s) else {
                    return false;
                };
                if let Some(from) = from {
                    let Ok(from_ts) = chrono::DateTime::parse_from_rfc3339(from) else {
                        return false;
                    };
                    if ts < from_ts {
                        return false;
                    }
                }
                if let Some(to) = to {
                    let Ok(to_ts) = chrono::DateTime::parse_from_rfc3339(to) else {
                        return false;
                    };
                    if ts > to_ts {
                        return false;
                    }
                }
                true
            }
            Filter::RawDsl { .. } => false,
            Filter::And(filters) => filters.iter().all(|f| f.matches(fields)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(fields)),
            Filter::Not(inner) => !inner.matches(fields),
        }
    }

    /// AND-compose this filter with another, flattening nested `And` nodes.
    pub fn and(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::And(mut a), Filter::And(b)) => {
                a.extend(b);
                Filter::And(a)
            }
            (Filter::And(mut a), b) => {
                a.push(b);
                Filter::And(a)
            }
            (a, Filter::And(mut b)) => {
                b.insert(0, a);
                Filter::And(b)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }
}

fn values_match(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(na), Value::Number(nb)) => {
            if let (Some(ia), Some(ib)) = (na.as_i64(), nb.as_i64()) {
                return ia == ib;
            }
            if let (Some(fa), Some(fb)) = (na.as_f64(), nb.as_f64()) {
                return (fa - fb).abs() < 1e-9;
            }
            false
        }
        _ => a == b,
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(na), Value::Number(nb)) => {
            let fa = na.as_f64()?;
            let fb = nb.as_f64()?;
            fa.partial_cmp(&fb)
        }
        (Value::String(sa), Value::String(sb)) => Some(sa.cmp(sb)),
        _ => None,
    }
}

fn range_check(
    val: &Value,
    gt: Option<&Value>,
    gte: Option<&Value>,
    lt: Option<&Value>,
    lte: Option<&Value>,
) -> bool {
    if let Some(g) = gt {
        if compare_values(val, g) != Some(std::cmp::Ordering::Greater) {
            return false;
        }
    }
    if let Some(g) = gte {
        match compare_values(val, g) {
            Some(std::cmp::Ordering::Less) | None => return false,
            _ => {}
        }
    }
    if let Some(l) = lt {
        if compare_values(val, l) != Some(std::cmp::Ordering::Less) {
            return false;
        }
    }
    if let Some(l) = lte {
        match compare_values(val, l) {
            Some(std::cmp::Ordering::Greater) | None => return false,
            _ => {}
        }
    }
    true
}
