use std::cmp::Ordering;

use serde_json::Value;

use crate::engine::types::Document;

/// Resolves a dotted field path (`"a.b.c"`) against a document.
///
/// Intermediate values that are not objects end the lookup with `None`.
pub fn lookup_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Compares two JSON values using a canonical cross-type order:
/// `null < numbers < strings < objects < arrays < booleans`.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    let by_type = type_rank(a).cmp(&type_rank(b));
    if by_type != Ordering::Equal {
        return by_type;
    }

    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_numbers(a, b),
        (Value::String(lhs), Value::String(rhs)) => lhs.cmp(rhs),
        (Value::Bool(lhs), Value::Bool(rhs)) => lhs.cmp(rhs),
        (Value::Array(lhs), Value::Array(rhs)) => {
            for (l, r) in lhs.iter().zip(rhs.iter()) {
                let ord = compare_values(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            lhs.len().cmp(&rhs.len())
        }
        (Value::Object(lhs), Value::Object(rhs)) => {
            for ((lk, lv), (rk, rv)) in lhs.iter().zip(rhs.iter()) {
                let ord = lk.cmp(rk).then_with(|| compare_values(lv, rv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            lhs.len().cmp(&rhs.len())
        }
        _ => Ordering::Equal,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

fn compare_numbers(a: &Value, b: &Value) -> Ordering {
    if let (Some(va), Some(vb)) = (a.as_u64(), b.as_u64()) {
        return va.cmp(&vb);
    }
    if let (Some(va), Some(vb)) = (a.as_i64(), b.as_i64()) {
        return va.cmp(&vb);
    }
    if let (Some(va), Some(vb)) = (a.as_f64(), b.as_f64()) {
        return va.partial_cmp(&vb).unwrap_or(Ordering::Equal);
    }
    Ordering::Equal
}
