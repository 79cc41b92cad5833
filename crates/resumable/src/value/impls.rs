//! Value trait implementations: constructors, predicates, extractors, From traits, PartialEq

use std::sync::Arc;

use super::*;

// ═══════════════════════════════════════════════════════════════════
// Convenience Constructors
// ═══════════════════════════════════════════════════════════════════

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(Arc::new(s.into()))
    }

    /// Create a vec value
    pub fn vec(items: Vec<Value>) -> Self {
        Value::Vec(Arc::new(items))
    }

    /// Create a map value from key/value pairs, preserving order
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Create a function value
    pub fn function<F>(name: impl Into<String>, arity: i32, func: F) -> Self
    where
        F: Fn(&crate::InvokeContext, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Value::Function(NativeFn::new(name, arity, func))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Type Predicates
    // ═══════════════════════════════════════════════════════════════════
    /// Check if value is unit type
    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    /// Check if value is a string
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Check if value can be called directly
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Check if value is a lazy reference
    pub fn is_qrl(&self) -> bool {
        matches!(self, Value::Qrl(_))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Extractors (return Option for safe access)
    // ═══════════════════════════════════════════════════════════════════
    /// Extract boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract integer value
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract as f64 (converts from integers)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(n) => Some(*n),
            Value::I64(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Extract string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Extract list items
    pub fn as_vec(&self) -> Option<&[Value]> {
        match self {
            Value::Vec(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Extract the native function
    pub fn as_function(&self) -> Option<&NativeFn> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Extract the lazy reference
    pub fn as_qrl(&self) -> Option<&Qrl> {
        match self {
            Value::Qrl(q) => Some(q),
            _ => None,
        }
    }

    /// Extract the element handle
    pub fn as_element(&self) -> Option<ElementRef> {
        match self {
            Value::Element(el) => Some(*el),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// PartialEq
// ═══════════════════════════════════════════════════════════════════

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Vec(a), Value::Vec(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Element(a), Value::Element(b)) => a == b,
            // Callables compare by identity
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Qrl(a), Value::Qrl(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// From Implementations
// ═══════════════════════════════════════════════════════════════════

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::I64(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::I64(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::F64(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::new(s))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::new(s.to_string()))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Vec(Arc::new(v.into_iter().map(Into::into).collect()))
    }
}

impl From<NativeFn> for Value {
    fn from(f: NativeFn) -> Self {
        Value::Function(f)
    }
}

impl From<Qrl> for Value {
    fn from(q: Qrl) -> Self {
        Value::Qrl(q)
    }
}

impl From<ElementRef> for Value {
    fn from(el: ElementRef) -> Self {
        Value::Element(el)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_constructor() {
        let v = Value::string("hello");
        assert_eq!(v.as_str(), Some("hello"));
    }

    #[test]
    fn test_map_preserves_order() {
        let v = Value::map([("b", Value::I64(2)), ("a", Value::I64(1))]);
        match v {
            Value::Map(m) => {
                let keys: Vec<&str> = m.keys().map(String::as_str).collect();
                assert_eq!(keys, vec!["b", "a"]);
            }
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_functions_compare_by_identity() {
        let f = Value::function("f", 0, |_, _| Ok(Value::Unit));
        let g = Value::function("f", 0, |_, _| Ok(Value::Unit));
        assert_eq!(f, f.clone());
        assert_ne!(f, g);
    }

    #[test]
    fn test_is_callable() {
        assert!(Value::function("f", 0, |_, _| Ok(Value::Unit)).is_callable());
        assert!(!Value::I64(1).is_callable());
        assert!(!Value::string("f").is_callable());
    }

    #[test]
    fn test_serializable() {
        assert!(Value::vec(vec![Value::I64(1), Value::string("x")]).is_serializable());
        let nested = Value::map([("f", Value::function("f", 0, |_, _| Ok(Value::Unit)))]);
        assert!(!nested.is_serializable());
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(3), Value::I64(3));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(vec!["a", "b"]).as_vec().map(|v| v.len()), Some(2));
        assert_eq!(Value::from(2.5).as_f64(), Some(2.5));
    }
}
