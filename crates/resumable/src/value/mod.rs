//! Value representation for resolved symbols and captured data

mod callable;
mod display;
mod impls;

pub use callable::{NativeFn, NativeFnPtr};

use std::sync::Arc;

use indexmap::IndexMap;

use crate::element::ElementRef;
use crate::qrl::Qrl;

/// Runtime value produced by resolving a lazy reference, or carried as
/// captured state.
///
/// Values are organized into three tiers:
/// - Tier 1: Inline primitives (no allocation)
/// - Tier 2: Heap-allocated data (Arc-wrapped) and tree handles
/// - Tier 3: Callables and lazy references
///
/// Lazy references are a distinct variant, so code that needs to know
/// whether a value is a reference matches on `Value::Qrl` instead of probing
/// for methods.
#[derive(Clone)]
pub enum Value {
    // ═══════════════════════════════════════════════════════════════════
    // Tier 1: Inline Primitives
    // ═══════════════════════════════════════════════════════════════════
    /// The unit value, also used for "no result"
    Unit,

    /// Boolean: `true` or `false`
    Bool(bool),

    /// 64-bit signed integer
    I64(i64),

    /// 64-bit floating point
    F64(f64),

    // ═══════════════════════════════════════════════════════════════════
    // Tier 2: Heap-Allocated Data
    // ═══════════════════════════════════════════════════════════════════
    /// Heap-allocated string
    String(Arc<String>),

    /// Ordered list
    Vec(Arc<Vec<Value>>),

    /// Ordered string-keyed record
    Map(Arc<IndexMap<String, Value>>),

    /// Handle to a real node or a virtual grouping node
    Element(ElementRef),

    // ═══════════════════════════════════════════════════════════════════
    // Tier 3: Callables and References
    // ═══════════════════════════════════════════════════════════════════
    /// Native function exported by a chunk
    Function(NativeFn),

    /// Lazy reference to a symbol in another chunk
    Qrl(Qrl),
}

impl Value {
    /// Check whether this value can travel through serialization.
    ///
    /// Native functions are runtime-only; everything else, including lazy
    /// references (which serialize to their string form), is fine.
    pub fn is_serializable(&self) -> bool {
        match self {
            Value::Function(_) => false,
            Value::Vec(items) => items.iter().all(Value::is_serializable),
            Value::Map(map) => map.values().all(Value::is_serializable),
            _ => true,
        }
    }
}
