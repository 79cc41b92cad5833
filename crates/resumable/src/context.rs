//! Invocation context passed to native functions

use crate::element::ElementRef;
use crate::qrl::Qrl;
use crate::value::Value;

/// State describing one invocation of a lazily loaded function.
///
/// A context is passed to every native function call. When the call goes
/// through a lazy reference, `qrl` records which reference performed it, so
/// downstream code can report it in diagnostics or detect re-entrancy.
#[derive(Debug, Clone, Default)]
pub struct InvokeContext {
    /// Reference that performed the call
    pub qrl: Option<Qrl>,

    /// Component host the call belongs to
    pub host_element: Option<ElementRef>,

    /// Element the triggering event was dispatched on
    pub element: Option<ElementRef>,

    /// Event payload, when the call handles an event
    pub event: Option<Value>,
}

impl InvokeContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context for an event dispatched on `element`.
    pub fn for_event(host_element: ElementRef, element: ElementRef, event: Value) -> Self {
        Self {
            host_element: Some(host_element),
            element: Some(element),
            event: Some(event),
            ..Default::default()
        }
    }

    /// Copy of this context that records `qrl` as the invoker.
    pub fn with_qrl(&self, qrl: Qrl) -> Self {
        Self {
            qrl: Some(qrl),
            ..self.clone()
        }
    }
}
