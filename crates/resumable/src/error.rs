//! Error types for reference resolution and tree manipulation

use thiserror::Error;

use crate::dom::NodeId;
use crate::value::Value;

/// Main error type for resumable operations
#[derive(Error, Debug)]
pub enum ResumeError {
    /// Lazy reference failure
    #[error(transparent)]
    Qrl(#[from] QrlError),

    /// Virtual node or marker failure
    #[error(transparent)]
    Virtual(#[from] VirtualError),

    /// Structural tree failure
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Result type alias for resumable operations
pub type Result<T> = std::result::Result<T, ResumeError>;

/// Errors raised while resolving, invoking or serializing a lazy reference.
///
/// The type is `Clone` because a single in-flight load is shared by every
/// caller that awaits it, and each of them receives the same outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QrlError {
    /// Resolution needs a host but none was attached
    #[error("QRL '{chunk}#{symbol}' does not have an attached container")]
    NoContainer {
        /// Chunk of the reference
        chunk: String,
        /// Symbol of the reference
        symbol: String,
    },

    /// The resolved value cannot be called
    #[error("QRL '{symbol}' resolved to `{found}`, which is not a function")]
    NotInvokable {
        /// Symbol of the reference
        symbol: String,
        /// Type name of the resolved value
        found: String,
    },

    /// The loaded module has no export with the requested name
    #[error("chunk '{chunk}' does not export '{symbol}'")]
    MissingExport {
        /// Chunk that was loaded
        chunk: String,
        /// Export that was requested
        symbol: String,
    },

    /// The loader or the platform failed
    #[error("failed to load '{chunk}#{symbol}': {message}")]
    LoadFailed {
        /// Chunk that was requested
        chunk: String,
        /// Symbol that was requested
        symbol: String,
        /// Underlying failure, flattened to text
        message: String,
    },

    /// A native function returned an error
    #[error("error in {name}: {message}")]
    InvocationFailed {
        /// Function name
        name: String,
        /// Error message
        message: String,
    },

    /// Wrong number of arguments for a native function
    #[error("{name} takes {expected} argument(s), {got} supplied")]
    ArityMismatch {
        /// Function name
        name: String,
        /// Declared arity
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// A captured value cannot travel through serialization
    #[error("captured value #{index} of type `{type_name}` is not serializable")]
    NotSerializable {
        /// Position in the capture list
        index: usize,
        /// Type name of the offending value
        type_name: String,
    },

    /// Malformed serialized reference or an unencodable component
    #[error("invalid QRL '{input}': {reason}")]
    InvalidFormat {
        /// The offending text
        input: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Errors raised while scanning or reconstructing virtual grouping nodes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VirtualError {
    /// The node is not an open marker
    #[error("node {node:?} is not a virtual open marker")]
    NotAVirtualMarker {
        /// The node that was inspected
        node: NodeId,
    },

    /// No matching close marker follows the open marker
    #[error("close marker not found for virtual open marker {open:?}")]
    UnbalancedMarkers {
        /// The open marker whose close is missing
        open: NodeId,
    },

    /// Underlying structural failure
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Errors raised by structural operations on the node tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The reference node is not a child of the parent
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Expected parent
        parent: NodeId,
        /// Node that was not found under it
        child: NodeId,
    },

    /// The insertion would create a cycle or target a leaf node
    #[error("cannot insert {node:?} into {parent:?}")]
    HierarchyRequest {
        /// Target parent
        parent: NodeId,
        /// Node being inserted
        node: NodeId,
    },

    /// A selector string could not be parsed
    #[error("invalid selector '{input}': {reason}")]
    InvalidSelector {
        /// The selector text
        input: String,
        /// What is wrong with it
        reason: String,
    },

    /// The node has the wrong kind for the operation
    #[error("node {node:?} is not {expected}")]
    WrongKind {
        /// The node that was inspected
        node: NodeId,
        /// Kind the operation needs
        expected: &'static str,
    },
}

/// Get the type name of a value (for error messages).
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Unit => "()",
        Value::Bool(_) => "bool",
        Value::I64(_) => "i64",
        Value::F64(_) => "f64",
        Value::String(_) => "String",
        Value::Vec(_) => "Vec",
        Value::Map(_) => "Map",
        Value::Element(_) => "Element",
        Value::Function(_) => "fn",
        Value::Qrl(_) => "QRL",
    }
}
