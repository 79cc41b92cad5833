//! # Resumable
//!
//! Core building blocks for resuming server-rendered applications on the
//! client without replaying their setup.
//!
//! Two pieces make that possible:
//!
//! - **Lazy references** ([`Qrl`]): a serializable pointer to a symbol in a
//!   loadable chunk, resolved to a live value only when first needed and
//!   shared by every caller waiting on it.
//! - **Virtual grouping nodes** ([`VirtualElement`]): a run of sibling nodes
//!   delimited by `<!--qv …-->` / `<!--/qv-->` comment markers, manipulated
//!   as if it were one element, with its attributes kept in the open
//!   marker's payload.
//!
//! ## Architecture
//!
//! - **Tree**: an arena [`Document`] of elements, text, comments and
//!   fragments addressed by [`NodeId`]
//! - **Virtual elements**: marker pairing, attribute codec and grouping
//!   operations on top of the tree
//! - **References**: resolution through inline values, loaders or a
//!   [`Platform`], invocation and the `chunk#symbol[hash]:captures` text form
//!
//! ## Example
//!
//! ```
//! use resumable::{Document, VirtualElement};
//!
//! let mut doc = Document::new();
//! let div = doc.create_element("div");
//! let root = doc.root();
//! doc.append_child(root, div).unwrap();
//!
//! let group = VirtualElement::create(&mut doc);
//! group.set_attribute(&mut doc, "q:key", "a b").unwrap();
//! let span = doc.create_element("span");
//! group.append_child(&mut doc, span).unwrap();
//! group.append_to(&mut doc, div.into()).unwrap();
//!
//! assert_eq!(doc.render(div), "<div><!--qv q:key=a+b--><span></span><!--/qv--></div>");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod dom;
pub mod element;
pub mod error;
pub mod platform;
pub mod qrl;
pub mod value;
pub mod virtual_element;

// Re-export main types
pub use config::ResumeConfig;
pub use context::InvokeContext;
pub use dom::{AttributeMatch, Document, DocumentPosition, NodeId, NodeKind, Selector};
pub use element::ElementRef;
pub use error::{DomError, QrlError, Result, ResumeError, VirtualError};
pub use platform::{loader, ChunkRegistry, Host, LoaderFn, Module, Platform};
pub use qrl::{
    get_symbol_hash, parse_qrl, stringify_qrl, Invokable, Invoker, ObjIdFn, PreInvokeHook, Qrl,
    QrlBuilder, SerializeOptions,
};
pub use value::{NativeFn, NativeFnPtr, Value};
pub use virtual_element::{
    escape, find_close, get_root_node, get_virtual_element, is_virtual_close, is_virtual_open,
    parse_virtual_attributes, process_virtual_nodes, query_all_virtual_by_attribute,
    query_virtual_by_attribute, serialize_virtual_attributes, unescape, VirtualElement, VIRTUAL,
    VIRTUAL_CLOSE, VIRTUAL_OPEN_PREFIX,
};

/// Resumable version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
