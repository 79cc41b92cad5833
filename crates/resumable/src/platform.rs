//! Loadable chunks and the platform hook that imports symbols from them

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;

use crate::element::ElementRef;
use crate::value::Value;

/// Exports of one loaded chunk, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Module {
    exports: IndexMap<String, Value>,
}

impl Module {
    /// Create an empty module
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style export
    pub fn with_export(mut self, name: impl Into<String>, value: Value) -> Self {
        self.exports.insert(name.into(), value);
        self
    }

    /// Add or replace an export
    pub fn export(&mut self, name: impl Into<String>, value: Value) {
        self.exports.insert(name.into(), value);
    }

    /// Look up an export
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.exports.get(name)
    }

    /// Export names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }
}

/// Asynchronous function producing a chunk's module.
pub type LoaderFn = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<Module>> + Send + Sync>;

/// Build a [`LoaderFn`] from an async closure.
pub fn loader<F, Fut>(f: F) -> LoaderFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = anyhow::Result<Module>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Environment hook that turns a chunk and symbol into a live value.
pub trait Platform: Send + Sync {
    /// Import `symbol` from `chunk`, using `element` as context.
    fn import_symbol(
        &self,
        element: ElementRef,
        chunk: &str,
        symbol: &str,
    ) -> BoxFuture<'static, anyhow::Result<Value>>;

    /// Map a symbol to `(symbol, chunk)` when the platform bundles symbols
    /// differently from how references name them.
    fn chunk_for_symbol(&self, _symbol: &str) -> Option<(String, String)> {
        None
    }
}

/// The resolution context a reference attaches to: the element it was
/// mounted under and the platform that can load its chunk.
#[derive(Clone)]
pub struct Host {
    /// Element supplying context
    pub element: ElementRef,

    /// Platform used to import symbols
    pub platform: Arc<dyn Platform>,
}

impl Host {
    /// Create a host
    pub fn new(element: impl Into<ElementRef>, platform: Arc<dyn Platform>) -> Self {
        Self {
            element: element.into(),
            platform,
        }
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("element", &self.element)
            .finish_non_exhaustive()
    }
}

/// In-memory platform: chunks are registered up front, optionally with a
/// symbol-to-chunk mapping used when references are serialized.
#[derive(Default)]
pub struct ChunkRegistry {
    chunks: DashMap<String, Module>,
    symbols: DashMap<String, (String, String)>,
}

impl ChunkRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a chunk.
    pub fn register(&self, chunk: impl Into<String>, module: Module) {
        self.chunks.insert(chunk.into(), module);
    }

    /// Record that `symbol` is bundled as `bundled_symbol` in `chunk`.
    pub fn map_symbol(
        &self,
        symbol: impl Into<String>,
        bundled_symbol: impl Into<String>,
        chunk: impl Into<String>,
    ) {
        self.symbols
            .insert(symbol.into(), (bundled_symbol.into(), chunk.into()));
    }

    /// Number of registered chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Check if no chunk is registered
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl Platform for ChunkRegistry {
    fn import_symbol(
        &self,
        _element: ElementRef,
        chunk: &str,
        symbol: &str,
    ) -> BoxFuture<'static, anyhow::Result<Value>> {
        let result = match self.chunks.get(chunk) {
            Some(module) => module
                .get(symbol)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("chunk '{}' has no export '{}'", chunk, symbol)),
            None => Err(anyhow::anyhow!("unknown chunk '{}'", chunk)),
        };
        future::ready(result).boxed()
    }

    fn chunk_for_symbol(&self, symbol: &str) -> Option<(String, String)> {
        self.symbols.get(symbol).map(|entry| entry.value().clone())
    }
}
