//! Lazy references to symbols in loadable chunks
//!
//! A [`Qrl`] names a symbol (`symbol`) exported by a chunk (`chunk`) and
//! turns it into a live [`Value`] on demand. Resolution goes through, in
//! order of preference:
//!
//! 1. a value supplied inline when the reference was built,
//! 2. a loader function producing the chunk's [`Module`],
//! 3. the [`Platform`] of the attached [`Host`].
//!
//! Every clone of a `Qrl` shares one resolution cell:
//!
//! ```text
//! Absent ──resolve──▶ Pending(shared load) ──ok──▶ Present(value)
//!    ▲                      │
//!    └──────── error ───────┘
//! ```
//!
//! Callers that arrive while a load is pending join it instead of starting
//! another, so a loader runs at most once per reference at a time. A failed
//! load returns the cell to `Absent`; the next `resolve` starts over.
//!
//! [`Module`]: crate::platform::Module
//! [`Platform`]: crate::platform::Platform

mod invoke;
mod serialize;

pub use invoke::{Invokable, Invoker, PreInvokeHook};
pub use serialize::{parse_qrl, stringify_qrl, ObjIdFn, SerializeOptions};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::error::{type_name, QrlError};
use crate::platform::{Host, LoaderFn};
use crate::value::{NativeFn, Value};

type SharedLoad = Shared<BoxFuture<'static, Result<Value, QrlError>>>;

/// Load ids are unique across every reference, so a copied `Pending` state
/// can never be confused with a load started later by the copy.
static NEXT_LOAD: AtomicU64 = AtomicU64::new(1);

enum ResolveState {
    Absent,
    Pending { generation: u64, load: SharedLoad },
    Present(Value),
}

impl Clone for ResolveState {
    fn clone(&self) -> Self {
        match self {
            ResolveState::Absent => ResolveState::Absent,
            ResolveState::Pending { generation, load } => ResolveState::Pending {
                generation: *generation,
                load: load.clone(),
            },
            ResolveState::Present(value) => ResolveState::Present(value.clone()),
        }
    }
}

struct QrlInner {
    chunk: String,
    symbol: String,
    ref_symbol: Option<String>,
    hash: String,
    loader: Option<LoaderFn>,
    state: Mutex<ResolveState>,
    host: OnceCell<Host>,
    capture: Mutex<Vec<String>>,
    capture_ref: Mutex<Vec<Value>>,
}

/// Derive the short hash of a symbol: the part after the last `_`, or the
/// whole name when there is none.
///
/// ```
/// use resumable::get_symbol_hash;
///
/// assert_eq!(get_symbol_hash("foo_AB12"), "AB12");
/// assert_eq!(get_symbol_hash("bar"), "bar");
/// ```
pub fn get_symbol_hash(symbol: &str) -> &str {
    match symbol.rfind('_') {
        Some(index) => &symbol[index + 1..],
        None => symbol,
    }
}

/// Builder for [`Qrl`].
#[must_use]
pub struct QrlBuilder {
    chunk: String,
    symbol: String,
    inline: Option<Value>,
    loader: Option<LoaderFn>,
    capture: Vec<String>,
    capture_ref: Vec<Value>,
    ref_symbol: Option<String>,
    hash: Option<String>,
    dev_checks: bool,
}

impl QrlBuilder {
    /// Value the reference resolves to without loading anything
    pub fn inline(mut self, value: Value) -> Self {
        self.inline = Some(value);
        self
    }

    /// Loader producing the chunk's module
    pub fn loader(mut self, loader: LoaderFn) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Serialized keys of the captured values
    pub fn capture<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capture = symbols.into_iter().map(Into::into).collect();
        self
    }

    /// Captured runtime values
    pub fn capture_values(mut self, values: Vec<Value>) -> Self {
        self.capture_ref = values;
        self
    }

    /// Externally visible symbol name
    pub fn ref_symbol(mut self, ref_symbol: impl Into<String>) -> Self {
        self.ref_symbol = Some(ref_symbol.into());
        self
    }

    /// Override the derived hash
    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Enable or disable the capture serializability check
    pub fn dev_checks(mut self, enabled: bool) -> Self {
        self.dev_checks = enabled;
        self
    }

    /// Build the reference.
    ///
    /// # Errors
    ///
    /// With development checks enabled, returns `NotSerializable` if a
    /// captured value cannot be serialized.
    pub fn build(self) -> Result<Qrl, QrlError> {
        if self.dev_checks {
            if let Some((index, value)) = self
                .capture_ref
                .iter()
                .enumerate()
                .find(|(_, v)| !v.is_serializable())
            {
                return Err(QrlError::NotSerializable {
                    index,
                    type_name: type_name(value).to_string(),
                });
            }
        }

        let hash = self
            .hash
            .unwrap_or_else(|| get_symbol_hash(&self.symbol).to_string());
        let state = match self.inline {
            Some(value) => ResolveState::Present(value),
            None => ResolveState::Absent,
        };
        Ok(Qrl::from_parts(
            self.chunk,
            self.symbol,
            self.ref_symbol,
            hash,
            self.loader,
            state,
            self.capture,
            self.capture_ref,
        ))
    }
}

/// A lazy reference to `chunk#symbol`.
///
/// Cloning is cheap and shares the resolution state, attached host and
/// capture data. Use [`Qrl::copy`] for an independent reference.
#[derive(Clone)]
pub struct Qrl {
    inner: Arc<QrlInner>,
}

impl Qrl {
    /// Start building a reference.
    pub fn builder(chunk: impl Into<String>, symbol: impl Into<String>) -> QrlBuilder {
        QrlBuilder {
            chunk: chunk.into(),
            symbol: symbol.into(),
            inline: None,
            loader: None,
            capture: Vec::new(),
            capture_ref: Vec::new(),
            ref_symbol: None,
            hash: None,
            dev_checks: cfg!(debug_assertions),
        }
    }

    /// A reference that can only be resolved through an attached host.
    pub fn new(chunk: impl Into<String>, symbol: impl Into<String>) -> Self {
        let chunk = chunk.into();
        let symbol = symbol.into();
        let hash = get_symbol_hash(&symbol).to_string();
        Self::from_parts(
            chunk,
            symbol,
            None,
            hash,
            None,
            ResolveState::Absent,
            Vec::new(),
            Vec::new(),
        )
    }

    /// A reference resolved through `loader`.
    pub fn with_loader(chunk: impl Into<String>, symbol: impl Into<String>, loader: LoaderFn) -> Self {
        let symbol = symbol.into();
        let hash = get_symbol_hash(&symbol).to_string();
        Self::from_parts(
            chunk.into(),
            symbol,
            None,
            hash,
            Some(loader),
            ResolveState::Absent,
            Vec::new(),
            Vec::new(),
        )
    }

    /// A reference that is already resolved to `value`.
    pub fn with_value(chunk: impl Into<String>, symbol: impl Into<String>, value: Value) -> Self {
        let qrl = Self::new(chunk, symbol);
        *qrl.inner.state.lock() = ResolveState::Present(value);
        qrl
    }

    #[allow(clippy::too_many_arguments)]
    fn from_parts(
        chunk: String,
        symbol: String,
        ref_symbol: Option<String>,
        hash: String,
        loader: Option<LoaderFn>,
        state: ResolveState,
        capture: Vec<String>,
        capture_ref: Vec<Value>,
    ) -> Self {
        Self {
            inner: Arc::new(QrlInner {
                chunk,
                symbol,
                ref_symbol,
                hash,
                loader,
                state: Mutex::new(state),
                host: OnceCell::new(),
                capture: Mutex::new(capture),
                capture_ref: Mutex::new(capture_ref),
            }),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Metadata
    // ═══════════════════════════════════════════════════════════════════

    /// Chunk identifier
    pub fn chunk(&self) -> &str {
        &self.inner.chunk
    }

    /// Export name within the chunk
    pub fn symbol(&self) -> &str {
        &self.inner.symbol
    }

    /// Externally visible name, if different from the export name
    pub fn ref_symbol(&self) -> Option<&str> {
        self.inner.ref_symbol.as_deref()
    }

    /// The externally visible name, falling back to the export name
    pub fn get_symbol(&self) -> &str {
        self.ref_symbol().unwrap_or(&self.inner.symbol)
    }

    /// Short hash identifying the symbol
    pub fn get_hash(&self) -> &str {
        &self.inner.hash
    }

    /// Serialized keys of the captured values
    pub fn capture(&self) -> Vec<String> {
        self.inner.capture.lock().clone()
    }

    /// Replace the serialized capture keys
    pub fn set_capture(&self, symbols: Vec<String>) {
        *self.inner.capture.lock() = symbols;
    }

    /// Captured runtime values
    pub fn capture_values(&self) -> Vec<Value> {
        self.inner.capture_ref.lock().clone()
    }

    /// Replace the captured runtime values, e.g. after restoring them by
    /// position from serialized state
    pub fn set_capture_values(&self, values: Vec<Value>) {
        *self.inner.capture_ref.lock() = values;
    }

    /// Check whether two handles share one reference.
    pub fn ptr_eq(&self, other: &Qrl) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Resolution
    // ═══════════════════════════════════════════════════════════════════

    /// Attach a host. Only the first host sticks.
    pub fn attach(&self, host: Host) {
        let _ = self.inner.host.set(host);
    }

    /// The attached host
    pub fn host(&self) -> Option<&Host> {
        self.inner.host.get()
    }

    /// The resolved value, if resolution has completed
    pub fn resolved_value(&self) -> Option<Value> {
        match &*self.inner.state.lock() {
            ResolveState::Present(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Check whether a load is in flight
    pub fn is_pending(&self) -> bool {
        matches!(&*self.inner.state.lock(), ResolveState::Pending { .. })
    }

    fn resolved_function(&self) -> Option<NativeFn> {
        match &*self.inner.state.lock() {
            ResolveState::Present(Value::Function(f)) => Some(f.clone()),
            _ => None,
        }
    }

    /// Resolve the reference, attaching `host` first when given.
    ///
    /// # Errors
    ///
    /// - `NoContainer` if there is no inline value, loader or host
    /// - `LoadFailed` / `MissingExport` if loading fails
    pub async fn resolve(&self, host: Option<&Host>) -> Result<Value, QrlError> {
        if let Some(host) = host {
            self.attach(host.clone());
        }

        let (generation, load) = {
            let mut state = self.inner.state.lock();
            match &*state {
                ResolveState::Present(value) => return Ok(value.clone()),
                ResolveState::Pending { generation, load } => (*generation, load.clone()),
                ResolveState::Absent => {
                    let load = self.start_load()?;
                    let generation = NEXT_LOAD.fetch_add(1, Ordering::Relaxed);
                    *state = ResolveState::Pending {
                        generation,
                        load: load.clone(),
                    };
                    (generation, load)
                }
            }
        };

        let result = load.await;
        self.settle(generation, &result);
        result
    }

    /// Build the shared load. Nothing user-supplied runs here: the loader
    /// or platform is only called on first poll, after the state lock is
    /// released.
    fn start_load(&self) -> Result<SharedLoad, QrlError> {
        let chunk = self.inner.chunk.clone();
        let symbol = self.inner.symbol.clone();

        if let Some(loader) = self.inner.loader.clone() {
            return Ok(async move {
                tracing::debug!(%chunk, %symbol, "loading chunk");
                let module = loader().await.map_err(|e| QrlError::LoadFailed {
                    chunk: chunk.clone(),
                    symbol: symbol.clone(),
                    message: format!("{e:#}"),
                })?;
                module
                    .get(&symbol)
                    .cloned()
                    .ok_or(QrlError::MissingExport { chunk, symbol })
            }
            .boxed()
            .shared());
        }

        let host = self.inner.host.get().cloned().ok_or_else(|| QrlError::NoContainer {
            chunk: chunk.clone(),
            symbol: if symbol.is_empty() {
                "default".to_string()
            } else {
                symbol.clone()
            },
        })?;
        Ok(async move {
            tracing::debug!(%chunk, %symbol, "importing symbol through platform");
            let import = host.platform.import_symbol(host.element, &chunk, &symbol);
            import.await.map_err(|e| QrlError::LoadFailed {
                chunk,
                symbol,
                message: format!("{e:#}"),
            })
        }
        .boxed()
        .shared())
    }

    /// Record the outcome of load `generation`, unless a newer load has
    /// taken its place.
    fn settle(&self, generation: u64, result: &Result<Value, QrlError>) {
        let mut state = self.inner.state.lock();
        let current = matches!(
            &*state,
            ResolveState::Pending { generation: g, .. } if *g == generation
        );
        if !current {
            return;
        }
        *state = match result {
            Ok(value) => {
                tracing::debug!(chunk = %self.inner.chunk, symbol = %self.inner.symbol, "resolved");
                ResolveState::Present(value.clone())
            }
            Err(error) => {
                tracing::debug!(chunk = %self.inner.chunk, symbol = %self.inner.symbol, %error, "load failed");
                ResolveState::Absent
            }
        };
    }

    /// Resolve to a native function.
    async fn resolve_function(&self, host: Option<&Host>) -> Result<NativeFn, QrlError> {
        if let Some(func) = self.resolved_function() {
            return Ok(func);
        }
        match self.resolve(host).await? {
            Value::Function(func) => Ok(func),
            other => Err(QrlError::NotInvokable {
                symbol: self.get_symbol().to_string(),
                found: type_name(&other).to_string(),
            }),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Copying
    // ═══════════════════════════════════════════════════════════════════

    /// An independent reference with the same target, resolution state,
    /// loader and current capture values, but no capture keys and no host.
    pub fn copy(&self) -> Qrl {
        let state = self.inner.state.lock().clone();
        Self::from_parts(
            self.inner.chunk.clone(),
            self.inner.symbol.clone(),
            self.inner.ref_symbol.clone(),
            self.inner.hash.clone(),
            self.inner.loader.clone(),
            state,
            Vec::new(),
            self.capture_values(),
        )
    }
}

impl fmt::Debug for Qrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Qrl")
            .field("chunk", &self.inner.chunk)
            .field("symbol", &self.inner.symbol)
            .field("hash", &self.inner.hash)
            .field("capture", &*self.inner.capture.lock())
            .finish_non_exhaustive()
    }
}
