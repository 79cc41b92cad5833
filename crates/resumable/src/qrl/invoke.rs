//! Calling through a lazy reference

use std::fmt;
use std::sync::Arc;

use super::Qrl;
use crate::context::InvokeContext;
use crate::error::QrlError;
use crate::platform::Host;
use crate::value::{NativeFn, Value};

/// Hook run after resolution and before the call itself.
pub type PreInvokeHook = Arc<dyn Fn() + Send + Sync>;

/// A callable obtained from a reference without waiting.
#[derive(Clone)]
pub enum Invokable {
    /// The reference was already resolved to a function
    Ready(NativeFn),

    /// Calling resolves the reference first
    Deferred {
        /// Reference to resolve
        qrl: Qrl,
        /// Host to attach before resolving
        host: Option<Host>,
    },
}

impl Invokable {
    /// Check if calling needs no resolution
    pub fn is_ready(&self) -> bool {
        matches!(self, Invokable::Ready(_))
    }

    /// Call with `args`, resolving first if needed.
    pub async fn call(&self, ctx: &InvokeContext, args: &[Value]) -> Result<Value, QrlError> {
        match self {
            Invokable::Ready(func) => func.call(ctx, args),
            Invokable::Deferred { qrl, host } => {
                let func = qrl.resolve_function(host.as_ref()).await?;
                func.call(ctx, args)
            }
        }
    }
}

impl fmt::Debug for Invokable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invokable::Ready(func) => f.debug_tuple("Ready").field(func).finish(),
            Invokable::Deferred { qrl, .. } => f.debug_tuple("Deferred").field(qrl).finish(),
        }
    }
}

/// Bound invocation of a reference, produced by [`Qrl::invoke`].
///
/// Each call resolves the reference (reusing any completed or in-flight
/// load), runs the pre-invoke hook and calls the function with a context
/// that records the reference as the invoker.
#[derive(Clone)]
pub struct Invoker {
    qrl: Qrl,
    host: Option<Host>,
    context: Option<InvokeContext>,
    before: Option<PreInvokeHook>,
}

impl Invoker {
    /// The reference being invoked
    pub fn qrl(&self) -> &Qrl {
        &self.qrl
    }

    /// Call with `args`.
    ///
    /// # Errors
    ///
    /// Resolution errors, `NotInvokable` if the value is not a function, and
    /// whatever the function itself returns.
    pub async fn call(&self, args: &[Value]) -> Result<Value, QrlError> {
        let func = self.qrl.resolve_function(self.host.as_ref()).await?;
        let ctx = self
            .context
            .as_ref()
            .map_or_else(InvokeContext::new, Clone::clone)
            .with_qrl(self.qrl.clone());
        if let Some(before) = &self.before {
            before();
        }
        tracing::trace!(symbol = %self.qrl.get_symbol(), args = args.len(), "invoking");
        func.call(&ctx, args)
    }
}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invoker")
            .field("qrl", &self.qrl)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl Qrl {
    /// The function this reference resolves to, without waiting when it
    /// is already resolved.
    pub fn resolve_invokable(&self, host: Option<&Host>) -> Invokable {
        match self.resolved_function() {
            Some(func) => Invokable::Ready(func),
            None => Invokable::Deferred {
                qrl: self.clone(),
                host: host.cloned(),
            },
        }
    }

    /// Bind an invocation. `host` is attached on first call, `context` is
    /// the base for the context handed to the function and `before` runs
    /// right before each call.
    pub fn invoke(
        &self,
        host: Option<Host>,
        context: Option<InvokeContext>,
        before: Option<PreInvokeHook>,
    ) -> Invoker {
        Invoker {
            qrl: self.clone(),
            host,
            context,
            before,
        }
    }

    /// Resolve and call with `args` and an empty context.
    pub async fn call(&self, args: &[Value]) -> Result<Value, QrlError> {
        self.invoke(None, None, None).call(args).await
    }
}
