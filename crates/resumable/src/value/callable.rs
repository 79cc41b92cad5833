//! Native callable values

use std::sync::Arc;

use super::Value;
use crate::context::InvokeContext;
use crate::error::QrlError;

/// Type alias for native function pointers to reduce complexity
pub type NativeFnPtr =
    Arc<dyn Fn(&InvokeContext, &[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// A native function exported by a loadable chunk.
///
/// The function receives the invocation context it runs in, which records
/// the lazy reference (if any) that performed the call.
#[derive(Clone)]
pub struct NativeFn {
    /// Function name (for display/debugging)
    pub name: String,

    /// Arity (-1 for variadic)
    pub arity: i32,

    /// The actual function pointer
    pub func: NativeFnPtr,
}

impl NativeFn {
    /// Create a new native function
    pub fn new<F>(name: impl Into<String>, arity: i32, func: F) -> Self
    where
        F: Fn(&InvokeContext, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            func: Arc::new(func),
        }
    }

    /// Call the function inside `ctx`.
    ///
    /// # Errors
    ///
    /// Returns `ArityMismatch` if the argument count doesn't match and
    /// `InvocationFailed` if the function itself fails.
    pub fn call(&self, ctx: &InvokeContext, args: &[Value]) -> Result<Value, QrlError> {
        if self.arity >= 0 && args.len() != self.arity as usize {
            return Err(QrlError::ArityMismatch {
                name: self.name.clone(),
                expected: self.arity as usize,
                got: args.len(),
            });
        }

        (self.func)(ctx, args).map_err(|e| QrlError::InvocationFailed {
            name: self.name.clone(),
            message: format!("{e:#}"),
        })
    }

    /// Check whether two handles point at the same function.
    pub fn ptr_eq(&self, other: &NativeFn) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl std::fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NativeFn({})", self.name)
    }
}
