//! Translator configuration.
//!
//! A [`Translator`] holds the ordered list of dialect handlers chosen at
//! configuration time. The list is static for the translator's lifetime;
//! a dialect that is not deployed is simply never added. The
//! [`NullHandler`] is appended automatically, so every statement failure
//! has exactly one responsible handler.

use dbvet_core::{Handler, NullHandler};

use crate::handling::Handling;

/// The configured constraint-translation engine.
///
/// Cheap to share by reference; all state is the immutable handler list.
/// Each top-level operation runs in its own [`Handling`] scope.
pub struct Translator {
    handlers: Vec<Box<dyn Handler>>,
}

impl Translator {
    /// A translator with no dialect handlers. Every failure stays
    /// unhandled; useful as a disabled configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> TranslatorBuilder {
        TranslatorBuilder {
            handlers: Vec::new(),
        }
    }

    /// Handlers in dispatch order, the catch-all included.
    pub fn handlers(&self) -> &[Box<dyn Handler>] {
        &self.handlers
    }

    /// Open a fresh handling scope for one logical write operation.
    ///
    /// The scope carries the reentrancy depth for the call stack it is
    /// threaded through; it must not be shared across concurrent callers.
    pub fn scope(&self) -> Handling<'_> {
        Handling::new(&self.handlers)
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.handlers.iter().map(|h| h.name()).collect();
        f.debug_struct("Translator").field("handlers", &names).finish()
    }
}

/// Builder assembling the ordered handler list.
pub struct TranslatorBuilder {
    handlers: Vec<Box<dyn Handler>>,
}

impl TranslatorBuilder {
    /// Append a dialect handler. Dispatch tries handlers in the order
    /// they were added.
    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn build(mut self) -> Translator {
        self.handlers.push(Box::new(NullHandler));
        Translator {
            handlers: self.handlers,
        }
    }
}
