//! Handler registry - Fans received frames out to subscribers

use std::sync::Arc;

use crate::protocol::Message;

/// A subscriber for frames received from the server
///
/// Handlers run on the receive path, so they should return quickly and
/// hand long work off elsewhere.
pub trait MessageHandler: Send + Sync {
    fn handle(&self, message: &Message);
}

impl<F> MessageHandler for F
where
    F: Fn(&Message) + Send + Sync,
{
    fn handle(&self, message: &Message) {
        self(message)
    }
}

/// An ordered collection of frame handlers
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn MessageHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Register a handler
    ///
    /// Registering the same handler again is allowed; it then runs once
    /// per registration.
    pub fn add(&mut self, handler: Arc<dyn MessageHandler>) {
        self.handlers.push(handler);
    }

    /// Unregister the first registration of exactly this handler
    ///
    /// Handlers are matched by identity, not content. Returns false if
    /// the handler was never registered.
    pub fn remove(&mut self, handler: &Arc<dyn MessageHandler>) -> bool {
        match self.handlers.iter().position(|h| Arc::ptr_eq(h, handler)) {
            Some(index) => {
                self.handlers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run every registered handler against a frame, in registration order
    pub fn dispatch(&self, message: &Message) {
        tracing::trace!(
            "Dispatching {:?} to {} handler(s)",
            message.kind,
            self.handlers.len()
        );
        for handler in &self.handlers {
            handler.handle(message);
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_dispatch_in_registration_order() {
        let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        let mut registry = HandlerRegistry::new();
        let first = seen.clone();
        registry.add(Arc::new(move |_: &Message| first.lock().unwrap().push("first")));
        let second = seen.clone();
        registry.add(Arc::new(move |_: &Message| second.lock().unwrap().push("second")));

        registry.dispatch(&Message::doc_list());
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_duplicate_registration_runs_twice() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let handler: Arc<dyn MessageHandler> = Arc::new(move |_: &Message| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut registry = HandlerRegistry::new();
        registry.add(handler.clone());
        registry.add(handler);
        assert_eq!(registry.len(), 2);

        registry.dispatch(&Message::doc_list());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_remove_drops_one_registration() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let handler: Arc<dyn MessageHandler> = Arc::new(move |_: &Message| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut registry = HandlerRegistry::new();
        registry.add(handler.clone());
        registry.add(handler.clone());

        assert!(registry.remove(&handler));
        assert_eq!(registry.len(), 1);

        registry.dispatch(&Message::doc_list());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_unknown_handler() {
        let registered: Arc<dyn MessageHandler> = Arc::new(|_: &Message| {});
        let stranger: Arc<dyn MessageHandler> = Arc::new(|_: &Message| {});

        let mut registry = HandlerRegistry::new();
        registry.add(registered.clone());

        assert!(!registry.remove(&stranger));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(&registered));
        assert!(registry.is_empty());
    }
}
