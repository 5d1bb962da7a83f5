//! Interactive flows
//!
//! A flow is a multi-step conversation with one user. While a user has an
//! active flow, their plain (non-command) messages are fed to it. At most one
//! flow per user is active at a time.

mod new_motion;

pub use new_motion::NewMotionFlow;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;

use crate::bot::Bot;

#[async_trait]
pub trait Flow: Send + Sync {
    /// Advance the flow with the user's message
    async fn step(&mut self, input: &str, bot: &Bot) -> anyhow::Result<()>;

    /// A finished flow is removed from the registry
    fn is_finished(&self) -> bool;
}

/// A flow shared between the registry and the task stepping it
pub type SharedFlow = Arc<Mutex<Box<dyn Flow>>>;

/// Active flows keyed by user id
#[derive(Default)]
pub struct FlowRegistry {
    flows: DashMap<u64, SharedFlow>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a flow for `user_id`. Returns false if one is already active.
    pub fn start(&self, user_id: u64, flow: Box<dyn Flow>) -> bool {
        match self.flows.entry(user_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(Mutex::new(flow)));
                true
            }
        }
    }

    pub fn get(&self, user_id: u64) -> Option<SharedFlow> {
        self.flows.get(&user_id).map(|flow| flow.value().clone())
    }

    pub fn is_active(&self, user_id: u64) -> bool {
        self.flows.contains_key(&user_id)
    }

    /// Remove the user's flow. Returns whether there was one.
    pub fn cancel(&self, user_id: u64) -> bool {
        self.flows.remove(&user_id).is_some()
    }

    /// Remove `flow` if it is still the user's active flow.
    ///
    /// A flow cancelled and replaced while it was being stepped stays replaced.
    pub fn finish(&self, user_id: u64, flow: &SharedFlow) {
        self.flows
            .remove_if(&user_id, |_, active| Arc::ptr_eq(active, flow));
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl Flow for Noop {
        async fn step(&mut self, _input: &str, _bot: &Bot) -> anyhow::Result<()> {
            Ok(())
        }

        fn is_finished(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_one_flow_per_user() {
        let registry = FlowRegistry::new();
        assert!(registry.start(1, Box::new(Noop)));
        assert!(!registry.start(1, Box::new(Noop)));
        assert!(registry.start(2, Box::new(Noop)));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_cancel() {
        let registry = FlowRegistry::new();
        assert!(!registry.cancel(1));
        registry.start(1, Box::new(Noop));
        assert!(registry.cancel(1));
        assert!(!registry.is_active(1));
    }

    #[test]
    fn test_finish_ignores_replaced_flow() {
        let registry = FlowRegistry::new();
        registry.start(1, Box::new(Noop));
        let old = registry.get(1).unwrap();

        registry.cancel(1);
        registry.start(1, Box::new(Noop));
        registry.finish(1, &old);
        assert!(registry.is_active(1));

        let current = registry.get(1).unwrap();
        registry.finish(1, &current);
        assert!(registry.is_empty());
    }
}
