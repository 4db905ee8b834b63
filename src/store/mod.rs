//! Realtime key-value store access.

use async_trait::async_trait;
use serde_json::Value;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::StoreResult;

pub mod firebase;
pub mod memory;
pub mod path;
pub mod schema;
pub mod sse;
pub mod tree;

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;
pub use path::StorePath;

#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Reads a node. Absent nodes read as `Null`.
    async fn get(&self, path: &StorePath) -> StoreResult<Value>;

    /// Replaces a node. Writing `Null` deletes it.
    async fn set(&self, path: &StorePath, value: Value) -> StoreResult<()>;

    /// Immediate child keys of a node, sorted.
    async fn keys(&self, path: &StorePath) -> StoreResult<Vec<String>>;

    /// Pushes the value of the node now and after every change to it.
    async fn subscribe(&self, path: &StorePath) -> StoreResult<Subscription>;
}

pub type Feed = mpsc::UnboundedSender<StoreResult<Value>>;

/// A live feed of one node's value. Dropping it stops the feed.
#[derive(Debug)]
pub struct Subscription {
    path: StorePath,
    rx: mpsc::UnboundedReceiver<StoreResult<Value>>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Spawns `run` with the sending half of a fresh feed.
    pub fn spawn<F, Fut>(path: StorePath, run: F) -> Self
    where
        F: FnOnce(Feed) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(tx));
        Self { path, rx, task }
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    /// `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<StoreResult<Value>> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        log::debug!("unsubscribing from {}", self.path);
        self.task.abort();
    }
}
