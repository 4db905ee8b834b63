use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use crate::error::StoreResult;

use super::{path::StorePath, tree, RealtimeStore, Subscription};

/// In-process store with push subscriptions.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    root: Arc<Mutex<Value>>,
    revision: Arc<watch::Sender<u64>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Value::Null)
    }
}

impl MemoryStore {
    pub fn new(root: Value) -> Self {
        let (revision, _) = watch::channel(0);
        let mut pruned = Value::Null;
        tree::set_at(&mut pruned, &StorePath::root(), root);

        Self {
            root: Arc::new(Mutex::new(pruned)),
            revision: Arc::new(revision),
        }
    }

    fn read(&self, path: &StorePath) -> Value {
        let root = self.root.lock().unwrap_or_else(|e| e.into_inner());
        tree::get_at(&root, path).cloned().unwrap_or(Value::Null)
    }

    pub fn snapshot(&self) -> Value {
        self.read(&StorePath::root())
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn get(&self, path: &StorePath) -> StoreResult<Value> {
        Ok(self.read(path))
    }

    async fn set(&self, path: &StorePath, value: Value) -> StoreResult<()> {
        {
            let mut root = self.root.lock().unwrap_or_else(|e| e.into_inner());
            tree::set_at(&mut root, path, value);
        }
        self.revision.send_modify(|rev| *rev += 1);
        Ok(())
    }

    async fn keys(&self, path: &StorePath) -> StoreResult<Vec<String>> {
        let mut keys = match self.read(path) {
            Value::Object(map) => map.keys().cloned().collect::<Vec<_>>(),
            _ => vec![],
        };
        keys.sort();
        Ok(keys)
    }

    async fn subscribe(&self, path: &StorePath) -> StoreResult<Subscription> {
        let store = self.clone();
        let mut revisions = self.revision.subscribe();
        let watched = path.clone();

        Ok(Subscription::spawn(path.clone(), move |feed| async move {
            let mut last = store.read(&watched);
            if feed.send(Ok(last.clone())).is_err() {
                return;
            }

            while revisions.changed().await.is_ok() {
                let current = store.read(&watched);
                if current != last {
                    if feed.send(Ok(current.clone())).is_err() {
                        return;
                    }
                    last = current;
                }
            }
        }))
    }
}
