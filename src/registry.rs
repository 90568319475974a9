use std::collections::HashMap;
use std::sync::Arc;

/// Correlates items with the opaque keys handed to the client.
///
/// Items are identified by allocation, so two equal values in separate
/// `Arc`s get separate keys. Entries are never evicted: the registry keeps
/// every item it has seen alive, which also guarantees that an address
/// cannot be reused by another item while its key is still registered.
#[derive(Debug)]
pub struct IdentityRegistry<T> {
    last_key: u64,
    keys: HashMap<usize, String>,
    items: HashMap<String, Arc<T>>,
}

impl<T> Default for IdentityRegistry<T> {
    fn default() -> Self {
        IdentityRegistry {
            last_key: 0,
            keys: HashMap::new(),
            items: HashMap::new(),
        }
    }
}

impl<T> IdentityRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn identity(item: &Arc<T>) -> usize {
        Arc::as_ptr(item) as *const () as usize
    }

    pub fn key_for(&mut self, item: &Arc<T>) -> String {
        let identity = Self::identity(item);

        if let Some(key) = self.keys.get(&identity) {
            return key.clone();
        }

        self.last_key += 1;
        let key = self.last_key.to_string();
        log::trace!("registered item under key '{}'", key);

        self.keys.insert(identity, key.clone());
        self.items.insert(key.clone(), Arc::clone(item));
        key
    }

    pub fn resolve(&self, key: &str) -> Option<Arc<T>> {
        self.items.get(key).cloned()
    }

    pub fn contains(&self, item: &Arc<T>) -> bool {
        self.keys.contains_key(&Self::identity(item))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
