use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use bloodlink::donation::store::{
    Document, DocumentId, DocumentStore, Filter, StoreError, ID_FIELD,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Mutex-guarded document store keeping each collection in insertion order.
#[derive(Default, Clone)]
pub(crate) struct InMemoryDocumentStore {
    collections: Arc<Mutex<BTreeMap<String, Vec<Document>>>>,
}

fn holds_id(document: &Document, id: &DocumentId) -> bool {
    document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .is_some_and(|raw| raw == id.to_string())
}

impl DocumentStore for InMemoryDocumentStore {
    fn insert(&self, collection: &str, mut document: Document) -> Result<DocumentId, StoreError> {
        let id = DocumentId::generate();
        document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        let mut guard = self.collections.lock().expect("store mutex poisoned");
        guard.entry(collection.to_string()).or_default().push(document);
        Ok(id)
    }

    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        let guard = self.collections.lock().expect("store mutex poisoned");
        let mut matches: Vec<Document> = guard
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| filter.matches(document))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if let Some(limit) = limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }

    fn find_one(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<Document>, StoreError> {
        let guard = self.collections.lock().expect("store mutex poisoned");
        Ok(guard.get(collection).and_then(|documents| {
            documents
                .iter()
                .find(|document| holds_id(document, id))
                .cloned()
        }))
    }

    fn update_one(
        &self,
        collection: &str,
        id: &DocumentId,
        changes: Document,
    ) -> Result<u64, StoreError> {
        let mut guard = self.collections.lock().expect("store mutex poisoned");
        let Some(documents) = guard.get_mut(collection) else {
            return Ok(0);
        };
        match documents.iter_mut().find(|document| holds_id(document, id)) {
            Some(document) => {
                for (field, value) in changes {
                    document.insert(field, value);
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn delete_one(&self, collection: &str, id: &DocumentId) -> Result<u64, StoreError> {
        let mut guard = self.collections.lock().expect("store mutex poisoned");
        let Some(documents) = guard.get_mut(collection) else {
            return Ok(0);
        };
        match documents.iter().position(|document| holds_id(document, id)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn collection_names(&self) -> Result<Vec<String>, StoreError> {
        let guard = self.collections.lock().expect("store mutex poisoned");
        Ok(guard.keys().cloned().collect())
    }
}
