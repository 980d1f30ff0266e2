use crate::flow::import::ImportProfileState;
use crate::flow::path;
use crate::flow::settings::EngineSettings;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

/// A typed fact value as reported by the fact store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FactValue {
    Boolean(bool),
    Text(String),
    Number(f64),
    /// Ordered member ids of a collection.
    Collection(Vec<String>),
    /// Reference to one member of a collection.
    ItemRef(String),
}

impl FactValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            FactValue::Boolean(value) => *value,
            FactValue::Text(value) => !value.is_empty(),
            FactValue::Number(value) => *value != 0.0,
            FactValue::Collection(_) | FactValue::ItemRef(_) => true,
        }
    }
}

/// Result of a fact lookup. A value may be present while the fact is still
/// incomplete (a placeholder).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactResult {
    pub complete: bool,
    #[serde(default)]
    pub value: Option<FactValue>,
}

impl FactResult {
    pub fn incomplete() -> Self {
        Self::default()
    }

    pub fn complete(value: FactValue) -> Self {
        Self {
            complete: true,
            value: Some(value),
        }
    }

    pub fn placeholder(value: FactValue) -> Self {
        Self {
            complete: false,
            value: Some(value),
        }
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_truthy(&self) -> bool {
        self.value.as_ref().is_some_and(FactValue::is_truthy)
    }
}

/// Read access to the external fact graph. Paths are concrete.
pub trait FactStore {
    /// Unknown paths report an empty, incomplete result.
    fn get(&self, path: &str) -> FactResult;
}

impl<T: FactStore + ?Sized> FactStore for &T {
    fn get(&self, path: &str) -> FactResult {
        (**self).get(path)
    }
}

/// Map-backed fact store used by tests and the command-line tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryFactStore {
    facts: BTreeMap<String, FactResult>,
}

impl InMemoryFactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, result: FactResult) {
        self.facts.insert(path.into(), result);
    }

    pub fn remove(&mut self, path: &str) -> Option<FactResult> {
        self.facts.remove(path)
    }

    pub fn with_fact(mut self, path: impl Into<String>, result: FactResult) -> Self {
        self.insert(path, result);
        self
    }

    pub fn with_bool(self, path: impl Into<String>, value: bool) -> Self {
        self.with_fact(path, FactResult::complete(FactValue::Boolean(value)))
    }

    pub fn with_collection<I, S>(self, path: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = ids.into_iter().map(Into::into).collect();
        self.with_fact(path, FactResult::complete(FactValue::Collection(ids)))
    }

    pub fn with_item_ref(self, path: impl Into<String>, id: impl Into<String>) -> Self {
        self.with_fact(path, FactResult::complete(FactValue::ItemRef(id.into())))
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FactResult)> {
        self.facts.iter().map(|(path, result)| (path.as_str(), result))
    }
}

impl FactStore for InMemoryFactStore {
    fn get(&self, path: &str) -> FactResult {
        self.facts.get(path).cloned().unwrap_or_default()
    }
}

/// One logical view of the fact store, import state and engine settings for
/// the duration of a single top-level call. Every fact is read from the store
/// at most once.
pub struct Snapshot<'a> {
    store: &'a dyn FactStore,
    imports: &'a ImportProfileState,
    settings: &'a EngineSettings,
    reads: RefCell<HashMap<String, FactResult>>,
}

impl<'a> Snapshot<'a> {
    pub fn new(
        store: &'a dyn FactStore,
        imports: &'a ImportProfileState,
        settings: &'a EngineSettings,
    ) -> Self {
        Self {
            store,
            imports,
            settings,
            reads: RefCell::new(HashMap::new()),
        }
    }

    pub fn get(&self, path: &str) -> FactResult {
        if let Some(hit) = self.reads.borrow().get(path) {
            return hit.clone();
        }
        let result = self.store.get(path);
        self.reads
            .borrow_mut()
            .insert(path.to_string(), result.clone());
        result
    }

    /// Looks up `path` under the repetition context. `None` when an abstract
    /// path has no item to bind to.
    pub fn lookup(&self, fact_path: &str, item_id: Option<&str>) -> Option<FactResult> {
        path::resolve(fact_path, item_id).map(|concrete| self.get(&concrete))
    }

    /// Ordered member ids of a complete collection; empty otherwise.
    pub fn collection_items(&self, collection: &str) -> Vec<String> {
        match self.get(collection) {
            FactResult {
                complete: true,
                value: Some(FactValue::Collection(ids)),
            } => ids,
            _ => Vec::new(),
        }
    }

    /// Item referenced by a complete item-reference fact such as the primary filer.
    pub fn referenced_item(&self, fact_path: &str) -> Option<String> {
        match self.get(fact_path) {
            FactResult {
                complete: true,
                value: Some(FactValue::ItemRef(id)),
            } => Some(id),
            _ => None,
        }
    }

    pub fn imports(&self) -> &ImportProfileState {
        self.imports
    }

    pub fn settings(&self) -> &EngineSettings {
        self.settings
    }
}

impl std::fmt::Debug for Snapshot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("cached_reads", &self.reads.borrow().len())
            .field("settings", self.settings)
            .finish_non_exhaustive()
    }
}
