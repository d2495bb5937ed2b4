// SPDX-License-Identifier: MIT OR Apache-2.0
//! Transformer registry.
//!
//! Maps runtime types to transformers for generation and element names to
//! transformers for consumption. Types without a transformer of their own
//! can be declared as deriving from another type and then resolve to the
//! nearest registered ancestor.

use crate::object::{type_of, ObjectRef, TypeKey};
use crate::transformer::{BindingTransformer, Transformer, TransformerConfig};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Registry of transformers, shared read-only by every run
#[derive(Default)]
pub struct TransformerRegistry {
    by_type: IndexMap<TypeKey, Arc<dyn Transformer>>,
    by_element: HashMap<String, Arc<dyn Transformer>>,
    parents: HashMap<TypeKey, TypeKey>,
}

impl TransformerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transformer.
    ///
    /// A later registration for the same type or element name replaces the
    /// earlier one.
    pub fn register(&mut self, transformer: impl Transformer + 'static) -> Arc<dyn Transformer> {
        self.register_arc(Arc::new(transformer))
    }

    /// Register a transformer built purely from configuration
    pub fn register_config(&mut self, config: TransformerConfig) -> Arc<dyn Transformer> {
        self.register(BindingTransformer::new(config))
    }

    /// Register an already shared transformer
    pub fn register_arc(&mut self, transformer: Arc<dyn Transformer>) -> Arc<dyn Transformer> {
        let config = transformer.config();
        tracing::debug!(
            target_type = %config.target,
            element = %config.element_name,
            "registering transformer"
        );
        if let Some(previous) = self.by_type.insert(config.target, Arc::clone(&transformer)) {
            tracing::debug!(target_type = %config.target, "transformer replaced");
            let stale = previous.config().element_name.as_str();
            if self
                .by_element
                .get(stale)
                .is_some_and(|current| Arc::ptr_eq(current, &previous))
            {
                self.by_element.remove(stale);
            }
        }
        self.by_element
            .insert(config.element_name.clone(), Arc::clone(&transformer));
        transformer
    }

    /// Declare `child` as deriving from `parent` for resolution purposes
    pub fn derive(&mut self, child: TypeKey, parent: TypeKey) {
        self.parents.insert(child, parent);
    }

    /// Transformer registered for exactly this type
    pub fn lookup(&self, target: TypeKey) -> Option<&Arc<dyn Transformer>> {
        self.by_type.get(&target)
    }

    /// Transformer for this type or its nearest registered ancestor
    pub fn resolve(&self, target: TypeKey) -> Option<&Arc<dyn Transformer>> {
        let mut current = target;
        let mut seen = HashSet::new();
        loop {
            if let Some(found) = self.by_type.get(&current) {
                return Some(found);
            }
            if !seen.insert(current) {
                tracing::warn!(%target, "type derivation cycle");
                return None;
            }
            current = *self.parents.get(&current)?;
        }
    }

    /// Transformer for a live object
    pub fn resolve_object(&self, object: &ObjectRef) -> Option<&Arc<dyn Transformer>> {
        self.resolve(type_of(object))
    }

    /// Transformer handling the given element name
    pub fn for_element(&self, name: &str) -> Option<&Arc<dyn Transformer>> {
        self.by_element.get(name)
    }

    /// Registered transformers, in registration order
    pub fn transformers(&self) -> impl Iterator<Item = &Arc<dyn Transformer>> {
        self.by_type.values()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    /// Whether nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Shape;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = TransformerRegistry::new();
        assert!(registry.is_empty());
        registry.register_config(TransformerConfig::of::<Shape>("shape"));
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup(TypeKey("Shape")).is_some());
        assert!(registry.for_element("shape").is_some());
        assert!(registry.for_element("other").is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = TransformerRegistry::new();
        registry.register_config(TransformerConfig::of::<Shape>("shape"));
        registry.register_config(TransformerConfig::of::<Shape>("box"));
        assert_eq!(registry.len(), 1);
        let found = registry.lookup(TypeKey("Shape")).unwrap();
        assert_eq!(found.config().element_name, "box");
        assert!(registry.for_element("shape").is_none());
    }

    #[test]
    fn test_resolve_walks_ancestors() {
        let mut registry = TransformerRegistry::new();
        registry.register_config(TransformerConfig::of::<Shape>("shape"));
        registry.derive(TypeKey("RoundShape"), TypeKey("Shape"));
        registry.derive(TypeKey("TinyRoundShape"), TypeKey("RoundShape"));

        assert!(registry.lookup(TypeKey("TinyRoundShape")).is_none());
        let found = registry.resolve(TypeKey("TinyRoundShape")).unwrap();
        assert_eq!(found.config().element_name, "shape");
        assert!(registry.resolve(TypeKey("Unrelated")).is_none());
    }

    #[test]
    fn test_resolve_survives_cycles() {
        let mut registry = TransformerRegistry::new();
        registry.derive(TypeKey("A"), TypeKey("B"));
        registry.derive(TypeKey("B"), TypeKey("A"));
        assert!(registry.resolve(TypeKey("A")).is_none());
    }
}
