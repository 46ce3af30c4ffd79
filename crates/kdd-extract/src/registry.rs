//! Maps [`KDDKind`] to its [`Extractor`], pre-loaded by [`create_default_registry`].

use std::collections::HashMap;

use kdd_core::KDDKind;

use crate::extractor::Extractor;
use crate::kinds::{
    adr::AdrExtractor, business_policy::BusinessPolicyExtractor, business_rule::BusinessRuleExtractor,
    command::CommandExtractor, cross_policy::CrossPolicyExtractor, entity::EntityExtractor, event::EventExtractor,
    objective::ObjectiveExtractor, prd::PrdExtractor, process::ProcessExtractor, query::QueryExtractor,
    requirement::RequirementExtractor, ui_component::UiComponentExtractor, ui_view::UiViewExtractor,
    use_case::UseCaseExtractor,
};

#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<KDDKind, Box<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extractor: Box<dyn Extractor>) {
        self.extractors.insert(extractor.kind(), extractor);
    }

    pub fn get(&self, kind: KDDKind) -> Option<&dyn Extractor> {
        self.extractors.get(&kind).map(|e| e.as_ref())
    }

    pub fn registered_kinds(&self) -> Vec<KDDKind> {
        self.extractors.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

/// Build a registry pre-loaded with all 15 extractors.
pub fn create_default_registry() -> ExtractorRegistry {
    let mut registry = ExtractorRegistry::new();
    registry.register(Box::new(EntityExtractor));
    registry.register(Box::new(EventExtractor));
    registry.register(Box::new(BusinessRuleExtractor));
    registry.register(Box::new(BusinessPolicyExtractor));
    registry.register(Box::new(CrossPolicyExtractor));
    registry.register(Box::new(CommandExtractor));
    registry.register(Box::new(QueryExtractor));
    registry.register(Box::new(ProcessExtractor));
    registry.register(Box::new(UseCaseExtractor));
    registry.register(Box::new(UiViewExtractor));
    registry.register(Box::new(UiComponentExtractor));
    registry.register(Box::new(RequirementExtractor));
    registry.register(Box::new(ObjectiveExtractor));
    registry.register(Box::new(PrdExtractor));
    registry.register(Box::new(AdrExtractor));
    registry
}
