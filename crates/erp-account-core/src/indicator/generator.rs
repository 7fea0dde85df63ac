use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AccountError;
use crate::AccountResult;

/// A stored report request and its last result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorGenerator {
    pub id: u64,
    pub code: String,
    pub name: String,
    /// Request text handed to the query engine
    pub request: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<String>,
}

/// Lookup and execution of indicator generators.
pub trait IndicatorGeneratorService {
    fn find(&self, id: u64) -> AccountResult<IndicatorGenerator>;

    /// Execute the generator's request and store its result.
    fn run(&mut self, generator: &IndicatorGenerator) -> AccountResult<String>;
}

/// Query engine behind one generator code.
pub type IndicatorQuery = Box<dyn Fn(&IndicatorGenerator) -> AccountResult<String> + Send + Sync>;

/// In-memory generators, each code bound to a query callback.
#[derive(Default)]
pub struct IndicatorRegistry {
    generators: BTreeMap<u64, IndicatorGenerator>,
    queries: HashMap<String, IndicatorQuery>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, generator: IndicatorGenerator) {
        self.generators.insert(generator.id, generator);
    }

    pub fn register_query(&mut self, code: impl Into<String>, query: IndicatorQuery) {
        self.queries.insert(code.into(), query);
    }

    pub fn get(&self, id: u64) -> Option<&IndicatorGenerator> {
        self.generators.get(&id)
    }
}

impl IndicatorGeneratorService for IndicatorRegistry {
    fn find(&self, id: u64) -> AccountResult<IndicatorGenerator> {
        self.generators
            .get(&id)
            .cloned()
            .ok_or_else(|| AccountError::NotFound(format!("indicator generator {id}")))
    }

    fn run(&mut self, generator: &IndicatorGenerator) -> AccountResult<String> {
        let query = self.queries.get(&generator.code).ok_or_else(|| {
            AccountError::NotFound(format!("query for indicator code '{}'", generator.code))
        })?;
        let result = query(generator)?;
        debug!(id = generator.id, code = %generator.code, "indicator computed");

        if let Some(stored) = self.generators.get_mut(&generator.id) {
            stored.result = Some(result.clone());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(id: u64, code: &str) -> IndicatorGenerator {
        IndicatorGenerator {
            id,
            code: code.into(),
            name: format!("Indicator {id}"),
            request: "select count(*) from invoice".into(),
            result: None,
        }
    }

    #[test]
    fn test_run_stores_result() {
        let mut registry = IndicatorRegistry::new();
        registry.register(generator(1, "COUNT"));
        registry.register_query("COUNT", Box::new(|g| Ok(format!("{} -> 42", g.request))));

        let g = registry.find(1).unwrap();
        let result = registry.run(&g).unwrap();

        assert_eq!(result, "select count(*) from invoice -> 42");
        assert_eq!(registry.get(1).unwrap().result.as_deref(), Some(result.as_str()));
    }

    #[test]
    fn test_unknown_code_is_not_found() {
        let mut registry = IndicatorRegistry::new();
        registry.register(generator(1, "MISSING"));
        let g = registry.find(1).unwrap();
        assert!(matches!(registry.run(&g), Err(AccountError::NotFound(_))));
    }
}
