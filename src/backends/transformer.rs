use std::collections::{BTreeMap, HashMap};

/// Post-processing step applied to flattened secret properties
pub trait PropertyTransformer: Send + Sync {
    fn transform_properties(&self, input: BTreeMap<String, String>) -> BTreeMap<String, String>;
}

impl<F> PropertyTransformer for F
where
    F: Fn(BTreeMap<String, String>) -> BTreeMap<String, String> + Send + Sync,
{
    fn transform_properties(&self, input: BTreeMap<String, String>) -> BTreeMap<String, String> {
        self(input)
    }
}

/// Renames properties, e.g. `username` to `spring.datasource.username`.
/// Keys without a mapping pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct PropertyNameTransformer {
    names: HashMap<String, String>,
}

impl PropertyNameTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `from` to `to`
    pub fn add_key_transformation(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.names.insert(from.into(), to.into());
        self
    }
}

impl PropertyTransformer for PropertyNameTransformer {
    fn transform_properties(&self, input: BTreeMap<String, String>) -> BTreeMap<String, String> {
        input
            .into_iter()
            .map(|(key, value)| match self.names.get(&key) {
                Some(renamed) => (renamed.clone(), value),
                None => (key, value),
            })
            .collect()
    }
}
