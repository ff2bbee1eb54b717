//! Ordered registry of configured engine adapters

use super::traits::{EngineAdapter, EngineDescriptor};
use anyhow::{bail, Result};
use std::sync::Arc;

/// An adapter registered under its configured name
#[derive(Clone)]
pub struct RegisteredEngine {
    pub name: String,
    pub adapter: Arc<dyn EngineAdapter>,
}

impl RegisteredEngine {
    pub fn descriptor(&self) -> EngineDescriptor {
        EngineDescriptor {
            name: self.name.clone(),
            endpoint: self.adapter.endpoint().to_string(),
        }
    }
}

impl std::fmt::Debug for RegisteredEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredEngine")
            .field("name", &self.name)
            .field("endpoint", &self.adapter.endpoint())
            .finish()
    }
}

/// Engines in registration order
///
/// Order matters: merged results follow batch order, then engine order.
#[derive(Debug, Clone, Default)]
pub struct EngineRegistry {
    engines: Vec<RegisteredEngine>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under `name`; names must be unique
    pub fn register(&mut self, name: impl Into<String>, adapter: Arc<dyn EngineAdapter>) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            bail!("engine name must not be empty");
        }
        if self.contains(&name) {
            bail!("duplicate engine name: {name}");
        }
        self.engines.push(RegisteredEngine { name, adapter });
        Ok(())
    }

    /// Register an adapter under its own name
    pub fn register_adapter(&mut self, adapter: Arc<dyn EngineAdapter>) -> Result<()> {
        let name = adapter.name().to_string();
        self.register(name, adapter)
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredEngine> {
        self.engines.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn engines(&self) -> &[RegisteredEngine] {
        &self.engines
    }

    pub fn names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn descriptors(&self) -> Vec<EngineDescriptor> {
        self.engines.iter().map(RegisteredEngine::descriptor).collect()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
