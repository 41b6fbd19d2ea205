// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Backend selection by name.
//!
//! Concrete backends are factory functions keyed by a case-sensitive ASCII
//! name ("Null", "Wgpu", ...). Two registration modes exist:
//!
//! * **explicit** — the application calls [`BackendRegistry::register`]
//!   with the factories it compiled in;
//! * **link-time** — any linked crate submits a [`BackendRegistration`]
//!   through `inventory`, and [`BackendRegistry::with_linked_backends`]
//!   collects them. This is the plugin-style analogue of looking up a
//!   `create<Name>RhiInstance` symbol in a shared library.

use crate::rhi::error::RenderError;
use crate::rhi::traits::Rhi;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The power/performance preference used when picking an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PowerPreference {
    /// Prefer the lowest-power adapter (usually integrated).
    LowPower,
    /// Prefer the highest-performance adapter (usually discrete).
    #[default]
    HighPerformance,
}

/// Configuration handed to a backend factory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// The case-sensitive backend name to instantiate.
    pub backend_name: String,
    /// Adapter power preference.
    pub power_preference: PowerPreference,
    /// Whether the backend may run without a presentable surface.
    pub headless: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend_name: "Wgpu".to_string(),
            power_preference: PowerPreference::default(),
            headless: false,
        }
    }
}

impl BackendConfig {
    /// A configuration selecting the named backend with default options.
    pub fn named(name: &str) -> Self {
        Self {
            backend_name: name.to_string(),
            ..Self::default()
        }
    }
}

/// A factory producing a ready [`Rhi`] instance.
pub type BackendFactory = fn(&BackendConfig) -> Result<Arc<dyn Rhi>, RenderError>;

/// A link-time backend registration collected through `inventory`.
pub struct BackendRegistration {
    /// The case-sensitive backend name.
    pub name: &'static str,
    /// The factory function.
    pub factory: BackendFactory,
}

inventory::collect!(BackendRegistration);

/// A name-keyed registry of backend factories.
#[derive(Default)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl BackendRegistry {
    /// Creates an empty registry. Use [`register`](Self::register) to add
    /// compiled-in factories explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry seeded with every backend registration submitted
    /// by linked crates.
    pub fn with_linked_backends() -> Self {
        let mut registry = Self::new();
        for registration in inventory::iter::<BackendRegistration> {
            registry.register(registration.name, registration.factory);
        }
        registry
    }

    /// Registers a factory under a case-sensitive name. A later
    /// registration under the same name replaces the earlier one.
    pub fn register(&mut self, name: &str, factory: BackendFactory) {
        if self.factories.insert(name.to_string(), factory).is_some() {
            log::warn!("Backend '{name}' registered twice; keeping the later factory");
        }
    }

    /// The registered backend names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiates the backend named in `config`.
    ///
    /// An unknown name is a configuration error: logged at error level and
    /// surfaced as [`RenderError::UnknownBackend`].
    pub fn create(&self, config: &BackendConfig) -> Result<Arc<dyn Rhi>, RenderError> {
        match self.factories.get(&config.backend_name) {
            Some(factory) => {
                log::info!("Creating '{}' graphics backend", config.backend_name);
                factory(config)
            }
            None => {
                log::error!(
                    "No graphics backend registered under '{}' (available: {:?})",
                    config.backend_name,
                    self.factories.keys().collect::<Vec<_>>()
                );
                Err(RenderError::UnknownBackend {
                    name: config.backend_name.clone(),
                })
            }
        }
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("names", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_backend_is_an_error() {
        let registry = BackendRegistry::new();
        let err = registry
            .create(&BackendConfig::named("DoesNotExist"))
            .unwrap_err();
        match err {
            RenderError::UnknownBackend { name } => assert_eq!(name, "DoesNotExist"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn names_are_case_sensitive() {
        fn fail_factory(_: &BackendConfig) -> Result<Arc<dyn Rhi>, RenderError> {
            Err(RenderError::InitializationFailed("test".into()))
        }
        let mut registry = BackendRegistry::new();
        registry.register("Null", fail_factory);
        assert!(matches!(
            registry.create(&BackendConfig::named("null")),
            Err(RenderError::UnknownBackend { .. })
        ));
        // The correctly-cased name resolves (and reaches the factory).
        assert!(matches!(
            registry.create(&BackendConfig::named("Null")),
            Err(RenderError::InitializationFailed(_))
        ));
    }
}
