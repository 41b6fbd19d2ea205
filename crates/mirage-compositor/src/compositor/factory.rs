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

use super::pass::CompositorPass;
use super::passes::ClearPass;
use super::CompositorError;
use mirage_core::math::LinearRgba;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A declarative description of one pass instance, typically loaded from
/// a compositor configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassDeclaration {
    /// The pass type name resolved through the factory chain.
    pub type_name: String,
    /// The instance name, used in logs.
    pub name: String,
    /// Free-form type-specific parameters.
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

impl PassDeclaration {
    /// A declaration with no parameters.
    pub fn new(type_name: &str, name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            name: name.to_string(),
            parameters: HashMap::new(),
        }
    }
}

/// Creates pass instances from declarations.
///
/// Applications register factories for their custom pass types; the
/// built-in [`BasePassFactory`] handles the generic ones.
pub trait PassFactory: Send + Sync {
    /// Creates a pass for `declaration`, or `None` if this factory does
    /// not recognize its type name.
    fn create_pass(&self, declaration: &PassDeclaration) -> Option<Box<dyn CompositorPass>>;
}

/// The fallback factory for built-in pass types.
///
/// Currently resolves `"Clear"` (parameters `r`, `g`, `b`, `a` as floats,
/// defaulting to opaque black). Resource-bearing passes (quad, compute,
/// shadow map) need handles only the application can supply, so they come
/// from application factories.
#[derive(Debug, Default)]
pub struct BasePassFactory;

impl PassFactory for BasePassFactory {
    fn create_pass(&self, declaration: &PassDeclaration) -> Option<Box<dyn CompositorPass>> {
        match declaration.type_name.as_str() {
            "Clear" => {
                let channel = |key: &str, default: f32| {
                    declaration
                        .parameters
                        .get(key)
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(default)
                };
                let color = LinearRgba::new(
                    channel("r", 0.0),
                    channel("g", 0.0),
                    channel("b", 0.0),
                    channel("a", 1.0),
                );
                Some(Box::new(ClearPass::new(&declaration.name, color)))
            }
            _ => None,
        }
    }
}

/// An ordered factory chain: custom factories are consulted first, the
/// base factory last.
#[derive(Default)]
pub struct PassFactoryChain {
    custom: Vec<Box<dyn PassFactory>>,
    base: BasePassFactory,
}

impl PassFactoryChain {
    /// An empty chain holding only the base factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a custom factory. Earlier registrations win on conflicts.
    pub fn push_factory(&mut self, factory: Box<dyn PassFactory>) {
        self.custom.push(factory);
    }

    /// Resolves a declaration into a pass instance.
    ///
    /// An unresolved type name is a fatal configuration error: it is
    /// logged at error level and returned as
    /// [`CompositorError::UnknownPassType`].
    pub fn resolve(
        &self,
        declaration: &PassDeclaration,
    ) -> Result<Box<dyn CompositorPass>, CompositorError> {
        for factory in &self.custom {
            if let Some(pass) = factory.create_pass(declaration) {
                return Ok(pass);
            }
        }
        if let Some(pass) = self.base.create_pass(declaration) {
            return Ok(pass);
        }
        log::error!(
            "Compositor: no pass factory recognizes pass type '{}' (instance '{}')",
            declaration.type_name,
            declaration.name
        );
        Err(CompositorError::UnknownPassType(
            declaration.type_name.clone(),
        ))
    }
}

impl std::fmt::Debug for PassFactoryChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassFactoryChain")
            .field("custom_factories", &self.custom.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_factory_resolves_clear() {
        let chain = PassFactoryChain::new();
        let mut declaration = PassDeclaration::new("Clear", "backdrop");
        declaration
            .parameters
            .insert("r".to_string(), "0.5".to_string());
        let pass = chain.resolve(&declaration).expect("Clear must resolve");
        assert_eq!(pass.name(), "backdrop");
    }

    #[test]
    fn unknown_type_is_a_configuration_error() {
        let chain = PassFactoryChain::new();
        let declaration = PassDeclaration::new("Bokeh", "dof");
        match chain.resolve(&declaration) {
            Err(CompositorError::UnknownPassType(name)) => assert_eq!(name, "Bokeh"),
            other => panic!("expected UnknownPassType, got {other:?}"),
        }
    }
}
