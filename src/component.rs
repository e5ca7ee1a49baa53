//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Oru.
//! The Oru project belongs to the Dunimd project team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//! http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::container::OruContainer;
use crate::errors::{OruError, Result};
use crate::path::OruResolved;

/// Contract that every component registered into a container must fulfill.
///
/// A component is the native counterpart of a pipeline step: pipelines reach
/// it through dotted references (`greeter.hello "world"`) and the container
/// manages its lifecycle. All methods take `&self`; implementations that
/// carry mutable state use interior mutability.
pub trait OruComponent: std::fmt::Debug + Send + Sync {
    /// Registry name of the component. May be empty, in which case
    /// installation falls back to `settings.tag` and then the class name.
    fn name(&self) -> &str;

    /// Class name used by JSON rehydration. Defaults to the registry name.
    fn class_name(&self) -> &str {
        self.name()
    }

    /// Whether the component exposes `method` for pipeline references.
    fn has_method(&self, _method: &str) -> bool {
        false
    }

    /// Invokes `method` with the ambient pipeline input and the resolved
    /// argument tokens. Arguments keep their resolved kind, so a callee can
    /// distinguish a quoted literal from a walked reference.
    fn invoke(
        &self,
        _container: &OruContainer,
        method: &str,
        _input: &Value,
        _args: &[OruResolved],
    ) -> Result<Value> {
        Err(OruError::MethodNotFound(format!(
            "{}.{}",
            self.name(),
            method
        )))
    }

    /// Reads a data member, for dotted walks that continue past the
    /// component (`model.settings.locale`).
    fn field(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Current settings object of the component.
    fn settings(&self) -> Value {
        Value::Null
    }

    /// Merges new settings into the component. Called by the registry on
    /// every singleton fetch that carries a non-null settings argument.
    fn apply_settings(&self, _settings: &Value) {}

    /// Lifecycle hook awaited by `OruContainer::start` in registration order.
    fn start(&self, _container: &OruContainer) -> Result<()> {
        Ok(())
    }

    /// Installation hook; runs before the component is named and registered.
    fn register(&self, _container: &OruContainer) {}

    /// Shallow JSON projection of the component's fields.
    fn to_json(&self) -> Value {
        Value::Object(Map::new())
    }

    /// Restores fields from a JSON projection (without its `className`).
    fn from_json(&self, _fields: &Value) {}
}

/// What a registry lookup yields: a live component or a plain value.
#[derive(Clone, Debug)]
pub enum OruInstance {
    Component(Arc<dyn OruComponent>),
    Value(Value),
}

impl OruInstance {
    pub fn as_component(&self) -> Option<&Arc<dyn OruComponent>> {
        match self {
            OruInstance::Component(component) => Some(component),
            OruInstance::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            OruInstance::Value(value) => Some(value),
            OruInstance::Component(_) => None,
        }
    }
}

/// Factory for non-singleton registrations, invoked on every `get` with the
/// caller's settings and the owning container.
pub type OruComponentFactory =
    Arc<dyn Fn(&Value, &OruContainer) -> Arc<dyn OruComponent> + Send + Sync>;

/// Constructor indexed by class name, used by `from_json` rehydration.
pub type OruClassFactory = Arc<dyn Fn(&Value) -> Arc<dyn OruComponent> + Send + Sync>;

/// Convenience helper to invoke a component method while normalizing errors.
pub fn invoke_component(
    component: &dyn OruComponent,
    container: &OruContainer,
    method: &str,
    input: &Value,
    args: &[OruResolved],
) -> Result<Value> {
    component
        .invoke(container, method, input, args)
        .map_err(|err| OruError::component(component.name(), err.to_string()))
}
