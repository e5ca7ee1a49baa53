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

//! # Container
//!
//! The process-wide registry tying everything together: components
//! (singletons and factories), classes for JSON rehydration, named
//! pipelines, configurations and compilers, with wildcard lookup, memoized
//! best-key caches and an optional parent fallback chain. Registration is
//! expected at boot; every mutation clears the wildcard caches.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::component::{
    OruClassFactory, OruComponent, OruComponentFactory, OruInstance,
};
use crate::dsl::compiler::{OruCompiler, OruDefaultCompiler, DEFAULT_COMPILER};
use crate::errors::{OruError, Result};
use crate::pipeline::{compiler_directive, expand_super, OruPipeline};
use crate::wildcard::compare_wildcards;

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|err| err.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|err| err.into_inner())
}

/// Container tuning knobs.
#[derive(Clone, Debug)]
pub struct OruContainerConfig {
    /// Maximum nesting of `$call` invocations before a run is aborted.
    pub max_pipeline_depth: usize,
    /// Pipeline run by [`OruContainer::start`] when registered.
    pub entry_pipeline: String,
}

impl Default for OruContainerConfig {
    fn default() -> Self {
        Self {
            max_pipeline_depth: 10,
            entry_pipeline: "main".to_string(),
        }
    }
}

impl OruContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_pipeline_depth(mut self, depth: usize) -> Self {
        self.max_pipeline_depth = depth;
        self
    }

    pub fn entry_pipeline(mut self, name: &str) -> Self {
        self.entry_pipeline = name.to_string();
        self
    }
}

/// How a factory entry yields instances.
#[derive(Clone)]
enum OruFactoryEntry {
    /// One identity-stable instance handed out on every `get`.
    Singleton(OruInstance),
    /// A constructor invoked per `get` with the caller's settings.
    Factory(OruComponentFactory),
}

/// One slot of the component factory.
#[derive(Clone)]
struct OruFactoryItem {
    is_singleton: bool,
    entry: OruFactoryEntry,
}

/// The component container and pipeline runtime.
pub struct OruContainer {
    config: OruContainerConfig,
    classes: RwLock<HashMap<String, OruClassFactory>>,
    factory: RwLock<IndexMap<String, OruFactoryItem>>,
    configurations: RwLock<IndexMap<String, Value>>,
    pipelines: RwLock<IndexMap<String, Arc<OruPipeline>>>,
    compilers: RwLock<HashMap<String, Arc<dyn OruCompiler>>>,
    cache_best_keys: RwLock<HashMap<String, Option<String>>>,
    cache_pipelines: RwLock<HashMap<String, Option<Arc<OruPipeline>>>>,
    child_pipelines: RwLock<IndexMap<String, IndexMap<String, Vec<String>>>>,
    parent: Option<Arc<OruContainer>>,
}

impl OruContainer {
    /// Creates an empty container with the `default` compiler registered.
    pub fn new() -> Self {
        Self::with_config(OruContainerConfig::default())
    }

    pub fn with_config(config: OruContainerConfig) -> Self {
        let container = Self {
            config,
            classes: RwLock::new(HashMap::new()),
            factory: RwLock::new(IndexMap::new()),
            configurations: RwLock::new(IndexMap::new()),
            pipelines: RwLock::new(IndexMap::new()),
            compilers: RwLock::new(HashMap::new()),
            cache_best_keys: RwLock::new(HashMap::new()),
            cache_pipelines: RwLock::new(HashMap::new()),
            child_pipelines: RwLock::new(IndexMap::new()),
            parent: None,
        };
        container.register_compiler(Arc::new(OruDefaultCompiler::new()));
        container
    }

    /// Creates a child container that falls back to `parent` on lookups.
    pub fn with_parent(parent: Arc<OruContainer>) -> Self {
        let mut container = Self::new();
        container.parent = Some(parent);
        container
    }

    pub fn config(&self) -> &OruContainerConfig {
        &self.config
    }

    pub fn parent(&self) -> Option<&Arc<OruContainer>> {
        self.parent.as_ref()
    }

    // ----- component factory ------------------------------------------------

    /// Registers a singleton component under `name`.
    pub fn register(&self, name: &str, component: Arc<dyn OruComponent>) {
        self.register_item(
            name,
            OruFactoryItem {
                is_singleton: true,
                entry: OruFactoryEntry::Singleton(OruInstance::Component(component)),
            },
        );
    }

    /// Registers a plain value under `name`. Values are always singletons.
    pub fn register_value(&self, name: &str, value: Value) {
        self.register_item(
            name,
            OruFactoryItem {
                is_singleton: true,
                entry: OruFactoryEntry::Singleton(OruInstance::Value(value)),
            },
        );
    }

    /// Registers a non-singleton constructor invoked on every `get` with the
    /// caller's settings and this container.
    pub fn register_factory(&self, name: &str, factory: OruComponentFactory) {
        self.register_item(
            name,
            OruFactoryItem {
                is_singleton: false,
                entry: OruFactoryEntry::Factory(factory),
            },
        );
    }

    fn register_item(&self, name: &str, item: OruFactoryItem) {
        write(&self.factory).insert(name.to_string(), item);
        write(&self.cache_best_keys).clear();
        log::debug!("registered '{name}' in the component factory");
    }

    /// Whether `name` is registered in this container (strict, no parent,
    /// no wildcard).
    pub fn has(&self, name: &str) -> bool {
        read(&self.factory).contains_key(name)
    }

    /// Strict lookup, then the parent chain, then wildcard resolution.
    pub fn get(&self, name: &str) -> Option<OruInstance> {
        self.get_with_settings(name, &Value::Null)
    }

    /// Like [`get`](Self::get); a non-null `settings` argument is merged into
    /// singletons via `apply_settings` and passed to factory constructors.
    pub fn get_with_settings(&self, name: &str, settings: &Value) -> Option<OruInstance> {
        let item = read(&self.factory).get(name).cloned();
        if let Some(item) = item {
            return Some(self.produce(&item, settings));
        }
        if let Some(parent) = &self.parent {
            if let Some(instance) = parent.get_with_settings(name, settings) {
                return Some(instance);
            }
        }
        let best = self.best_key(name)?;
        let item = read(&self.factory).get(&best).cloned()?;
        Some(self.produce(&item, settings))
    }

    fn produce(&self, item: &OruFactoryItem, settings: &Value) -> OruInstance {
        match &item.entry {
            OruFactoryEntry::Singleton(instance) => {
                if !settings.is_null() {
                    if let OruInstance::Component(component) = instance {
                        component.apply_settings(settings);
                    }
                }
                instance.clone()
            }
            OruFactoryEntry::Factory(factory) => OruInstance::Component(factory(settings, self)),
        }
    }

    /// First registered key (in insertion order) matching `name` as a glob,
    /// memoized until the next registration.
    fn best_key(&self, name: &str) -> Option<String> {
        if let Some(cached) = read(&self.cache_best_keys).get(name) {
            return cached.clone();
        }
        let found = read(&self.factory)
            .keys()
            .find(|key| compare_wildcards(key, name))
            .cloned();
        write(&self.cache_best_keys).insert(name.to_string(), found.clone());
        found
    }

    /// Installs a component: runs its `register` hook, picks a registry name
    /// (explicit argument, then `component.name()`, then `settings.tag`, then
    /// the class name) and registers it as a singleton. Returns the chosen
    /// name.
    pub fn install(
        &self,
        component: Arc<dyn OruComponent>,
        name: Option<&str>,
        only_if_not_exists: bool,
    ) -> String {
        component.register(self);
        let chosen = match name {
            Some(explicit) => explicit.to_string(),
            None => {
                let own = component.name();
                if !own.is_empty() {
                    own.to_string()
                } else if let Some(tag) = component
                    .settings()
                    .get("tag")
                    .and_then(Value::as_str)
                {
                    tag.to_string()
                } else {
                    component.class_name().to_string()
                }
            }
        };
        if only_if_not_exists && self.has(&chosen) {
            log::debug!("component '{chosen}' already present, keeping the existing one");
            return chosen;
        }
        self.register(&chosen, component);
        chosen
    }

    // ----- configurations ---------------------------------------------------

    /// Stores a configuration under `tag`. With `overwrite` false an
    /// existing configuration wins silently.
    pub fn register_configuration(&self, tag: &str, configuration: Value, overwrite: bool) {
        let mut configurations = write(&self.configurations);
        if !overwrite && configurations.contains_key(tag) {
            log::debug!("configuration '{tag}' already registered, keeping the existing one");
            return;
        }
        configurations.insert(tag.to_string(), configuration);
    }

    /// Strict then wildcard configuration lookup.
    pub fn get_configuration(&self, tag: &str) -> Option<Value> {
        let configurations = read(&self.configurations);
        if let Some(configuration) = configurations.get(tag) {
            return Some(configuration.clone());
        }
        configurations
            .iter()
            .find(|(key, _)| compare_wildcards(key, tag))
            .map(|(_, configuration)| configuration.clone())
    }

    // ----- classes and JSON rehydration -------------------------------------

    /// Indexes a constructor under a class name for `from_json`.
    pub fn add_class(&self, name: &str, factory: OruClassFactory) {
        write(&self.classes).insert(name.to_string(), factory);
    }

    /// Shallow JSON projection of a component plus its `className`.
    pub fn to_json(&self, component: &dyn OruComponent) -> Value {
        let mut fields = match component.to_json() {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        fields.insert(
            "className".to_string(),
            Value::String(component.class_name().to_string()),
        );
        Value::Object(fields)
    }

    /// Rehydrates a component from a projection produced by
    /// [`to_json`](Self::to_json): looks the class up, constructs it with
    /// `settings`, and hands the remaining fields (without `className`) to
    /// the instance.
    pub fn from_json(&self, value: &Value, settings: &Value) -> Result<Arc<dyn OruComponent>> {
        let Value::Object(source) = value else {
            return Err(OruError::validation("rehydration source must be an object"));
        };
        let class_name = source
            .get("className")
            .and_then(Value::as_str)
            .ok_or_else(|| OruError::validation("rehydration source is missing 'className'"))?;
        let factory = read(&self.classes)
            .get(class_name)
            .cloned()
            .ok_or_else(|| {
                OruError::validation(format!("class '{class_name}' is not registered"))
            })?;
        let instance = factory(settings);
        let mut fields = source.clone();
        fields.remove("className");
        instance.from_json(&Value::Object(fields));
        Ok(instance)
    }

    // ----- compilers --------------------------------------------------------

    /// Registers a pipeline compiler under its own name.
    pub fn register_compiler(&self, compiler: Arc<dyn OruCompiler>) {
        let name = compiler.name().to_string();
        write(&self.compilers).insert(name, compiler);
    }

    /// Strict compiler lookup.
    pub fn compiler(&self, name: &str) -> Result<Arc<dyn OruCompiler>> {
        read(&self.compilers)
            .get(name)
            .cloned()
            .ok_or_else(|| OruError::CompilerNotFound(name.to_string()))
    }

    fn compiler_or_default(&self, name: &str) -> Result<Arc<dyn OruCompiler>> {
        match self.compiler(name) {
            Ok(compiler) => Ok(compiler),
            Err(_) => {
                log::warn!("compiler '{name}' not found, falling back to '{DEFAULT_COMPILER}'");
                self.compiler(DEFAULT_COMPILER)
            }
        }
    }

    // ----- pipelines --------------------------------------------------------

    /// Builds a pipeline from source lines: expands `$super` against the
    /// previous version, honors a leading `// compiler=NAME` directive
    /// (unknown names fall back to `default`) and compiles the body.
    pub fn build_pipeline(
        &self,
        lines: &[String],
        prev_lines: Option<&[String]>,
    ) -> Result<OruPipeline> {
        let expanded = expand_super(lines, prev_lines);
        let (compiler, body) = match compiler_directive(&expanded) {
            Some(name) => (self.compiler_or_default(&name)?, expanded[1..].to_vec()),
            None => (self.compiler(DEFAULT_COMPILER)?, expanded.clone()),
        };
        let compiled = compiler.compile(&body)?;
        Ok(OruPipeline {
            tag: String::new(),
            lines: expanded,
            compiler: compiler.name().to_string(),
            compiled,
        })
    }

    /// Compiles and stores a pipeline from a multi-line source string.
    pub fn register_pipeline(&self, tag: &str, source: &str, overwrite: bool) -> Result<()> {
        self.register_pipeline_lines(
            tag,
            source.lines().map(str::to_string).collect(),
            overwrite,
        )
    }

    /// Compiles and stores a pipeline from source lines. On overwrite the
    /// existing pipeline's lines feed `$super` expansion; with `overwrite`
    /// false an existing pipeline wins silently.
    pub fn register_pipeline_lines(
        &self,
        tag: &str,
        lines: Vec<String>,
        overwrite: bool,
    ) -> Result<()> {
        let previous = read(&self.pipelines).get(tag).cloned();
        if previous.is_some() && !overwrite {
            log::debug!("pipeline '{tag}' already registered, keeping the existing one");
            return Ok(());
        }
        let prev_lines = previous.map(|pipeline| pipeline.lines.clone());
        let mut pipeline = self.build_pipeline(&lines, prev_lines.as_deref())?;
        pipeline.tag = tag.to_string();
        write(&self.pipelines).insert(tag.to_string(), Arc::new(pipeline));
        write(&self.cache_pipelines).clear();
        Ok(())
    }

    /// Stores raw pipeline lines for a named child container; binding is
    /// left to the collaborator that owns the child.
    pub fn register_pipeline_for_child(
        &self,
        child_name: &str,
        tag: &str,
        lines: Vec<String>,
        overwrite: bool,
    ) {
        let mut children = write(&self.child_pipelines);
        let bucket = children.entry(child_name.to_string()).or_default();
        if !overwrite && bucket.contains_key(tag) {
            log::debug!(
                "child pipeline '{tag}' for '{child_name}' already registered, keeping the existing one"
            );
            return;
        }
        bucket.insert(tag.to_string(), lines);
    }

    /// Pipelines deferred to a named child, in registration order.
    pub fn child_pipelines(&self, child_name: &str) -> Vec<(String, Vec<String>)> {
        read(&self.child_pipelines)
            .get(child_name)
            .map(|bucket| {
                bucket
                    .iter()
                    .map(|(tag, lines)| (tag.clone(), lines.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Strict then wildcard pipeline lookup, memoized until the next
    /// pipeline registration.
    pub fn get_pipeline(&self, tag: &str) -> Option<Arc<OruPipeline>> {
        if let Some(pipeline) = read(&self.pipelines).get(tag) {
            return Some(pipeline.clone());
        }
        if let Some(cached) = read(&self.cache_pipelines).get(tag) {
            return cached.clone();
        }
        let found = read(&self.pipelines)
            .iter()
            .find(|(key, _)| compare_wildcards(key, tag))
            .map(|(_, pipeline)| pipeline.clone());
        write(&self.cache_pipelines).insert(tag.to_string(), found.clone());
        found
    }

    /// Runs a registered pipeline with a null source object.
    pub fn run_pipeline(&self, tag: &str, input: Value) -> Result<Value> {
        let mut src_object = Value::Null;
        self.run_pipeline_with(tag, input, &mut src_object)
    }

    /// Runs a registered pipeline against a caller-supplied source object
    /// (the `this` root of path resolution).
    pub fn run_pipeline_with(
        &self,
        tag: &str,
        input: Value,
        src_object: &mut Value,
    ) -> Result<Value> {
        let pipeline = self
            .get_pipeline(tag)
            .ok_or_else(|| OruError::PipelineNotFound(tag.to_string()))?;
        self.run_pipeline_at_depth(&pipeline, input, src_object, 0)
    }

    /// Runs a pipeline at an explicit call depth. Nested `$call` dispatch
    /// re-enters here with `depth + 1`; past the configured limit the
    /// invocation is aborted.
    pub fn run_pipeline_at_depth(
        &self,
        pipeline: &OruPipeline,
        input: Value,
        src_object: &mut Value,
        depth: usize,
    ) -> Result<Value> {
        if depth > self.config.max_pipeline_depth {
            return Err(OruError::PipelineDepthExceeded(depth));
        }
        let compiler = self.compiler_or_default(&pipeline.compiler)?;
        compiler.execute(self, pipeline, input, src_object, depth)
    }

    /// Runs an ad-hoc line slice: the source is registered under a digest of
    /// itself on first use, so repeated runs reuse the compiled form.
    pub fn run_pipeline_lines(
        &self,
        lines: &[String],
        input: Value,
        src_object: &mut Value,
    ) -> Result<Value> {
        let tag = serde_json::to_string(lines)
            .map_err(|err| OruError::internal(err.to_string()))?;
        if read(&self.pipelines).get(&tag).is_none() {
            self.register_pipeline_lines(&tag, lines.to_vec(), true)?;
        }
        self.run_pipeline_with(&tag, input, src_object)
    }

    // ----- text loader and lifecycle ----------------------------------------

    /// Loads pipelines from a flat outline: `#` headings name sections
    /// (`default`/`pipelines`, case-insensitive, belong to this container;
    /// anything else defers to a named child), `##` headings open a pipeline
    /// body.
    pub fn load_pipelines_from_string(&self, text: &str) -> Result<()> {
        let mut own_section = true;
        let mut child_name = String::new();
        let mut pending: Option<(String, Vec<String>)> = None;
        for line in text.lines() {
            let trimmed = line.trim();
            if let Some(heading) = trimmed.strip_prefix("##") {
                self.flush_loaded(own_section, &child_name, pending.take())?;
                pending = Some((heading.trim().to_string(), Vec::new()));
            } else if let Some(heading) = trimmed.strip_prefix('#') {
                self.flush_loaded(own_section, &child_name, pending.take())?;
                let section = heading.trim();
                let lowered = section.to_lowercase();
                own_section = lowered == "default" || lowered == "pipelines";
                child_name = if own_section {
                    String::new()
                } else {
                    section.to_string()
                };
            } else if !trimmed.is_empty() {
                if let Some((_, body)) = pending.as_mut() {
                    body.push(line.to_string());
                }
            }
        }
        self.flush_loaded(own_section, &child_name, pending)
    }

    fn flush_loaded(
        &self,
        own_section: bool,
        child_name: &str,
        pending: Option<(String, Vec<String>)>,
    ) -> Result<()> {
        let Some((tag, lines)) = pending else {
            return Ok(());
        };
        if own_section {
            self.register_pipeline_lines(&tag, lines, true)
        } else {
            self.register_pipeline_for_child(child_name, &tag, lines, true);
            Ok(())
        }
    }

    /// Starts every singleton component in registration order, then runs the
    /// configured entry pipeline when one is registered.
    pub fn start(&self) -> Result<Option<Value>> {
        let entry = self.config.entry_pipeline.clone();
        self.start_with(&entry)
    }

    /// [`start`](Self::start) with an explicit entry pipeline name.
    pub fn start_with(&self, pipeline_name: &str) -> Result<Option<Value>> {
        let singletons: Vec<Arc<dyn OruComponent>> = read(&self.factory)
            .values()
            .filter(|item| item.is_singleton)
            .filter_map(|item| match &item.entry {
                OruFactoryEntry::Singleton(OruInstance::Component(component)) => {
                    Some(component.clone())
                }
                _ => None,
            })
            .collect();
        for component in singletons {
            component.start(self)?;
        }
        if self.get_pipeline(pipeline_name).is_some() {
            let input = Value::Object(Map::new());
            return Ok(Some(self.run_pipeline(pipeline_name, input)?));
        }
        Ok(None)
    }
}

impl Default for OruContainer {
    fn default() -> Self {
        Self::new()
    }
}
