// src/core/environment.rs

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::constants::DEFAULT_ENVIRONMENT;
use crate::errors::{EnvironmentError, ShellError};

/// How a caller selects an environment: by registered name or by position in
/// the registration list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvSelector {
    Name(String),
    Index(usize),
}

impl EnvSelector {
    /// A numeric token selects by index, anything else by name.
    pub fn parse(token: &str) -> Self {
        match token.parse::<usize>() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Name(token.to_string()),
        }
    }
}

type TypeMap = HashMap<TypeId, Box<dyn Any + Send>>;

/// The set of valid environment names, the current selection, and one
/// lazily-built context-object cache per environment.
///
/// Selection is validated before any state changes: an invalid name or index
/// leaves the current selection untouched. Cached objects are dropped only by
/// an explicit [`clear_cache`](Self::clear_cache), never behind the caller's
/// back.
pub struct EnvironmentCollection {
    names: Vec<String>,
    current: Option<usize>,
    caches: HashMap<String, TypeMap>,
}

impl EnvironmentCollection {
    /// Builds a collection over the given names. An empty list is rejected at
    /// construction; the run loop must always have something selectable.
    pub fn new<I, S>(names: I) -> Result<Self, ShellError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ShellError::Build(
                "an environment collection requires at least one name".to_string(),
            ));
        }
        let mut seen = HashMap::new();
        for (i, name) in names.iter().enumerate() {
            if seen.insert(name.clone(), i).is_some() {
                return Err(ShellError::Build(format!(
                    "duplicate environment name '{name}'"
                )));
            }
        }
        Ok(Self {
            names,
            current: None,
            caches: HashMap::new(),
        })
    }

    /// The degenerate one-environment case: a single fixed name, selected
    /// from the start.
    pub fn single(name: &str) -> Self {
        Self {
            names: vec![name.to_string()],
            current: Some(0),
            caches: HashMap::new(),
        }
    }

    /// A single-environment collection under the default name.
    pub fn default_single() -> Self {
        Self::single(DEFAULT_ENVIRONMENT)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The currently selected name, or `NoneSet` before the first selection.
    pub fn current_name(&self) -> Result<&str, EnvironmentError> {
        self.current
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
            .ok_or(EnvironmentError::NoneSet)
    }

    pub fn has_current(&self) -> bool {
        self.current.is_some()
    }

    /// Selects an environment. Validation happens before mutation: `Invalid`
    /// leaves the previous selection in place. Re-selecting the current
    /// environment reports `NotChanged`.
    pub fn set_current(&mut self, selector: &EnvSelector) -> Result<(), EnvironmentError> {
        let index = match selector {
            EnvSelector::Index(i) => {
                if *i >= self.names.len() {
                    return Err(EnvironmentError::Invalid(i.to_string()));
                }
                *i
            }
            EnvSelector::Name(name) => self
                .names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| EnvironmentError::Invalid(name.clone()))?,
        };
        if self.current == Some(index) {
            return Err(EnvironmentError::NotChanged);
        }
        log::debug!(
            "environment changed to '{}' (index {})",
            self.names[index],
            index
        );
        self.current = Some(index);
        Ok(())
    }

    fn current_cache(&mut self) -> Result<&mut TypeMap, EnvironmentError> {
        let name = self.current_name()?.to_string();
        Ok(self.caches.entry(name).or_default())
    }

    /// A previously cached context object of type `T` for the current
    /// environment, if any.
    pub fn cached<T: Any + Send>(&self) -> Option<&T> {
        let name = self.current_name().ok()?;
        self.caches
            .get(name)?
            .get(&TypeId::of::<T>())?
            .downcast_ref::<T>()
    }

    /// Stores one context object of type `T` for the current environment,
    /// replacing any previous instance of that type.
    pub fn cache_instance<T: Any + Send>(&mut self, value: T) -> Result<(), EnvironmentError> {
        self.current_cache()?
            .insert(TypeId::of::<T>(), Box::new(value));
        Ok(())
    }

    /// Returns the cached instance of `T`, invoking the factory only when no
    /// cached instance exists. While a cached instance lives, the factory is
    /// never called again.
    pub fn get_or_build<T, F>(&mut self, factory: F) -> Result<&T, ShellError>
    where
        T: Any + Send,
        F: FnOnce(&str) -> Result<T, ShellError>,
    {
        let name = self.current_name()?.to_string();
        let cache = self.caches.entry(name.clone()).or_default();
        if !cache.contains_key(&TypeId::of::<T>()) {
            let built = factory(&name)?;
            cache.insert(TypeId::of::<T>(), Box::new(built));
        }
        self.caches
            .get(&name)
            .and_then(|c| c.get(&TypeId::of::<T>()))
            .and_then(|b| b.downcast_ref::<T>())
            .ok_or_else(|| {
                ShellError::Execution(format!(
                    "context object for environment '{name}' vanished after construction"
                ))
            })
    }

    /// Drops every cached object for the *current* environment only.
    pub fn clear_cache(&mut self) -> Result<(), EnvironmentError> {
        let name = self.current_name()?.to_string();
        self.caches.remove(&name);
        Ok(())
    }
}

// MARK: --- UNIT TESTS ---
