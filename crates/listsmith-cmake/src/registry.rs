//! Catalog of known command types.
//!
//! A registry is assembled once through [`RegistryBuilder`] and is
//! read-only afterwards. Types are keyed by name and indexed by keyword.

use crate::catalog;
use crate::codec::is_identifier;
use crate::command_type::CommandType;
use crate::error::RegistryError;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    types: IndexMap<SmolStr, Arc<CommandType>>,
    by_keyword: FxHashMap<SmolStr, Vec<usize>>,
}

impl CommandRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Start a new builder holding every type of this registry.
    pub fn extend(&self) -> RegistryBuilder {
        RegistryBuilder {
            registry: self.clone(),
        }
    }

    /// The shared registry with the Arduino CMake catalog.
    pub fn standard() -> &'static CommandRegistry {
        static STANDARD: OnceLock<CommandRegistry> = OnceLock::new();
        STANDARD.get_or_init(catalog::standard_registry)
    }

    /// Look up a type by name.
    pub fn get(&self, name: &str) -> Option<&Arc<CommandType>> {
        self.types.get(name)
    }

    /// All types sharing `keyword` (case-insensitive), in registration order.
    pub fn by_keyword<'a>(
        &'a self,
        keyword: &str,
    ) -> impl Iterator<Item = &'a Arc<CommandType>> + 'a {
        let indices = self
            .by_keyword
            .get(keyword.to_ascii_lowercase().as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        indices.iter().filter_map(move |&i| self.types.get_index(i).map(|(_, ty)| ty))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CommandType>> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Find the type a parsed invocation belongs to.
    ///
    /// Among the types registered for `keyword`, picks the one whose fixed
    /// arguments match the longest prefix of `args` by raw text; earlier
    /// registrations win ties. Returns the type and the number of leading
    /// arguments its fixed arguments account for.
    pub fn resolve<S: AsRef<str>>(
        &self,
        keyword: &str,
        args: &[S],
    ) -> Option<(Arc<CommandType>, usize)> {
        let mut best: Option<&Arc<CommandType>> = None;

        for ty in self.by_keyword(keyword) {
            if !ty.matches_prefix(args) {
                continue;
            }
            if best.map_or(true, |b| ty.fixed_args().len() > b.fixed_args().len()) {
                best = Some(ty);
            }
        }

        best.map(|ty| (Arc::clone(ty), ty.fixed_args().len()))
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: CommandRegistry,
}

impl RegistryBuilder {
    /// Add a command type, returning the shared handle nodes should hold.
    pub fn register(&mut self, ty: CommandType) -> Result<Arc<CommandType>, RegistryError> {
        if !is_identifier(ty.command()) {
            return Err(RegistryError::InvalidKeyword(ty.command().to_string()));
        }
        if self.registry.types.contains_key(ty.name()) {
            return Err(RegistryError::DuplicateName(ty.name().to_string()));
        }
        Ok(self.insert(ty))
    }

    /// Chaining form of [`register`](Self::register).
    pub fn with(mut self, ty: CommandType) -> Result<Self, RegistryError> {
        self.register(ty)?;
        Ok(self)
    }

    pub(crate) fn insert(&mut self, ty: CommandType) -> Arc<CommandType> {
        debug_assert!(is_identifier(ty.command()), "bad keyword {}", ty.command());
        let name = SmolStr::new(ty.name());
        let keyword = SmolStr::new(ty.command());
        let ty = Arc::new(ty);

        let (index, previous) = self.registry.types.insert_full(name, Arc::clone(&ty));
        debug_assert!(previous.is_none(), "duplicate command type {}", ty.name());
        self.registry.by_keyword.entry(keyword).or_default().push(index);
        ty
    }

    pub fn build(self) -> CommandRegistry {
        self.registry
    }
}
