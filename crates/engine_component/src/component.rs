//! Core [`Component`] trait, component identity, and the per-world registry.
//!
//! Every piece of data stored in the ECS must implement [`Component`]. The
//! trait requires [`bytemuck::Pod`] so that a component can be stored in, and
//! read back from, a type-erased byte column without any constructor or drop
//! glue, and [`Default`] so that freshly created rows can be initialised.
//!
//! ## Type Identity
//!
//! A [`ComponentId`] is a small integer handed out by a [`ComponentRegistry`]
//! the first time a type is registered. IDs are assigned in registration
//! order, starting at zero, and are never reused or reassigned for the
//! lifetime of the registry. Each world owns its own registry, so two worlds
//! may assign different IDs to the same Rust type.

use std::any::TypeId;
use std::collections::HashMap;

use bytemuck::Pod;
use serde::{Deserialize, Serialize};

use crate::archetype::Archetype;
use crate::error::EcsError;
use crate::pool::MAX_COMPONENT_ALIGN;

/// A unique identifier for a component type within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

impl ComponentId {
    /// The invalid component sentinel.
    pub const INVALID: ComponentId = ComponentId(u32::MAX);

    /// Returns the raw index of this ID.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` unless this is [`ComponentId::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Component({})", self.0)
    }
}

/// The core component trait.
///
/// Components are plain data: `Pod` guarantees that any byte pattern of the
/// right size is a valid value and that values can be copied bytewise, which
/// is exactly what the column storage does.
///
/// # Examples
///
/// ```rust
/// use bytemuck::{Pod, Zeroable};
/// use engine_component::Component;
///
/// #[derive(Debug, Clone, Copy, Pod, Zeroable)]
/// #[repr(C)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Default for Health {
///     fn default() -> Self {
///         Self { current: 100.0, max: 100.0 }
///     }
/// }
///
/// impl Component for Health {}
/// ```
pub trait Component: Pod + Default {
    /// A human-readable name for this component type, used in logs and
    /// error messages.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Metadata about a registered component type, used to size its columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
    /// The ID assigned at registration.
    pub id: ComponentId,
    /// The component's name (see [`Component::type_name`]).
    pub name: &'static str,
    /// Size of one component instance in bytes.
    pub size: usize,
    /// Alignment of one component instance in bytes.
    pub align: usize,
}

impl ComponentInfo {
    /// Build the metadata for `T` under the given ID.
    #[must_use]
    pub fn of<T: Component>(id: ComponentId) -> Self {
        Self {
            id,
            name: T::type_name(),
            size: std::mem::size_of::<T>(),
            align: std::mem::align_of::<T>(),
        }
    }
}

/// Assigns [`ComponentId`]s to component types and records their layout.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    ids: HashMap<TypeId, ComponentId>,
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    /// Create an empty registry. The first registered type receives ID 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T`, returning its ID. Registering an already known type
    /// returns the existing ID.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnsupportedAlignment`] if `T` needs a stricter
    /// alignment than a pool can provide.
    pub fn register<T: Component>(&mut self) -> Result<ComponentId, EcsError> {
        if let Some(&id) = self.ids.get(&TypeId::of::<T>()) {
            return Ok(id);
        }

        Self::check_layout::<T>()?;
        let id = ComponentId(self.infos.len() as u32);
        self.ids.insert(TypeId::of::<T>(), id);
        self.infos.push(ComponentInfo::of::<T>(id));
        Ok(id)
    }

    /// Check that a pool can store `T`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnsupportedAlignment`] if `T` needs a stricter
    /// alignment than [`MAX_COMPONENT_ALIGN`].
    pub fn check_layout<T: Component>() -> Result<(), EcsError> {
        let align = std::mem::align_of::<T>();
        if align > MAX_COMPONENT_ALIGN {
            return Err(EcsError::UnsupportedAlignment {
                type_name: T::type_name(),
                align,
                max: MAX_COMPONENT_ALIGN,
            });
        }
        Ok(())
    }

    /// Returns the ID of `T` if it has been registered.
    #[must_use]
    pub fn id_of<T: Component>(&self) -> Option<ComponentId> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    /// Returns the metadata for a registered ID.
    #[must_use]
    pub fn info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.infos.get(id.index())
    }

    /// Returns the byte size recorded for a registered ID.
    #[must_use]
    pub fn size_of(&self, id: ComponentId) -> Option<usize> {
        self.info(id).map(|info| info.size)
    }

    /// Returns the number of registered component types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Returns `true` if no component type has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Iterate over registered components in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.infos.iter()
    }

    /// Forget every registration. The next registered type receives ID 0.
    pub fn reset(&mut self) {
        self.ids.clear();
        self.infos.clear();
    }
}

/// A statically known set of component types, implemented for tuples of up
/// to eight [`Component`]s.
///
/// A set is used three ways: to build an archetype key (`register`), to
/// resolve a query key without side effects (`lookup`), and to write one
/// value per member into a freshly added row (`write_into`). Duplicate member
/// types are allowed; the key collapses them.
pub trait ComponentSet: 'static {
    /// Check every member's layout without registering anything.
    ///
    /// # Errors
    ///
    /// See [`ComponentRegistry::check_layout`].
    fn check_layout() -> Result<(), EcsError>;

    /// Register every member type, returning the IDs in declaration order.
    /// Nothing is registered unless every member passes
    /// [`check_layout`](Self::check_layout).
    ///
    /// # Errors
    ///
    /// Propagates registration failures from [`ComponentRegistry::register`].
    fn register(registry: &mut ComponentRegistry) -> Result<Vec<ComponentId>, EcsError>;

    /// Resolve member IDs without registering. Returns `None` if any member
    /// type is unknown to the registry.
    fn lookup(registry: &ComponentRegistry) -> Option<Vec<ComponentId>>;

    /// Write each member value into its column at `row`.
    ///
    /// # Errors
    ///
    /// Fails if a member is unregistered or the archetype lacks its column.
    fn write_into(
        self,
        archetype: &mut Archetype,
        registry: &ComponentRegistry,
        row: usize,
    ) -> Result<(), EcsError>;
}

macro_rules! impl_component_set {
    ($($name:ident),*) => {
        impl<$($name: Component),*> ComponentSet for ($($name,)*) {
            fn check_layout() -> Result<(), EcsError> {
                $(ComponentRegistry::check_layout::<$name>()?;)*
                Ok(())
            }

            #[allow(unused_variables)]
            fn register(registry: &mut ComponentRegistry) -> Result<Vec<ComponentId>, EcsError> {
                Self::check_layout()?;
                Ok(vec![$(registry.register::<$name>()?),*])
            }

            #[allow(unused_variables)]
            fn lookup(registry: &ComponentRegistry) -> Option<Vec<ComponentId>> {
                Some(vec![$(registry.id_of::<$name>()?),*])
            }

            #[allow(non_snake_case, unused_variables)]
            fn write_into(
                self,
                archetype: &mut Archetype,
                registry: &ComponentRegistry,
                row: usize,
            ) -> Result<(), EcsError> {
                let ($($name,)*) = self;
                $(archetype.write(registry, row, $name)?;)*
                Ok(())
            }
        }
    };
}

impl_component_set!();
impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);
