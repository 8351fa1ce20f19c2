//! Bundles: statically typed groups of components.
//!
//! A [`Bundle`] is the codec between a Rust value and an entity's [`Values`]. Encoding splits the
//! bundle into one type-erased value per component; decoding clones each component back out and
//! reassembles the bundle. Bundles are what entities are spawned from, what gets attached to
//! existing entities, and what a [`Query`](crate::ecs::Query) yields per row.
//!
//! Bundles are provided for:
//! - every [`Component`] (a bundle of one),
//! - tuples of up to 16 components,
//! - structs deriving `Bundle`, one component per field:
//!
//! ```rust,ignore
//! #[derive(Bundle)]
//! struct Body {
//!     position: Position,
//!     velocity: Velocity,
//! }
//! ```
//!
//! A bundle must not contain the same component type twice. Encoding such a bundle fails with
//! [`Error::DuplicateComponent`].

use std::{any::type_name, sync::Arc};

use crate::{
    all_arities,
    ecs::{
        component::{Component, Id, Registry, Values},
        error::Error,
    },
};

/// A statically typed group of components.
pub trait Bundle: Sized + Send + Sync + 'static {
    /// The component ids making up this bundle, in declaration order. Registers any component
    /// type not seen before.
    fn component_ids(registry: &Registry) -> Vec<Id>;

    /// Push every component of this bundle into the encoder.
    fn encode(self, encoder: &mut Encoder<'_>);

    /// Rebuild the bundle from an entity's values. Returns `None` if any component is missing.
    fn decode(decoder: &Decoder<'_>) -> Option<Self>;

    /// Encode this bundle into a fresh component map.
    fn into_values(self, registry: &Registry) -> Result<Values, Error> {
        let mut encoder = Encoder::new(registry, type_name::<Self>());
        self.encode(&mut encoder);
        encoder.finish()
    }

    /// Decode this bundle from a component map.
    fn from_values(registry: &Registry, values: &Values) -> Option<Self> {
        Self::decode(&Decoder::new(registry, values))
    }
}

/// Accumulates the components of a bundle being encoded.
pub struct Encoder<'r> {
    registry: &'r Registry,
    bundle: &'static str,
    values: Values,
    duplicate: Option<&'static str>,
}

impl<'r> Encoder<'r> {
    /// Start encoding the named bundle type.
    pub fn new(registry: &'r Registry, bundle: &'static str) -> Self {
        Self {
            registry,
            bundle,
            values: Values::new(),
            duplicate: None,
        }
    }

    /// Add one component. A second component of the same type marks the bundle invalid.
    pub fn push<C: Component>(&mut self, component: C) {
        let id = self.registry.register::<C>();
        if self.values.insert(id, Arc::new(component)).is_some() {
            self.duplicate.get_or_insert(type_name::<C>());
        }
    }

    /// Finish encoding, failing if the bundle repeated a component type.
    pub fn finish(self) -> Result<Values, Error> {
        match self.duplicate {
            Some(component) => Err(Error::DuplicateComponent {
                bundle: self.bundle,
                component,
            }),
            None => Ok(self.values),
        }
    }
}

/// Read access to an entity's values while decoding a bundle.
pub struct Decoder<'a> {
    registry: &'a Registry,
    values: &'a Values,
}

impl<'a> Decoder<'a> {
    /// Decode from the given values.
    #[inline]
    pub fn new(registry: &'a Registry, values: &'a Values) -> Self {
        Self { registry, values }
    }

    /// Clone the component of type `C` out of the values, if present.
    #[inline]
    pub fn get<C: Component>(&self) -> Option<C> {
        let id = self.registry.get::<C>()?;
        self.values.get_as::<C>(id).cloned()
    }
}

impl<C: Component> Bundle for C {
    fn component_ids(registry: &Registry) -> Vec<Id> {
        vec![registry.register::<C>()]
    }

    fn encode(self, encoder: &mut Encoder<'_>) {
        encoder.push(self);
    }

    fn decode(decoder: &Decoder<'_>) -> Option<Self> {
        decoder.get::<C>()
    }
}

macro_rules! tuple_bundle {
    ($($name:ident),*) => {
        impl<$($name: Component),*> Bundle for ($($name,)*) {
            fn component_ids(registry: &Registry) -> Vec<Id> {
                vec![$(registry.register::<$name>()),*]
            }

            #[allow(non_snake_case)]
            fn encode(self, encoder: &mut Encoder<'_>) {
                let ($($name,)*) = self;
                $(encoder.push::<$name>($name);)*
            }

            fn decode(decoder: &Decoder<'_>) -> Option<Self> {
                Some(($(decoder.get::<$name>()?,)*))
            }
        }
    };
}

all_arities!(tuple_bundle);

#[cfg(test)]
mod tests {
    use tickworks_macros::{Bundle, Component};

    use super::*;

    #[derive(Component, Clone, Debug, PartialEq)]
    struct Position {
        x: i32,
    }

    #[derive(Component, Clone, Debug, PartialEq)]
    struct Velocity {
        dx: i32,
    }

    #[derive(Bundle, Clone, Debug, PartialEq)]
    struct Body {
        position: Position,
        velocity: Velocity,
    }

    #[derive(Bundle, Clone, Debug, PartialEq)]
    struct Pair(Position, Velocity);

    #[derive(Bundle)]
    struct Twice {
        first: Position,
        second: Position,
    }

    #[test]
    fn single_component_bundle() {
        // Given
        let registry = Registry::new();

        // When
        let values = Position { x: 3 }.into_values(&registry).unwrap();

        // Then
        assert_eq!(values.len(), 1);
        assert_eq!(
            Position::from_values(&registry, &values),
            Some(Position { x: 3 })
        );
        assert_eq!(
            Position::component_ids(&registry),
            vec![registry.get::<Position>().unwrap()]
        );
    }

    #[test]
    fn derived_struct_bundle() {
        // Given
        let registry = Registry::new();
        let body = Body {
            position: Position { x: 1 },
            velocity: Velocity { dx: 2 },
        };

        // When
        let values = body.clone().into_values(&registry).unwrap();

        // Then
        assert_eq!(values.len(), 2);
        assert_eq!(Body::from_values(&registry, &values), Some(body));
        assert_eq!(
            Body::component_ids(&registry),
            vec![
                registry.get::<Position>().unwrap(),
                registry.get::<Velocity>().unwrap()
            ]
        );
    }

    #[test]
    fn derived_tuple_struct_bundle() {
        // Given
        let registry = Registry::new();

        // When
        let values = Pair(Position { x: 5 }, Velocity { dx: 6 })
            .into_values(&registry)
            .unwrap();

        // Then
        assert_eq!(
            Pair::from_values(&registry, &values),
            Some(Pair(Position { x: 5 }, Velocity { dx: 6 }))
        );
    }

    #[test]
    fn tuple_bundle_decodes_subset() {
        // Given
        let registry = Registry::new();
        let values = (Position { x: 1 }, Velocity { dx: 2 })
            .into_values(&registry)
            .unwrap();

        // Then - Decoding only needs the components the bundle asks for
        assert_eq!(
            <(Velocity,)>::from_values(&registry, &values),
            Some((Velocity { dx: 2 },))
        );
        assert_eq!(
            Velocity::from_values(&registry, &values),
            Some(Velocity { dx: 2 })
        );
    }

    #[test]
    fn decode_missing_component_is_none() {
        // Given
        let registry = Registry::new();
        let values = Position { x: 1 }.into_values(&registry).unwrap();

        // Then
        assert!(Body::from_values(&registry, &values).is_none());
    }

    #[test]
    fn duplicate_component_is_rejected() {
        // Given
        let registry = Registry::new();

        // When
        let result = Twice {
            first: Position { x: 1 },
            second: Position { x: 2 },
        }
        .into_values(&registry);

        // Then
        match result {
            Err(Error::DuplicateComponent { bundle, component }) => {
                assert!(bundle.ends_with("Twice"));
                assert!(component.ends_with("Position"));
            }
            other => panic!("expected a duplicate component error, got {other:?}"),
        }
    }
}
