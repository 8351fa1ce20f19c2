//! System parameter types.
//!
//! | Parameter | Input | Argument |
//! |-----------|-------|----------|
//! | [`Query<B>`] | Entities carrying every component of bundle `B` | The decoded bundles, in ascending entity order |
//! | [`Res<A>`] | Asset `A` | The asset value current when the slot materialized |
//!
//! Both are cheap, shared handles: the schedule materializes an argument once and hands clones of
//! the same `Arc` to every run until the argument is invalidated.

use std::{any::type_name, fmt, ops::Deref, sync::Arc};

use crate::ecs::{
    asset::{self, Asset},
    component::{Bundle, Registry},
    storage::Row,
    system::{Argument, Input, QueryInput},
};

/// A type that can be passed to a system function.
pub trait Parameter: Sized + Send + Sync + 'static {
    /// Describe what this parameter reads.
    fn input(registry: &Registry) -> Input;

    /// Recover the parameter from the argument materialized for its input.
    ///
    /// # Panics
    ///
    /// If `argument` was not materialized for this parameter's input.
    fn extract(argument: &Argument) -> Self;
}

/// Every entity carrying the components of bundle `B`, decoded into `B`s.
///
/// Include [`Entity`](crate::ecs::Entity) in the bundle to learn which entity each item came from.
pub struct Query<B> {
    items: Arc<Vec<B>>,
}

impl<B> Query<B> {
    /// Iterate over the matched bundles.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, B> {
        self.items.iter()
    }
}

impl<B> Clone for Query<B> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<B> Deref for Query<B> {
    type Target = [B];

    #[inline]
    fn deref(&self) -> &[B] {
        &self.items
    }
}

impl<'a, B> IntoIterator for &'a Query<B> {
    type Item = &'a B;
    type IntoIter = std::slice::Iter<'a, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<B: fmt::Debug> fmt::Debug for Query<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}

/// Decode listed rows into the argument a [`Query<B>`] is extracted from.
fn decode_rows<B: Bundle>(registry: &Registry, rows: &[Row]) -> Argument {
    let items: Vec<B> = rows
        .iter()
        .filter_map(|row| B::from_values(registry, &row.values))
        .collect();
    Arc::new(items)
}

impl<B: Bundle> Parameter for Query<B> {
    fn input(registry: &Registry) -> Input {
        Input::Query(QueryInput {
            components: B::component_ids(registry),
            decode: decode_rows::<B>,
            bundle: type_name::<B>(),
        })
    }

    fn extract(argument: &Argument) -> Self {
        let items = Arc::clone(argument)
            .downcast::<Vec<B>>()
            .unwrap_or_else(|_| {
                panic!(
                    "Query argument is not a Vec<{}>. This indicates a bug in the schedule.",
                    type_name::<B>()
                )
            });
        Self { items }
    }
}

/// Shared read access to asset `A`.
pub struct Res<A> {
    value: Arc<A>,
}

impl<A> Res<A> {
    /// The shared asset value.
    #[inline]
    pub fn into_inner(self) -> Arc<A> {
        self.value
    }
}

impl<A> Clone for Res<A> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
        }
    }
}

impl<A> Deref for Res<A> {
    type Target = A;

    #[inline]
    fn deref(&self) -> &A {
        &self.value
    }
}

impl<A: fmt::Debug> fmt::Debug for Res<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Res").field(&self.value).finish()
    }
}

impl<A: Asset> Parameter for Res<A> {
    fn input(_registry: &Registry) -> Input {
        Input::Asset(asset::Key::of::<A>())
    }

    fn extract(argument: &Argument) -> Self {
        let value = Arc::clone(argument).downcast::<A>().unwrap_or_else(|_| {
            panic!(
                "Asset argument is not a {}. This indicates a bug in the schedule.",
                type_name::<A>()
            )
        });
        Self { value }
    }
}

#[cfg(test)]
mod tests {
    use tickworks_macros::{Asset, Component};

    use super::*;
    use crate::ecs::{component::Values, entity::Entity};

    #[derive(Component, Clone, Debug, PartialEq)]
    struct Position(i32);

    #[derive(Component, Clone, Debug, PartialEq)]
    struct Velocity(i32);

    #[derive(Asset, Debug, PartialEq)]
    struct Config {
        level: u32,
    }

    fn row(registry: &Registry, raw: u64, position: Option<i32>) -> Row {
        let mut values = Values::new();
        values.insert(registry.register::<Entity>(), Arc::new(Entity::from_raw(raw)));
        if let Some(x) = position {
            values.insert(registry.register::<Position>(), Arc::new(Position(x)));
        }
        Row {
            entity: Entity::from_raw(raw),
            values,
        }
    }

    #[test]
    fn query_input_lists_bundle_components() {
        // Given
        let registry = Registry::new();

        // When
        let input = Query::<(Position, Velocity)>::input(&registry);

        // Then
        let Input::Query(query) = input else {
            panic!("expected a query input");
        };
        assert_eq!(
            query.components,
            vec![
                registry.get::<Position>().unwrap(),
                registry.get::<Velocity>().unwrap()
            ]
        );
        assert!(query.bundle.contains("Position"));
    }

    #[test]
    fn query_decodes_rows() {
        // Given
        let registry = Registry::new();
        let Input::Query(input) = Query::<(Entity, Position)>::input(&registry) else {
            panic!("expected a query input");
        };
        let rows = vec![row(&registry, 1, Some(10)), row(&registry, 2, Some(20))];

        // When
        let argument = (input.decode)(&registry, &rows);
        let query = Query::<(Entity, Position)>::extract(&argument);

        // Then
        assert_eq!(query.len(), 2);
        assert_eq!(query[0], (Entity::from_raw(1), Position(10)));
        assert_eq!(
            query.iter().map(|(_, p)| p.0).collect::<Vec<_>>(),
            vec![10, 20]
        );
    }

    #[test]
    fn query_skips_undecodable_rows() {
        // Given
        let registry = Registry::new();
        let Input::Query(input) = Query::<Position>::input(&registry) else {
            panic!("expected a query input");
        };
        let rows = vec![row(&registry, 1, None), row(&registry, 2, Some(5))];

        // When
        let query = Query::<Position>::extract(&(input.decode)(&registry, &rows));

        // Then
        assert_eq!(&*query, &[Position(5)]);
    }

    #[test]
    fn res_extracts_shared_asset() {
        // Given
        let registry = Registry::new();
        let argument: Argument = Arc::new(Config { level: 3 });

        // When
        let res = Res::<Config>::extract(&argument);

        // Then
        assert_eq!(res.level, 3);
        assert!(matches!(
            Res::<Config>::input(&registry),
            Input::Asset(key) if key == asset::Key::of::<Config>()
        ));
    }

    #[test]
    #[should_panic(expected = "bug in the schedule")]
    fn extract_rejects_mismatched_argument() {
        // Given
        let argument: Argument = Arc::new(Config { level: 1 });

        // Then
        let _ = Query::<Position>::extract(&argument);
    }
}
