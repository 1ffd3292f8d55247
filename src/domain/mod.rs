//! Domain layer: storefront state containers and back-office aggregates.
pub mod aggregates;
pub mod events;
pub mod theme;
pub mod value_objects;
