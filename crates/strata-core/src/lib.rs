//! Strata Core Types and Routing
//!
//! This crate provides the foundational model for Strata ownership diagrams.
//! It includes:
//!
//! - **Identifiers**: Random opaque ids ([`identifier::new_id`])
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Shapes**: Entity outlines and bounding-box clipping ([`shape`] module)
//! - **Model**: Entities, relationships and diagram edits ([`model`] module)
//! - **Routing**: Parallel-aware connector geometry ([`routing`] module)

pub mod color;
pub mod geometry;
pub mod identifier;
pub mod model;
pub mod routing;
pub mod shape;
