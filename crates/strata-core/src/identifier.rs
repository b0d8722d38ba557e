//! Opaque identifiers for entities, relationships and stored structures.
//!
//! Identifiers are random UUID v4 strings. They are compared as plain
//! strings; nothing in the model interprets their content.

use uuid::Uuid;

/// Allocates a fresh, unique identifier.
///
/// # Examples
///
/// ```
/// use strata_core::identifier::new_id;
///
/// let a = new_id();
/// let b = new_id();
/// assert_ne!(a, b);
/// assert_eq!(a.len(), 36);
/// ```
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
