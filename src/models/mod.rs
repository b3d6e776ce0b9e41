//! Domain models for the hbnb shell.
//!
//! # Core Concepts
//!
//! - [`ModelKind`]: The closed set of record types. Each kind carries its own
//!   table of declared fields with their semantic [`FieldType`].
//! - [`Record`]: One live instance of a kind. Besides `id`, `created_at` and
//!   `updated_at`, a record holds an ordered, open set of attributes, so fields
//!   outside the declared table can be attached at any time.
//! - [`Value`]: The tagged value stored in an attribute slot.
//!
//! Records have two textual forms: the canonical display form
//! (`[State] (id) {...}`) printed by the shell, and the dictionary-of-fields
//! form (JSON object with a `__class__` tag) used for persistence.

mod kind;
mod record;
mod value;

pub use kind::*;
pub use record::*;
pub use value::*;
