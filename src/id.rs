//! Code for handling IDs
use anyhow::{Context, Result};
use std::collections::HashSet;

/// A trait alias for ID types
pub trait IDLike:
    Eq + std::hash::Hash + std::borrow::Borrow<str> + Clone + std::fmt::Display + From<String>
{
}
impl<T> IDLike for T where
    T: Eq + std::hash::Hash + std::borrow::Borrow<str> + Clone + std::fmt::Display + From<String>
{
}

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone,
            std::hash::Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            serde::Deserialize,
            Debug,
            serde::Serialize,
        )]
        /// An ID type (e.g. `ModelID`, `ScenarioID`, etc.)
        pub struct $name(pub std::rc::Rc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::rc::Rc::from(id))
            }

            /// The ID as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id_type! {ScenarioID}
define_id_type! {VariantID}
define_id_type! {ModelID}
define_id_type! {VariableID}
define_id_type! {ComponentID}

/// The variant assigned to observations from files without a `scenario_variant` column
pub const DEFAULT_VARIANT: &str = "default";

impl Default for VariantID {
    fn default() -> Self {
        VariantID::new(DEFAULT_VARIANT)
    }
}

/// A scenario together with one of its variants
pub type ScenarioKey = (ScenarioID, VariantID);

/// A data structure containing a set of IDs
pub trait IDCollection<ID: IDLike> {
    /// Get the ID from the collection by its string representation.
    ///
    /// # Arguments
    ///
    /// * `id` - The string representation of the ID
    ///
    /// # Returns
    ///
    /// A copy of the ID in `self`, or an error if not found.
    fn get_id_by_str(&self, id: &str) -> Result<ID>;
}

impl<ID: IDLike> IDCollection<ID> for HashSet<ID> {
    fn get_id_by_str(&self, id: &str) -> Result<ID> {
        let found = self
            .get(id)
            .with_context(|| format!("Unknown ID {id} found"))?;
        Ok(found.clone())
    }
}

/// Get the ID from `ids` which matches `id`, inserting it if it is not already present.
///
/// Sharing a single [`Rc`](std::rc::Rc) between rows keeps memory use down when the same IDs are
/// repeated on every line of a results file.
pub fn intern<ID: IDLike>(ids: &mut HashSet<ID>, id: &str) -> ID {
    if let Ok(found) = ids.get_id_by_str(id) {
        return found;
    }

    let new_id = ID::from(id.to_string());
    ids.insert(new_id.clone());
    new_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::rc::Rc;

    #[test]
    fn test_get_id_by_str() {
        let ids: HashSet<ModelID> = ["nexus".into(), "stem".into()].into_iter().collect();
        assert_eq!(ids.get_id_by_str("stem").unwrap(), "stem".into());
        assert_error!(ids.get_id_by_str("ses"), "Unknown ID ses found");
    }

    #[test]
    fn test_intern_reuses_existing() {
        let mut ids: HashSet<ModelID> = HashSet::new();
        let first = intern(&mut ids, "calliope");
        let second = intern(&mut ids, "calliope");
        assert!(Rc::ptr_eq(&first.0, &second.0));
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_default_variant() {
        assert_eq!(VariantID::default().as_str(), DEFAULT_VARIANT);
    }
}
