//! Backend-agnostic data-access intents.

use strum_macros::AsRefStr;

use crate::storage::types::{NewPatient, PatientId, SearchFilter};

/// An abstract data-access operation together with its parameters.
///
/// Every backend realizes each variant in its own dialect; callers never see
/// SQL.
#[derive(Debug, Clone, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Intent {
    /// All patients, ascending by last name.
    ListAll,
    /// Create one patient. Yields the stored row.
    InsertOne(NewPatient),
    /// Remove one patient. Missing ids are a no-op.
    DeleteById(PatientId),
    /// Patients matching a [`SearchFilter`], ascending by last name.
    FilteredSearch(SearchFilter),
}

impl Intent {
    /// Stable name used in logs.
    pub fn name(&self) -> &str {
        self.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_names() {
        assert_eq!(Intent::ListAll.name(), "list-all");
        assert_eq!(Intent::InsertOne(NewPatient::default()).name(), "insert-one");
        assert_eq!(Intent::DeleteById(7).name(), "delete-by-id");
        assert_eq!(
            Intent::FilteredSearch(SearchFilter::default()).name(),
            "filtered-search"
        );
    }
}
