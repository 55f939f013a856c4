//! Removal of uninformative properties from predicted records.

use std::collections::HashSet;

use propsight_common::PropertyRecord;

/// Drop every property named in `excluded`. Order and provenance of the
/// remaining entries are unchanged.
pub fn curate(record: &PropertyRecord, excluded: &HashSet<String>) -> PropertyRecord {
    PropertyRecord::from_entries(
        record.provenance(),
        record
            .iter()
            .filter(|(name, _)| !excluded.contains(*name))
            .map(|(name, value)| (name.to_string(), value.clone())),
    )
}

/// Applies a fixed exclusion set to predicted records.
#[derive(Debug, Clone, Default)]
pub struct ResultCurator {
    excluded: HashSet<String>,
}

impl ResultCurator {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { excluded: excluded.into_iter().map(Into::into).collect() }
    }

    pub fn curate(&self, record: &PropertyRecord) -> PropertyRecord {
        curate(record, &self.excluded)
    }
}
