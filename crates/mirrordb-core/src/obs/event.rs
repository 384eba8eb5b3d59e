use crate::record::Record;

///
/// ChangeBatch
///
/// The explicit diff of one external mutation: every record created,
/// updated (with the names of its changed fields, computed ones included),
/// or deleted. Exactly one batch is flushed per external call, so
/// subscribers always observe a single consistent snapshot.
///

#[derive(Clone, Debug, Default)]
pub struct ChangeBatch {
    pub created: Vec<Record>,
    pub updated: Vec<(Record, Vec<String>)>,
    pub deleted: Vec<Record>,
}

impl ChangeBatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Changed-field names for one updated record, if it is in the batch.
    #[must_use]
    pub fn updated_fields(&self, record: Record) -> Option<&[String]> {
        self.updated
            .iter()
            .find(|(r, _)| *r == record)
            .map(|(_, fields)| fields.as_slice())
    }
}
