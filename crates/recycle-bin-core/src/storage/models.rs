use crate::holding;
use rusqlite::Row;

/// A file currently held in the recycle bin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: i64,
    pub original_path: String,
    pub delete_timestamp: i64,
    pub scheduled_deletion: i64,
    pub file_type: String,
}

impl Record {
    /// Name the file sits under inside the holding area. Derived, never stored.
    pub fn held_name(&self) -> String {
        holding::held_name(self.delete_timestamp, &self.original_path)
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Record {
            id: row.get(0)?,
            original_path: row.get(1)?,
            delete_timestamp: row.get(2)?,
            scheduled_deletion: row.get(3)?,
            file_type: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        })
    }
}

/// A record that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub original_path: String,
    pub delete_timestamp: i64,
    pub scheduled_deletion: i64,
    pub file_type: String,
}

impl NewRecord {
    pub fn with_id(self, id: i64) -> Record {
        Record {
            id,
            original_path: self.original_path,
            delete_timestamp: self.delete_timestamp,
            scheduled_deletion: self.scheduled_deletion,
            file_type: self.file_type,
        }
    }
}
