use super::models::{NewRecord, Record};
use super::sqlite::TrackingStore;
use crate::error::{Error, Result};
use rusqlite::params;
use tracing::debug;

const SELECT_RECORD: &str =
    "SELECT id, original_path, delete_timestamp, scheduled_deletion, file_type FROM deleted_files";

impl TrackingStore {
    pub fn insert(&self, record: &NewRecord) -> Result<i64> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO deleted_files \
             (original_path, delete_timestamp, scheduled_deletion, file_type) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.original_path,
                record.delete_timestamp,
                record.scheduled_deletion,
                record.file_type,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        debug!("Inserted record {} for {}", id, record.original_path);
        Ok(id)
    }

    /// All records, in no particular order.
    pub fn list_all(&self) -> Result<Vec<Record>> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let records = {
            let mut stmt = tx.prepare(SELECT_RECORD)?;
            let rows = stmt.query_map([], Record::from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.commit()?;
        Ok(records)
    }

    pub fn get(&self, id: i64) -> Result<Record> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let record = match tx.query_row(
            &format!("{} WHERE id = ?1", SELECT_RECORD),
            params![id],
            Record::from_row,
        ) {
            Ok(record) => record,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(Error::NotFound(format!("no record with id {}", id)))
            }
            Err(e) => return Err(e.into()),
        };
        tx.commit()?;
        Ok(record)
    }

    /// Remove a record. Returns false when there was nothing to remove,
    /// which callers treat as success.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM deleted_files WHERE id = ?1", params![id])?;
        tx.commit()?;
        if removed == 0 {
            debug!("Record {} already absent", id);
        }
        Ok(removed > 0)
    }

    /// Records deleted at exactly `delete_timestamp`, whether or not their
    /// held file still exists.
    pub fn find_by_delete_timestamp(&self, delete_timestamp: i64) -> Result<Vec<Record>> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let records = {
            let mut stmt = tx.prepare(&format!(
                "{} WHERE delete_timestamp = ?1 ORDER BY id",
                SELECT_RECORD
            ))?;
            let rows = stmt.query_map(params![delete_timestamp], Record::from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.commit()?;
        Ok(records)
    }

    /// Records whose scheduled deletion is at or before `now`.
    pub fn find_expired(&self, now: i64) -> Result<Vec<Record>> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let records = {
            let mut stmt = tx.prepare(&format!(
                "{} WHERE scheduled_deletion <= ?1 ORDER BY scheduled_deletion, id",
                SELECT_RECORD
            ))?;
            let rows = stmt.query_map(params![now], Record::from_row)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.commit()?;
        Ok(records)
    }
}
