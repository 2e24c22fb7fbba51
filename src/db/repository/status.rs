use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::*;

/// Apply status updates in one transaction.
///
/// Flags are upserted (criteria and chunk count overwritten) and never
/// deleted, so a document cannot regress to incomplete for a stage.
pub fn apply_status_updates(
    conn: &Connection,
    updates: &[StatusUpdate],
) -> Result<usize, DatabaseError> {
    let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let tx = conn.unchecked_transaction()?;
    {
        let mut status_stmt = tx.prepare(
            "INSERT OR IGNORE INTO processing_status (document_id, created_at) VALUES (?1, ?2)",
        )?;
        let mut flag_stmt = tx.prepare(
            "INSERT INTO processing_flag
             (document_id, flag, document_type, document_format, pipeline, pipeline_version,
              chunk_count, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(document_id, flag) DO UPDATE SET
                document_type = excluded.document_type,
                document_format = excluded.document_format,
                pipeline = excluded.pipeline,
                pipeline_version = excluded.pipeline_version,
                chunk_count = excluded.chunk_count,
                updated_at = excluded.updated_at",
        )?;
        let mut collection_stmt = tx.prepare(
            "INSERT OR IGNORE INTO status_collection (document_id, collection) VALUES (?1, ?2)",
        )?;

        for update in updates {
            status_stmt.execute(params![update.document_id, now])?;
            flag_stmt.execute(params![
                update.document_id,
                update.flag.as_str(),
                update.criteria.document_type.as_str(),
                update.criteria.document_format.as_str(),
                update.criteria.pipeline.as_str(),
                update.criteria.pipeline_version,
                update.chunk_count,
                now,
            ])?;
            if let Some(collection) = &update.collection {
                collection_stmt.execute(params![update.document_id, collection])?;
            }
        }
    }
    tx.commit()?;
    Ok(updates.len())
}

pub fn get_status(
    conn: &Connection,
    document_id: &str,
) -> Result<Option<ProcessingStatus>, DatabaseError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM processing_status WHERE document_id = ?1)",
        params![document_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Ok(None);
    }

    let mut status = ProcessingStatus::new(document_id);

    let mut stmt = conn.prepare(
        "SELECT document_id, flag, document_type, document_format, pipeline, pipeline_version, chunk_count
         FROM processing_flag WHERE document_id = ?1",
    )?;
    let rows = stmt
        .query_map(params![document_id], flag_row)?
        .collect::<Result<Vec<_>, _>>()?;
    for row in rows {
        apply_flag_row(&mut status, row)?;
    }

    let mut stmt = conn.prepare(
        "SELECT collection FROM status_collection WHERE document_id = ?1",
    )?;
    let collections = stmt
        .query_map(params![document_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    for collection in collections {
        status.add_collection(collection);
    }

    Ok(Some(status))
}

/// Load every status in the ledger, ordered by document id.
pub fn load_statuses(conn: &Connection) -> Result<Vec<ProcessingStatus>, DatabaseError> {
    let mut statuses: BTreeMap<String, ProcessingStatus> = BTreeMap::new();

    let mut stmt = conn.prepare("SELECT document_id FROM processing_status")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    for id in ids {
        statuses.insert(id.clone(), ProcessingStatus::new(id));
    }

    let mut stmt = conn.prepare(
        "SELECT document_id, flag, document_type, document_format, pipeline, pipeline_version, chunk_count
         FROM processing_flag",
    )?;
    let rows = stmt
        .query_map([], flag_row)?
        .collect::<Result<Vec<_>, _>>()?;
    for row in rows {
        let status = statuses
            .entry(row.document_id.clone())
            .or_insert_with(|| ProcessingStatus::new(row.document_id.clone()));
        apply_flag_row(status, row)?;
    }

    let mut stmt = conn.prepare("SELECT document_id, collection FROM status_collection")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    for (document_id, collection) in rows {
        if let Some(status) = statuses.get_mut(&document_id) {
            status.add_collection(collection);
        }
    }

    Ok(statuses.into_values().collect())
}

struct FlagRow {
    document_id: String,
    flag: String,
    document_type: String,
    document_format: String,
    pipeline: String,
    pipeline_version: String,
    chunk_count: u32,
}

fn flag_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FlagRow> {
    Ok(FlagRow {
        document_id: row.get(0)?,
        flag: row.get(1)?,
        document_type: row.get(2)?,
        document_format: row.get(3)?,
        pipeline: row.get(4)?,
        pipeline_version: row.get(5)?,
        chunk_count: row.get(6)?,
    })
}

fn apply_flag_row(status: &mut ProcessingStatus, row: FlagRow) -> Result<(), DatabaseError> {
    let criteria = DocumentCriteria::new(
        DocumentType::from_str(&row.document_type)?,
        DocumentFormat::from_str(&row.document_format)?,
        PipelineKey::from_str(&row.pipeline)?,
        row.pipeline_version,
    );
    status.enable_flag(
        ProcessingStatusFlag::from_str(&row.flag)?,
        criteria,
        row.chunk_count,
    );
    Ok(())
}
