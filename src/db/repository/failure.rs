use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_failures(conn: &Connection, failures: &[EtlFailureData]) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO etl_failure
             (failure_id, document_id, document_type, document_format, pipeline, pipeline_version,
              message, cause, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for failure in failures {
            stmt.execute(params![
                failure.failure_id,
                failure.document_id,
                failure.stage.document_type.as_str(),
                failure.stage.document_format.as_str(),
                failure.stage.pipeline.as_str(),
                failure.stage.pipeline_version,
                failure.message,
                failure.cause,
                failure.occurred_at.to_rfc3339(),
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Failures for one document, oldest first.
pub fn failures_for_document(
    conn: &Connection,
    document_id: &str,
) -> Result<Vec<EtlFailureData>, DatabaseError> {
    query_failures(
        conn,
        "SELECT failure_id, document_id, document_type, document_format, pipeline, pipeline_version,
                message, cause, occurred_at
         FROM etl_failure WHERE document_id = ?1 ORDER BY occurred_at ASC",
        Some(document_id),
    )
}

pub fn list_failures(conn: &Connection) -> Result<Vec<EtlFailureData>, DatabaseError> {
    query_failures(
        conn,
        "SELECT failure_id, document_id, document_type, document_format, pipeline, pipeline_version,
                message, cause, occurred_at
         FROM etl_failure ORDER BY occurred_at ASC, document_id ASC",
        None,
    )
}

struct FailureRow {
    failure_id: String,
    document_id: String,
    document_type: String,
    document_format: String,
    pipeline: String,
    pipeline_version: String,
    message: String,
    cause: Option<String>,
    occurred_at: String,
}

fn query_failures(
    conn: &Connection,
    sql: &str,
    document_id: Option<&str>,
) -> Result<Vec<EtlFailureData>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<FailureRow> {
        Ok(FailureRow {
            failure_id: row.get(0)?,
            document_id: row.get(1)?,
            document_type: row.get(2)?,
            document_format: row.get(3)?,
            pipeline: row.get(4)?,
            pipeline_version: row.get(5)?,
            message: row.get(6)?,
            cause: row.get(7)?,
            occurred_at: row.get(8)?,
        })
    };
    let rows = match document_id {
        Some(id) => stmt.query_map(params![id], map_row)?.collect::<Result<Vec<_>, _>>()?,
        None => stmt.query_map([], map_row)?.collect::<Result<Vec<_>, _>>()?,
    };

    rows.into_iter().map(failure_from_row).collect()
}

fn failure_from_row(row: FailureRow) -> Result<EtlFailureData, DatabaseError> {
    let occurred_at = DateTime::parse_from_rfc3339(&row.occurred_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DatabaseError::InvalidEnum {
            field: "occurred_at".into(),
            value: row.occurred_at.clone(),
        })?;
    Ok(EtlFailureData {
        failure_id: row.failure_id,
        stage: DocumentCriteria::new(
            DocumentType::from_str(&row.document_type)?,
            DocumentFormat::from_str(&row.document_format)?,
            PipelineKey::from_str(&row.pipeline)?,
            row.pipeline_version,
        ),
        document_id: row.document_id,
        message: row.message,
        cause: row.cause,
        occurred_at,
    })
}
