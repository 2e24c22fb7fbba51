use std::collections::{BTreeMap, BTreeSet};

use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::*;

/// Store the chunks of one artifact, replacing any previous version of the
/// same `(document_id, criteria)` slot.
pub fn put_artifact(
    conn: &Connection,
    document_id: &str,
    criteria: &DocumentCriteria,
    chunks: &[String],
) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM document_artifact
         WHERE document_id = ?1 AND document_type = ?2 AND document_format = ?3
           AND pipeline = ?4 AND pipeline_version = ?5",
        params![
            document_id,
            criteria.document_type.as_str(),
            criteria.document_format.as_str(),
            criteria.pipeline.as_str(),
            criteria.pipeline_version,
        ],
    )?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO document_artifact
             (document_id, document_type, document_format, pipeline, pipeline_version,
              chunk_index, chunk_total, content)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for (index, chunk) in chunks.iter().enumerate() {
            stmt.execute(params![
                document_id,
                criteria.document_type.as_str(),
                criteria.document_format.as_str(),
                criteria.pipeline.as_str(),
                criteria.pipeline_version,
                index as i64,
                chunks.len() as i64,
                chunk,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Chunks of one artifact in order, or `None` if nothing is stored.
pub fn get_artifact(
    conn: &Connection,
    document_id: &str,
    criteria: &DocumentCriteria,
) -> Result<Option<Vec<String>>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT chunk_index, chunk_total, content FROM document_artifact
         WHERE document_id = ?1 AND document_type = ?2 AND document_format = ?3
           AND pipeline = ?4 AND pipeline_version = ?5
         ORDER BY chunk_index ASC",
    )?;
    let rows = stmt
        .query_map(
            params![
                document_id,
                criteria.document_type.as_str(),
                criteria.document_format.as_str(),
                criteria.pipeline.as_str(),
                criteria.pipeline_version,
            ],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;

    if rows.is_empty() {
        return Ok(None);
    }

    let expected = rows[0].1;
    let complete = rows.len() as i64 == expected
        && rows.iter().enumerate().all(|(i, (index, total, _))| *index == i as i64 && *total == expected);
    if !complete {
        return Err(DatabaseError::CorruptArtifact {
            document_id: document_id.to_string(),
            criteria: criteria.to_string(),
            reason: format!("expected {expected} chunks, found {}", rows.len()),
        });
    }

    Ok(Some(rows.into_iter().map(|(_, _, content)| content).collect()))
}

/// Reassembled content for each requested criteria that is present.
/// Absent artifacts are simply missing from the map.
pub fn get_artifacts(
    conn: &Connection,
    document_id: &str,
    criteria: &BTreeSet<DocumentCriteria>,
) -> Result<BTreeMap<DocumentCriteria, String>, DatabaseError> {
    let mut found = BTreeMap::new();
    for c in criteria {
        if let Some(chunks) = get_artifact(conn, document_id, c)? {
            found.insert(c.clone(), chunks.concat());
        }
    }
    Ok(found)
}
