//! CSV import
//!
//! Three stages:
//! 1. [`parse_csv`] maps each data row to a [`ProfileDraft`] through the
//!    header table in [`headers`] and the normalisation rules in [`rules`].
//! 2. [`prepare_rows`] validates the drafts and settles identifiers,
//!    allocating synthetic ones from the [`SyntheticIds`] passed in.
//! 3. [`import_csv`] upserts every prepared row concurrently and collects
//!    per-row failures into the [`ImportReport`].
//!
//! A CSV that cannot be parsed aborts the import before anything is written.
//! Any later failure is confined to its row.

pub mod headers;
pub mod rules;
pub mod synthetic;

use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord};
use futures::future::join_all;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::db::models::ProfileDraft;
use crate::db::profiles;
use crate::{Error, Result};

pub use headers::{ColumnMap, ProfileField};
pub use rules::{derive_attendee_count, standardize_gender};
pub use synthetic::{parse_anubandh_id, SyntheticIds, SYNTHETIC_ID_START};

/// A data row mapped to profile fields
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    /// 1-based data-row number, header excluded
    pub row: usize,
    pub draft: ProfileDraft,
}

/// A validated row with its settled identifier
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRow {
    pub row: usize,
    pub anubandh_id: i64,
    pub synthetic: bool,
    pub draft: ProfileDraft,
}

/// A row that was not imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub anubandh_id: Option<i64>,
    pub message: String,
}

/// Outcome of [`prepare_rows`]
#[derive(Debug)]
pub struct PreparedBatch {
    pub rows: Vec<PreparedRow>,
    pub errors: Vec<RowError>,
    /// Allocator state after the batch
    pub ids: SyntheticIds,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub total_rows: usize,
    pub imported: usize,
    pub errors: Vec<RowError>,
    /// Synthetic identifiers given to rows without a usable Anubandh ID
    pub assigned_synthetic: Vec<i64>,
    /// Where the next batch's synthetic identifiers would start
    pub next_synthetic_id: i64,
}

/// Parse CSV bytes into drafts
///
/// The first record is the header row. Unknown columns are ignored; rows of
/// uneven length are accepted.
pub fn parse_csv(data: &[u8]) -> Result<Vec<ParsedRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let header = reader.headers()?.clone();
    if header.iter().all(|h| h.trim().trim_start_matches('\u{feff}').is_empty()) {
        return Err(Error::InvalidInput("CSV has no header row".to_string()));
    }

    let columns = ColumnMap::resolve(&header);
    if !columns.has(ProfileField::Name) || !columns.has(ProfileField::Mobile) {
        warn!(
            headers = ?header.iter().collect::<Vec<_>>(),
            "CSV lacks a recognised name or mobile column; every row will fail validation"
        );
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(ParsedRow {
            row: index + 1,
            draft: draft_from_record(&columns, &record),
        });
    }

    debug!(rows = rows.len(), "Parsed CSV");
    Ok(rows)
}

/// Map one record through the column table
pub fn draft_from_record(columns: &ColumnMap, record: &StringRecord) -> ProfileDraft {
    let mut draft = ProfileDraft {
        anubandh_id: columns
            .value(record, ProfileField::AnubandhId)
            .and_then(parse_anubandh_id),
        name: columns
            .value(record, ProfileField::Name)
            .unwrap_or_default()
            .to_string(),
        mobile: columns
            .value(record, ProfileField::Mobile)
            .unwrap_or_default()
            .to_string(),
        gender: columns
            .value(record, ProfileField::Gender)
            .and_then(standardize_gender),
        attendee_count: columns
            .value(record, ProfileField::AttendeeSurvey)
            .map(derive_attendee_count)
            .unwrap_or(0),
        ..Default::default()
    };

    for field in columns.fields() {
        if let Some(slot) = headers::detail_slot(&mut draft.details, field) {
            *slot = columns.value(record, field).map(str::to_string);
        }
    }

    draft
}

/// Validate drafts and settle their identifiers
///
/// Invalid rows never consume a synthetic identifier. Synthetic identifiers
/// are allocated in row order and never collide with an explicit identifier
/// anywhere in the batch. When two rows carry the same explicit
/// identifier the later row is kept and the earlier one reported.
pub fn prepare_rows(rows: Vec<ParsedRow>, mut ids: SyntheticIds) -> PreparedBatch {
    let mut prepared: Vec<Option<PreparedRow>> = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();
    let mut seen: HashMap<i64, usize> = HashMap::new();
    ids = ids.reserving(rows.iter().filter_map(|r| r.draft.anubandh_id));

    for ParsedRow { row, draft } in rows {
        let draft = draft.normalized();
        if let Err(message) = draft.validate() {
            errors.push(RowError {
                row,
                anubandh_id: draft.anubandh_id,
                message,
            });
            continue;
        }

        let (anubandh_id, synthetic) = match draft.anubandh_id {
            Some(id) => (id, false),
            None => {
                let (id, rest) = ids.take();
                ids = rest;
                (id, true)
            }
        };

        if let Some(earlier) = seen.insert(anubandh_id, prepared.len()) {
            if let Some(replaced) = prepared[earlier].take() {
                errors.push(RowError {
                    row: replaced.row,
                    anubandh_id: Some(anubandh_id),
                    message: format!("Anubandh ID {} repeated in row {}", anubandh_id, row),
                });
            }
        }

        prepared.push(Some(PreparedRow {
            row,
            anubandh_id,
            synthetic,
            draft,
        }));
    }

    errors.sort_by_key(|e| e.row);
    PreparedBatch {
        rows: prepared.into_iter().flatten().collect(),
        errors,
        ids,
    }
}

/// Import a CSV file, upserting each valid row by Anubandh ID
///
/// `ids` seeds synthetic identifier allocation for this batch.
pub async fn import_csv(pool: &SqlitePool, data: &[u8], ids: SyntheticIds) -> Result<ImportReport> {
    let rows = parse_csv(data)?;
    let total_rows = rows.len();
    let PreparedBatch {
        rows: prepared,
        mut errors,
        ids,
    } = prepare_rows(rows, ids);

    let assigned_synthetic: Vec<i64> = prepared
        .iter()
        .filter(|r| r.synthetic)
        .map(|r| r.anubandh_id)
        .collect();

    let writes = prepared.iter().map(|row| async move {
        let result =
            profiles::upsert_profile(pool, row.anubandh_id, row.synthetic, &row.draft).await;
        (row, result)
    });

    let mut imported = 0;
    for (row, result) in join_all(writes).await {
        match result {
            Ok(()) => imported += 1,
            Err(e) => {
                warn!(
                    row = row.row,
                    anubandh_id = row.anubandh_id,
                    error = %e,
                    "Row import failed"
                );
                errors.push(RowError {
                    row: row.row,
                    anubandh_id: Some(row.anubandh_id),
                    message: e.to_string(),
                });
            }
        }
    }
    errors.sort_by_key(|e| e.row);

    info!(
        total_rows,
        imported,
        failed = errors.len(),
        synthetic = assigned_synthetic.len(),
        "CSV import finished"
    );

    Ok(ImportReport {
        total_rows,
        imported,
        errors,
        assigned_synthetic,
        next_synthetic_id: ids.peek(),
    })
}
