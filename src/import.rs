//! Bulk candidate import from CSV.
//!
//! The first line is a header naming the columns in any order. `full_name`
//! and `email` are required; `phone`, `technology`, `stage` and
//! `recruiter_email` are optional. Fields may be wrapped in double quotes,
//! with `""` standing for a literal quote inside a quoted field. A quoted
//! field may contain line breaks; a skipped row reports the line its record
//! starts on.
//!
//! Rows are upserted by candidate email inside a single transaction. A row
//! that cannot be applied is skipped and reported; a bad header aborts the
//! import before anything is written.

use std::collections::HashMap;
use std::io::Read;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{info, warn};

use crate::db::{self, audit::NewAuditEntry};
use crate::error::{PortalError, PortalResult};
use crate::models::{CandidateStage, Role};

const KNOWN_COLUMNS: &[&str] = &[
    "full_name",
    "email",
    "phone",
    "technology",
    "stage",
    "recruiter_email",
];
const REQUIRED_COLUMNS: &[&str] = &["full_name", "email"];

/// A row that was not imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based line number in the input.
    pub line: usize,
    /// Why the row was skipped.
    pub reason: String,
}

/// Summary of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// New candidates created.
    pub inserted: u32,
    /// Existing candidates updated.
    pub updated: u32,
    /// Rows left out, in input order.
    pub skipped: Vec<SkippedRow>,
}

/// Splits one CSV line into fields.
fn split_record(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut chars = line.chars().peekable();
    let mut quoted = false;
    let mut at_field_start = true;

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => {
                    quoted = false;
                    match chars.peek() {
                        None | Some(',') => {}
                        Some(other) => {
                            return Err(format!("unexpected '{}' after closing quote", other));
                        }
                    }
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if at_field_start => {
                quoted = true;
                at_field_start = false;
            }
            ',' => {
                fields.push(std::mem::take(&mut field));
                at_field_start = true;
            }
            _ => {
                field.push(c);
                at_field_start = false;
            }
        }
    }
    if quoted {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(field);
    Ok(fields)
}

/// Returns whether `line` ends inside a quoted field, given whether it
/// started inside one. Quotes only open a field at its start.
fn ends_inside_quotes(line: &str, mut quoted: bool) -> bool {
    let mut chars = line.chars().peekable();
    let mut at_field_start = !quoted;
    while let Some(c) = chars.next() {
        if quoted {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    quoted = false;
                }
            }
            continue;
        }
        match c {
            '"' if at_field_start => quoted = true,
            ',' => {
                at_field_start = true;
                continue;
            }
            _ => {}
        }
        at_field_start = false;
    }
    quoted
}

/// Groups physical lines into records, keeping line breaks inside quoted
/// fields. Each record carries the 1-based line it starts on.
fn logical_records(content: &str) -> Vec<(usize, String)> {
    let mut records = Vec::new();
    let mut pending: Option<(usize, String)> = None;
    let mut quoted = false;

    for (index, line) in content.lines().enumerate() {
        match pending.as_mut() {
            Some((_, record)) => {
                record.push('\n');
                record.push_str(line);
            }
            None => pending = Some((index + 1, line.to_string())),
        }
        quoted = ends_inside_quotes(line, quoted);
        if !quoted {
            records.extend(pending.take());
        }
    }
    // An unterminated quote keeps the rest of the input as one record
    records.extend(pending);
    records
}

/// Maps column names to their positions.
fn parse_header(line: &str) -> PortalResult<HashMap<String, usize>> {
    let header_error = |message: String| PortalError::Import { line: 1, message };

    let names = split_record(line).map_err(header_error)?;
    let mut columns = HashMap::new();
    for (index, raw) in names.iter().enumerate() {
        let name = raw.trim().to_ascii_lowercase();
        if !KNOWN_COLUMNS.contains(&name.as_str()) {
            return Err(header_error(format!("unknown column '{}'", raw.trim())));
        }
        if columns.insert(name.clone(), index).is_some() {
            return Err(header_error(format!("duplicate column '{}'", name)));
        }
    }
    for required in REQUIRED_COLUMNS {
        if !columns.contains_key(*required) {
            return Err(header_error(format!("missing required column '{}'", required)));
        }
    }
    Ok(columns)
}

/// One data row with optional fields normalised to `None` when blank.
struct CandidateRow {
    full_name: String,
    email: String,
    phone: Option<String>,
    technology: Option<String>,
    stage: Option<CandidateStage>,
    recruiter_email: Option<String>,
}

fn parse_row(columns: &HashMap<String, usize>, fields: &[String]) -> Result<CandidateRow, String> {
    if fields.len() != columns.len() {
        return Err(format!(
            "expected {} fields, found {}",
            columns.len(),
            fields.len()
        ));
    }
    let get = |name: &str| {
        columns
            .get(name)
            .and_then(|&index| fields.get(index))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let full_name = get("full_name").ok_or("full_name is empty")?;
    let email = get("email")
        .map(|email| email.to_ascii_lowercase())
        .ok_or("email is empty")?;
    if !email.contains('@') {
        return Err(format!("'{}' is not an email address", email));
    }
    let stage = get("stage")
        .map(|raw| {
            raw.parse::<CandidateStage>()
                .map_err(|_| format!("unknown stage '{}'", raw))
        })
        .transpose()?;

    Ok(CandidateRow {
        full_name,
        email,
        phone: get("phone"),
        technology: get("technology"),
        stage,
        recruiter_email: get("recruiter_email").map(|e| e.to_ascii_lowercase()),
    })
}

async fn recruiter_id_for(
    tx: &mut Transaction<'_, Sqlite>,
    email: &str,
) -> PortalResult<Option<i64>> {
    let found: Option<(i64, String)> =
        sqlx::query_as("SELECT id, role FROM users WHERE email = ? AND active = 1")
            .bind(email)
            .fetch_optional(&mut **tx)
            .await?;
    Ok(found
        .filter(|(_, role)| role == Role::Recruiter.as_str())
        .map(|(id, _)| id))
}

/// Inserts or updates one candidate. Returns true for an insert.
async fn upsert(
    tx: &mut Transaction<'_, Sqlite>,
    row: &CandidateRow,
    recruiter_id: Option<i64>,
) -> PortalResult<bool> {
    let now = Utc::now();
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM candidates WHERE email = ?")
        .bind(&row.email)
        .fetch_optional(&mut **tx)
        .await?;

    match existing {
        Some(id) => {
            sqlx::query(
                "UPDATE candidates SET full_name = ?, phone = COALESCE(?, phone),
                 technology = COALESCE(?, technology), stage = COALESCE(?, stage),
                 recruiter_id = COALESCE(?, recruiter_id), updated_at = ?
                 WHERE id = ?",
            )
            .bind(&row.full_name)
            .bind(&row.phone)
            .bind(&row.technology)
            .bind(row.stage.map(|stage| stage.as_str()))
            .bind(recruiter_id)
            .bind(now)
            .bind(id)
            .execute(&mut **tx)
            .await?;
            Ok(false)
        }
        None => {
            sqlx::query(
                "INSERT INTO candidates (full_name, email, phone, technology, stage, recruiter_id, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&row.full_name)
            .bind(&row.email)
            .bind(&row.phone)
            .bind(&row.technology)
            .bind(row.stage.unwrap_or(CandidateStage::Onboarding).as_str())
            .bind(recruiter_id)
            .bind(now)
            .bind(now)
            .execute(&mut **tx)
            .await?;
            Ok(true)
        }
    }
}

/// Imports candidates from CSV.
///
/// Blank lines are ignored. A row whose stage is unknown, or whose
/// `recruiter_email` matches no active recruiter, is skipped.
///
/// # Errors
///
/// * [`PortalError::Import`] for an empty input or a bad header; nothing is written
/// * [`PortalError::Io`] if the reader fails
/// * [`PortalError::Database`] if a write fails; the transaction is rolled back
pub async fn import_candidates<R: Read>(
    pool: &SqlitePool,
    mut reader: R,
    actor_id: Option<i64>,
) -> PortalResult<ImportReport> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let mut lines = logical_records(content).into_iter();
    let header = lines
        .by_ref()
        .find(|(_, line)| !line.trim().is_empty())
        .ok_or(PortalError::Import {
            line: 1,
            message: "input is empty".to_string(),
        })?;
    let columns = parse_header(&header.1).map_err(|e| match e {
        PortalError::Import { message, .. } => PortalError::Import {
            line: header.0,
            message,
        },
        other => other,
    })?;

    let mut report = ImportReport::default();
    let mut tx = pool.begin().await?;

    for (line_number, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let row = match split_record(&line).and_then(|fields| parse_row(&columns, &fields)) {
            Ok(row) => row,
            Err(reason) => {
                report.skipped.push(SkippedRow { line: line_number, reason });
                continue;
            }
        };

        let recruiter_id = match &row.recruiter_email {
            None => None,
            Some(email) => match recruiter_id_for(&mut tx, email).await? {
                Some(id) => Some(id),
                None => {
                    report.skipped.push(SkippedRow {
                        line: line_number,
                        reason: format!("no active recruiter with email '{}'", email),
                    });
                    continue;
                }
            },
        };

        if upsert(&mut tx, &row, recruiter_id).await? {
            report.inserted += 1;
        } else {
            report.updated += 1;
        }
    }

    db::audit::record(
        &mut *tx,
        &NewAuditEntry {
            actor_id,
            action: "import",
            entity: "candidate",
            entity_id: None,
            details: json!({
                "inserted": report.inserted,
                "updated": report.updated,
                "skipped": report.skipped.len(),
            }),
        },
    )
    .await?;
    tx.commit().await?;

    if !report.skipped.is_empty() {
        warn!(skipped = report.skipped.len(), "Some import rows were skipped");
    }
    info!(
        inserted = report.inserted,
        updated = report.updated,
        "Candidate import complete"
    );
    Ok(report)
}
