//! CSV export of every candidate.
//!
//! The body is produced page by page from the store while it is being sent,
//! so no export is ever materialized in full, on disk or in memory.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use futures_util::stream::{self, Stream, TryStreamExt};
use thiserror::Error;
use tracing::{error, info};

use hire_models::{fields, CandidateRecord};

use crate::auth::{AuthUser, Capability};
use crate::error::ApiResult;
use crate::state::AppState;
use crate::store::{CandidateStore, StoreError};

/// Column order of the export.
pub const REPORT_COLUMNS: [&str; 13] = [
    fields::FIRST_NAME,
    fields::LAST_NAME,
    fields::EMAIL,
    fields::UUID,
    fields::CAREER_LEVEL,
    fields::JOB_MAJOR,
    fields::YEARS_OF_EXPERIENCE,
    fields::DEGREE_TYPE,
    fields::SKILLS,
    fields::NATIONALITY,
    fields::CITY,
    fields::SALARY,
    fields::GENDER,
];

pub const REPORT_CONTENT_DISPOSITION: &str = "attachment; filename=\"candidates_report.csv\"";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("csv encoding error: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stream the candidate report as CSV.
pub async fn generate_report(State(state): State<AppState>, user: AuthUser) -> ApiResult<Response> {
    user.require(state.policy.as_ref(), Capability::ExportReport)?;
    info!(user_id = %user.0.user_id.as_str(), "Generating candidate report");

    let body = Body::from_stream(report_stream(
        Arc::clone(&state.candidates),
        state.config.report_page_size,
    ));

    Ok((
        [
            (CONTENT_TYPE, "text/csv"),
            (CONTENT_DISPOSITION, REPORT_CONTENT_DISPOSITION),
        ],
        body,
    )
        .into_response())
}

enum Cursor {
    Start,
    After(String),
    Done,
}

/// Header plus one chunk per store page.
pub fn report_stream(
    store: Arc<dyn CandidateStore>,
    page_size: u32,
) -> impl Stream<Item = Result<Bytes, ReportError>> + Send + 'static {
    stream::try_unfold(Cursor::Start, move |cursor| next_chunk(Arc::clone(&store), page_size, cursor))
        .inspect_err(|e| error!("Candidate report aborted: {}", e))
}

async fn next_chunk(
    store: Arc<dyn CandidateStore>,
    page_size: u32,
    cursor: Cursor,
) -> Result<Option<(Bytes, Cursor)>, ReportError> {
    let (after, with_header) = match cursor {
        Cursor::Done => return Ok(None),
        Cursor::Start => (None, true),
        Cursor::After(token) => (Some(token), false),
    };

    let page = store.list_page(page_size, after.as_deref()).await?;
    let chunk = encode_rows(&page.records, with_header)?;
    let next = page.next.map_or(Cursor::Done, Cursor::After);
    Ok(Some((Bytes::from(chunk), next)))
}

/// Encode records as CSV rows, optionally preceded by the header row.
pub fn encode_rows(records: &[CandidateRecord], with_header: bool) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if with_header {
        writer.write_record(REPORT_COLUMNS)?;
    }

    for record in records {
        let c = &record.candidate;
        let years = c.years_of_experience.to_string();
        let skills = c.skills.join(", ");
        let salary = format_decimal(c.salary);
        writer.write_record([
            c.first_name.as_str(),
            c.last_name.as_str(),
            c.email.as_str(),
            // The external UUID column is kept but left blank.
            "",
            c.career_level.as_str(),
            c.job_major.as_str(),
            years.as_str(),
            c.degree_type.as_str(),
            skills.as_str(),
            c.nationality.as_str(),
            c.city.as_str(),
            salary.as_str(),
            c.gender.as_str(),
        ])?;
    }

    writer.into_inner().map_err(|e| ReportError::Io(e.into_error()))
}

/// Whole numbers keep one decimal place, e.g. `50000.0`.
fn format_decimal(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
