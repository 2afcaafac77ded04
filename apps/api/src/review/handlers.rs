//! Axum route handlers for the dashboard, upload and results pages.

use axum::{
    extract::{multipart::Field, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::platform::auth::Session;
use crate::platform::fs::UploadFile;
use crate::platform::kv::UserKv;
use crate::review::flow::{Capabilities, Submission, UploadFlow};
use crate::review::loader::{load_dashboard, load_record, load_results, DashboardView, ResultsView};
use crate::review::validation::{validate_upload, UploadRejection, MAX_FILE_SIZE, PDF_CONTENT_TYPE};
use crate::state::AppState;
use crate::util::format_size;
use crate::view::report::resume_url;

pub const FILE_FIELD: &str = "file";
pub const COMPANY_FIELD: &str = "company-name";
pub const JOB_TITLE_FIELD: &str = "job-title";
pub const JOB_DESCRIPTION_FIELD: &str = "job-description";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFormResponse {
    pub accepted_type: &'static str,
    pub max_file_size: u64,
    pub max_file_size_label: String,
    pub file_field: &'static str,
    pub text_fields: [&'static str; 3],
}

/// Detail section to open or close before the results view is returned.
#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub toggle: Option<String>,
}

/// GET /
pub async fn handle_dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<DashboardView>, AppError> {
    let kv = UserKv::new(state.platform.kv.as_ref(), &session.user_id);
    Ok(Json(load_dashboard(&kv).await?))
}

/// GET /upload
pub async fn handle_upload_form() -> Json<UploadFormResponse> {
    Json(UploadFormResponse {
        accepted_type: PDF_CONTENT_TYPE,
        max_file_size: MAX_FILE_SIZE,
        max_file_size_label: format_size(MAX_FILE_SIZE),
        file_field: FILE_FIELD,
        text_fields: [COMPANY_FIELD, JOB_TITLE_FIELD, JOB_DESCRIPTION_FIELD],
    })
}

/// POST /upload
///
/// Validates the multipart submission, then runs the upload flow to
/// completion and redirects to the new results page.
pub async fn handle_upload(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let submission = read_submission(multipart).await?;
    validate_upload(&submission.file)?;

    info!(
        user = %session.user_id,
        file = %submission.file.name,
        size = %format_size(submission.file.size()),
        "Starting resume analysis"
    );

    let kv = UserKv::new(state.platform.kv.as_ref(), &session.user_id);
    let caps = Capabilities {
        fs: state.platform.fs.as_ref(),
        pdf: state.pdf.as_ref(),
        kv: &kv,
        ai: state.platform.ai.as_ref(),
    };
    let record = UploadFlow::new(caps, &session.user_id, submission)
        .run()
        .await?;

    Ok(Redirect::to(&resume_url(&record.id)))
}

/// GET /resume/:id?toggle=
pub async fn handle_results(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<ResultsView>, AppError> {
    let kv = UserKv::new(state.platform.kv.as_ref(), &session.user_id);
    let mut view = load_results(&kv, state.platform.fs.as_ref(), &id).await?;
    if let (Some(report), Some(section)) = (view.report.as_mut(), query.toggle.as_deref()) {
        report.details.accordion.toggle(section);
    }
    debug!(resume_id = %id, loading = view.is_loading(), "Loaded results");
    Ok(Json(view))
}

/// GET /resume/:id/file
pub async fn handle_resume_file(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let record = owned_record(&state, &session, &id).await?;
    blob_response(&state, &record.resume_path, PDF_CONTENT_TYPE).await
}

/// GET /resume/:id/image
pub async fn handle_resume_image(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let record = owned_record(&state, &session, &id).await?;
    blob_response(&state, &record.image_path, "image/png").await
}

async fn owned_record(
    state: &AppState,
    session: &Session,
    id: &str,
) -> Result<ResumeRecord, AppError> {
    let kv = UserKv::new(state.platform.kv.as_ref(), &session.user_id);
    load_record(&kv, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

async fn blob_response(
    state: &AppState,
    path: &str,
    content_type: &'static str,
) -> Result<Response, AppError> {
    let bytes = state
        .platform
        .fs
        .read(path)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File {path} not found")))?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

async fn read_submission(mut multipart: Multipart) -> Result<Submission, AppError> {
    let mut file: Option<UploadFile> = None;
    let mut company_name = None;
    let mut job_title = None;
    let mut job_description = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD => {
                if file.is_some() {
                    return Err(UploadRejection::MultipleFiles.into());
                }
                let name = field.file_name().unwrap_or("resume.pdf").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some(UploadFile {
                    name,
                    content_type,
                    bytes,
                });
            }
            COMPANY_FIELD => company_name = text_field(field).await?,
            JOB_TITLE_FIELD => job_title = text_field(field).await?,
            JOB_DESCRIPTION_FIELD => job_description = text_field(field).await?,
            _ => {}
        }
    }

    Ok(Submission {
        file: file.ok_or(UploadRejection::Missing)?,
        company_name,
        job_title,
        job_description,
    })
}

async fn text_field(field: Field<'_>) -> Result<Option<String>, AppError> {
    let text = field.text().await.map_err(multipart_error)?;
    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::Validation(format!(
            "PDF files up to {} are accepted",
            format_size(MAX_FILE_SIZE)
        ));
    }
    AppError::Validation(format!("Invalid upload form: {}", e.body_text()))
}
