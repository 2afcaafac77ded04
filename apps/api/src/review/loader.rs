//! Read side: the results page and the dashboard.

use std::cmp::Reverse;

use serde::Serialize;
use tracing::debug;

use crate::models::resume::{record_key, ResumeRecord, RECORD_KEY_PATTERN};
use crate::platform::{BlobStore, KvStore, PlatformError};
use crate::view::report::{file_url, image_url, ReportView, ResumeCardView};

/// What the results page can show so far. `None` pieces are still loading.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsView {
    pub id: String,
    pub resume_url: Option<String>,
    pub image_url: Option<String>,
    pub report: Option<ReportView>,
}

impl ResultsView {
    fn loading(id: &str) -> Self {
        Self {
            id: id.to_string(),
            resume_url: None,
            image_url: None,
            report: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.resume_url.is_none() || self.image_url.is_none() || self.report.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub resumes: Vec<ResumeCardView>,
}

pub async fn load_record(
    kv: &dyn KvStore,
    id: &str,
) -> Result<Option<ResumeRecord>, PlatformError> {
    match kv.get(&record_key(id)).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Fills the results view in order: record, PDF, preview image, feedback.
/// Stops at the first piece that is not there yet.
pub async fn load_results(
    kv: &dyn KvStore,
    fs: &dyn BlobStore,
    id: &str,
) -> Result<ResultsView, PlatformError> {
    let mut view = ResultsView::loading(id);

    let Some(record) = load_record(kv, id).await? else {
        debug!(resume_id = %id, "No record yet");
        return Ok(view);
    };

    if fs.read(&record.resume_path).await?.is_none() {
        debug!(resume_id = %id, "Resume blob missing");
        return Ok(view);
    }
    view.resume_url = Some(file_url(id));

    if fs.read(&record.image_path).await?.is_none() {
        debug!(resume_id = %id, "Preview blob missing");
        return Ok(view);
    }
    view.image_url = Some(image_url(id));

    if !record.is_analyzed() {
        debug!(resume_id = %id, "Analysis pending");
    }
    view.report = record.feedback.map(ReportView::new);
    Ok(view)
}

/// Every record in `kv`, newest first. Records without a timestamp sort last.
/// A single unreadable value fails the whole listing.
pub async fn load_dashboard(kv: &dyn KvStore) -> Result<DashboardView, PlatformError> {
    let items = kv.list(RECORD_KEY_PATTERN, true).await?;

    let mut records = items
        .into_iter()
        .filter_map(|item| item.value)
        .map(|value| serde_json::from_str::<ResumeRecord>(&value))
        .collect::<Result<Vec<_>, _>>()?;
    records.sort_by_key(|r| Reverse(r.created_at));

    Ok(DashboardView {
        resumes: records.iter().map(ResumeCardView::new).collect(),
    })
}
