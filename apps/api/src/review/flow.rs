//! Upload → convert → store → analyze pipeline as an explicit state machine.
//!
//! Every working stage makes exactly one platform call and advances only on
//! success. Any failure parks the machine in `Stage::Failed`; nothing is
//! retried and nothing already written is rolled back.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::strip_json_fences;
use crate::models::resume::{record_key, Feedback, ResumeRecord};
use crate::pdf::PdfRasterizer;
use crate::platform::fs::{StoredFile, UploadFile};
use crate::platform::{AiService, BlobStore, KvStore};
use crate::review::prompts::prepare_instructions;
use crate::util::generate_id;

/// A validated upload form.
#[derive(Debug, Clone)]
pub struct Submission {
    pub file: UploadFile,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub job_description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStep {
    Upload,
    Conversion,
    ImageUpload,
    Save,
    Analysis,
    MalformedFeedback,
}

impl FailedStep {
    /// User-facing status line for this failure.
    pub fn message(self) -> &'static str {
        match self {
            FailedStep::Upload => "Error: Failed to Upload File",
            FailedStep::Conversion => "Error: Failed to Convert PDF To Image",
            FailedStep::ImageUpload => "Error: Failed to Upload Image",
            FailedStep::Save => "Error: Failed to Save Resume",
            FailedStep::Analysis => "Error: Failed to Analyze Resume",
            FailedStep::MalformedFeedback => "Error: Failed to Read Analysis",
        }
    }
}

/// Displays as the fixed status line; `detail` is for logs only.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", .step.message())]
pub struct FlowError {
    pub step: FailedStep,
    pub detail: String,
}

impl FlowError {
    fn new(step: FailedStep, detail: impl ToString) -> Self {
        Self {
            step,
            detail: detail.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Idle,
    UploadingFile,
    ConvertingToImage,
    UploadingImage,
    SavingDraft,
    RequestingAnalysis,
    SavingFinal,
    Done,
    Failed(FlowError),
}

impl Stage {
    fn next(&self) -> Stage {
        match self {
            Stage::Idle => Stage::UploadingFile,
            Stage::UploadingFile => Stage::ConvertingToImage,
            Stage::ConvertingToImage => Stage::UploadingImage,
            Stage::UploadingImage => Stage::SavingDraft,
            Stage::SavingDraft => Stage::RequestingAnalysis,
            Stage::RequestingAnalysis => Stage::SavingFinal,
            Stage::SavingFinal | Stage::Done => Stage::Done,
            Stage::Failed(e) => Stage::Failed(e.clone()),
        }
    }

    pub fn status_text(&self) -> &'static str {
        match self {
            Stage::Idle => "",
            Stage::UploadingFile => "Uploading your resume...",
            Stage::ConvertingToImage => "Converting to image...",
            Stage::UploadingImage => "Processing image...",
            Stage::SavingDraft => "Preparing analysis...",
            Stage::RequestingAnalysis => "Analyzing your resume with AI...",
            Stage::SavingFinal | Stage::Done => "Analysis complete! Redirecting...",
            Stage::Failed(e) => e.step.message(),
        }
    }
}

/// Outcome of one `step()`.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Advanced(Stage),
    Completed(String),
    Halted(FlowError),
}

/// The platform calls the flow is allowed to make.
#[derive(Clone, Copy)]
pub struct Capabilities<'a> {
    pub fs: &'a dyn BlobStore,
    pub pdf: &'a dyn PdfRasterizer,
    pub kv: &'a dyn KvStore,
    pub ai: &'a dyn AiService,
}

pub struct UploadFlow<'a> {
    caps: Capabilities<'a>,
    owner: String,
    submission: Submission,
    stage: Stage,
    id: String,
    uploaded_file: Option<StoredFile>,
    image: Option<UploadFile>,
    uploaded_image: Option<StoredFile>,
    record: Option<ResumeRecord>,
}

impl<'a> UploadFlow<'a> {
    /// `owner` is the blob directory the files are stored under.
    pub fn new(caps: Capabilities<'a>, owner: &str, submission: Submission) -> Self {
        Self {
            caps,
            owner: owner.to_string(),
            submission,
            stage: Stage::Idle,
            id: generate_id(),
            uploaded_file: None,
            image: None,
            uploaded_image: None,
            record: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn step(&mut self) -> Transition {
        let result = match self.stage.clone() {
            Stage::Idle => Ok(()),
            Stage::UploadingFile => self.upload_file().await,
            Stage::ConvertingToImage => self.convert_to_image().await,
            Stage::UploadingImage => self.upload_image().await,
            Stage::SavingDraft => self.save_draft().await,
            Stage::RequestingAnalysis => self.request_analysis().await,
            Stage::SavingFinal => self.save_final().await,
            Stage::Done => return Transition::Completed(self.id.clone()),
            Stage::Failed(e) => return Transition::Halted(e),
        };

        match result {
            Ok(()) => {
                self.stage = self.stage.next();
                info!(resume_id = %self.id, "{}", self.stage.status_text());
                if self.stage == Stage::Done {
                    Transition::Completed(self.id.clone())
                } else {
                    Transition::Advanced(self.stage.clone())
                }
            }
            Err(e) => {
                warn!(
                    resume_id = %self.id,
                    step = ?e.step,
                    "Upload flow halted: {}",
                    e.detail
                );
                self.stage = Stage::Failed(e.clone());
                Transition::Halted(e)
            }
        }
    }

    /// Drives the machine to `Done` or the first failure.
    pub async fn run(mut self) -> Result<ResumeRecord, FlowError> {
        loop {
            match self.step().await {
                Transition::Advanced(_) => continue,
                Transition::Completed(_) => {
                    return self
                        .record
                        .ok_or_else(|| FlowError::new(FailedStep::Save, "no record written"));
                }
                Transition::Halted(e) => return Err(e),
            }
        }
    }

    async fn upload_file(&mut self) -> Result<(), FlowError> {
        let stored = self
            .caps
            .fs
            .upload(&self.owner, self.submission.file.clone())
            .await
            .map_err(|e| FlowError::new(FailedStep::Upload, e))?;
        self.uploaded_file = Some(stored);
        Ok(())
    }

    async fn convert_to_image(&mut self) -> Result<(), FlowError> {
        let file = &self.submission.file;
        let image = self
            .caps
            .pdf
            .first_page_png(&file.name, file.bytes.clone())
            .await
            .map_err(|e| FlowError::new(FailedStep::Conversion, e))?;
        self.image = Some(image);
        Ok(())
    }

    async fn upload_image(&mut self) -> Result<(), FlowError> {
        let image = self
            .image
            .take()
            .ok_or_else(|| FlowError::new(FailedStep::ImageUpload, "no preview image"))?;
        let stored = self
            .caps
            .fs
            .upload(&self.owner, image)
            .await
            .map_err(|e| FlowError::new(FailedStep::ImageUpload, e))?;
        self.uploaded_image = Some(stored);
        Ok(())
    }

    async fn save_draft(&mut self) -> Result<(), FlowError> {
        let (Some(file), Some(image)) = (&self.uploaded_file, &self.uploaded_image) else {
            return Err(FlowError::new(FailedStep::Save, "uploads missing"));
        };

        let record = ResumeRecord {
            id: self.id.clone(),
            resume_path: file.path.clone(),
            image_path: image.path.clone(),
            company_name: self.submission.company_name.clone(),
            job_title: self.submission.job_title.clone(),
            job_description: self.submission.job_description.clone(),
            feedback: None,
            created_at: Some(Utc::now()),
        };
        self.write_record(&record).await?;
        self.record = Some(record);
        Ok(())
    }

    async fn request_analysis(&mut self) -> Result<(), FlowError> {
        let record = self
            .record
            .as_mut()
            .ok_or_else(|| FlowError::new(FailedStep::Analysis, "no draft record"))?;

        let instructions = prepare_instructions(
            self.submission.job_title.as_deref(),
            self.submission.job_description.as_deref(),
        );
        let response = self
            .caps
            .ai
            .feedback(&record.resume_path, &instructions)
            .await
            .map_err(|e| FlowError::new(FailedStep::Analysis, e))?;

        let text = response
            .text()
            .ok_or_else(|| FlowError::new(FailedStep::Analysis, "empty completion"))?;
        record.feedback = Some(parse_feedback(text)?);
        Ok(())
    }

    async fn save_final(&mut self) -> Result<(), FlowError> {
        let record = self
            .record
            .as_ref()
            .ok_or_else(|| FlowError::new(FailedStep::Save, "no record"))?;
        self.write_record(record).await
    }

    async fn write_record(&self, record: &ResumeRecord) -> Result<(), FlowError> {
        let value =
            serde_json::to_string(record).map_err(|e| FlowError::new(FailedStep::Save, e))?;
        self.caps
            .kv
            .set(&record_key(&record.id), &value)
            .await
            .map_err(|e| FlowError::new(FailedStep::Save, e))
    }
}

/// Parses the completion text into `Feedback` and checks every score is 0..=100.
pub fn parse_feedback(text: &str) -> Result<Feedback, FlowError> {
    let feedback: Feedback = serde_json::from_str(strip_json_fences(text))
        .map_err(|e| FlowError::new(FailedStep::MalformedFeedback, e))?;
    if let Some(section) = feedback.out_of_range_section() {
        return Err(FlowError::new(
            FailedStep::MalformedFeedback,
            format!("{section} score out of range"),
        ));
    }
    Ok(feedback)
}
