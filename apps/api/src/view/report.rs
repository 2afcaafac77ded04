use serde::Serialize;

use super::accordion::Accordion;
use super::gauge::{ScoreCircle, ScoreGauge};
use super::tier::{Badge, Tier};
use crate::models::resume::{AtsTip, CategorySection, Feedback, ResumeRecord, Tip};

/// Detail section opened when the report first renders.
pub const DEFAULT_OPEN_SECTION: &str = "tone-style";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRow {
    pub title: &'static str,
    pub score: u32,
    pub badge: Badge,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub gauge: ScoreGauge,
    pub gauge_svg: String,
    pub categories: Vec<CategoryRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AtsView {
    pub score: u32,
    pub badge: Badge,
    pub label: &'static str,
    pub tips: Vec<AtsTip>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailSection {
    pub id: &'static str,
    pub title: &'static str,
    pub score: u32,
    pub badge: Badge,
    pub tips: Vec<Tip>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsView {
    pub sections: Vec<DetailSection>,
    pub accordion: Accordion,
}

/// Everything the results page draws, plus the feedback exactly as stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub summary: SummaryView,
    pub ats: AtsView,
    pub details: DetailsView,
    pub feedback: Feedback,
}

fn categories(feedback: &Feedback) -> [(&'static str, &'static str, &CategorySection); 4] {
    [
        ("tone-style", "Tone & Style", &feedback.tone_and_style),
        ("content", "Content Quality", &feedback.content),
        ("structure", "Structure & Layout", &feedback.structure),
        ("skills", "Skills & Keywords", &feedback.skills),
    ]
}

impl ReportView {
    pub fn new(feedback: Feedback) -> Self {
        let gauge = ScoreGauge::new(feedback.overall_score);
        let gauge_svg = gauge.to_svg();

        let rows = categories(&feedback)
            .into_iter()
            .map(|(_, title, section)| CategoryRow {
                title,
                score: section.score,
                badge: Badge::for_score(section.score),
            })
            .collect();

        let ats_tier = Tier::from_score(feedback.ats.score);
        let ats = AtsView {
            score: feedback.ats.score,
            badge: Badge::for_score(feedback.ats.score),
            label: ats_tier.ats_label(),
            tips: feedback.ats.tips.clone(),
        };

        let sections: Vec<DetailSection> = categories(&feedback)
            .into_iter()
            .map(|(id, title, section)| DetailSection {
                id,
                title,
                score: section.score,
                badge: Badge::for_score(section.score),
                tips: section.tips.clone(),
            })
            .collect();
        let accordion = Accordion::new(
            sections.iter().map(|s| s.id),
            Some(DEFAULT_OPEN_SECTION),
            false,
        );

        Self {
            summary: SummaryView {
                gauge,
                gauge_svg,
                categories: rows,
            },
            ats,
            details: DetailsView {
                sections,
                accordion,
            },
            feedback,
        }
    }
}

/// One dashboard card.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeCardView {
    pub id: String,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub url: String,
    pub image_url: String,
    pub overall_score: Option<u32>,
    pub score_circle: Option<ScoreCircle>,
    pub score_circle_svg: Option<String>,
}

impl ResumeCardView {
    pub fn new(record: &ResumeRecord) -> Self {
        let overall_score = record.feedback.as_ref().map(|f| f.overall_score);
        let score_circle = overall_score.map(ScoreCircle::new);
        let score_circle_svg = score_circle.as_ref().map(ScoreCircle::to_svg);
        Self {
            id: record.id.clone(),
            company_name: record.company_name.clone(),
            job_title: record.job_title.clone(),
            url: resume_url(&record.id),
            image_url: image_url(&record.id),
            overall_score,
            score_circle,
            score_circle_svg,
        }
    }
}

pub fn resume_url(id: &str) -> String {
    format!("/resume/{id}")
}

pub fn file_url(id: &str) -> String {
    format!("/resume/{id}/file")
}

pub fn image_url(id: &str) -> String {
    format!("/resume/{id}/image")
}
