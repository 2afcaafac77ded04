use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// KV key prefix for resume records.
pub const RECORD_KEY_PREFIX: &str = "resume:";

/// Pattern matching every resume record key.
pub const RECORD_KEY_PATTERN: &str = "resume:*";

pub fn record_key(id: &str) -> String {
    format!("{RECORD_KEY_PREFIX}{id}")
}

/// Persisted metadata for one uploaded resume. The KV store owns it; the
/// service only ever holds transient copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: String,
    pub resume_path: String,
    pub image_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    /// `""` on the wire while analysis is pending.
    #[serde(default, with = "pending_feedback")]
    pub feedback: Option<Feedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ResumeRecord {
    pub fn is_analyzed(&self) -> bool {
        self.feedback.is_some()
    }
}

/// Whether a tip reinforces something done well or flags an improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Good,
    Improve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsTip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    pub tip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsSection {
    pub score: u32,
    pub tips: Vec<AtsTip>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    pub tip: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySection {
    pub score: u32,
    pub tips: Vec<Tip>,
}

/// AI-produced critique. Stored and rendered exactly as returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub overall_score: u32,
    #[serde(rename = "ATS")]
    pub ats: AtsSection,
    pub tone_and_style: CategorySection,
    pub content: CategorySection,
    pub structure: CategorySection,
    pub skills: CategorySection,
}

pub const MAX_SCORE: u32 = 100;

impl Feedback {
    /// Returns the name of the first section whose score is outside 0..=100.
    pub fn out_of_range_section(&self) -> Option<&'static str> {
        [
            ("overallScore", self.overall_score),
            ("ATS", self.ats.score),
            ("toneAndStyle", self.tone_and_style.score),
            ("content", self.content.score),
            ("structure", self.structure.score),
            ("skills", self.skills.score),
        ]
        .into_iter()
        .find(|(_, score)| *score > MAX_SCORE)
        .map(|(name, _)| name)
    }
}

/// Serde adapter for the record's feedback slot: `None` is written as `""`,
/// and both `""` and `null` read back as `None`.
mod pending_feedback {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Feedback;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Slot {
        Ready(Box<Feedback>),
        Pending(Option<String>),
    }

    pub fn serialize<S: Serializer>(value: &Option<Feedback>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(feedback) => feedback.serialize(s),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Feedback>, D::Error> {
        match Slot::deserialize(d)? {
            Slot::Ready(feedback) => Ok(Some(*feedback)),
            Slot::Pending(_) => Ok(None),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::sample_feedback;
    use super::*;

    fn draft() -> ResumeRecord {
        ResumeRecord {
            id: "abc".to_string(),
            resume_path: "alice/1-resume.pdf".to_string(),
            image_path: "alice/2-resume.png".to_string(),
            company_name: Some("Acme".to_string()),
            job_title: None,
            job_description: None,
            feedback: None,
            created_at: None,
        }
    }

    #[test]
    fn test_pending_feedback_serializes_as_empty_string() {
        let json = serde_json::to_value(draft()).unwrap();
        assert_eq!(json["feedback"], "");
        assert_eq!(json["resumePath"], "alice/1-resume.pdf");
        assert!(json.get("jobTitle").is_none());
    }

    #[test]
    fn test_empty_and_null_feedback_read_as_pending() {
        let empty = r#"{"id":"a","resumePath":"p","imagePath":"i","feedback":""}"#;
        let null = r#"{"id":"a","resumePath":"p","imagePath":"i","feedback":null}"#;
        let missing = r#"{"id":"a","resumePath":"p","imagePath":"i"}"#;
        for raw in [empty, null, missing] {
            let record: ResumeRecord = serde_json::from_str(raw).unwrap();
            assert!(!record.is_analyzed(), "{raw}");
        }
    }

    #[test]
    fn test_feedback_survives_record_round_trip() {
        let mut record = draft();
        record.feedback = Some(sample_feedback(77));

        let stored = serde_json::to_string(&record).unwrap();
        let loaded: ResumeRecord = serde_json::from_str(&stored).unwrap();

        assert_eq!(loaded, record);
        let feedback = loaded.feedback.unwrap();
        assert_eq!(feedback.overall_score, 77);
        assert_eq!(feedback.skills.tips[1].explanation, "Tighten the skills section.");
    }

    #[test]
    fn test_feedback_wire_names() {
        let json = serde_json::to_value(sample_feedback(60)).unwrap();
        assert_eq!(json["overallScore"], 60);
        assert_eq!(json["ATS"]["tips"][0]["type"], "good");
        assert_eq!(json["toneAndStyle"]["tips"][1]["type"], "improve");
    }

    #[test]
    fn test_out_of_range_section() {
        let mut feedback = sample_feedback(90);
        assert_eq!(feedback.out_of_range_section(), None);
        feedback.content.score = 140;
        assert_eq!(feedback.out_of_range_section(), Some("content"));
    }

    #[test]
    fn test_record_key() {
        assert_eq!(record_key("42"), "resume:42");
    }
}
