// Prompt text for resume analysis.

/// Shape the model must answer with. Mirrors `models::resume::Feedback`.
pub const FEEDBACK_FORMAT: &str = r#"{
  "overallScore": 0,
  "ATS": {
    "score": 0,
    "tips": [
      { "type": "good" | "improve", "tip": "short finding" }
    ]
  },
  "toneAndStyle": {
    "score": 0,
    "tips": [
      { "type": "good" | "improve", "tip": "short title", "explanation": "detailed explanation" }
    ]
  },
  "content": { "score": 0, "tips": [ { "type": "good" | "improve", "tip": "...", "explanation": "..." } ] },
  "structure": { "score": 0, "tips": [ { "type": "good" | "improve", "tip": "...", "explanation": "..." } ] },
  "skills": { "score": 0, "tips": [ { "type": "good" | "improve", "tip": "...", "explanation": "..." } ] }
}"#;

/// Review instructions. Replace `{job_title}`, `{job_description}` and `{format}` before sending.
pub const REVIEW_INSTRUCTIONS_TEMPLATE: &str = r#"You are an expert in ATS (Applicant Tracking Systems) and resume review.
Analyze and rate the resume below and explain how it can be improved.
Scores range from 0 to 100 and may be low when the resume is weak: be thorough and point out every mistake or gap you find.
When a job description is provided, judge the resume against that role specifically.

Job title: {job_title}
Job description: {job_description}

Answer with feedback in exactly this format:
{format}

Give 3-4 ATS tips and 3-4 tips per category.
Return only the JSON object, with no surrounding text and no backticks."#;

const NOT_PROVIDED: &str = "(not provided)";

pub fn prepare_instructions(job_title: Option<&str>, job_description: Option<&str>) -> String {
    fill_placeholders(REVIEW_INSTRUCTIONS_TEMPLATE, |name| match name {
        "job_title" => Some(job_title.unwrap_or(NOT_PROVIDED)),
        "job_description" => Some(job_description.unwrap_or(NOT_PROVIDED)),
        "format" => Some(FEEDBACK_FORMAT),
        _ => None,
    })
}

/// Replaces `{name}` placeholders in a single left-to-right pass. Inserted
/// values are never scanned again; unknown names stay as written.
fn fill_placeholders<'a>(template: &str, value: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let filled = after
            .find('}')
            .and_then(|end| value(&after[..end]).map(|text| (end, text)));
        match filled {
            Some((end, text)) => {
                out.push_str(text);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_instructions_fills_placeholders() {
        let text = prepare_instructions(Some("Senior Software Engineer"), Some("Rust, Tokio"));
        assert!(text.contains("Job title: Senior Software Engineer"));
        assert!(text.contains("Job description: Rust, Tokio"));
        assert!(text.contains("\"toneAndStyle\""));
        assert!(!text.contains("{job_title}"));
        assert!(!text.contains("{format}"));
    }

    #[test]
    fn test_user_text_is_not_expanded() {
        let text = prepare_instructions(Some("{job_description} {format}"), Some("SECRET"));
        assert!(text.contains("Job title: {job_description} {format}\n"));
        assert_eq!(text.matches("SECRET").count(), 1);
        assert_eq!(text.matches("\"toneAndStyle\"").count(), 1);
    }

    #[test]
    fn test_unknown_braces_are_kept() {
        let text = fill_placeholders("a {x} {b", |_| None);
        assert_eq!(text, "a {x} {b");
    }

    #[test]
    fn test_prepare_instructions_without_job_details() {
        let text = prepare_instructions(None, None);
        assert!(text.contains("Job title: (not provided)"));
        assert!(text.contains("Job description: (not provided)"));
    }
}
