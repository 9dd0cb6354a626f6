// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::errors::ConfigError;

/// One question/answer exchange captured from an assistant.
///
/// A record that carries a `grade` key was reviewed by a grader and counts as
/// a failure for analysis purposes. An explicit `grade: null` sets the outer
/// `Option` and leaves the inner one empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: String,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<Vec<Value>>,
    pub answer: String,
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub grade: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grader: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl LogRecord {
    pub fn new(id: impl Into<String>, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            docs: None,
            answer: answer.into(),
            grade: None,
            grader: None,
            feedback: None,
        }
    }

    pub fn graded(mut self, grade: i64, grader: impl Into<String>, feedback: impl Into<String>) -> Self {
        self.grade = Some(Some(grade));
        self.grader = Some(grader.into());
        self.feedback = Some(feedback.into());
        self
    }

    pub fn with_docs(mut self, docs: Vec<Value>) -> Self {
        self.docs = Some(docs);
        self
    }

    /// Any graded record is a failure, whatever the grade, even `null`.
    pub fn contains_failure(&self) -> bool {
        self.grade.is_some()
    }

    /// Trimmed copy used as the cleaned form of a raw record
    pub fn cleaned(&self) -> Self {
        Self {
            id: self.id.trim().to_string(),
            question: self.question.trim().to_string(),
            docs: self.docs.clone(),
            answer: self.answer.trim().to_string(),
            grade: self.grade,
            grader: self.grader.as_deref().map(str::trim).map(str::to_string),
            feedback: self.feedback.as_deref().map(str::trim).map(str::to_string),
        }
    }
}

/// Runs only when the key is present, so a `null` value still yields `Some`
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

/// Read a YAML or JSON list of log records.
pub fn load_logs<P: AsRef<Path>>(path: P) -> Result<Vec<LogRecord>, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    // JSON is a subset of YAML, one parser covers both
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_failure_predicate_is_grade_presence() {
        let plain = LogRecord::new("1", "How can I import ChatOllama?", "from langchain_community...");
        let graded = LogRecord::new("2", "How can I use Chroma?", "vectorstore = ...")
            .graded(0, "Document Relevance Recall", "The retrieved documents discuss vectorstores");

        assert!(!plain.contains_failure());
        assert!(graded.contains_failure());
    }

    #[test]
    fn test_null_grade_still_counts_as_failure() {
        let record: LogRecord =
            serde_json::from_value(json!({"id": "3", "question": "q", "answer": "a", "grade": null}))
                .unwrap();

        assert_eq!(record.grade, Some(None));
        assert!(record.contains_failure());
        assert!(record.cleaned().contains_failure());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value.get("grade"), Some(&Value::Null));
    }

    #[test]
    fn test_absent_optionals_are_not_serialized() {
        let value = serde_json::to_value(LogRecord::new("1", "q", "a")).unwrap();
        assert_eq!(value, json!({"id": "1", "question": "q", "answer": "a"}));
    }

    #[test]
    fn test_cleaned_trims_text() {
        let raw = LogRecord::new(" 7 ", "  what?  ", "answer\n").graded(1, " grader ", " ok ");
        let cleaned = raw.cleaned();

        assert_eq!(cleaned.id, "7");
        assert_eq!(cleaned.question, "what?");
        assert_eq!(cleaned.answer, "answer");
        assert_eq!(cleaned.grader.as_deref(), Some("grader"));
        assert_eq!(cleaned.grade, Some(Some(1)));
    }

    #[test]
    fn test_load_logs_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
- id: "1"
  question: How can I import ChatOllama?
  answer: Use langchain_community.
- id: "2"
  question: How can I use Chroma?
  answer: Build a vector store.
  grade: 0
  grader: Document Relevance Recall
  feedback: Missing the relevant page.
"#
        )
        .unwrap();

        let logs = load_logs(file.path()).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].grade, Some(Some(0)));
        assert!(logs[0].docs.is_none());
    }

    #[test]
    fn test_load_logs_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": "9", "question": "q", "answer": "a", "docs": ["d1"]}}]"#).unwrap();

        let logs = load_logs(file.path()).unwrap();
        assert_eq!(logs[0].docs, Some(vec![json!("d1")]));
    }

    #[test]
    fn test_load_logs_missing_required_field() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "- id: \"1\"\n  question: q\n").unwrap();

        assert!(matches!(load_logs(file.path()), Err(ConfigError::Parse { .. })));
    }
}
