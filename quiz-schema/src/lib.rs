//! Quiz data model shared between the service and the domain utilities.
//!
//! `QuestionDocument` is the shape stored in MongoDB. `Question` is the fixed
//! shape served over HTTP and accepted back in feedback requests.
use bson::Bson;
use serde::{Deserialize, Deserializer, Serialize};

pub mod db;

/// A multiple choice quiz question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Opaque key. Clients may send it as a string or an integer.
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: u32,
}

/// A user's submitted answers for a list of questions.
///
/// `answers[i]` is the selected option index for the i-th question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttempt {
    pub score: u32,
    pub total_questions: u32,
    pub answers: Vec<u32>,
}

/// Record as stored in the `questions` collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestionDocument {
    #[serde(rename = "_id")]
    pub id: Bson,
    #[serde(default)]
    pub subject: Option<String>,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(alias = "correctAnswer")]
    pub correct_answer: u32,
}

impl From<QuestionDocument> for Question {
    fn from(doc: QuestionDocument) -> Self {
        Question {
            id: render_id(&doc.id),
            subject: doc.subject.filter(|s| !s.trim().is_empty()),
            question: doc.question,
            options: doc.options,
            correct_answer: doc.correct_answer,
        }
    }
}

/// Renders a stored `_id` as the opaque string key used by the API.
pub fn render_id(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        Bson::Int32(n) => n.to_string(),
        Bson::Int64(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Key {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match Key::deserialize(deserializer)? {
        Key::Text(s) => s,
        Key::Signed(n) => n.to_string(),
        Key::Unsigned(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;

    #[test]
    fn question_id_accepts_numbers_and_strings() {
        let numeric: Question = serde_json::from_str(
            r#"{"id": 1, "question": "q", "options": ["a", "b"], "correct_answer": 1}"#,
        )
        .unwrap();
        assert_eq!(numeric.id, "1");
        assert_eq!(numeric.subject, None);

        let text: Question = serde_json::from_str(
            r#"{"id": "abc", "subject": "History", "question": "q", "options": ["a", "b"], "correct_answer": 0}"#,
        )
        .unwrap();
        assert_eq!(text.id, "abc");
        assert_eq!(text.subject.as_deref(), Some("History"));
    }

    #[test]
    fn question_id_serializes_as_string() {
        let question = Question {
            id: "7".to_string(),
            subject: None,
            question: "q".to_string(),
            options: vec!["a".to_string(), "b".to_string()],
            correct_answer: 0,
        };
        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["id"], serde_json::json!("7"));
    }

    #[test]
    fn document_shapes_into_question() {
        let oid = ObjectId::new();
        let doc = bson::doc! {
            "_id": oid,
            "subject": "Geography",
            "question": "Capital of France?",
            "options": ["London", "Paris"],
            "correctAnswer": 1,
        };
        let doc: QuestionDocument = bson::from_document(doc).unwrap();
        let question = Question::from(doc);

        assert_eq!(question.id, oid.to_hex());
        assert_eq!(question.subject.as_deref(), Some("Geography"));
        assert_eq!(question.correct_answer, 1);
    }

    #[test]
    fn blank_subject_is_dropped() {
        let doc = QuestionDocument {
            id: Bson::Int32(3),
            subject: Some("  ".to_string()),
            question: "q".to_string(),
            options: vec![],
            correct_answer: 0,
        };
        let question = Question::from(doc);
        assert_eq!(question.id, "3");
        assert_eq!(question.subject, None);
    }
}
