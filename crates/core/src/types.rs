use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    duration::parse_duration,
    error::{Result, SocratesError},
    format::slugify,
};

/// A named point on the video timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    /// Human time string, e.g. `"4m21s"`. Parsed on demand.
    pub time: String,
    #[serde(default)]
    pub complete: bool,
}

impl Bookmark {
    pub fn seconds(&self) -> Result<f64> {
        parse_duration(&self.time)
    }

    /// Falls back to the id when the title has nothing sluggable in it.
    pub fn slug(&self) -> String {
        let slug = slugify(&self.title);
        if slug.is_empty() {
            slugify(&self.id)
        } else {
            slug
        }
    }
}

/// How a question captures its answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    #[default]
    FreeText,
    CheckboxGrid,
    Matrix,
}

fn default_version() -> Option<String> {
    Some("1".to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(flatten)]
    pub bookmark: Bookmark,
    pub youtube_id: String,
    /// `None` accepts any answer.
    #[serde(default)]
    pub correct_data: Option<Value>,
    /// Parent bookmark id for "explain" drill-down links.
    #[serde(default)]
    pub nested: Option<String>,
    #[serde(default = "default_version")]
    pub version: Option<String>,
    #[serde(default)]
    pub kind: QuestionKind,
}

impl Question {
    pub fn id(&self) -> &str {
        &self.bookmark.id
    }

    pub fn seconds(&self) -> Result<f64> {
        self.bookmark.seconds()
    }

    pub fn slug(&self) -> String {
        self.bookmark.slug()
    }

    pub fn is_complete(&self) -> bool {
        self.bookmark.complete
    }

    /// Flip `complete` on. Never reverts.
    pub fn mark_complete(&mut self) {
        self.bookmark.complete = true;
    }

    /// Key used to resolve this question's overlay template.
    pub fn template_key(&self) -> TemplateKey {
        TemplateKey {
            youtube_id: self.youtube_id.clone(),
            slug: self.slug(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateKey {
    pub youtube_id: String,
    pub slug: String,
}

/// One entry of the server-supplied timeline. Questions are tried first
/// since they carry a superset of bookmark fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimelineItem {
    Question(Question),
    Bookmark(Bookmark),
}

impl TimelineItem {
    pub fn bookmark(&self) -> &Bookmark {
        match self {
            TimelineItem::Question(q) => &q.bookmark,
            TimelineItem::Bookmark(b) => b,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFeed {
    pub youtube_id: String,
    pub title: String,
    /// Video length in seconds.
    pub duration: f64,
    pub items: Vec<TimelineItem>,
}

impl VideoFeed {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.items.iter().filter_map(|item| match item {
            TimelineItem::Question(q) => Some(q),
            TimelineItem::Bookmark(_) => None,
        })
    }
}

/// Submission record handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub time: String,
    pub youtube_id: String,
    pub id: String,
    pub version: String,
    pub correct: bool,
    pub data: Value,
    /// Seconds the question was on screen since the previous response.
    pub time_displayed: f64,
}

/// A response before its structural check. Every field must be present.
#[derive(Debug, Clone, Default)]
pub struct ResponseDraft {
    pub time: Option<String>,
    pub youtube_id: Option<String>,
    pub id: Option<String>,
    pub version: Option<String>,
    pub correct: Option<bool>,
    pub data: Option<Value>,
    pub time_displayed: f64,
}

impl ResponseDraft {
    pub fn validate(self) -> Result<Response> {
        fn require<T>(value: Option<T>, field: &'static str) -> Result<T> {
            value.ok_or(SocratesError::InvalidResponse { field })
        }

        let data = match self.data {
            Some(Value::Null) | None => return Err(SocratesError::InvalidResponse { field: "data" }),
            Some(data) => data,
        };

        Ok(Response {
            id: require(self.id, "id")?,
            version: require(self.version, "version")?,
            correct: require(self.correct, "correct")?,
            youtube_id: require(self.youtube_id, "youtubeId")?,
            time: require(self.time, "time")?,
            data,
            time_displayed: self.time_displayed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"{
        "youtubeId": "abc123",
        "title": "Adding fractions",
        "duration": 300,
        "items": [
            {"id": "b1", "title": "Intro", "time": "0s"},
            {"id": "q1", "title": "What is 2 + 2?", "time": "1m30s",
             "youtubeId": "abc123", "correctData": {"answer": "4"}},
            {"id": "q2", "title": "Pick the grid", "time": "2m", "youtubeId": "abc123",
             "kind": "checkbox-grid", "version": null}
        ]
    }"#;

    #[test]
    fn feed_distinguishes_questions_from_bookmarks() {
        let feed = VideoFeed::from_json(FEED).unwrap();
        assert!(matches!(feed.items[0], TimelineItem::Bookmark(_)));
        assert!(matches!(feed.items[1], TimelineItem::Question(_)));

        let questions: Vec<_> = feed.questions().collect();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].seconds().unwrap(), 90.0);
        assert_eq!(questions[0].version.as_deref(), Some("1"));
        assert_eq!(questions[1].kind, QuestionKind::CheckboxGrid);
        assert_eq!(questions[1].version, None);
        assert_eq!(questions[0].template_key().slug, "what-is-2-2");
    }

    #[test]
    fn untitled_bookmarks_slug_by_id() {
        let bookmark = Bookmark {
            id: "Q7".into(),
            title: "???".into(),
            time: "1s".into(),
            complete: false,
        };
        assert_eq!(bookmark.slug(), "q7");
    }

    #[test]
    fn draft_requires_every_field() {
        let full = ResponseDraft {
            time: Some("1m30s".into()),
            youtube_id: Some("abc123".into()),
            id: Some("q1".into()),
            version: Some("1".into()),
            correct: Some(true),
            data: Some(serde_json::json!({"answer": "4"})),
            time_displayed: 2.0,
        };
        assert!(full.clone().validate().is_ok());

        let missing_version = ResponseDraft {
            version: None,
            ..full.clone()
        };
        assert!(matches!(
            missing_version.validate(),
            Err(SocratesError::InvalidResponse { field: "version" })
        ));

        let null_data = ResponseDraft {
            data: Some(Value::Null),
            ..full
        };
        assert!(matches!(
            null_data.validate(),
            Err(SocratesError::InvalidResponse { field: "data" })
        ));
    }
}
