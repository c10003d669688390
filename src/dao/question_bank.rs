//! Question bank port.
//!
//! Question and question-set storage is an external collaborator; the engine
//! only needs an ordered question sequence for the sets a lobby selected. The
//! in-process implementation loads sets from a JSON file so the binary can run
//! without the full content service.

use std::{fs, path::Path};

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{dao::storage::StorageResult, state::session::Question};

/// A named, ordered collection of questions.
#[derive(Debug, Clone)]
pub struct QuestionSet {
    /// Stable identifier of the set.
    pub id: Uuid,
    /// Human readable set name.
    pub name: String,
    /// Questions in authoring order.
    pub questions: Vec<Question>,
}

/// Abstraction over the question/question-set store.
pub trait QuestionBank: Send + Sync {
    /// Human readable name of a question set, if the set exists.
    fn question_set_name(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<String>>>;
    /// All questions of the given sets, concatenated in set order.
    ///
    /// Unknown set ids yield an empty contribution; the caller decides whether
    /// an empty overall sequence is an error.
    fn questions_for_sets(
        &self,
        set_ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<Question>>>;
}

/// In-process question bank holding static sets.
#[derive(Default)]
pub struct StaticQuestionBank {
    sets: DashMap<Uuid, QuestionSet>,
}

impl StaticQuestionBank {
    /// Build a bank from pre-constructed sets.
    pub fn from_sets(sets: impl IntoIterator<Item = QuestionSet>) -> Self {
        let bank = Self::default();
        for set in sets {
            bank.sets.insert(set.id, set);
        }
        bank
    }

    /// Load question sets from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let raw: Vec<RawQuestionSet> = serde_json::from_str(&contents)?;
        let bank = Self::from_sets(raw.into_iter().map(QuestionSet::from));
        info!(path = %path.display(), count = bank.sets.len(), "loaded question sets");
        Ok(bank)
    }
}

impl QuestionBank for StaticQuestionBank {
    fn question_set_name(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let name = self.sets.get(&id).map(|set| set.name.clone());
        Box::pin(async move { Ok(name) })
    }

    fn questions_for_sets(
        &self,
        set_ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<Question>>> {
        let mut questions = Vec::new();
        for id in &set_ids {
            if let Some(set) = self.sets.get(id) {
                questions.extend(set.questions.iter().cloned());
            }
        }
        Box::pin(async move { Ok(questions) })
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a question set on disk.
struct RawQuestionSet {
    id: Uuid,
    name: String,
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single question on disk.
struct RawQuestion {
    #[serde(default)]
    id: Option<Uuid>,
    prompt: String,
    options: Vec<String>,
    correct_index: usize,
}

impl From<RawQuestionSet> for QuestionSet {
    fn from(raw: RawQuestionSet) -> Self {
        let set_id = raw.id;
        let questions = raw
            .questions
            .into_iter()
            .map(|question| Question {
                id: question.id.unwrap_or_else(Uuid::new_v4),
                question_set_id: set_id,
                prompt: question.prompt,
                options: question.options,
                correct_index: question.correct_index,
            })
            .collect();

        Self {
            id: set_id,
            name: raw.name,
            questions,
        }
    }
}
