//! Question catalog: the immutable set of quiz questions, their canonical
//! order, and the named flows (ordered subsequences) a visitor can take.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{QuizError, QuizResult};

/// Flow id of the canonical `question_order`.
pub const DEFAULT_FLOW: &str = "default";

/// Suffixes of the two answer keys a dual-select question stores.
pub const DUAL_PRIMARY_SUFFIX: &str = "size";
pub const DUAL_SECONDARY_SUFFIX: &str = "brand";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleSelect,
    /// Two selections captured on one screen (size + brand).
    DualSelect,
    Date,
    FreeText,
}

impl QuestionKind {
    pub fn requires_options(&self) -> bool {
        matches!(self, QuestionKind::SingleSelect | QuestionKind::DualSelect)
    }
}

/// One selectable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub value: String,
    pub label: String,
    /// Asset reference for the option (brand logo, illustration).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_ref: Option<String>,
    /// Flow to switch to when this option is chosen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl QuestionOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            icon_ref: None,
            branch: None,
        }
    }

    pub fn with_icon(mut self, icon_ref: impl Into<String>) -> Self {
        self.icon_ref = Some(icon_ref.into());
        self
    }

    pub fn with_branch(mut self, flow: impl Into<String>) -> Self {
        self.branch = Some(flow.into());
        self
    }
}

/// Auxiliary "why do we ask?" explanation shown next to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpText {
    pub text: String,
    pub answer: String,
}

/// A single quiz prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<QuestionOption>,
    /// Second option group of a dual-select question.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_options: Vec<QuestionOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<HelpText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl Question {
    pub fn new(id: impl Into<String>, kind: QuestionKind, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            prompt: prompt.into(),
            options: Vec::new(),
            secondary_options: Vec::new(),
            help: None,
            placeholder: None,
        }
    }

    pub fn with_options(mut self, options: Vec<QuestionOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_secondary_options(mut self, options: Vec<QuestionOption>) -> Self {
        self.secondary_options = options;
        self
    }

    pub fn with_help(mut self, text: impl Into<String>, answer: impl Into<String>) -> Self {
        self.help = Some(HelpText {
            text: text.into(),
            answer: answer.into(),
        });
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn option(&self, value: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.value == value)
    }

    /// Flow selected by answering `value`, if that option branches.
    pub fn branch_for(&self, value: &str) -> Option<&str> {
        self.option(value).and_then(|o| o.branch.as_deref())
    }

    /// Keys under which this question's answers are stored in a session.
    /// A dual-select screen may also store each half on its own.
    pub fn answer_keys(&self) -> Vec<String> {
        match self.kind {
            QuestionKind::DualSelect => vec![
                self.id.clone(),
                format!("{}-{}", self.id, DUAL_PRIMARY_SUFFIX),
                format!("{}-{}", self.id, DUAL_SECONDARY_SUFFIX),
            ],
            _ => vec![self.id.clone()],
        }
    }

    fn validate(&self) -> QuizResult<()> {
        if self.id.trim().is_empty() {
            return Err(QuizError::InvalidCatalog("question id must not be empty".into()));
        }
        if self.kind.requires_options() && self.options.is_empty() {
            return Err(QuizError::InvalidCatalog(format!(
                "question '{}' requires at least one option",
                self.id
            )));
        }
        if self.kind == QuestionKind::DualSelect && self.secondary_options.is_empty() {
            return Err(QuizError::InvalidCatalog(format!(
                "dual-select question '{}' requires secondary options",
                self.id
            )));
        }
        for group in [&self.options, &self.secondary_options] {
            let mut seen = HashSet::new();
            for option in group.iter() {
                if !seen.insert(option.value.as_str()) {
                    return Err(QuizError::InvalidCatalog(format!(
                        "question '{}' has duplicate option value '{}'",
                        self.id, option.value
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A named, ordered path through the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizFlow {
    pub id: String,
    pub question_ids: Vec<String>,
}

impl QuizFlow {
    pub fn new(id: impl Into<String>, question_ids: Vec<String>) -> Self {
        Self {
            id: id.into(),
            question_ids,
        }
    }

    pub fn len(&self) -> usize {
        self.question_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.question_ids.is_empty()
    }

    pub fn position(&self, question_id: &str) -> Option<usize> {
        self.question_ids.iter().position(|id| id == question_id)
    }

    pub fn question_at(&self, index: usize) -> Option<&str> {
        self.question_ids.get(index).map(String::as_str)
    }
}

/// Serialized form of a catalog, as loaded from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub question_order: Vec<String>,
    pub questions: Vec<Question>,
    #[serde(default)]
    pub flows: Vec<QuizFlow>,
}

/// Immutable question catalog. Validated once at construction.
#[derive(Debug, Clone)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
    index: HashMap<String, usize>,
    answer_keys: HashSet<String>,
    question_order: Vec<String>,
    flows: Vec<QuizFlow>,
}

impl QuestionCatalog {
    /// Catalog whose only flow is the canonical order.
    pub fn new(questions: Vec<Question>, question_order: Vec<String>) -> QuizResult<Self> {
        Self::with_flows(questions, question_order, Vec::new())
    }

    /// Catalog with additional named flows. The canonical order is always
    /// registered as the `default` flow.
    pub fn with_flows(
        questions: Vec<Question>,
        question_order: Vec<String>,
        extra_flows: Vec<QuizFlow>,
    ) -> QuizResult<Self> {
        let mut index = HashMap::with_capacity(questions.len());
        for (i, question) in questions.iter().enumerate() {
            question.validate()?;
            if index.insert(question.id.clone(), i).is_some() {
                return Err(QuizError::InvalidCatalog(format!(
                    "duplicate question id '{}'",
                    question.id
                )));
            }
        }

        let mut flows = Vec::with_capacity(extra_flows.len() + 1);
        flows.push(QuizFlow::new(DEFAULT_FLOW, question_order.clone()));
        for flow in extra_flows {
            if flows.iter().any(|f| f.id == flow.id) {
                return Err(QuizError::InvalidCatalog(format!("duplicate flow id '{}'", flow.id)));
            }
            flows.push(flow);
        }

        for flow in &flows {
            if flow.is_empty() {
                return Err(QuizError::InvalidCatalog(format!("flow '{}' is empty", flow.id)));
            }
            let mut seen = HashSet::new();
            for id in &flow.question_ids {
                if !index.contains_key(id) {
                    return Err(QuizError::InvalidCatalog(format!(
                        "flow '{}' references unknown question '{}'",
                        flow.id, id
                    )));
                }
                if !seen.insert(id.as_str()) {
                    return Err(QuizError::InvalidCatalog(format!(
                        "flow '{}' lists question '{}' twice",
                        flow.id, id
                    )));
                }
            }
        }

        // A branch jumps into another flow at the branching question's own
        // position, so the target flow must contain that question.
        for question in &questions {
            for option in &question.options {
                let Some(target) = option.branch.as_deref() else { continue };
                let flow = flows.iter().find(|f| f.id == target).ok_or_else(|| {
                    QuizError::InvalidCatalog(format!(
                        "question '{}' branches to unknown flow '{}'",
                        question.id, target
                    ))
                })?;
                if flow.position(&question.id).is_none() {
                    return Err(QuizError::InvalidCatalog(format!(
                        "flow '{}' does not contain branching question '{}'",
                        target, question.id
                    )));
                }
            }
        }

        let answer_keys = questions.iter().flat_map(Question::answer_keys).collect();

        debug!(
            questions = questions.len(),
            flows = flows.len(),
            "Question catalog built"
        );

        Ok(Self {
            questions,
            index,
            answer_keys,
            question_order,
            flows,
        })
    }

    pub fn from_document(document: CatalogDocument) -> QuizResult<Self> {
        Self::with_flows(document.questions, document.question_order, document.flows)
    }

    pub fn from_json(json: &str) -> QuizResult<Self> {
        let document: CatalogDocument =
            serde_json::from_str(json).map_err(|e| QuizError::Document(e.to_string()))?;
        Self::from_document(document)
    }

    pub fn load_file(path: impl AsRef<Path>) -> QuizResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| QuizError::Document(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Lookup by id. Absence is a normal outcome; the caller renders nothing.
    pub fn get_question(&self, id: &str) -> Option<&Question> {
        self.index.get(id).map(|&i| &self.questions[i])
    }

    /// Whether a session may store an answer under `key`.
    pub fn accepts_answer_key(&self, key: &str) -> bool {
        self.answer_keys.contains(key)
    }

    /// 1-based position of `id` in the canonical order, for progress display.
    pub fn step_number(&self, id: &str) -> Option<usize> {
        self.question_order.iter().position(|q| q == id).map(|i| i + 1)
    }

    pub fn question_order(&self) -> &[String] {
        &self.question_order
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn flow(&self, id: &str) -> Option<&QuizFlow> {
        self.flows.iter().find(|f| f.id == id)
    }

    pub fn default_flow(&self) -> &QuizFlow {
        &self.flows[0]
    }

    pub fn flows(&self) -> &[QuizFlow] {
        &self.flows
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            question_order: self.question_order.clone(),
            questions: self.questions.clone(),
            flows: self.flows[1..].to_vec(),
        }
    }
}
