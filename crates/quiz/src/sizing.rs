//! Built-in diaper sizing quiz.
//!
//! Visitors who already have their baby take the `born` flow, which asks
//! for a birthdate and the diaper they use today. Expecting parents take
//! the shorter `expecting` flow with a due date instead.

use crate::catalog::{Question, QuestionCatalog, QuestionKind, QuestionOption, QuizFlow};
use crate::error::QuizResult;

pub const FLOW_BORN: &str = "born";
pub const FLOW_EXPECTING: &str = "expecting";

const SIZES: &[(&str, &str)] = &[
    ("newborn", "Newborn"),
    ("1", "Size 1"),
    ("2", "Size 2"),
    ("3", "Size 3"),
    ("4", "Size 4"),
    ("5", "Size 5"),
    ("6", "Size 6"),
];

const BRANDS: &[(&str, &str)] = &[
    ("pampers", "Pampers"),
    ("huggies", "Huggies"),
    ("luvs", "Luvs"),
    ("honest", "Honest"),
    ("store-brand", "Store brand"),
    ("other", "Other"),
];

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl QuestionCatalog {
    /// The sizing quiz shipped with the site.
    pub fn sizing_quiz() -> QuizResult<Self> {
        let questions = vec![
            Question::new("baby", QuestionKind::SingleSelect, "Has your little one arrived?")
                .with_options(vec![
                    QuestionOption::new("born", "Yes, they're here").with_branch(FLOW_BORN),
                    QuestionOption::new("expecting", "Not yet, we're expecting")
                        .with_branch(FLOW_EXPECTING),
                ])
                .with_help(
                    "Why do we ask?",
                    "Newborns and older babies need very different fits, so we start here.",
                ),
            Question::new("due-date", QuestionKind::Date, "When is your baby due?")
                .with_placeholder("MM/DD/YYYY"),
            Question::new("birthdate", QuestionKind::Date, "When was your baby born?")
                .with_placeholder("MM/DD/YYYY")
                .with_help(
                    "Why do we need a birthdate?",
                    "Babies grow fast. Age lets us suggest when to size up.",
                ),
            Question::new("name", QuestionKind::FreeText, "What's your baby's name?")
                .with_placeholder("First name"),
            Question::new(
                "current-diaper",
                QuestionKind::DualSelect,
                "Which size and brand are you using now?",
            )
            .with_options(
                SIZES
                    .iter()
                    .map(|(value, label)| QuestionOption::new(*value, *label))
                    .collect(),
            )
            .with_secondary_options(
                BRANDS
                    .iter()
                    .map(|(value, label)| {
                        QuestionOption::new(*value, *label)
                            .with_icon(format!("/images/brands/{value}.svg"))
                    })
                    .collect(),
            ),
            Question::new("email", QuestionKind::FreeText, "Where should we send your results?")
                .with_placeholder("you@example.com"),
        ];

        let order = ids(&["baby", "birthdate", "name", "current-diaper", "email"]);
        let flows = vec![
            QuizFlow::new(FLOW_BORN, order.clone()),
            QuizFlow::new(FLOW_EXPECTING, ids(&["baby", "due-date", "name", "email"])),
        ];

        QuestionCatalog::with_flows(questions, order, flows)
    }
}
