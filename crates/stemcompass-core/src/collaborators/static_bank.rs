//! Bundled question bank, used when the generator is not configured.

use async_trait::async_trait;
use uuid::Uuid;

use super::traits::QuestionSource;
use crate::assessment::{Question, QuestionOrigin, QuestionSet, StemCategory};
use crate::error::CollaboratorError;

use crate::assessment::StemCategory::{
    Engineering as E, Mathematics as M, Science as S, Technology as T,
};

type Entry = (&'static str, [(&'static str, StemCategory); 4]);

const BANK: [Entry; 10] = [
    (
        "Which school project sounds the most fun?",
        [
            ("Testing how plants grow under different light", S),
            ("Building a website for a club", T),
            ("Designing a bridge out of popsicle sticks", E),
            ("Finding patterns in a set of numbers", M),
        ],
    ),
    (
        "On a free afternoon you would most likely...",
        [
            ("Learn a new programming trick", T),
            ("Take something apart to see how it works", E),
            ("Solve logic puzzles", M),
            ("Watch a documentary about space or animals", S),
        ],
    ),
    (
        "Which question do you find most interesting?",
        [
            ("How can a machine lift more with less effort?", E),
            ("Why do some numbers never repeat?", M),
            ("What causes earthquakes?", S),
            ("How does a phone recognise faces?", T),
        ],
    ),
    (
        "Which tool would you like to master?",
        [
            ("A microscope", S),
            ("A statistics package", M),
            ("A 3D printer", E),
            ("A code editor", T),
        ],
    ),
    (
        "In a group project you usually...",
        [
            ("Run the experiment and record observations", S),
            ("Set up the shared documents and apps", T),
            ("Plan how the pieces fit together", E),
            ("Check the calculations", M),
        ],
    ),
    (
        "Which job would you like to shadow for a day?",
        [
            ("A software developer", T),
            ("A marine biologist", S),
            ("An actuary", M),
            ("A civil engineer", E),
        ],
    ),
    (
        "Which achievement would make you proudest?",
        [
            ("Proving a difficult theorem", M),
            ("Launching an app people use every day", T),
            ("Discovering a new species", S),
            ("Designing an energy-efficient house", E),
        ],
    ),
    (
        "Which club would you join?",
        [
            ("Robotics club", E),
            ("Chemistry club", S),
            ("Coding club", T),
            ("Maths olympiad team", M),
        ],
    ),
    (
        "What kind of problem do you enjoy most?",
        [
            ("One with a single exact answer", M),
            ("One you can explore with experiments", S),
            ("One solved by automating a task", T),
            ("One where you build a working prototype", E),
        ],
    ),
    (
        "Which magazine would you pick up first?",
        [
            ("Popular Mechanics", E),
            ("Wired", T),
            ("National Geographic", S),
            ("A puzzle and brain-teaser book", M),
        ],
    ),
];

/// Question source backed by the bundled bank. Never fails.
#[derive(Debug, Default)]
pub struct StaticQuestionSource;

impl StaticQuestionSource {
    pub fn new() -> Self {
        Self
    }

    pub fn question_set(&self) -> QuestionSet {
        let questions = BANK
            .iter()
            .enumerate()
            .map(|(index, (text, choices))| {
                Question::from_arrays(
                    index,
                    *text,
                    (*choices).map(|(label, _)| label.to_string()),
                    (*choices).map(|(_, cat)| cat),
                )
            })
            .collect();
        QuestionSet::from_parts(
            format!("static-{}", Uuid::new_v4()),
            QuestionOrigin::Static,
            questions,
        )
    }
}

#[async_trait]
impl QuestionSource for StaticQuestionSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_questions(&self) -> Result<QuestionSet, CollaboratorError> {
        Ok(self.question_set())
    }
}
