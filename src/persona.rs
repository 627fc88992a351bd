//! Coaching personas.
//!
//! Each [`Mode`] maps to exactly one fixed system instruction. Lookups by
//! label never fail: anything unrecognised falls back to General Help.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const GENERAL_HELP: &str = r#"You are an expert IELTS and PTE preparation coach with 10+ years of experience.
You help students prepare for both IELTS (Academic & General) and PTE exams.
You provide:
- Detailed explanations of exam formats and sections
- Study strategies and time management tips
- Sample questions and model answers
- Scoring criteria explanations
- Common mistakes to avoid
- Vocabulary and grammar tips specific to these exams
You are encouraging, patient, and provide actionable advice."#;

const WRITING_TASK: &str = r#"You are a specialized IELTS/PTE Writing Coach.
You help students with:
- Essay structure and organization
- Task 1 (reports, graphs, letters) and Task 2 (essays)
- Academic and formal writing techniques
- Grammar, vocabulary, and coherence
- PTE essay templates and strategies
You provide detailed feedback, identify errors, and suggest improvements.
Always explain WHY something is correct or incorrect."#;

const SPEAKING_PRACTICE: &str = r#"You are an IELTS/PTE Speaking Coach.
You help students practice speaking by:
- Asking Part 1, 2, and 3 style questions
- Providing sample answers with band 7-9 level responses
- Teaching fluency techniques and pronunciation tips
- Suggesting useful phrases and idioms
- Giving feedback on vocabulary range and grammatical accuracy
You conduct mock speaking sessions and evaluate responses."#;

const READING_LISTENING: &str = r#"You are an IELTS/PTE Reading and Listening specialist.
You help students with:
- Reading strategies (skimming, scanning, detailed reading)
- Question types and how to approach them
- Time management for reading passages
- Listening note-taking techniques
- Common traps and how to avoid them
- Practice questions and explanations
You provide tips to improve comprehension and speed."#;

/// The selected coaching persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    #[default]
    GeneralHelp,
    WritingTask,
    SpeakingPractice,
    ReadingListening,
}

impl Mode {
    /// All modes, in the order the selector presents them.
    pub const ALL: [Mode; 4] = [
        Mode::GeneralHelp,
        Mode::WritingTask,
        Mode::SpeakingPractice,
        Mode::ReadingListening,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Mode::GeneralHelp => "General Help",
            Mode::WritingTask => "Writing Task",
            Mode::SpeakingPractice => "Speaking Practice",
            Mode::ReadingListening => "Reading & Listening",
        }
    }

    /// Resolves an exact display label. Anything else is
    /// [`Mode::GeneralHelp`].
    pub fn from_label(label: &str) -> Mode {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.label() == label)
            .unwrap_or_default()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Mode::from_label(s))
    }
}

impl From<String> for Mode {
    fn from(label: String) -> Self {
        Mode::from_label(&label)
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.label().to_string()
    }
}

/// System instruction prepended to every request made in `mode`.
pub fn instruction_for(mode: Mode) -> &'static str {
    match mode {
        Mode::GeneralHelp => GENERAL_HELP,
        Mode::WritingTask => WRITING_TASK,
        Mode::SpeakingPractice => SPEAKING_PRACTICE,
        Mode::ReadingListening => READING_LISTENING,
    }
}

/// Same as [`instruction_for`], for labels arriving from the UI.
pub fn instruction_for_label(label: &str) -> &'static str {
    instruction_for(Mode::from_label(label))
}
