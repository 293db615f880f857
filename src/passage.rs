use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

static PASSAGE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/passages");

const PASSAGE_FILE: &str = "passages.json";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    #[default]
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}

/// Reference text a session is typed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    pub id: String,
    pub text: String,
    pub difficulty: Difficulty,
}

impl Passage {
    pub fn new(id: impl Into<String>, text: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            difficulty,
        }
    }

    /// A user supplied prompt; surrounding whitespace is dropped.
    pub fn custom(text: &str) -> Self {
        Self::new("custom", text.trim(), Difficulty::default())
    }

    pub fn is_custom(&self) -> bool {
        self.id == "custom"
    }
}

#[derive(Deserialize)]
struct RawPassage {
    id: String,
    text: String,
}

#[derive(Deserialize)]
struct RawLibrary {
    easy: Vec<RawPassage>,
    medium: Vec<RawPassage>,
    hard: Vec<RawPassage>,
}

/// Every built-in passage, grouped by difficulty.
#[derive(Debug, Clone)]
pub struct PassageLibrary {
    easy: Vec<Passage>,
    medium: Vec<Passage>,
    hard: Vec<Passage>,
}

impl PassageLibrary {
    /// Load the passages bundled into the binary.
    pub fn load() -> Result<Self> {
        let file = PASSAGE_DIR
            .get_file(PASSAGE_FILE)
            .ok_or_else(|| Error::MissingPassages(PASSAGE_FILE.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| Error::MissingPassages(format!("{PASSAGE_FILE} is not utf-8")))?;
        Self::from_json(contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawLibrary = serde_json::from_str(json)?;
        let convert = |items: Vec<RawPassage>, difficulty| {
            items
                .into_iter()
                .map(|p| Passage::new(p.id, p.text, difficulty))
                .collect::<Vec<_>>()
        };

        Ok(Self {
            easy: convert(raw.easy, Difficulty::Easy),
            medium: convert(raw.medium, Difficulty::Medium),
            hard: convert(raw.hard, Difficulty::Hard),
        })
    }

    pub fn passages(&self, difficulty: Difficulty) -> &[Passage] {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Passage> {
        Difficulty::ALL
            .iter()
            .flat_map(|d| self.passages(*d))
            .find(|p| p.id == id)
    }

    pub fn random<R: Rng + ?Sized>(&self, difficulty: Difficulty, rng: &mut R) -> Result<Passage> {
        self.passages(difficulty)
            .choose(rng)
            .cloned()
            .ok_or(Error::EmptyDifficulty(difficulty))
    }

    /// Like [`random`](Self::random) but avoids `current_id` whenever another
    /// passage of the same difficulty exists.
    pub fn random_except<R: Rng + ?Sized>(
        &self,
        difficulty: Difficulty,
        current_id: &str,
        rng: &mut R,
    ) -> Result<Passage> {
        let candidates: Vec<&Passage> = self
            .passages(difficulty)
            .iter()
            .filter(|p| p.id != current_id)
            .collect();

        match candidates.choose(rng) {
            Some(p) => Ok((*p).clone()),
            None => self.random(difficulty, rng),
        }
    }
}
