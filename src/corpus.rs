//! Labeled training corpus loaded from CSV.
//!
//! The file carries a header row followed by `label,text` records. A label of
//! `spam` marks the positive class; every other label is ham.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Deserialize;
use std::fs::File;
use std::io;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

use crate::classifier::Message;

pub type Result<T> = std::result::Result<T, CorpusError>;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("failed to open corpus {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed corpus record: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    Spam,
    Ham,
}

impl FromStr for MessageClass {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "spam" => Ok(MessageClass::Spam),
            "ham" => Ok(MessageClass::Ham),
            _ => Err(()),
        }
    }
}

#[derive(Deserialize)]
struct Record(String, String);

#[derive(Debug, Default)]
pub struct Corpus {
    spam: Vec<Message>,
    ham: Vec<Message>,
}

impl Corpus {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CorpusError::Open {
            path: path.display().to_string(),
            source,
        })?;

        let corpus = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            spam = corpus.spam.len(),
            ham = corpus.ham.len(),
            "Loaded training corpus"
        );
        Ok(corpus)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let mut corpus = Corpus::default();

        for (row, record) in reader.deserialize::<Record>().enumerate() {
            let Record(label, text) = record?;

            if label.is_empty() || text.is_empty() {
                debug!(row = row + 1, "Skipping record with empty label or text");
                continue;
            }

            if label == "spam" {
                corpus.spam.push(Message::spam(text));
            } else {
                corpus.ham.push(Message::ham(text));
            }
        }

        Ok(corpus)
    }

    /// All messages, spam first.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.spam.iter().chain(self.ham.iter())
    }

    pub fn of_class(&self, class: MessageClass) -> &[Message] {
        match class {
            MessageClass::Spam => &self.spam,
            MessageClass::Ham => &self.ham,
        }
    }

    /// Text of a random message from `class`, if that class has any.
    pub fn random<R: Rng + ?Sized>(&self, class: MessageClass, rng: &mut R) -> Option<&str> {
        self.of_class(class)
            .choose(rng)
            .map(|message| message.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.spam.len() + self.ham.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
