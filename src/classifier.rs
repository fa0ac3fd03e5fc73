//! Naive Bayes spam classifier over per-message token presence.
//!
//! Scoring sweeps the whole trained vocabulary on every call, so `predict`
//! costs O(vocabulary size) regardless of how short the input is. Absent
//! vocabulary tokens contribute evidence through `ln(1 - p)`, taken from the
//! exact complement `(n - count + k) / (n + 2k)` so it never rounds to zero.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::tokenizer::Tokenizer;

pub const THRESHOLD: f64 = 0.5;

/// Smoothing used when nothing else is configured.
pub const DEFAULT_SMOOTHING: f64 = 0.5;

pub type Result<T> = std::result::Result<T, ClassifierError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// `predict` was called before `fit` completed
    #[error("model has not yet been trained")]
    NotFitted,

    #[error("smoothing constant must be a normal positive number no larger than {max:e}, got {0}", max = MAX_SMOOTHING)]
    InvalidSmoothing(f64),
}

/// Largest smoothing constant for which `n + 2k` stays finite.
pub const MAX_SMOOTHING: f64 = f64::MAX / 4.;

/// Whether `k` keeps every smoothed probability strictly inside (0, 1).
pub fn is_valid_smoothing(k: f64) -> bool {
    k.is_normal() && k > 0. && k <= MAX_SMOOTHING
}

/// A labeled training message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub is_spam: bool,
}

impl Message {
    pub fn new(text: impl Into<String>, is_spam: bool) -> Self {
        Message {
            text: text.into(),
            is_spam,
        }
    }

    pub fn spam(text: impl Into<String>) -> Self {
        Self::new(text, true)
    }

    pub fn ham(text: impl Into<String>) -> Self {
        Self::new(text, false)
    }
}

/// Summary of the classifier state reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    #[serde(rename = "hasbeentrained")]
    pub fitted: bool,
    #[serde(rename = "numobs")]
    pub observations: usize,
    #[serde(rename = "numtkns")]
    pub vocabulary_size: usize,
    #[serde(rename = "numspam")]
    pub spam_messages: usize,
    #[serde(rename = "numham")]
    pub ham_messages: usize,
}

pub struct Classifier {
    k: f64,
    vocabulary: HashSet<String>,
    spam_token_count: HashMap<String, usize>,
    ham_token_count: HashMap<String, usize>,
    spam_messages: usize,
    ham_messages: usize,
    observations: usize,
    fitted: bool,
    tokenizer: Tokenizer,
}

impl Classifier {
    /// Create an empty, unfitted classifier with smoothing constant `k`.
    pub fn new(k: f64) -> Result<Self> {
        if !is_valid_smoothing(k) {
            return Err(ClassifierError::InvalidSmoothing(k));
        }

        Ok(Self {
            k,
            vocabulary: HashSet::new(),
            spam_token_count: HashMap::new(),
            ham_token_count: HashMap::new(),
            spam_messages: 0,
            ham_messages: 0,
            observations: 0,
            fitted: false,
            tokenizer: Tokenizer::default(),
        })
    }

    /// Build a classifier and fit it in one step.
    pub fn trained<I>(k: f64, messages: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<Message>,
    {
        let mut classifier = Self::new(k)?;
        classifier.fit(messages);
        Ok(classifier)
    }

    /// Estimate token counts from `messages`.
    ///
    /// Any state from an earlier fit is discarded first; fits never merge.
    /// Each distinct token counts once per message no matter how often it
    /// repeats inside that message.
    pub fn fit<I>(&mut self, messages: I)
    where
        I: IntoIterator,
        I::Item: AsRef<Message>,
    {
        self.vocabulary.clear();
        self.spam_token_count.clear();
        self.ham_token_count.clear();
        self.spam_messages = 0;
        self.ham_messages = 0;
        self.observations = 0;

        for message in messages {
            let message = message.as_ref();

            let counts = if message.is_spam {
                self.spam_messages += 1;
                &mut self.spam_token_count
            } else {
                self.ham_messages += 1;
                &mut self.ham_token_count
            };

            for token in self.tokenizer.encode(&message.text) {
                *counts.entry(token.clone()).or_default() += 1;
                self.vocabulary.insert(token);
            }

            self.observations += 1;
        }

        self.fitted = true;

        if self.observations == 0 {
            warn!("Classifier fitted on an empty training set, predictions fall back to the smoothing prior");
        } else {
            info!(
                observations = self.observations,
                spam = self.spam_messages,
                ham = self.ham_messages,
                vocabulary = self.vocabulary.len(),
                "Classifier fitted"
            );
        }
    }

    /// Smoothed `(P(token | spam), P(token | ham))`.
    pub fn token_probabilities(&self, token: &str) -> (f64, f64) {
        let spam = self.spam_token_count.get(token).copied().unwrap_or(0) as f64;
        let ham = self.ham_token_count.get(token).copied().unwrap_or(0) as f64;

        let p_spam = (spam + self.k) / (self.spam_messages as f64 + 2. * self.k);
        let p_ham = (ham + self.k) / (self.ham_messages as f64 + 2. * self.k);

        (p_spam, p_ham)
    }

    /// `ln P(token | class)` when present, `ln(1 - P(token | class))` when absent.
    fn token_log_likelihoods(&self, token: &str, present: bool) -> (f64, f64) {
        let log_likelihood = |count: usize, messages: usize| {
            let count = count as f64;
            let messages = messages as f64;
            let numerator = if present {
                count + self.k
            } else {
                messages - count + self.k
            };
            numerator.ln() - (messages + 2. * self.k).ln()
        };

        let spam = self.spam_token_count.get(token).copied().unwrap_or(0);
        let ham = self.ham_token_count.get(token).copied().unwrap_or(0);

        (
            log_likelihood(spam, self.spam_messages),
            log_likelihood(ham, self.ham_messages),
        )
    }

    /// Posterior probability that `text` is spam.
    pub fn predict(&self, text: &str) -> Result<f64> {
        if !self.fitted {
            return Err(ClassifierError::NotFitted);
        }

        let tokens = self.tokenizer.encode(text);

        let (log_spam, log_ham) = self.vocabulary.iter().fold(
            (0., 0.),
            |(log_spam, log_ham): (f64, f64), token| {
                let (ln_spam, ln_ham) = self.token_log_likelihoods(token, tokens.contains(token));
                (log_spam + ln_spam, log_ham + ln_ham)
            },
        );

        Ok(posterior(log_spam, log_ham))
    }

    pub fn is_spam(&self, text: &str) -> Result<bool> {
        Ok(self.predict(text)? > THRESHOLD)
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            fitted: self.fitted,
            observations: self.observations,
            vocabulary_size: self.vocabulary.len(),
            spam_messages: self.spam_messages,
            ham_messages: self.ham_messages,
        }
    }

    pub fn smoothing(&self) -> f64 {
        self.k
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn vocabulary(&self) -> &HashSet<String> {
        &self.vocabulary
    }

    pub fn spam_token_counts(&self) -> &HashMap<String, usize> {
        &self.spam_token_count
    }

    pub fn ham_token_counts(&self) -> &HashMap<String, usize> {
        &self.ham_token_count
    }
}

impl AsRef<Message> for Message {
    fn as_ref(&self) -> &Message {
        self
    }
}

fn posterior(log_spam: f64, log_ham: f64) -> f64 {
    let p_spam = log_spam.exp();
    let p_ham = log_ham.exp();
    let total = p_spam + p_ham;

    if total.is_normal() {
        return p_spam / total;
    }

    // Both likelihoods underflowed; the ratio survives in log space.
    debug!(log_spam, log_ham, "Likelihoods underflowed, using log-odds");
    let log_odds = log_ham - log_spam;
    if log_odds.is_nan() {
        return 0.5;
    }
    1. / (1. + log_odds.exp())
}
