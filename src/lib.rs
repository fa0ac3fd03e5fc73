//! Naive Bayes spam filtering.
//!
//! A [`Classifier`] is fitted once from a labeled [`Corpus`] and then answers
//! spam probabilities for arbitrary text. The [`server`] module exposes it
//! over HTTP.

pub mod classifier;
pub mod config;
pub mod corpus;
pub mod model;
pub mod remote;
pub mod server;
pub mod tokenizer;

pub use classifier::{Classifier, ClassifierError, Message, ModelInfo};
pub use config::{Config, ConfigError};
pub use corpus::{Corpus, CorpusError, MessageClass};
pub use model::ModelHandle;
pub use remote::{RemoteAnswer, RemoteError, RemoteScorer};
pub use tokenizer::Tokenizer;
