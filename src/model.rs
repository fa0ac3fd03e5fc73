//! Shared handle to the classifier currently serving predictions.

use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use crate::classifier::{Classifier, ClassifierError};

/// Holds the published classifier snapshot.
///
/// Readers take a cheap `Arc` clone and score without holding the lock.
/// Retraining builds a new classifier off to the side and swaps it in with
/// [`ModelHandle::publish`], so in-flight predictions keep their snapshot.
#[derive(Clone)]
pub struct ModelHandle {
    current: Arc<RwLock<Arc<Classifier>>>,
}

impl ModelHandle {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(classifier))),
        }
    }

    /// A handle holding an unfitted classifier.
    pub fn unfitted(k: f64) -> Result<Self, ClassifierError> {
        Ok(Self::new(Classifier::new(k)?))
    }

    pub fn current(&self) -> Arc<Classifier> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn publish(&self, classifier: Classifier) {
        let info = classifier.info();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(classifier);
        info!(
            observations = info.observations,
            vocabulary = info.vocabulary_size,
            "Published classifier"
        );
    }
}
