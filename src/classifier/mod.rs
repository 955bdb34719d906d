// Relevance classification: zero-shot HTTP client plus thresholding.

pub mod relevance;
pub mod zero_shot;

pub use relevance::{Classifier, RelevanceClassifier};
pub use zero_shot::HuggingFaceClient;
