use crate::classifier::zero_shot::ZeroShot;
use crate::config::ClassifierConfig;
use crate::model::{MatchRecord, RawRecord};
use serde_json::Value;
use tracing::{info, warn};

#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    /// Returns the records that scored above the threshold. Failed calls are
    /// logged and the record is dropped.
    async fn classify(&self, records: &[RawRecord], labels: &[String]) -> Vec<MatchRecord>;
}

pub struct RelevanceClassifier<Z: ZeroShot> {
    client: Z,
    threshold: f64,
    max_length: usize,
}

impl<Z: ZeroShot> RelevanceClassifier<Z> {
    pub fn new(client: Z, cfg: &ClassifierConfig) -> Self {
        Self {
            client,
            threshold: cfg.threshold,
            max_length: cfg.max_length,
        }
    }
}

#[async_trait::async_trait]
impl<Z: ZeroShot> Classifier for RelevanceClassifier<Z> {
    async fn classify(&self, records: &[RawRecord], labels: &[String]) -> Vec<MatchRecord> {
        let mut matches = Vec::new();

        for (i, record) in records.iter().enumerate() {
            info!(
                "Checking text {}/{}: {}...",
                i + 1,
                records.len(),
                truncate_chars(&record.title, 50)
            );
            let text = truncate_chars(&record.title, self.max_length);

            let result = match self.client.score(&text, labels).await {
                Ok(v) => v,
                Err(e) => {
                    warn!("Error querying classifier for text {}: {}", i + 1, e);
                    continue;
                }
            };

            if any_score_above(&result, self.threshold) {
                info!("Relevant Match Found: {}", text);
                matches.push(MatchRecord {
                    title: text,
                    date: record.date.clone(),
                    link: record.link.clone(),
                    result,
                });
            }
        }

        matches
    }
}

/// First `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// `scores` of a zero-shot response. The endpoint sometimes wraps a single
/// result in a one-element array.
fn scores(result: &Value) -> Vec<f64> {
    let obj = match result {
        Value::Array(items) => items.first(),
        other => Some(other),
    };
    obj.and_then(|o| o.get("scores"))
        .and_then(Value::as_array)
        .map(|s| s.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default()
}

/// Strictly greater: a score equal to the threshold does not count.
pub fn any_score_above(result: &Value, threshold: f64) -> bool {
    scores(result).into_iter().any(|s| s > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClassifierError;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned response per input text; unknown texts fail with a 503.
    struct FakeZeroShot {
        replies: HashMap<String, Value>,
        seen: Mutex<Vec<String>>,
    }

    impl FakeZeroShot {
        fn new(replies: &[(&str, Value)]) -> Self {
            Self {
                replies: replies.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ZeroShot for FakeZeroShot {
        async fn score(&self, text: &str, _labels: &[String]) -> Result<Value, ClassifierError> {
            self.seen.lock().unwrap().push(text.to_string());
            self.replies.get(text).cloned().ok_or(ClassifierError::Status {
                status: 503,
                body: "model loading".into(),
            })
        }
    }

    fn raw(title: &str, link: &str) -> RawRecord {
        RawRecord {
            title: title.into(),
            date: String::new(),
            link: link.into(),
        }
    }

    fn reply(score: f64) -> Value {
        json!({"sequence": "x", "labels": ["catering", "mittag"], "scores": [score, 0.0]})
    }

    fn config(threshold: f64, max_length: usize) -> ClassifierConfig {
        ClassifierConfig {
            threshold,
            max_length,
            ..ClassifierConfig::default()
        }
    }

    fn labels() -> Vec<String> {
        vec!["catering".into(), "mittag".into()]
    }

    #[test]
    fn threshold_is_strict() {
        assert!(!any_score_above(&reply(0.5), 0.5));
        assert!(any_score_above(&reply(0.5 + 1e-9), 0.5));
        assert!(!any_score_above(&reply(0.01), 0.01));
    }

    #[test]
    fn missing_or_malformed_scores_never_match() {
        assert!(!any_score_above(&json!({"error": "loading"}), 0.0));
        assert!(!any_score_above(&json!({"scores": "high"}), 0.0));
        assert!(!any_score_above(&json!({"scores": ["0.9"]}), 0.0));
    }

    #[test]
    fn array_wrapped_response_is_understood() {
        assert!(any_score_above(&json!([{"labels": ["a"], "scores": [0.9]}]), 0.5));
        assert!(!any_score_above(&json!([]), 0.0));
    }

    #[test]
    fn truncation_is_exact_and_char_based() {
        assert_eq!(truncate_chars("Schulverpflegung", 5), "Schul");
        assert_eq!(truncate_chars("kurz", 512), "kurz");
        assert_eq!(truncate_chars("Küche", 2), "Kü");
    }

    #[tokio::test]
    async fn keeps_relevant_records_with_payload() {
        let fake = FakeZeroShot::new(&[
            ("Catering Ausschreibung Schule", reply(0.9)),
            ("Straßenbau", reply(0.001)),
        ]);
        let classifier = RelevanceClassifier::new(fake, &config(0.01, 512));

        let records = vec![raw("Catering Ausschreibung Schule", "XYZ"), raw("Straßenbau", "ABC")];
        let matches = classifier.classify(&records, &labels()).await;

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].title, "Catering Ausschreibung Schule");
        assert_eq!(matches[0].link, "XYZ");
        assert_eq!(matches[0].result, reply(0.9));
    }

    #[tokio::test]
    async fn long_titles_are_sent_and_stored_truncated() {
        let long = "Mittagsverpflegung für Grundschulen im Landkreis";
        let fake = FakeZeroShot::new(&[("Mittagsverpflegung", reply(0.7))]);
        let classifier = RelevanceClassifier::new(fake, &config(0.01, 18));

        let matches = classifier.classify(&[raw(long, "L")], &labels()).await;

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].title, "Mittagsverpflegung");
        assert_eq!(matches[0].title.chars().count(), 18);
        assert_eq!(*classifier.client.seen.lock().unwrap(), vec!["Mittagsverpflegung"]);
    }

    #[tokio::test]
    async fn failed_call_skips_record_and_continues() {
        let fake = FakeZeroShot::new(&[("B", reply(0.9))]);
        let classifier = RelevanceClassifier::new(fake, &config(0.01, 512));

        let matches = classifier.classify(&[raw("A", "1"), raw("B", "2")], &labels()).await;

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].link, "2");
        assert_eq!(classifier.client.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn strict_regime_drops_low_scores() {
        let fake = FakeZeroShot::new(&[("A", reply(0.3)), ("B", reply(0.95))]);
        let classifier = RelevanceClassifier::new(fake, &config(0.8, 512));

        let matches = classifier.classify(&[raw("A", "1"), raw("B", "2")], &labels()).await;

        assert_eq!(matches.iter().map(|m| m.title.as_str()).collect::<Vec<_>>(), vec!["B"]);
    }
}
