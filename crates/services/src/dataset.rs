use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use practice_core::{Difficulty, Example, Problem, ProblemSet, SetId};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::discovery::SetDescriptor;
use crate::error::DatasetError;
use crate::fetch::DocumentFetcher;

type LoadFuture = Shared<BoxFuture<'static, Result<Arc<ProblemSet>, DatasetError>>>;

struct CacheSlot {
    generation: u64,
    future: LoadFuture,
}

struct CacheState {
    entries: HashMap<SetId, CacheSlot>,
    next_generation: u64,
}

/// Fetches, parses, and caches problem-set documents keyed by set id.
///
/// Concurrent loads of the same id share a single in-flight future, so a
/// document is fetched at most once no matter how many navigations race.
/// Successful loads stay cached for the service's lifetime; failed loads
/// are evicted so the next call retries from scratch.
pub struct DatasetService {
    fetcher: Arc<dyn DocumentFetcher>,
    state: Mutex<CacheState>,
}

impl DatasetService {
    #[must_use]
    pub fn new(fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self {
            fetcher,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                next_generation: 0,
            }),
        }
    }

    /// Loads the set described by `descriptor`, joining an in-flight load
    /// or reusing the cached document when one exists.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError::Fetch` when the document cannot be retrieved
    /// and `DatasetError::Invalid` when it fails validation. Neither
    /// outcome is cached.
    pub async fn load(&self, descriptor: &SetDescriptor) -> Result<Arc<ProblemSet>, DatasetError> {
        let (future, generation) = self.slot(descriptor)?;
        let result = future.await;
        if result.is_err() {
            self.evict(descriptor.id(), generation);
        }
        result
    }

    fn slot(&self, descriptor: &SetDescriptor) -> Result<(LoadFuture, u64), DatasetError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| DatasetError::Internal(e.to_string()))?;

        if let Some(slot) = state.entries.get(descriptor.id()) {
            debug!(target: "dataset", set = %descriptor.id(), "Joining existing load");
            return Ok((slot.future.clone(), slot.generation));
        }

        let generation = state.next_generation;
        state.next_generation += 1;
        let future = run_load(Arc::clone(&self.fetcher), descriptor.clone())
            .boxed()
            .shared();
        state.entries.insert(
            descriptor.id().clone(),
            CacheSlot {
                generation,
                future: future.clone(),
            },
        );
        debug!(target: "dataset", set = %descriptor.id(), "Starting load");
        Ok((future, generation))
    }

    // Removes a failed entry, but only if it is still the one that failed.
    // A retry issued by another caller may already occupy the slot.
    fn evict(&self, id: &SetId, generation: u64) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        let Some(slot) = state.entries.get(id) else {
            return;
        };
        if slot.generation == generation {
            state.entries.remove(id);
            warn!(target: "dataset", set = %id, "Evicted failed load; next call retries");
        }
    }
}

async fn run_load(
    fetcher: Arc<dyn DocumentFetcher>,
    descriptor: SetDescriptor,
) -> Result<Arc<ProblemSet>, DatasetError> {
    let raw = fetcher
        .fetch(descriptor.source())
        .await
        .map_err(|e| DatasetError::Fetch {
            id: descriptor.id().clone(),
            message: e.to_string(),
        })?;
    let set = parse_document(descriptor.id(), &raw)?;
    info!(
        target: "dataset",
        set = %descriptor.id(),
        problems = set.problem_count(),
        "Loaded problem set"
    );
    Ok(Arc::new(set))
}

//
// ─── Document Parsing ───
//

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    title: Option<String>,
    #[serde(alias = "coding_practice", alias = "problems")]
    items: Vec<RawProblem>,
}

#[derive(Debug, Deserialize)]
struct RawProblem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    constraints: Option<String>,
    #[serde(default)]
    examples: RawExamples,
    #[serde(alias = "tag")]
    category_tag: u32,
    #[serde(default)]
    difficulty: Option<String>,
}

/// External datasets ship `examples` either as a list or as a single
/// object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawExamples {
    Many(Vec<RawExample>),
    One(RawExample),
}

impl Default for RawExamples {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl RawExamples {
    fn into_vec(self) -> Vec<RawExample> {
        match self {
            Self::Many(examples) => examples,
            Self::One(example) => vec![example],
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawExample {
    #[serde(default)]
    input: Option<serde_json::Value>,
    #[serde(default)]
    output: Option<serde_json::Value>,
}

fn parse_document(id: &SetId, raw: &str) -> Result<ProblemSet, DatasetError> {
    let document: RawDocument =
        serde_json::from_str(raw).map_err(|e| DatasetError::Invalid {
            id: id.clone(),
            message: e.to_string(),
        })?;

    let problems = document
        .items
        .into_iter()
        .enumerate()
        .map(|(index, item)| build_problem(index, item))
        .collect();

    ProblemSet::new(id.clone(), document.title, problems).map_err(|e| DatasetError::Invalid {
        id: id.clone(),
        message: e.to_string(),
    })
}

fn build_problem(index: usize, raw: RawProblem) -> Problem {
    let title = raw
        .title
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("Problem {}", index + 1));
    let difficulty = Difficulty::from_label(raw.difficulty.as_deref());

    let mut problem = Problem::new(title, raw.description, raw.category_tag, difficulty);
    if let Some(constraints) = raw.constraints {
        problem = problem.with_constraints(constraints);
    }
    let examples: Vec<Example> = raw
        .examples
        .into_vec()
        .into_iter()
        .filter_map(build_example)
        .collect();
    if !examples.is_empty() {
        problem = problem.with_examples(examples);
    }
    problem
}

// An example with neither side present carries no information; one with a
// non-string side keeps its JSON rendering, matching how upstream datasets
// mix strings and structured values.
fn build_example(raw: RawExample) -> Option<Example> {
    if raw.input.is_none() && raw.output.is_none() {
        return None;
    }
    Some(Example::new(
        raw.input.map(value_to_text).unwrap_or_default(),
        raw.output.map(value_to_text).unwrap_or_default(),
    ))
}

fn value_to_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use futures::channel::oneshot;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    fn build_descriptor(slug: &str) -> SetDescriptor {
        SetDescriptor::new(
            SetId::new(slug).unwrap(),
            None,
            Url::parse(&format!("https://example.test/{slug}.json")).unwrap(),
        )
    }

    fn sample_document() -> String {
        r#"{
            "title": "Algorithms I",
            "items": [
                {"title": "Two Sum", "description": "d", "tag": 512, "difficulty": "easy",
                 "examples": [{"input": "[2,7]", "output": "[0,1]"}]},
                {"description": "d2", "category_tag": 101, "difficulty": "HARD",
                 "examples": {"input": 3, "output": [1, 2]}}
            ]
        }"#
        .to_owned()
    }

    struct StaticFetcher {
        body: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DocumentFetcher for StaticFetcher {
        async fn fetch(&self, _source: &Url) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.clone())
        }
    }

    struct FlakyFetcher {
        body: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DocumentFetcher for FlakyFetcher {
        async fn fetch(&self, source: &Url) -> Result<String, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                return Err(FetchError::Transport {
                    url: source.to_string(),
                    message: "connection reset".into(),
                });
            }
            Ok(self.body.clone())
        }
    }

    struct GatedFetcher {
        body: String,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DocumentFetcher for GatedFetcher {
        async fn fetch(&self, source: &Url) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self
                .gate
                .lock()
                .unwrap()
                .take();
            if let Some(gate) = gate {
                gate.await.map_err(|_| FetchError::Transport {
                    url: source.to_string(),
                    message: "gate dropped".into(),
                })?;
            }
            Ok(self.body.clone())
        }
    }

    #[test]
    fn parses_aliases_fallback_titles_and_example_shapes() {
        let set = parse_document(&SetId::new("algo1").unwrap(), &sample_document()).unwrap();

        assert_eq!(set.title(), Some("Algorithms I"));
        assert_eq!(set.problem_count(), 2);

        let first = set.problem(0).unwrap();
        assert_eq!(first.title(), "Two Sum");
        assert_eq!(first.category_tag(), 512);
        assert_eq!(first.difficulty(), Difficulty::Easy);
        assert_eq!(first.examples().len(), 1);

        let second = set.problem(1).unwrap();
        assert_eq!(second.title(), "Problem 2");
        assert_eq!(second.difficulty(), Difficulty::Hard);
        assert_eq!(second.examples().len(), 1);
        assert_eq!(second.examples()[0].input(), "3");
        assert_eq!(second.examples()[0].output(), "[1,2]");
    }

    #[test]
    fn parses_coding_practice_alias() {
        let raw = r#"{"coding_practice": [{"description": "d", "tag": 100}]}"#;
        let set = parse_document(&SetId::new("s").unwrap(), raw).unwrap();
        assert_eq!(set.problem_count(), 1);
        assert_eq!(set.problem(0).unwrap().difficulty(), Difficulty::Unknown);
    }

    #[test]
    fn empty_example_objects_are_dropped() {
        let raw = r#"{"items": [{"description": "d", "tag": 100,
            "examples": [{}, {"input": "x"}]}]}"#;
        let set = parse_document(&SetId::new("s").unwrap(), raw).unwrap();
        let examples = set.problem(0).unwrap().examples();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].input(), "x");
        assert_eq!(examples[0].output(), "");
    }

    #[test]
    fn rejects_empty_and_malformed_documents() {
        let id = SetId::new("s").unwrap();
        assert!(matches!(
            parse_document(&id, r#"{"items": []}"#),
            Err(DatasetError::Invalid { .. })
        ));
        assert!(matches!(
            parse_document(&id, "not json"),
            Err(DatasetError::Invalid { .. })
        ));
        // a problem without a category tag fails the whole document
        assert!(matches!(
            parse_document(&id, r#"{"items": [{"description": "d"}]}"#),
            Err(DatasetError::Invalid { .. })
        ));
    }

    #[tokio::test]
    async fn loads_issued_before_first_resolution_share_one_fetch() {
        let (release, gate) = oneshot::channel();
        let fetcher = Arc::new(GatedFetcher {
            body: sample_document(),
            gate: Mutex::new(Some(gate)),
            calls: AtomicUsize::new(0),
        });
        let service = Arc::new(DatasetService::new(fetcher.clone()));
        let descriptor = build_descriptor("algo1");

        let first = tokio::spawn({
            let service = Arc::clone(&service);
            let descriptor = descriptor.clone();
            async move { service.load(&descriptor).await }
        });
        let second = tokio::spawn({
            let service = Arc::clone(&service);
            let descriptor = descriptor.clone();
            async move { service.load(&descriptor).await }
        });

        // Let both callers register against the pending load before the
        // fetch is allowed to complete.
        tokio::task::yield_now().await;
        release.send(()).unwrap();

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resolved_set_is_reused_without_refetching() {
        let fetcher = Arc::new(StaticFetcher {
            body: sample_document(),
            calls: AtomicUsize::new(0),
        });
        let service = DatasetService::new(fetcher.clone());
        let descriptor = build_descriptor("algo1");

        let first = service.load(&descriptor).await.unwrap();
        let second = service.load(&descriptor).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_is_not_cached_and_retries() {
        let fetcher = Arc::new(FlakyFetcher {
            body: sample_document(),
            calls: AtomicUsize::new(0),
        });
        let service = DatasetService::new(fetcher.clone());
        let descriptor = build_descriptor("algo1");

        let error = service.load(&descriptor).await.unwrap_err();
        assert!(matches!(error, DatasetError::Fetch { .. }));

        let set = service.load(&descriptor).await.unwrap();
        assert_eq!(set.problem_count(), 2);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalid_document_is_not_cached() {
        struct EmptyThenFull {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl DocumentFetcher for EmptyThenFull {
            async fn fetch(&self, _source: &Url) -> Result<String, FetchError> {
                let call = self.calls.fetch_add(1, Ordering::SeqCst);
                if call == 0 {
                    Ok(r#"{"items": []}"#.to_owned())
                } else {
                    Ok(sample_document())
                }
            }
        }

        let fetcher = Arc::new(EmptyThenFull {
            calls: AtomicUsize::new(0),
        });
        let service = DatasetService::new(fetcher.clone());
        let descriptor = build_descriptor("algo1");

        let error = service.load(&descriptor).await.unwrap_err();
        assert!(matches!(error, DatasetError::Invalid { .. }));
        assert!(service.load(&descriptor).await.is_ok());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }
}
