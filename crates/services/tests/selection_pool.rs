use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use practice_core::{CategoryId, Difficulty, DifficultyFilter, SetId};
use serde_json::json;
use services::{
    DatasetService, DocumentFetcher, FetchError, PickError, SelectionEngine, SetDescriptor,
    SetDiscovery, StaticDiscovery,
};
use url::Url;

fn set_url(slug: &str) -> String {
    format!("https://sets.test/{slug}.json")
}

fn problem(tag: u32, difficulty: &str) -> serde_json::Value {
    json!({"title": format!("T{tag}"), "description": "d", "tag": tag, "difficulty": difficulty})
}

fn doc(problems: Vec<serde_json::Value>) -> String {
    json!({ "items": problems }).to_string()
}

struct MapFetcher {
    docs: HashMap<String, String>,
}

#[async_trait]
impl DocumentFetcher for MapFetcher {
    async fn fetch(&self, source: &Url) -> Result<String, FetchError> {
        self.docs
            .get(source.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: source.to_string(),
                status: 404,
            })
    }
}

/// Engine over the given slugs; slugs without a document fail to load.
fn build_engine(slugs: &[&str], docs: HashMap<String, String>) -> SelectionEngine {
    let fetcher = Arc::new(MapFetcher { docs });
    let dataset = Arc::new(DatasetService::new(fetcher));
    let sets = slugs
        .iter()
        .copied()
        .map(|slug| {
            SetDescriptor::new(
                SetId::new(slug).unwrap(),
                None,
                Url::parse(&set_url(slug)).unwrap(),
            )
        })
        .collect();
    let discovery: Arc<dyn SetDiscovery> = Arc::new(StaticDiscovery::new(sets));
    SelectionEngine::new(dataset, discovery)
}

#[tokio::test]
async fn any_filter_stays_in_category_and_covers_difficulties() {
    let engine = build_engine(
        &["mixed"],
        HashMap::from([(
            set_url("mixed"),
            doc(vec![
                problem(512, "easy"),
                problem(555, "medium"),
                problem(720, "hard"),
            ]),
        )]),
    );

    let mut seen = HashSet::new();
    for _ in 0..1000 {
        let picked = engine
            .pick(CategoryId::new(500), DifficultyFilter::Any)
            .await
            .unwrap();
        assert_eq!(picked.entry.category(), CategoryId::new(500));
        assert_eq!(picked.set_id.as_str(), "mixed");
        seen.insert(picked.entry.difficulty());
    }
    assert!(seen.contains(&Difficulty::Easy));
    assert!(seen.contains(&Difficulty::Medium));
    assert!(!seen.contains(&Difficulty::Hard));
}

#[tokio::test]
async fn unknown_category_returns_no_candidates() {
    let engine = build_engine(
        &["mixed"],
        HashMap::from([(set_url("mixed"), doc(vec![problem(512, "easy")]))]),
    );

    let result = engine
        .pick(CategoryId::new(999), DifficultyFilter::Any)
        .await;
    assert_eq!(result, Err(PickError::NoCandidates));

    // A difficulty constraint changes nothing for an absent category.
    let result = engine
        .pick(
            CategoryId::new(999),
            DifficultyFilter::Only(Difficulty::Easy),
        )
        .await;
    assert_eq!(result, Err(PickError::NoCandidates));
}

#[tokio::test]
async fn failed_sets_are_excluded_not_fatal() {
    // "broken" has no document behind it, so every load of it fails.
    let engine = build_engine(
        &["broken", "good"],
        HashMap::from([(set_url("good"), doc(vec![problem(501, "medium")]))]),
    );

    let picked = engine
        .pick(CategoryId::new(500), DifficultyFilter::Any)
        .await
        .unwrap();
    assert_eq!(picked.set_id.as_str(), "good");
    assert_eq!(picked.index, 0);
}

#[tokio::test]
async fn relaxation_drops_difficulty_when_category_has_no_match() {
    let engine = build_engine(
        &["mixed"],
        HashMap::from([(
            set_url("mixed"),
            doc(vec![problem(510, "medium"), problem(530, "medium")]),
        )]),
    );

    // Nothing in category 500 is hard; the pick falls back to the full
    // category rather than failing.
    let picked = engine
        .pick(
            CategoryId::new(500),
            DifficultyFilter::Only(Difficulty::Hard),
        )
        .await
        .unwrap();
    assert_eq!(picked.entry.category(), CategoryId::new(500));
    assert_eq!(picked.entry.difficulty(), Difficulty::Medium);
}

#[tokio::test]
async fn options_collapse_below_two() {
    let engine = build_engine(
        &["mixed"],
        HashMap::from([(
            set_url("mixed"),
            doc(vec![
                problem(512, "easy"),
                problem(520, "medium"),
                problem(540, "easy"),
                problem(700, "hard"),
            ]),
        )]),
    );

    // Two grades present: the unconstrained choice leads.
    assert_eq!(
        engine.difficulty_options(CategoryId::new(500)).await,
        vec![
            DifficultyFilter::Any,
            DifficultyFilter::Only(Difficulty::Easy),
            DifficultyFilter::Only(Difficulty::Medium),
        ]
    );

    // A single grade offers no real choice.
    assert_eq!(
        engine.difficulty_options(CategoryId::new(700)).await,
        vec![DifficultyFilter::Only(Difficulty::Hard)]
    );

    assert_eq!(engine.difficulty_options(CategoryId::new(999)).await, vec![]);
}
