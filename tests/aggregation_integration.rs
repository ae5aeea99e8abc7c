//! Integration tests for the aggregation pipeline.
//!
//! These tests drive a [`ResultContainer`] the way a metasearch front end
//! does: several engines report batches (some concurrently), then the
//! container is finalized once. No network calls are made.

use std::collections::BTreeSet;
use std::sync::Arc;

use metasearch_results::orchestrator::scoring::calculate_score;
use metasearch_results::{
    EngineRegistry, EngineSettings, EngineSource, InMemoryRegistry, Infobox, RawItem, RawResult,
    ResultContainer,
};
use serde_json::json;

fn registry() -> Arc<InMemoryRegistry> {
    Arc::new(
        InMemoryRegistry::from_json(
            r#"{
                "a":          {"weight": 1.0, "categories": ["general"]},
                "b":          {"weight": 1.0, "categories": ["general"]},
                "wikipedia":  {"weight": 2.0, "categories": ["general", "science"]},
                "flickr":     {"weight": 1.0, "categories": ["images"]},
                "youtube":    {"weight": 1.0, "categories": ["videos"]}
            }"#,
        )
        .expect("valid registry"),
    )
}

fn hit(url: &str, content: &str) -> RawItem {
    RawItem::Result(RawResult::new(url).with_content(content))
}

#[test]
fn http_then_https_merges_into_https_with_richer_content() {
    let container = ResultContainer::new(registry());
    container
        .ingest("a", vec![hit("http://ex.com/p", "hi")])
        .expect("ingest a");
    container
        .ingest("b", vec![hit("https://ex.com/p/", "hello there")])
        .expect("ingest b");

    let output = container.finalize();
    assert_eq!(output.results.len(), 1);
    let merged = &output.results[0];
    assert_eq!(merged.url, "https://ex.com/p/");
    assert_eq!(merged.parsed_url.scheme, "https");
    assert_eq!(merged.content.as_deref(), Some("hello there"));
    assert_eq!(merged.positions, vec![1, 1]);
    assert_eq!(merged.engines, vec!["a", "b"]);
}

#[test]
fn lowercase_snippet_survives_merge_with_all_caps_twin() {
    let container = ResultContainer::new(registry());
    container
        .ingest("a", vec![hit("https://ex.com/rust", "RUST 2024 EDITION")])
        .expect("ingest a");
    container
        .ingest("b", vec![hit("https://ex.com/rust", "rust ed")])
        .expect("ingest b");

    let output = container.finalize();
    assert_eq!(output.results.len(), 1);
    assert_eq!(output.results[0].content.as_deref(), Some("rust ed"));
}

#[test]
fn dot_segments_and_idn_hosts_survive_ingest() {
    let container = ResultContainer::new(registry());
    container
        .ingest(
            "a",
            vec![
                hit("http://ex.com/a/../b", ""),
                hit("http://ex.com/b", ""),
                hit("https://www.b\u{fc}cher.de/", ""),
            ],
        )
        .expect("ingest a");

    let output = container.finalize();
    assert_eq!(output.merged_count, 3);
    assert!(output.results.iter().any(|r| r.host == "b\u{fc}cher.de"));
}

#[test]
fn https_first_is_kept_when_http_arrives_later() {
    let container = ResultContainer::new(registry());
    container
        .ingest("b", vec![hit("https://ex.com/p/", "hello there")])
        .expect("ingest b");
    container
        .ingest("a", vec![hit("http://ex.com/p", "hi")])
        .expect("ingest a");

    let output = container.finalize();
    assert_eq!(output.results[0].url, "https://ex.com/p/");
    assert_eq!(output.results[0].content.as_deref(), Some("hello there"));
    assert_eq!(output.results[0].engines, vec!["b", "a"]);
}

#[test]
fn suggestion_only_batch() {
    let container = ResultContainer::new(registry());
    container
        .ingest("a", vec![RawItem::Suggestion("foo".into())])
        .expect("ingest");
    assert_eq!(container.suggestions(), BTreeSet::from(["foo".to_string()]));
    assert_eq!(container.merged_count(), 0);

    let output = container.finalize();
    assert!(output.results.is_empty());
    assert_eq!(output.merged_count, 0);
}

#[test]
fn shared_infobox_id_keeps_longer_content() {
    let container = ResultContainer::new(registry());
    container
        .ingest_json("wikipedia", json!([{"infobox": {"id": "x", "content": "short"}}]))
        .expect("ingest wikipedia");
    container
        .ingest_json(
            "a",
            json!([{"infobox": {"id": "x", "content": "a much longer description"}}]),
        )
        .expect("ingest a");

    let output = container.finalize();
    assert_eq!(output.infoboxes.len(), 1);
    assert_eq!(
        output.infoboxes[0].content.as_deref(),
        Some("a much longer description")
    );
}

#[test]
fn infobox_without_id_is_standalone() {
    let container = ResultContainer::new(registry());
    container
        .ingest("a", vec![RawItem::Infobox(Infobox::default())])
        .expect("ingest a");
    container
        .ingest("b", vec![RawItem::Infobox(Infobox::default())])
        .expect("ingest b");
    assert_eq!(container.infoboxes().len(), 2);
}

#[test]
fn ten_results_of_one_category_stay_in_score_order() {
    let container = ResultContainer::new(registry());
    let batch: Vec<RawItem> = (1..=10)
        .map(|n| hit(&format!("https://site{n}.com/"), ""))
        .collect();
    container.ingest("a", batch).expect("ingest");

    let output = container.finalize();
    let hosts: Vec<_> = output.results.iter().map(|r| r.host.clone()).collect();
    let expected: Vec<_> = (1..=10).map(|n| format!("site{n}.com")).collect();
    assert_eq!(hosts, expected);
}

#[test]
fn categories_cluster_around_their_anchor() {
    let container = ResultContainer::new(registry());
    container
        .ingest(
            "a",
            vec![
                hit("https://g1.com", ""),
                hit("https://g2.com", ""),
                hit("https://g3.com", ""),
            ],
        )
        .expect("ingest a");
    container
        .ingest(
            "flickr",
            vec![hit("https://i1.com", ""), hit("https://i2.com", "")],
        )
        .expect("ingest flickr");

    let output = container.finalize();
    let hosts: Vec<_> = output.results.iter().map(|r| r.host.as_str()).collect();
    // Score order is g1, i1, g2, i2, g3; grouping pulls g2 and g3 up to g1.
    assert_eq!(hosts, vec!["g1.com", "g2.com", "g3.com", "i1.com", "i2.com"]);
}

#[test]
fn template_overrides_engine_category() {
    let container = ResultContainer::new(registry());
    container
        .ingest(
            "a",
            vec![
                hit("https://g1.com", ""),
                RawItem::Result(RawResult::new("https://v1.com").with_template("videos.html")),
                hit("https://g2.com", ""),
            ],
        )
        .expect("ingest a");
    container
        .ingest(
            "youtube",
            vec![RawItem::Result(
                RawResult::new("https://v2.com").with_template("videos.html"),
            )],
        )
        .expect("ingest youtube");

    let output = container.finalize();
    let hosts: Vec<_> = output.results.iter().map(|r| r.host.as_str()).collect();
    // Scores: g1 = 1, v2 = 1, v1 = 1/2, g2 = 1/3.
    // v1 joins v2's anchor; g2 joins g1's anchor ahead of both.
    assert_eq!(hosts, vec!["g1.com", "g2.com", "v2.com", "v1.com"]);
}

#[test]
fn weighted_engine_outranks_plain_engine() {
    let container = ResultContainer::new(registry());
    container
        .ingest("a", vec![hit("https://plain.com", "")])
        .expect("ingest a");
    container
        .ingest("wikipedia", vec![hit("https://weighted.com", "")])
        .expect("ingest wikipedia");

    let output = container.finalize();
    assert_eq!(output.results[0].host, "weighted.com");
    assert!((output.results[0].score - 2.0).abs() < f64::EPSILON);
}

#[test]
fn cross_engine_result_outranks_single_engine_top_hit() {
    let container = ResultContainer::new(registry());
    container
        .ingest(
            "a",
            vec![hit("https://solo.com", ""), hit("https://shared.com", "")],
        )
        .expect("ingest a");
    container
        .ingest("b", vec![hit("https://shared.com", "")])
        .expect("ingest b");

    let output = container.finalize();
    // shared: 2/2 + 2/1 = 3; solo: 1/1 = 1
    assert_eq!(output.results[0].host, "shared.com");
    assert!((output.results[0].score - 3.0).abs() < f64::EPSILON);
}

#[test]
fn stored_scores_match_calculator() {
    let registry = registry();
    let container = ResultContainer::new(registry.clone());
    container
        .ingest("wikipedia", vec![hit("https://x.com", ""), hit("https://y.com", "")])
        .expect("ingest wikipedia");
    container
        .ingest("a", vec![hit("https://y.com", "")])
        .expect("ingest a");

    let output = container.finalize();
    for result in &output.results {
        let expected = calculate_score(result, registry.as_ref());
        assert!((result.score - expected).abs() < f64::EPSILON);
    }
}

#[test]
fn side_channels_survive_finalization() {
    let container = ResultContainer::new(registry());
    container
        .ingest_json(
            "a",
            json!([
                {"answer": "42"},
                {"suggestion": "forty two"},
                {"number_of_results": 1000},
                {"url": "https://answer.com", "title": "Answer"}
            ]),
        )
        .expect("ingest a");
    container
        .ingest_json("b", json!([{"number_of_results": 2500}]))
        .expect("ingest b");

    let output = container.finalize();
    assert!(output.answers.contains("42"));
    assert!(output.suggestions.contains("forty two"));
    assert_eq!(output.number_of_results, 2500);
    assert_eq!(output.results[0].positions, vec![4]);
}

#[test]
fn output_serializes_to_json() {
    let container = ResultContainer::new(registry());
    container
        .ingest_json(
            "a",
            json!([{"url": "https://www.ex.com/a?b=c", "title": "T", "thumbnail": "t.png"}]),
        )
        .expect("ingest");
    let output = container.finalize();

    let value = serde_json::to_value(&output).expect("serialize");
    let first = &value["results"][0];
    assert_eq!(first["host"], "ex.com");
    assert_eq!(first["parsed_url"]["query"], "b=c");
    assert_eq!(first["thumbnail"], "t.png");
    assert_eq!(first["positions"], json!([1]));
    assert_eq!(value["merged_count"], 1);
}

#[test]
fn concurrent_engines_share_one_container() {
    let registry = registry();
    let container = Arc::new(ResultContainer::new(registry.clone()));
    let engines = ["a", "b", "wikipedia", "flickr", "youtube"];

    let handles: Vec<_> = engines
        .iter()
        .map(|engine| {
            let container = Arc::clone(&container);
            let engine = (*engine).to_string();
            std::thread::spawn(move || {
                let batch: Vec<RawItem> = (1..=20)
                    .map(|n| hit(&format!("https://common.com/{n}"), &engine))
                    .collect();
                container.ingest(&engine, batch).expect("ingest");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker finished");
    }

    let container = Arc::try_unwrap(container).expect("all workers done");
    assert_eq!(container.merged_count(), 20);
    let output = container.finalize();
    for result in &output.results {
        assert_eq!(result.positions.len(), engines.len());
        let distinct: BTreeSet<_> = result.engines.iter().collect();
        assert_eq!(distinct.len(), engines.len());
    }
    for engine in engines {
        let stats = registry.stats(engine).expect("known engine");
        assert_eq!(stats.search_count, 1);
        assert_eq!(stats.result_count, 20);
        assert!(stats.score_count > 0.0);
    }
}

struct StaticSource {
    id: &'static str,
    items: Vec<RawItem>,
}

impl EngineSource for StaticSource {
    fn id(&self) -> &str {
        self.id
    }

    async fn fetch(&self, _query: &str) -> metasearch_results::Result<Vec<RawItem>> {
        Ok(self.items.clone())
    }
}

#[tokio::test]
async fn fan_out_driver_aggregates_sources() {
    let sources = [
        StaticSource {
            id: "a",
            items: vec![hit("http://ex.com/p", "hi"), hit("https://a-only.com", "")],
        },
        StaticSource {
            id: "b",
            items: vec![
                RawItem::Suggestion("ex".into()),
                hit("https://ex.com/p/", "hello there"),
            ],
        },
    ];
    let output = metasearch_results::aggregate(
        "ex",
        &sources,
        registry(),
        &metasearch_results::AggregateConfig::default(),
    )
    .await
    .expect("aggregate");

    assert_eq!(output.merged_count, 2);
    let ex = output
        .results
        .iter()
        .find(|r| r.host == "ex.com")
        .expect("ex.com present");
    assert_eq!(ex.url, "https://ex.com/p/");
    let mut positions = ex.positions.clone();
    positions.sort_unstable();
    assert_eq!(positions, vec![1, 2]);
    assert!(output.suggestions.contains("ex"));
}

#[test]
fn registry_settings_round_trip_from_json() {
    let registry = registry();
    let settings: EngineSettings = registry.settings("wikipedia").expect("known engine");
    assert_eq!(settings.categories[0], "general");
}
