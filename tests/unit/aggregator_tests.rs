/*!
 * Tests for per-video aggregation and the translation fallback policy
 */

use std::time::Duration;

use transcript_gateway::aggregator::{AggregateResult, Aggregator};
use transcript_gateway::errors::ProviderError;
use transcript_gateway::formatter::{OutputFormat, Rendered};
use transcript_gateway::providers::mock::MockProvider;
use transcript_gateway::request_parser::{AggregateRequest, RawRequest};
use transcript_gateway::transcript::TranslationTarget;

use crate::common::{DISABLED_MESSAGE, aggregator_with, sample_provider};

fn request(video_ids: &[&str], formats: &[OutputFormat]) -> AggregateRequest {
    AggregateRequest {
        video_ids: video_ids.iter().map(|id| id.to_string()).collect(),
        formats: formats.to_vec(),
    }
}

fn default_policy() -> Vec<TranslationTarget> {
    vec![TranslationTarget::new("en", "en", false)]
}

fn txt(rendered: &Rendered) -> &str {
    match rendered {
        Rendered::Text(text) => text,
        Rendered::Cues(_) => panic!("expected text"),
    }
}

#[tokio::test]
async fn test_native_tracks_should_be_keyed_by_language_and_origin() {
    let (provider, aggregator) = aggregator_with(sample_provider(), default_policy());

    let tracks = aggregator.add_video("A", &[OutputFormat::Txt]).await.unwrap();

    let keys: Vec<&str> = tracks.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["en", "en_generated"]);
    assert!(!tracks["en"].is_generated);
    assert!(tracks["en_generated"].is_generated);
    assert_eq!(txt(&tracks["en_generated"].content["txt"]), "[en-auto] first line\n[en-auto] second line");
    // "en" is already present, so the default policy translates nothing
    assert!(provider.translations().is_empty());
}

#[tokio::test]
async fn test_missing_policy_language_should_be_translated_from_first_track() {
    let policy = vec![TranslationTarget::new("de", "de", false)];
    let (provider, aggregator) = aggregator_with(sample_provider(), policy);

    let tracks = aggregator.add_video("A", &[OutputFormat::Txt]).await.unwrap();

    assert_eq!(tracks.len(), 3);
    assert_eq!(txt(&tracks["de"].content["txt"]), "[de] [en] first line\n[de] [en] second line");
    assert_eq!(tracks["de"].language_code, "de");
    assert_eq!(provider.translations(), vec![("en".to_string(), "de".to_string())]);
}

#[tokio::test]
async fn test_forced_policy_entry_should_keep_native_track() {
    let policy = vec![TranslationTarget::new("en", "en", true)];
    let (provider, aggregator) = aggregator_with(sample_provider(), policy);

    let tracks = aggregator.add_video("A", &[OutputFormat::Txt]).await.unwrap();

    let keys: Vec<&str> = tracks.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["en", "en_generated", "en_translated"]);
    assert_eq!(txt(&tracks["en"].content["txt"]), "[en] first line\n[en] second line");
    assert_eq!(
        txt(&tracks["en_translated"].content["txt"]),
        "[en] [en] first line\n[en] [en] second line"
    );
    assert!(tracks["en_translated"].url.ends_with("&tlang=en"));
    assert_eq!(provider.translations().len(), 1);
}

#[tokio::test]
async fn test_translation_of_generated_only_track_should_not_replace_it() {
    let provider = MockProvider::new().with_video(
        "G",
        vec![(MockProvider::track("G", "en", true, true), MockProvider::cues("en"))],
    );
    let (provider, aggregator) = aggregator_with(provider, default_policy());

    let tracks = aggregator.add_video("G", &[OutputFormat::Txt]).await.unwrap();

    let keys: Vec<&str> = tracks.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["en", "en_generated"]);
    assert_eq!(tracks["en_generated"].url, "mock://G/en/asr");
    assert_eq!(txt(&tracks["en_generated"].content["txt"]), "[en] first line\n[en] second line");
    assert_eq!(txt(&tracks["en"].content["txt"]), "[en] [en] first line\n[en] [en] second line");
    assert_eq!(provider.translations(), vec![("en_generated".to_string(), "en".to_string())]);
}

#[tokio::test]
async fn test_untranslatable_first_track_should_skip_policy_silently() {
    let (provider, aggregator) = aggregator_with(sample_provider(), default_policy());

    // D lists a non-translatable `fr` first; its generated `en` is never used as a source
    let tracks = aggregator.add_video("D", &[OutputFormat::Txt]).await.unwrap();

    let keys: Vec<&str> = tracks.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["en_generated", "fr"]);
    assert!(provider.translations().is_empty());
}

#[tokio::test]
async fn test_failed_video_should_not_affect_others() {
    let (_, aggregator) = aggregator_with(sample_provider(), default_policy());
    let mut result = AggregateResult::new();

    aggregator
        .aggregate(&request(&["A", "B"], &[OutputFormat::Srt]), &mut result)
        .await;

    assert_eq!(result.results.len(), 1);
    assert!(result.results.contains_key("A"));
    assert_eq!(
        result.errors,
        vec![(
            "B".to_string(),
            format!("Transcripts are disabled: {}", DISABLED_MESSAGE)
        )]
    );
}

#[tokio::test]
async fn test_content_failure_should_discard_partial_video() {
    let (_, aggregator) = aggregator_with(sample_provider(), default_policy());
    let mut result = AggregateResult::new();

    aggregator
        .aggregate(&request(&["E", "A"], &[OutputFormat::Txt]), &mut result)
        .await;

    assert!(!result.results.contains_key("E"));
    assert!(result.results.contains_key("A"));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].0, "E");
}

#[tokio::test]
async fn test_slow_provider_should_time_out_as_video_error() {
    let provider = sample_provider().with_delay(Duration::from_millis(200));
    let aggregator = Aggregator::new(
        std::sync::Arc::new(provider),
        default_policy(),
        Duration::from_millis(20),
    );
    let mut result = AggregateResult::new();

    aggregator.aggregate(&request(&["A"], &[OutputFormat::Txt]), &mut result).await;

    assert!(result.results.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].1.contains("timed out"));
}

#[tokio::test]
async fn test_track_count_should_be_bounded_by_natives_plus_policy() {
    let policy = vec![
        TranslationTarget::new("de", "de", false),
        TranslationTarget::new("fr", "fr", false),
        TranslationTarget::new("en", "en", true),
    ];
    let natives = 2;
    let (_, aggregator) = aggregator_with(sample_provider(), policy.clone());

    let tracks = aggregator.add_video("A", &[OutputFormat::Json]).await.unwrap();

    assert!(tracks.len() <= natives + policy.len());
    assert_eq!(tracks.len(), 5);
    assert!(tracks.contains_key("en_translated"));
}

#[tokio::test]
async fn test_aggregate_should_cap_videos_in_flight() {
    let video_ids: Vec<String> = (0..6).map(|i| format!("V{}", i)).collect();
    let provider = video_ids
        .iter()
        .fold(MockProvider::new(), |provider, id| {
            provider.with_video(id, vec![(MockProvider::track(id, "en", false, true), MockProvider::cues("en"))])
        })
        .with_delay(Duration::from_millis(10));
    let provider = std::sync::Arc::new(provider);
    let aggregator = Aggregator::new(provider.clone(), default_policy(), Duration::from_secs(5)).with_concurrency(2);
    let ids: Vec<&str> = video_ids.iter().map(|id| id.as_str()).collect();
    let mut result = AggregateResult::new();

    aggregator.aggregate(&request(&ids, &[OutputFormat::Txt]), &mut result).await;

    assert_eq!(result.results.len(), 6);
    assert!(result.errors.is_empty());
    assert_eq!(provider.max_in_flight(), 2);
}

#[tokio::test]
async fn test_aggregate_errors_should_keep_request_order() {
    let provider = sample_provider()
        .with_failure("X", ProviderError::Blocked("x".to_string()))
        .with_delay(Duration::from_millis(5));
    let (_, aggregator) = aggregator_with(provider, default_policy());
    let aggregator = aggregator.with_concurrency(3);
    let mut result = AggregateResult::new();

    aggregator
        .aggregate(&request(&["X", "A", "B"], &[OutputFormat::Txt]), &mut result)
        .await;

    let ids: Vec<&str> = result.errors.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["X", "B"]);
}

#[tokio::test]
async fn test_content_should_hold_exactly_requested_formats() {
    let (_, aggregator) = aggregator_with(sample_provider(), default_policy());
    let formats = [OutputFormat::Vtt, OutputFormat::Raw];

    let tracks = aggregator.add_video("A", &formats).await.unwrap();

    for payload in tracks.values() {
        let names: Vec<&str> = payload.content.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["raw", "vtt"]);
        assert!(matches!(payload.content["raw"], Rendered::Cues(_)));
    }
}

#[tokio::test]
async fn test_aggregate_result_should_serialize_errors_as_pairs() {
    let (_, aggregator) = aggregator_with(sample_provider(), default_policy());
    let mut result = AggregateResult::new();

    aggregator.aggregate(&request(&["B"], &[OutputFormat::Txt]), &mut result).await;

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["results"], serde_json::json!({}));
    assert_eq!(value["errors"][0][0], "B");
}

fn raw(video_id: &str, language_code: &str) -> RawRequest {
    RawRequest {
        video_id: video_id.to_string(),
        language_code: language_code.to_string(),
        format: OutputFormat::Txt,
    }
}

#[tokio::test]
async fn test_fetch_single_should_prefer_direct_track() {
    let (provider, aggregator) = aggregator_with(sample_provider(), default_policy());

    let cues = aggregator.fetch_single(&raw("A", "en")).await.unwrap();

    assert_eq!(cues, MockProvider::cues("en"));
    assert!(provider.translations().is_empty());
}

#[tokio::test]
async fn test_fetch_single_should_fall_back_to_translation() {
    let (provider, aggregator) = aggregator_with(sample_provider(), default_policy());

    let cues = aggregator.fetch_single(&raw("A", "de")).await.unwrap();

    assert_eq!(cues[0].text, "[de] [en] first line");
    assert_eq!(provider.translations(), vec![("en".to_string(), "de".to_string())]);
}

#[tokio::test]
async fn test_fetch_single_for_unknown_video_should_fail() {
    let (_, aggregator) = aggregator_with(sample_provider(), default_policy());

    let error = aggregator.fetch_single(&raw("Z", "en")).await.unwrap_err();

    assert!(error.is_not_found());
}

#[tokio::test]
async fn test_fetch_single_untranslatable_source_should_fail() {
    let (_, aggregator) = aggregator_with(sample_provider(), default_policy());

    let error = aggregator.fetch_single(&raw("D", "de")).await.unwrap_err();

    assert!(matches!(error, ProviderError::NotTranslatable(_)));
}
