use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crest::{
    AudioSample, Classifier, Crest, CrestError, Decision, DecisionCache, Fingerprint, Mode,
    Outcome, Result, VolumeAction,
};

struct FixedClassifier(&'static str);

#[async_trait]
impl Classifier for FixedClassifier {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn classify(&self, _prompt: &str) -> Result<String> {
        Ok(self.0.to_string())
    }
}

struct PanickingClassifier;

#[async_trait]
impl Classifier for PanickingClassifier {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn classify(&self, _prompt: &str) -> Result<String> {
        panic!("gateway client bug")
    }
}

#[test]
fn no_credentials_builds_mock_engine() {
    let engine = Crest::builder().build().unwrap();
    assert_eq!(engine.mode(), Mode::Mock);
    assert!(engine.resolver().is_none());
}

#[test]
fn key_without_base_url_stays_mock() {
    let engine = Crest::builder().api_key("tfy-key").build().unwrap();
    assert_eq!(engine.mode(), Mode::Mock);
}

#[test]
fn empty_key_stays_mock() {
    let engine = Crest::builder()
        .gateway("", "https://gw.example.com")
        .build()
        .unwrap();
    assert_eq!(engine.mode(), Mode::Mock);
}

#[test]
fn invalid_resolver_config_rejected_in_live_mode() {
    let result = Crest::builder()
        .classifier(Arc::new(FixedClassifier("YES")))
        .upstream_timeout(Duration::from_secs(60))
        .stale_after(Duration::from_secs(30))
        .build();
    assert!(matches!(result, Err(CrestError::Configuration(_))));
}

#[tokio::test]
async fn mock_mode_uses_keyword_rules() {
    let engine = Crest::builder().build().unwrap();

    let loud = engine.decide_subtitle("[explosion]").await;
    assert_eq!(loud.decision, Decision::Loud);
    assert_eq!(loud.outcome, Outcome::Rules);
    assert_eq!(loud.confidence, None);

    let quiet = engine.decide_subtitle("Hello there").await;
    assert_eq!(quiet.decision, Decision::Quiet);
}

#[tokio::test]
async fn mock_mode_uses_spike_heuristic() {
    let engine = Crest::builder().build().unwrap();

    let (verdict, directive) = engine
        .audio_directive(AudioSample::new(0.9, 0.2, 0.5))
        .await;
    assert_eq!(verdict.decision, Decision::Loud);
    assert_eq!(verdict.confidence, Some(1.0));
    assert_eq!(directive.action, VolumeAction::LowerVolume);
    assert_eq!(directive.level, Some(0.25));
    assert_eq!(directive.duration_ms, Some(3000));

    let (verdict, directive) = engine
        .audio_directive(AudioSample::new(0.3, 0.25, 0.05))
        .await;
    assert_eq!(verdict.decision, Decision::Quiet);
    assert_eq!(directive.action, VolumeAction::None);
}

#[tokio::test]
async fn live_subtitle_directive() {
    let engine = Crest::builder()
        .classifier(Arc::new(FixedClassifier("YES")))
        .build()
        .unwrap();
    assert_eq!(engine.mode(), Mode::Live);

    let (verdict, directive) = engine.subtitle_directive("[thunder]").await;
    assert_eq!(verdict.outcome, Outcome::Upstream);
    assert_eq!(directive.level, Some(0.3));
    assert_eq!(directive.duration_ms, Some(5000));

    let resolver = engine.resolver().unwrap();
    assert_eq!(resolver.classifier_name(), "fixed");
    assert_eq!(
        resolver.cache().lookup(&Fingerprint::of_subtitle("[thunder]")),
        Some(Decision::Loud)
    );
}

#[tokio::test]
async fn live_audio_carries_confidence() {
    let engine = Crest::builder()
        .classifier(Arc::new(FixedClassifier("NO")))
        .build()
        .unwrap();

    let verdict = engine.decide_audio(AudioSample::new(0.4, 0.3, 0.1)).await;
    assert_eq!(verdict.decision, Decision::Quiet);
    let confidence = verdict.confidence.unwrap();
    assert!((confidence - 0.75).abs() < 1e-6);
}

#[tokio::test]
async fn panicking_classifier_still_yields_quiet() {
    let engine = Arc::new(
        Crest::builder()
            .classifier(Arc::new(PanickingClassifier))
            .build()
            .unwrap(),
    );

    let task = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.decide_subtitle("[bang]").await })
    };
    let verdict = task.await.expect("decide never unwinds");
    assert_eq!(verdict.decision, Decision::Quiet);
    assert_eq!(verdict.outcome, Outcome::TransportFailure);
    assert!(engine.resolver().unwrap().inflight().is_empty());
}

#[tokio::test]
async fn builder_cache_settings_reach_resolver() {
    let engine = Crest::builder()
        .classifier(Arc::new(FixedClassifier("NO")))
        .cache_ttl(Duration::from_secs(42))
        .cache_failures(false)
        .build()
        .unwrap();

    let resolver = engine.resolver().unwrap();
    assert_eq!(resolver.cache().ttl(), Duration::from_secs(42));
    assert!(!resolver.config().cache_failures);
}

/// 1000 distinct entries with a one-second TTL, then one more insert after
/// the TTL boundary: the capacity sweep reclaims all the expired ones.
#[tokio::test(start_paused = true)]
async fn capacity_sweep_reclaims_expired_entries() {
    let cache = DecisionCache::new(
        &crest::CacheConfig::new()
            .ttl(Duration::from_secs(1))
            .max_entries(1_000),
    );
    for i in 0..1_000 {
        cache.store(Fingerprint::of_subtitle(&format!("line {i}")), Decision::Quiet);
    }
    assert_eq!(cache.len(), 1_000);

    tokio::time::advance(Duration::from_secs(2)).await;
    cache.store(Fingerprint::of_subtitle("after the boundary"), Decision::Loud);

    assert_eq!(cache.len(), 1);
    assert_eq!(
        cache.lookup(&Fingerprint::of_subtitle("after the boundary")),
        Some(Decision::Loud)
    );
}
