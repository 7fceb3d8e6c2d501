//! Lazy-materialization pipeline: lookup → search → assemble → generate →
//! summarize → persist.
//!
//! Storage and generation are explicit, injected handles — there is no
//! ambient global state. Persistence is the single terminal step: no
//! partial article (missing summary or content) is ever written.

use babelwiki_generation::{SamplingParams, TextGenerator, generate_article, summarize};
use babelwiki_shared::{Article, BabelWikiError, Result, normalize_keyword};
use babelwiki_storage::{DEFAULT_RELATED_LIMIT, Storage, new_article};
use tracing::{info, instrument, warn};

use crate::context::build_context;

/// Return the article for `raw_keyword`, materializing it on first request.
///
/// The keyword is normalized before lookup; an empty normalization result
/// is rejected as [`BabelWikiError::InvalidKeyword`] without touching
/// storage. On a miss, the pipeline runs relevance search over prior
/// articles, assembles their context, generates content and summary, and
/// persists exactly once.
///
/// Two overlapping requests for a never-seen keyword may both generate;
/// the storage uniqueness constraint decides the winner and the loser
/// recovers by re-reading, so callers never observe the race.
#[instrument(skip(storage, generator, params))]
pub async fn get_or_create_article(
    storage: &Storage,
    generator: &dyn TextGenerator,
    params: &SamplingParams,
    raw_keyword: &str,
) -> Result<Article> {
    let keyword = normalize_keyword(raw_keyword)?;

    if let Some(existing) = storage.get_article(&keyword).await? {
        return Ok(existing);
    }

    info!(keyword, "article miss, generating");

    let related = storage.find_related(&keyword, DEFAULT_RELATED_LIMIT).await?;
    info!(keyword, related = related.len(), "relevance search complete");

    let context = build_context(&related);
    let content = generate_article(generator, params, &keyword, &context).await?;
    let summary = summarize(generator, params, &content).await?;

    let article = new_article(&keyword, content, summary);
    match storage.insert_article(&article).await {
        Ok(()) => info!(keyword, "article persisted"),
        Err(BabelWikiError::DuplicateKeyword { .. }) => {
            // Another pipeline won the persistence race; its record is the
            // article now.
            warn!(keyword, "lost persistence race, returning winning record");
        }
        Err(e) => return Err(e),
    }

    // Return the persisted record, not the local copy.
    storage.get_article(&keyword).await?.ok_or_else(|| {
        BabelWikiError::Storage(format!("article {keyword:?} missing after persist"))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use babelwiki_generation::CompletionRequest;

    use super::*;

    const ARTICLE_BODY: &str = "## History\n\nFounded near [[Atlantis]].\n\n## References\n\n- *Chronicles of the Deep*";
    const SUMMARY_BODY: &str = "A short digest retaining Atlantis.";

    /// Which stage the mock should fail at, if any.
    #[derive(Clone, Copy, PartialEq)]
    enum FailAt {
        Nothing,
        Article,
        Summary,
    }

    struct MockGenerator {
        calls: AtomicUsize,
        fail_at: FailAt,
        /// When set, the first article completion inserts this record
        /// directly, simulating a concurrent pipeline winning the race.
        race_winner: Option<(Arc<Storage>, Article)>,
    }

    impl MockGenerator {
        fn new(fail_at: FailAt) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_at,
                race_winner: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for MockGenerator {
        async fn complete(&self, request: CompletionRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let is_summary = request.system.contains("summary generator");
            match (self.fail_at, is_summary) {
                (FailAt::Article, false) => {
                    return Err(BabelWikiError::Generation("model unavailable".into()));
                }
                (FailAt::Summary, true) => {
                    return Err(BabelWikiError::Generation("model unavailable".into()));
                }
                _ => {}
            }

            if !is_summary {
                if let Some((storage, winner)) = &self.race_winner {
                    storage.insert_article(winner).await?;
                }
                return Ok(ARTICLE_BODY.to_string());
            }
            Ok(SUMMARY_BODY.to_string())
        }
    }

    async fn test_storage() -> Arc<Storage> {
        use std::time::{SystemTime, UNIX_EPOCH};
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let tmp = std::env::temp_dir().join(format!(
            "bw_pipeline_test_{}_{nanos}.db",
            std::process::id()
        ));
        Arc::new(Storage::open(&tmp).await.expect("open test db"))
    }

    fn params() -> SamplingParams {
        SamplingParams::from(&babelwiki_shared::OpenAiConfig::default())
    }

    #[tokio::test]
    async fn miss_generates_and_persists() {
        let storage = test_storage().await;
        let generator = MockGenerator::new(FailAt::Nothing);

        let article = get_or_create_article(&storage, &generator, &params(), "Grand Library")
            .await
            .expect("pipeline");

        assert_eq!(article.keyword, "Grand Library");
        assert_eq!(article.content, ARTICLE_BODY);
        assert_eq!(article.summary, SUMMARY_BODY);
        // One article completion + one summary completion.
        assert_eq!(generator.calls(), 2);

        let stored = storage
            .get_article("Grand Library")
            .await
            .unwrap()
            .expect("persisted");
        assert_eq!(stored, article);
    }

    #[tokio::test]
    async fn second_request_is_a_hit() {
        let storage = test_storage().await;
        let generator = MockGenerator::new(FailAt::Nothing);

        let first = get_or_create_article(&storage, &generator, &params(), "Paris")
            .await
            .expect("first");
        let second = get_or_create_article(&storage, &generator, &params(), "Paris")
            .await
            .expect("second");

        assert_eq!(first, second);
        // No additional generation on the hit path.
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn normalized_variants_share_one_article() {
        let storage = test_storage().await;
        let generator = MockGenerator::new(FailAt::Nothing);

        get_or_create_article(&storage, &generator, &params(), "Paris!!")
            .await
            .expect("first");
        let second = get_or_create_article(&storage, &generator, &params(), "Paris")
            .await
            .expect("second");

        assert_eq!(second.keyword, "Paris");
        assert_eq!(generator.calls(), 2);
        assert_eq!(storage.list_keywords(50).await.unwrap(), vec!["Paris"]);
    }

    #[tokio::test]
    async fn invalid_keyword_is_rejected_before_generation() {
        let storage = test_storage().await;
        let generator = MockGenerator::new(FailAt::Nothing);

        let err = get_or_create_article(&storage, &generator, &params(), "***")
            .await
            .expect_err("must reject");
        assert!(matches!(err, BabelWikiError::InvalidKeyword { .. }));
        assert_eq!(generator.calls(), 0);
        assert!(storage.list_keywords(50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn article_failure_persists_nothing() {
        let storage = test_storage().await;
        let generator = MockGenerator::new(FailAt::Article);

        let err = get_or_create_article(&storage, &generator, &params(), "Doomed")
            .await
            .expect_err("must fail");
        assert!(matches!(err, BabelWikiError::Generation(_)));
        assert!(storage.get_article("Doomed").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn summary_failure_persists_nothing() {
        let storage = test_storage().await;
        let generator = MockGenerator::new(FailAt::Summary);

        let err = get_or_create_article(&storage, &generator, &params(), "Doomed")
            .await
            .expect_err("must fail");
        assert!(matches!(err, BabelWikiError::Generation(_)));
        assert!(storage.get_article("Doomed").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lost_race_returns_winning_record() {
        let storage = test_storage().await;
        let winner = new_article("Contested", "winner content".into(), "winner digest".into());
        let generator = MockGenerator {
            calls: AtomicUsize::new(0),
            fail_at: FailAt::Nothing,
            race_winner: Some((storage.clone(), winner.clone())),
        };

        // The mock persists the winner while this pipeline is mid-generation,
        // so this pipeline's own insert hits the uniqueness constraint.
        let article = get_or_create_article(&storage, &generator, &params(), "Contested")
            .await
            .expect("race must be recovered, not surfaced");

        assert_eq!(article.content, "winner content");
        assert_eq!(storage.list_keywords(50).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_double_miss_stores_exactly_one() {
        let storage = test_storage().await;
        let generator = Arc::new(MockGenerator::new(FailAt::Nothing));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let storage = storage.clone();
            let generator = generator.clone();
            handles.push(tokio::spawn(async move {
                get_or_create_article(&storage, generator.as_ref(), &params(), "Contested").await
            }));
        }

        for handle in handles {
            let article = handle.await.expect("join").expect("no race error");
            assert_eq!(article.keyword, "Contested");
        }
        assert_eq!(storage.list_keywords(50).await.unwrap(), vec!["Contested"]);
    }
}
