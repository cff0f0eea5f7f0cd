//! Recommendation pipeline tests
//!
//! Drive `Recommender` against a real SQLite store with scripted generator
//! and catalog search fakes.

mod helpers;

use bookclub_server::db::SqliteBookStore;
use bookclub_server::services::recommendation::{
    backfill::backfill, BookSource, Candidate, CandidateResolver, RecommendError, Recommender,
    Resolution, SimilarityMatch, SubstringMatch, UnresolvedReason, DEFAULT_SUMMARY, MAX_ROUNDS,
};
use bookclub_server::types::{BookSearch, BookStore, Generator};
use helpers::*;
use std::collections::HashSet;
use std::sync::Arc;

const PHILOSOPHY: &str = "철학";

fn philosophy_catalog() -> Vec<bookclub_server::types::BibliographicRecord> {
    vec![
        bibliographic("소크라테스의 변명", "플라톤", "9780000000001"),
        bibliographic("니코마코스 윤리학", "아리스토텔레스", "9780000000002"),
        bibliographic("정의란 무엇인가", "마이클 샌델", "9780000000003"),
        bibliographic("차라투스트라는 이렇게 말했다", "프리드리히 니체", "9780000000004"),
        bibliographic("철학의 위안", "보에티우스", "9780000000005"),
        bibliographic("시지프 신화", "알베르 카뮈", "9780000000006"),
    ]
}

fn candidate(title: &str, author: &str, reason: Option<&str>) -> Candidate {
    Candidate {
        title: title.to_string(),
        author: author.to_string(),
        reason: reason.map(str::to_string),
    }
}

fn recommender(
    generator: &Arc<ScriptedGenerator>,
    search: &Arc<CatalogSearch>,
    store: &SqliteBookStore,
) -> Recommender {
    Recommender::new(
        Arc::clone(generator) as Arc<dyn Generator>,
        Arc::clone(search) as Arc<dyn BookSearch>,
        Arc::new(store.clone()),
    )
}

fn assert_distinct(ids: &[String]) {
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len(), "duplicate ids in {:?}", ids);
}

#[tokio::test]
async fn test_end_to_end_philosophy_five_books() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool.clone());

    // Round 1: three distinct books, one repeated, one segment without an author
    let round_one = format!(
        "{}---\n제목: 저자 없는 책\n추천 이유: 형식 오류\n",
        candidate_text(&[
            ("소크라테스의 변명", "플라톤", "철학의 출발점"),
            ("니코마코스 윤리학", "아리스토텔레스", "행복에 대한 고전"),
            ("소크라테스의 변명", "플라톤", "다시 추천"),
            ("정의란 무엇인가", "마이클 샌델", "토론하기 좋은 책"),
        ])
    );
    let round_two = candidate_text(&[
        ("차라투스트라는 이렇게 말했다", "프리드리히 니체", "사유의 전환"),
        ("철학의 위안", "보에티우스", "고전의 위로"),
        ("시지프 신화", "알베르 카뮈", "부조리에 대한 성찰"),
    ]);

    let generator = Arc::new(ScriptedGenerator::new(
        vec![Reply::Text(round_one), Reply::Text(round_two)],
        Reply::Fail,
    ));
    let search = Arc::new(CatalogSearch::new(philosophy_catalog()));
    let recommender = recommender(&generator, &search, &store);

    let books = recommender.recommend(PHILOSOPHY, 5).await.unwrap();

    assert_eq!(books.len(), 5);
    let ids: Vec<String> = books.iter().map(|b| b.book.id.clone()).collect();
    assert_distinct(&ids);
    assert!(generator.calls() <= 2);
    assert_eq!(generator.requested_counts(), vec![7, 4]);
    assert!(books.iter().all(|b| b.source == BookSource::Generated));
    assert!(books.iter().all(|b| b.book.category == PHILOSOPHY));

    let titles: Vec<&str> = books.iter().map(|b| b.book.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "소크라테스의 변명",
            "니코마코스 윤리학",
            "정의란 무엇인가",
            "차라투스트라는 이렇게 말했다",
            "철학의 위안",
        ]
    );

    // The repeat resolved from the store; nothing was created twice
    assert_eq!(count_books(&pool).await, 5);
    assert_eq!(search.queries().len(), 5);
}

#[tokio::test]
async fn test_degraded_generator_falls_back_to_category_books() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool.clone());
    let a = seed_book(&store, "A", "x", PHILOSOPHY).await;
    let b = seed_book(&store, "B", "y", PHILOSOPHY).await;
    let c = seed_book(&store, "C", "z", PHILOSOPHY).await;
    seed_book(&store, "D", "w", "소설").await;

    let generator = Arc::new(ScriptedGenerator::always(
        "죄송합니다. 지금은 추천 목록을 만들 수 없습니다.",
    ));
    let search = Arc::new(CatalogSearch::empty());
    let recommender = recommender(&generator, &search, &store);

    let books = recommender.recommend(PHILOSOPHY, 5).await.unwrap();

    let ids: Vec<&str> = books.iter().map(|b| b.book.id.as_str()).collect();
    assert_eq!(ids, vec![c.id.as_str(), b.id.as_str(), a.id.as_str()]);
    assert!(books.iter().all(|b| b.source == BookSource::Backfill));
    assert!(books.iter().all(|b| b.summary == DEFAULT_SUMMARY));
    assert_eq!(generator.calls(), MAX_ROUNDS);
}

#[tokio::test]
async fn test_rounds_are_bounded_when_nothing_resolves() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool);

    let generator = Arc::new(ScriptedGenerator::always(&candidate_text(&[
        ("존재하지 않는 책", "아무개", "상상 속의 책"),
        ("또 다른 가짜 책", "누군가", "역시 상상"),
    ])));
    let search = Arc::new(CatalogSearch::empty());
    let recommender = recommender(&generator, &search, &store);

    let collection = recommender.collect(PHILOSOPHY, 5).await;
    assert!(collection.results.is_empty());
    assert_eq!(collection.rounds_attempted, MAX_ROUNDS);
    assert_eq!(generator.calls(), MAX_ROUNDS);

    let result = recommender.recommend(PHILOSOPHY, 5).await;
    assert_eq!(
        result,
        Err(RecommendError::NoBooksAvailable {
            category: PHILOSOPHY.to_string()
        })
    );
    assert_eq!(generator.calls(), 2 * MAX_ROUNDS);
}

#[tokio::test]
async fn test_result_never_exceeds_count() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool.clone());

    let generator = Arc::new(ScriptedGenerator::always(&candidate_text(&[
        ("소크라테스의 변명", "플라톤", "r"),
        ("니코마코스 윤리학", "아리스토텔레스", "r"),
        ("정의란 무엇인가", "마이클 샌델", "r"),
        ("철학의 위안", "보에티우스", "r"),
    ])));
    let search = Arc::new(CatalogSearch::new(philosophy_catalog()));
    let recommender = recommender(&generator, &search, &store);

    let books = recommender.recommend(PHILOSOPHY, 2).await.unwrap();

    assert_eq!(books.len(), 2);
    assert_eq!(generator.calls(), 1);
    // Candidates after the cap are never resolved
    assert_eq!(count_books(&pool).await, 2);
}

#[tokio::test]
async fn test_generator_failure_aborts_rounds_and_backfills() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool);
    seed_book(&store, "철학 입문", "x", PHILOSOPHY).await;

    let generator = Arc::new(ScriptedGenerator::unavailable());
    let search = Arc::new(CatalogSearch::new(philosophy_catalog()));
    let recommender = recommender(&generator, &search, &store);

    let collection = recommender.collect(PHILOSOPHY, 3).await;
    assert!(collection.generator_failed);
    assert_eq!(collection.rounds_attempted, 0);
    assert_eq!(generator.calls(), 1);

    let books = recommender.recommend(PHILOSOPHY, 3).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].book.title, "철학 입문");
    assert!(search.queries().is_empty());
}

#[tokio::test]
async fn test_blank_generator_text_counts_as_unavailable() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool);
    let stored = seed_book(&store, "국가", "플라톤", PHILOSOPHY).await;

    let generator = Arc::new(ScriptedGenerator::always("  \n"));
    let search = Arc::new(CatalogSearch::new(philosophy_catalog()));
    let recommender = recommender(&generator, &search, &store);

    let collection = recommender.collect(PHILOSOPHY, 3).await;
    assert!(collection.generator_failed);
    assert_eq!(collection.rounds_attempted, 0);
    assert!(collection.results.is_empty());
    assert_eq!(generator.calls(), 1);

    let books = recommender.recommend(PHILOSOPHY, 3).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].book.id, stored.id);
    assert_eq!(books[0].source, BookSource::Backfill);
    assert_eq!(generator.calls(), 2);
    assert!(search.queries().is_empty());
}

#[tokio::test]
async fn test_backfill_skips_books_already_collected() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool);
    // Stored in the category and also suggested by the generator
    let plato = seed_book(&store, "소크라테스의 변명", "플라톤", PHILOSOPHY).await;
    let other = seed_book(&store, "방법서설", "데카르트", PHILOSOPHY).await;

    let generator = Arc::new(ScriptedGenerator::new(
        vec![Reply::Text(candidate_text(&[(
            "소크라테스의 변명",
            "플라톤",
            "철학의 출발점",
        )]))],
        Reply::Fail,
    ));
    let search = Arc::new(CatalogSearch::empty());
    let recommender = recommender(&generator, &search, &store);

    let books = recommender.recommend(PHILOSOPHY, 5).await.unwrap();

    let ids: Vec<String> = books.iter().map(|b| b.book.id.clone()).collect();
    assert_eq!(ids, vec![plato.id.clone(), other.id.clone()]);
    assert_eq!(books[0].source, BookSource::Generated);
    assert_eq!(books[0].summary, "철학의 출발점");
    assert_eq!(books[1].source, BookSource::Backfill);
}

#[tokio::test]
async fn test_backfill_excludes_ids_and_respects_shortfall() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool);
    let a = seed_book(&store, "A", "x", PHILOSOPHY).await;
    let b = seed_book(&store, "B", "x", PHILOSOPHY).await;
    let c = seed_book(&store, "C", "x", PHILOSOPHY).await;

    let books = backfill(&store, PHILOSOPHY, 5, &[c.id.clone()]).await;
    let ids: Vec<&str> = books.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec![b.id.as_str(), a.id.as_str()]);

    let one = backfill(&store, PHILOSOPHY, 1, &[]).await;
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].id, c.id);

    assert!(backfill(&store, PHILOSOPHY, 0, &[]).await.is_empty());
    assert!(backfill(&store, "소설", 3, &[]).await.is_empty());
}

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool.clone());
    let search = CatalogSearch::new(philosophy_catalog());
    let resolver = CandidateResolver::new(&store, &search, &SubstringMatch);

    let first = resolver
        .resolve(&candidate("정의란 무엇인가", "마이클 샌델", Some("처음 이유")), Some(PHILOSOPHY))
        .await;
    let second = resolver
        .resolve(&candidate("정의란 무엇인가", "마이클 샌델", Some("새 이유")), Some(PHILOSOPHY))
        .await;

    let (Resolution::Resolved(first), Resolution::Resolved(second)) = (first, second) else {
        panic!("both resolutions should succeed");
    };
    assert_eq!(first.id, second.id);
    assert_eq!(first.recommendation_reason.as_deref(), Some("처음 이유"));
    assert_eq!(second.recommendation_reason.as_deref(), Some("새 이유"));
    assert_eq!(count_books(&pool).await, 1);
    assert_eq!(search.queries().len(), 1);
}

#[tokio::test]
async fn test_search_hit_with_stored_isbn_is_reused() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool.clone());
    // Search matches titles ignoring case and answers with its own spelling
    let search = CatalogSearch::new(vec![bibliographic(
        "The Stranger",
        "Albert Camus",
        "9780679720201",
    )])
    .folding_case();
    let resolver = CandidateResolver::new(&store, &search, &SubstringMatch);
    let wanted = candidate("the stranger", "Albert Camus", Some("부조리 소설"));

    let first = resolver.resolve(&wanted, Some("소설")).await;
    let second = resolver.resolve(&wanted, Some("소설")).await;

    let (Resolution::Resolved(first), Resolution::Resolved(second)) = (first, second) else {
        panic!("both resolutions should succeed");
    };
    assert_eq!(first.id, second.id);
    assert_eq!(second.title, "The Stranger");
    assert_eq!(count_books(&pool).await, 1);
    assert_eq!(search.queries().len(), 2);
}

#[tokio::test]
async fn test_repeated_candidate_with_rewritten_title_appears_once() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool.clone());
    let generator = Arc::new(ScriptedGenerator::always(&candidate_text(&[
        ("the stranger", "Albert Camus", "첫 추천"),
        ("the stranger", "Albert Camus", "다시 추천"),
    ])));
    let search = Arc::new(
        CatalogSearch::new(vec![bibliographic(
            "The Stranger",
            "Albert Camus",
            "9780679720201",
        )])
        .folding_case(),
    );
    let recommender = recommender(&generator, &search, &store);

    let books = recommender.recommend("소설", 2).await.unwrap();

    assert_eq!(books.len(), 1);
    assert_eq!(books[0].book.isbn.as_deref(), Some("9780679720201"));
    assert_eq!(count_books(&pool).await, 1);
}

#[tokio::test]
async fn test_matched_book_gets_new_category() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool);
    let existing = seed_book(&store, "시지프 신화", "알베르 카뮈", "").await;
    let search = CatalogSearch::empty();
    let resolver = CandidateResolver::new(&store, &search, &SubstringMatch);

    let resolution = resolver
        .resolve(&candidate("시지프 신화", "카뮈", None), Some(PHILOSOPHY))
        .await;

    let Resolution::Resolved(book) = resolution else {
        panic!("existing book should match");
    };
    assert_eq!(book.id, existing.id);
    assert_eq!(book.category, PHILOSOPHY);
    assert_eq!(book.recommendation_reason, None);
    assert!(search.queries().is_empty());
}

#[tokio::test]
async fn test_caret_authors_are_normalized() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool);
    let search = CatalogSearch::new(vec![bibliographic("공저 입문", "Kim^Lee", "9780000000099")]);
    let resolver = CandidateResolver::new(&store, &search, &SubstringMatch);

    let resolution = resolver
        .resolve(&candidate("공저 입문", "Kim^Lee", Some("함께 쓴 책")), None)
        .await;

    assert_eq!(
        search.queries(),
        vec![("공저 입문".to_string(), "Kim, Lee".to_string())]
    );
    let Resolution::Resolved(book) = resolution else {
        panic!("search hit should persist");
    };
    assert_eq!(book.author, "Kim, Lee");
    assert_eq!(book.category, "");
    assert_eq!(book.isbn.as_deref(), Some("9780000000099"));
}

#[tokio::test]
async fn test_failures_become_unresolved() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool.clone());

    let empty = CatalogSearch::empty();
    let resolver = CandidateResolver::new(&store, &empty, &SubstringMatch);
    assert_eq!(
        resolver.resolve(&candidate("없는 책", "누구", None), None).await,
        Resolution::Unresolved(UnresolvedReason::NotFound)
    );

    let failing = CatalogSearch::failing();
    let resolver = CandidateResolver::new(&store, &failing, &SubstringMatch);
    assert_eq!(
        resolver.resolve(&candidate("없는 책", "누구", None), None).await,
        Resolution::Unresolved(UnresolvedReason::SearchFailed)
    );

    let broken_store = FailingCreateStore {
        inner: store.clone(),
    };
    let catalog = CatalogSearch::new(philosophy_catalog());
    let resolver = CandidateResolver::new(&broken_store, &catalog, &SubstringMatch);
    assert_eq!(
        resolver
            .resolve(&candidate("철학의 위안", "보에티우스", None), None)
            .await,
        Resolution::Unresolved(UnresolvedReason::StoreFailed)
    );

    assert_eq!(count_books(&pool).await, 0);
}

#[tokio::test]
async fn test_persistence_failure_yields_shorter_result() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool);
    let kept = seed_book(&store, "국가", "플라톤", PHILOSOPHY).await;

    let generator = Arc::new(ScriptedGenerator::always(&candidate_text(&[
        ("국가", "플라톤", "이상 국가론"),
        ("철학의 위안", "보에티우스", "고전의 위로"),
    ])));
    let search = Arc::new(CatalogSearch::new(philosophy_catalog()));
    let recommender = Recommender::new(
        Arc::clone(&generator) as Arc<dyn Generator>,
        Arc::clone(&search) as Arc<dyn BookSearch>,
        Arc::new(FailingCreateStore {
            inner: store.clone(),
        }) as Arc<dyn BookStore>,
    );

    let books = recommender.recommend(PHILOSOPHY, 3).await.unwrap();

    assert_eq!(books.len(), 1);
    assert_eq!(books[0].book.id, kept.id);
    assert_eq!(books[0].summary, "이상 국가론");
    assert_eq!(generator.calls(), MAX_ROUNDS);
}

#[tokio::test]
async fn test_similarity_match_finds_spacing_variants() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool);
    let existing = seed_book(&store, "소년이 온다", "한강", "소설").await;
    let search = CatalogSearch::empty();

    let substring = CandidateResolver::new(&store, &search, &SubstringMatch);
    assert_eq!(
        substring.resolve(&candidate("소년이온다", "한강", None), None).await,
        Resolution::Unresolved(UnresolvedReason::NotFound)
    );

    let similarity = SimilarityMatch::default();
    let resolver = CandidateResolver::new(&store, &search, &similarity);
    let Resolution::Resolved(book) = resolver
        .resolve(&candidate("소년이온다", "한강", None), None)
        .await
    else {
        panic!("similar title should match");
    };
    assert_eq!(book.id, existing.id);
}

#[tokio::test]
async fn test_similarity_match_prefers_closest_title() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool);
    seed_book(&store, "이방인들", "알베르 카뮈", "소설").await;
    let exact = seed_book(&store, "이방인", "알베르 카뮈", "소설").await;
    let search = CatalogSearch::empty();
    let similarity = SimilarityMatch::new(0.5);
    let resolver = CandidateResolver::new(&store, &search, &similarity);

    let Resolution::Resolved(book) = resolver
        .resolve(&candidate("이방인", "알베르 카뮈", None), None)
        .await
    else {
        panic!("stored titles should match");
    };
    assert_eq!(book.id, exact.id);
}

#[tokio::test]
async fn test_invalid_count_is_rejected() {
    let pool = create_test_pool().await;
    let store = SqliteBookStore::new(pool);
    let generator = Arc::new(ScriptedGenerator::unavailable());
    let search = Arc::new(CatalogSearch::empty());
    let recommender = recommender(&generator, &search, &store)
        .with_matcher(Arc::new(SimilarityMatch::default()));

    assert!(matches!(
        recommender.recommend(PHILOSOPHY, 0).await,
        Err(RecommendError::InvalidCount { .. })
    ));
    assert!(matches!(
        recommender.recommend(PHILOSOPHY, 21).await,
        Err(RecommendError::InvalidCount { .. })
    ));
    assert_eq!(generator.calls(), 0);
    assert_eq!(recommender.matcher_name(), "similarity");
}
