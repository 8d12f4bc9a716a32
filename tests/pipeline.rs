//! End-to-end pipeline tests with deterministic mock providers

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use docchat::config::ChatConfig;
use docchat::error::{Error, Result};
use docchat::ingestion::parser::{hash_bytes, PageContent, ParsedDocument};
use docchat::ingestion::TextChunker;
use docchat::providers::{EmbeddingProvider, LlmProvider};
use docchat::retrieval::ChunkIndex;
use docchat::server::routes::ingest::ingest_document;
use docchat::server::routes::query::answer_question;
use docchat::server::routes::sessions::reset_session;
use docchat::server::state::AppState;
use docchat::types::{AskRequest, Chunk, ChunkSource, Document, Role};

const DIMS: usize = 8;

/// Deterministic embedder: folds bytes into a fixed-size vector
struct MockEmbedder {
    calls: AtomicUsize,
}

impl MockEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut v = vec![0.1f32; DIMS];
        for (i, b) in text.bytes().enumerate() {
            v[i % DIMS] += (b as f32) / 255.0;
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Embedder whose vectors have zero norm, so index construction fails
struct ZeroEmbedder;

#[async_trait]
impl EmbeddingProvider for ZeroEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.0; DIMS])
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "zero"
    }
}

/// Embedder that attaches a competing document to the target session on its
/// first call, reproducing an upload that wins the session mid-ingest
struct RacingEmbedder {
    target: Mutex<Option<(AppState, Uuid)>>,
}

impl RacingEmbedder {
    fn new() -> Self {
        Self {
            target: Mutex::new(None),
        }
    }

    fn arm(&self, state: AppState, session_id: Uuid) {
        *self.target.lock().unwrap() = Some((state, session_id));
    }
}

#[async_trait]
impl EmbeddingProvider for RacingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        if let Some((state, session_id)) = self.target.lock().unwrap().take() {
            let document = Document::new("winner.pdf".to_string(), "winner-hash".to_string(), 6);
            let mut chunk = Chunk::new(
                document.id,
                "winner".to_string(),
                ChunkSource {
                    filename: "winner.pdf".to_string(),
                    page_number: Some(1),
                    page_count: Some(1),
                },
                0,
                6,
                0,
            );
            chunk.embedding = vec![1.0; DIMS];
            let index = Arc::new(ChunkIndex::build(document.id, vec![chunk]).unwrap());
            let _ = state
                .sessions()
                .with_session_mut(session_id, |s| s.attach_document(document, index));
        }
        Ok(vec![0.5; DIMS])
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "racing"
    }
}

/// Build a one-page PDF showing `text`, small enough to extract in tests
fn minimal_pdf(text: &str) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().unwrap(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Mock LLM whose failure mode can be toggled per test
struct MockLlm {
    fail: AtomicBool,
}

impl MockLlm {
    fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
        }
    }

    fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn generate_answer(&self, question: &str, _context: &str) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Llm("simulated network error".to_string()));
        }
        Ok(format!("Answer to: {}", question))
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

struct TestHarness {
    state: AppState,
    llm: Arc<MockLlm>,
    embedder: Arc<MockEmbedder>,
    _upload_dir: tempfile::TempDir,
}

fn state_with(
    embedder: Arc<dyn EmbeddingProvider>,
) -> (AppState, Arc<MockLlm>, tempfile::TempDir) {
    let upload_dir = tempfile::tempdir().unwrap();
    let mut config = ChatConfig::default();
    config.storage.upload_dir = upload_dir.path().to_path_buf();
    config.embeddings.dimensions = DIMS;

    let llm = Arc::new(MockLlm::new());
    let state = AppState::with_providers(config, embedder, llm.clone()).unwrap();
    (state, llm, upload_dir)
}

fn harness() -> TestHarness {
    let embedder = Arc::new(MockEmbedder::new());
    let (state, llm, upload_dir) = state_with(embedder.clone());

    TestHarness {
        state,
        llm,
        embedder,
        _upload_dir: upload_dir,
    }
}

/// Simulate a completed upload: chunk, embed, index, and attach to the
/// session, exactly as the ingest path does after PDF extraction.
async fn index_text_document(h: &TestHarness, session_id: Uuid, filename: &str, text: &str) {
    let parsed = ParsedDocument {
        content: text.to_string(),
        content_hash: format!("hash-of-{}", filename),
        total_pages: Some(1),
        pages: vec![PageContent {
            page_number: 1,
            content: text.to_string(),
        }],
    };

    let document = Document::new(
        filename.to_string(),
        parsed.content_hash.clone(),
        text.len() as u64,
    );

    let chunker = TextChunker::from_config(&h.state.config().chunking);
    let mut chunks = chunker.chunk_document(document.id, filename, &parsed);
    for chunk in chunks.iter_mut() {
        chunk.embedding = h.state.embedding_provider().embed(&chunk.content).await.unwrap();
    }

    let index = Arc::new(ChunkIndex::build(document.id, chunks).unwrap());
    h.state.cache_index(parsed.content_hash.clone(), index.clone());
    h.state
        .sessions()
        .with_session_mut(session_id, |s| s.attach_document(document, index))
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn upload_then_ask_appends_user_and_assistant_turns() {
    let h = harness();
    let session_id = h.state.sessions().create();
    index_text_document(&h, session_id, "report.pdf", &"the document is about gardens. ".repeat(100)).await;

    let response = answer_question(
        &h.state,
        session_id,
        AskRequest::new("What is the document about?"),
    )
    .await
    .unwrap();

    assert_eq!(
        response.answer.as_deref(),
        Some("Answer to: What is the document about?")
    );
    assert!(response.error.is_none());
    assert!(!response.sources.is_empty());
    assert!(response.sources.len() <= 3);

    let turns = h
        .state
        .sessions()
        .with_session(session_id, |s| s.transcript().to_vec())
        .unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].content, "What is the document about?");
    assert_eq!(turns[1].role, Role::Assistant);
}

#[tokio::test]
async fn ask_before_upload_is_rejected_without_a_turn() {
    let h = harness();
    let session_id = h.state.sessions().create();

    let err = answer_question(&h.state, session_id, AskRequest::new("Anything?"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoIndex(_)));

    let turns = h
        .state
        .sessions()
        .with_session(session_id, |s| s.transcript().len())
        .unwrap();
    assert_eq!(turns, 0);
}

#[tokio::test]
async fn model_failure_keeps_user_turn_and_session_queryable() {
    let h = harness();
    let session_id = h.state.sessions().create();
    index_text_document(&h, session_id, "report.pdf", &"facts about rivers. ".repeat(100)).await;

    h.llm.set_failing(true);
    let response = answer_question(&h.state, session_id, AskRequest::new("What rivers?"))
        .await
        .unwrap();

    assert!(response.answer.is_none());
    assert!(response.error.as_deref().unwrap().contains("simulated network error"));

    let turns = h
        .state
        .sessions()
        .with_session(session_id, |s| s.transcript().to_vec())
        .unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, Role::User);

    // Session stays usable once the backend recovers
    h.llm.set_failing(false);
    let response = answer_question(&h.state, session_id, AskRequest::new("Still there?"))
        .await
        .unwrap();
    assert!(response.answer.is_some());

    let turns = h
        .state
        .sessions()
        .with_session(session_id, |s| s.transcript().len())
        .unwrap();
    assert_eq!(turns, 3);
}

#[tokio::test]
async fn reset_clears_everything_and_is_idempotent() {
    let h = harness();
    let session_id = h.state.sessions().create();
    index_text_document(&h, session_id, "report.pdf", &"session state notes. ".repeat(100)).await;

    answer_question(&h.state, session_id, AskRequest::new("What notes?"))
        .await
        .unwrap();

    reset_session(&h.state, session_id).await.unwrap();

    let view = h
        .state
        .sessions()
        .with_session(session_id, |s| {
            (s.document().is_none(), s.has_index(), s.transcript().len())
        })
        .unwrap();
    assert_eq!(view, (true, false, 0));

    // Asking again is rejected until a new document arrives
    let err = answer_question(&h.state, session_id, AskRequest::new("Anything?"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoIndex(_)));

    // Reset twice is a no-op
    reset_session(&h.state, session_id).await.unwrap();
}

#[tokio::test]
async fn reset_evicts_the_memoized_index() {
    let h = harness();
    let session_id = h.state.sessions().create();
    index_text_document(&h, session_id, "report.pdf", &"cached content. ".repeat(100)).await;

    assert!(h.state.cached_index("hash-of-report.pdf").is_some());
    reset_session(&h.state, session_id).await.unwrap();
    assert!(h.state.cached_index("hash-of-report.pdf").is_none());
}

#[tokio::test]
async fn reingesting_identical_bytes_reuses_the_index() {
    let h = harness();
    let pdf = minimal_pdf("memoization keeps identical uploads cheap");

    let first_session = h.state.sessions().create();
    let first = ingest_document(&h.state, first_session, "report.pdf", &pdf)
        .await
        .unwrap();
    assert!(!first.index_reused);
    assert!(first.total_chunks > 0);

    let calls_after_first = h.embedder.calls();
    assert!(calls_after_first > 0);

    // Same bytes in another session hit the cache; nothing is re-embedded
    let second_session = h.state.sessions().create();
    let second = ingest_document(&h.state, second_session, "copy.pdf", &pdf)
        .await
        .unwrap();
    assert!(second.index_reused);
    assert_eq!(second.total_chunks, first.total_chunks);
    assert_eq!(h.embedder.calls(), calls_after_first);
}

#[tokio::test]
async fn failed_index_build_releases_the_stored_file() {
    let (state, _llm, upload_dir) = state_with(Arc::new(ZeroEmbedder));
    let session_id = state.sessions().create();
    let pdf = minimal_pdf("these vectors have zero norm");

    let err = ingest_document(&state, session_id, "report.pdf", &pdf)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Index(_)));

    // No partial state: no stored file, no document on the session
    assert_eq!(std::fs::read_dir(upload_dir.path()).unwrap().count(), 0);
    let has_document = state
        .sessions()
        .with_session(session_id, |s| s.document().is_some())
        .unwrap();
    assert!(!has_document);
}

#[tokio::test]
async fn losing_a_concurrent_upload_releases_file_and_cache() {
    let racer = Arc::new(RacingEmbedder::new());
    let (state, _llm, upload_dir) = state_with(racer.clone());
    let session_id = state.sessions().create();
    racer.arm(state.clone(), session_id);

    let pdf = minimal_pdf("two uploads race for one session");
    let err = ingest_document(&state, session_id, "report.pdf", &pdf)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DocumentExists(_)));

    // The losing upload leaves no stored file and no cache entry behind
    assert!(state.cached_index(&hash_bytes(&pdf)).is_none());
    assert_eq!(std::fs::read_dir(upload_dir.path()).unwrap().count(), 0);

    // The winner's document is untouched
    let filename = state
        .sessions()
        .with_session(session_id, |s| s.document().map(|d| d.filename.clone()))
        .unwrap();
    assert_eq!(filename.as_deref(), Some("winner.pdf"));
}

#[tokio::test]
async fn ingest_rejects_non_pdf_uploads() {
    let h = harness();
    let session_id = h.state.sessions().create();

    let err = ingest_document(&h.state, session_id, "notes.txt", b"plain text")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedFileType(_)));

    let err = ingest_document(&h.state, session_id, "empty.pdf", b"")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Upload(_)));
}

#[tokio::test]
async fn ingest_rejects_a_second_document() {
    let h = harness();
    let session_id = h.state.sessions().create();
    index_text_document(&h, session_id, "first.pdf", "already indexed content here").await;

    let err = ingest_document(&h.state, session_id, "second.pdf", b"%PDF-1.4 bytes")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DocumentExists(_)));
}

#[tokio::test]
async fn blank_questions_are_rejected() {
    let h = harness();
    let session_id = h.state.sessions().create();
    index_text_document(&h, session_id, "report.pdf", &"some indexed text. ".repeat(100)).await;

    let err = answer_question(&h.state, session_id, AskRequest::new("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidQuery(_)));

    let turns = h
        .state
        .sessions()
        .with_session(session_id, |s| s.transcript().len())
        .unwrap();
    assert_eq!(turns, 0);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let h = harness();
    let missing = Uuid::new_v4();

    let err = answer_question(&h.state, missing, AskRequest::new("Hello?"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SessionNotFound(_)));

    let err = ingest_document(&h.state, missing, "a.pdf", b"%PDF-1.4 bytes")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SessionNotFound(_)));
}
