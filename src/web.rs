//! HTTP API: get-or-create translations, substring search, delete.

use crate::network::{TranslateError, Translator};
use crate::store::{StoreError, StoredWord, WordStore};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;

type SharedState = Arc<AppState>;

const NO_TRANSLATION: &str = "No translation found. Please, check word and language";

pub struct AppState {
    pub store: Arc<dyn WordStore>,
    pub translator: Arc<dyn Translator>,
    pub default_lang: String,
}

#[derive(Error, Debug)]
pub enum WebError {
    #[error("io error: {0}")] Io(#[from] std::io::Error),
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), WebError> {
    let router = build_router(Arc::new(state));
    log::info!("Binding HTTP listener on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        log::error!("Store failure: {}", err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<TranslateError> for ApiError {
    fn from(err: TranslateError) -> Self {
        log::error!("Translation failure: {}", err);
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/translate_word", post(create_word))
        .route("/healthz", get(health))
        .route("/:word", get(show_word).delete(delete_word))
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct WordInput {
    word: String,
    lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeleteParams {
    lang: Option<String>,
}

async fn create_word(
    State(state): State<SharedState>,
    Json(input): Json<WordInput>,
) -> Result<(StatusCode, Json<StoredWord>), ApiError> {
    let word = input.word.trim();
    if word.is_empty() {
        return Err(ApiError::bad_request("word must not be empty"));
    }
    let lang = input
        .lang
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(&state.default_lang);

    log::debug!("Creating new word {} in language {}", word, lang);
    if let Some(found) = state.store.find(word, lang)? {
        log::debug!("Translation for word ({}) and language ({}) is found in the database", word, lang);
        return Ok((StatusCode::OK, Json(found)));
    }

    let record = state.translator.translate(word, lang).await?;
    if record.is_empty() {
        return Err(ApiError::not_found(NO_TRANSLATION));
    }
    let stored = state.store.insert(&record)?;
    log::debug!("New word successfully created with ID: {}", stored.id);
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn show_word(
    State(state): State<SharedState>,
    Path(word): Path<String>,
) -> Result<Json<Vec<StoredWord>>, ApiError> {
    let words = state.store.search(&word)?;
    if words.is_empty() {
        return Err(ApiError::not_found(format!("Word {word} not found")));
    }
    log::debug!("Words for string value ({}) successfully retrieved", word);
    Ok(Json(words))
}

async fn delete_word(
    State(state): State<SharedState>,
    Path(word): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<StatusCode, ApiError> {
    log::debug!("Need to delete: {} ({:?})", word, params.lang);
    let removed = state.store.delete(&word, params.lang.as_deref())?;
    if removed == 0 {
        return Err(ApiError::not_found(format!("Word {word} not found")));
    }
    log::debug!("Word {} was successfully deleted ({} rows)", word, removed);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::TranslationRecord;
    use crate::store::SqliteStore;
    use axum::{body, body::Body, http::Request};
    use futures::future::BoxFuture;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Answers every word with the same translations, or fails when `fail` is set
    struct StubTranslator {
        translations: Vec<String>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubTranslator {
        fn new(translations: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                translations: translations.iter().map(|s| s.to_string()).collect(),
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                translations: Vec::new(),
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Translator for StubTranslator {
        fn translate<'a>(
            &'a self,
            word: &'a str,
            lang: &'a str,
        ) -> BoxFuture<'a, Result<TranslationRecord, TranslateError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if self.fail {
                    return Err(TranslateError::MalformedResponse("missing length header".into()));
                }
                Ok(TranslationRecord {
                    translations: self.translations.clone(),
                    ..TranslationRecord::empty(word, lang)
                })
            })
        }
    }

    fn test_router(translator: Arc<StubTranslator>) -> (Router, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let state = Arc::new(AppState {
            store: store.clone(),
            translator,
            default_lang: "ru".to_string(),
        });
        (build_router(state), store)
    }

    fn post_word(body: Value) -> Request<Body> {
        Request::post("/translate_word")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_translates_then_serves_from_store() {
        let translator = StubTranslator::new(&["hola"]);
        let (router, store) = test_router(translator.clone());

        let response = router
            .clone()
            .oneshot(post_word(json!({ "word": "hello", "lang": "es" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        assert_eq!(created["name"], "hello");
        assert_eq!(created["lang"], "es");
        assert_eq!(created["translations"], json!(["hola"]));
        assert_eq!(created["synonyms"], json!([]));
        assert!(store.find("hello", "es").unwrap().is_some());

        let response = router
            .oneshot(post_word(json!({ "word": "hello", "lang": "es" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, created);
        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn create_defaults_language() {
        let (router, store) = test_router(StubTranslator::new(&["привет"]));
        let response = router
            .oneshot(post_word(json!({ "word": " hello " })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(store.find("hello", "ru").unwrap().is_some());
    }

    #[tokio::test]
    async fn empty_translation_is_not_found_and_not_stored() {
        let (router, store) = test_router(StubTranslator::new(&[]));
        let response = router
            .oneshot(post_word(json!({ "word": "qwzx", "lang": "es" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], NO_TRANSLATION);
        assert!(store.search("qwzx").unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_is_bad_gateway() {
        let (router, _) = test_router(StubTranslator::failing());
        let response = router
            .oneshot(post_word(json!({ "word": "hello", "lang": "es" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let error = json_body(response).await["error"].as_str().unwrap().to_string();
        assert!(error.starts_with("Malformed response"), "{error}");
    }

    #[tokio::test]
    async fn blank_word_is_rejected() {
        let (router, _) = test_router(StubTranslator::new(&["x"]));
        let response = router
            .oneshot(post_word(json!({ "word": "   ", "lang": "es" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn show_lists_matching_words() {
        let (router, store) = test_router(StubTranslator::new(&["x"]));
        store.insert(&TranslationRecord::empty("world", "es")).unwrap();
        store.insert(&TranslationRecord::empty("worldwide", "de")).unwrap();
        store.insert(&TranslationRecord::empty("other", "es")).unwrap();

        let response = router
            .clone()
            .oneshot(Request::get("/world").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let words = json_body(response).await;
        let names: Vec<&str> = words
            .as_array()
            .unwrap()
            .iter()
            .map(|w| w["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["world", "worldwide"]);

        let response = router
            .oneshot(Request::get("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "Word missing not found");
    }

    #[tokio::test]
    async fn delete_by_word_and_language() {
        let (router, store) = test_router(StubTranslator::new(&["x"]));
        store.insert(&TranslationRecord::empty("test", "es")).unwrap();
        store.insert(&TranslationRecord::empty("test", "de")).unwrap();

        let response = router
            .clone()
            .oneshot(Request::delete("/test?lang=es").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(store.find("test", "es").unwrap().is_none());
        assert!(store.find("test", "de").unwrap().is_some());

        let response = router
            .clone()
            .oneshot(Request::delete("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router
            .oneshot(Request::delete("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await, json!({ "error": "Word test not found" }));
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (router, _) = test_router(StubTranslator::new(&[]));
        let response = router
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "status": "ok" }));
    }
}
