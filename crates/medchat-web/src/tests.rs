//! Router tests driving the chat endpoints with in-memory backends

#[cfg(test)]
mod router_tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use insta::assert_snapshot;
    use medchat_core::{Document, GenerationConfig, IndexingConfig, RetryConfig};
    use medchat_rag::testing::{Failure, RecordingGenerator, ScriptedGenerator};
    use medchat_rag::{
        HashingEmbedder, InMemoryVectorIndex, IndexingPipeline, QueryConfig, QueryPipeline,
    };
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::{AppContext, router};

    const FORM: &str = "application/x-www-form-urlencoded";

    fn config() -> QueryConfig {
        QueryConfig {
            retry: RetryConfig::none(),
            ..QueryConfig::default()
        }
    }

    async fn indexed() -> (Arc<HashingEmbedder>, Arc<InMemoryVectorIndex>) {
        let embedder = Arc::new(HashingEmbedder::default());
        let index = Arc::new(InMemoryVectorIndex::new());
        let documents = vec![Document {
            source_path: PathBuf::from("data/aspirin.pdf"),
            page: 1,
            raw_text: "Aspirin is used to reduce pain and inflammation.".to_string(),
        }];
        IndexingPipeline::new(embedder.clone(), index.clone(), "medical-chat", IndexingConfig::default())
            .index_documents(&documents)
            .await
            .unwrap();
        (embedder, index)
    }

    async fn app_with(generator: Arc<dyn medchat_core::Generator>, config: QueryConfig) -> Router {
        let (embedder, index) = indexed().await;
        router(AppContext::new(QueryPipeline::new(embedder, index, generator, config)))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn post_form(body: &str) -> Request<Body> {
        Request::post("/get")
            .header(header::CONTENT_TYPE, FORM)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_serves_chat_page() {
        let app = app_with(Arc::new(RecordingGenerator::new("unused")), config()).await;
        let (status, body) = send(app, Request::get("/").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<form"));
        assert!(body.contains("/get"));
    }

    #[tokio::test]
    async fn test_post_returns_generated_answer() {
        let generator = Arc::new(RecordingGenerator::new("It reduces pain and inflammation."));
        let app = app_with(generator.clone(), config()).await;

        let (status, body) = send(app, post_form("msg=What+is+aspirin+used+for%3F")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "It reduces pain and inflammation.");

        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("Context: Aspirin is used to reduce pain and inflammation."));
        assert!(prompt.contains("Question: What is aspirin used for?"));
    }

    #[tokio::test]
    async fn test_get_reads_query_string() {
        let app = app_with(Arc::new(RecordingGenerator::new("Pain relief.")), config()).await;
        let request = Request::get("/get?msg=aspirin").body(Body::empty()).unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Pain relief.");
    }

    #[tokio::test]
    async fn test_missing_or_blank_msg_is_bad_request() {
        let generator = Arc::new(RecordingGenerator::new("unused"));
        let app = app_with(generator.clone(), config()).await;

        let requests = [
            post_form(""),
            post_form("msg=%20%20"),
            post_form("other=1"),
            Request::post("/get").body(Body::empty()).unwrap(),
            Request::get("/get").body(Body::empty()).unwrap(),
        ];
        for request in requests {
            let (status, body) = send(app.clone(), request).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            insta::allow_duplicates! {
                assert_snapshot!(body, @"Please enter a question.");
            }
        }
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_missing_index_is_bad_gateway() {
        let app = router(AppContext::new(QueryPipeline::new(
            Arc::new(HashingEmbedder::default()),
            Arc::new(InMemoryVectorIndex::new()),
            Arc::new(RecordingGenerator::new("unused")),
            config(),
        )));

        let (status, body) = send(app, post_form("msg=aspirin")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body.contains("medical-chat"));
    }

    #[tokio::test]
    async fn test_generator_crash_is_bad_gateway() {
        let app = app_with(Arc::new(ScriptedGenerator::failing(Failure::Crash)), config()).await;

        let (status, body) = send(app, post_form("msg=aspirin")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body.contains("model process exited"));
    }

    #[tokio::test]
    async fn test_generator_hang_is_gateway_timeout() {
        let config = QueryConfig {
            generation: GenerationConfig {
                timeout: Duration::from_millis(50),
                ..GenerationConfig::default()
            },
            ..config()
        };
        let app = app_with(Arc::new(ScriptedGenerator::failing(Failure::Hang)), config).await;

        let (status, _) = send(app, post_form("msg=aspirin")).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with(Arc::new(RecordingGenerator::new("unused")), config()).await;
        let (status, body) = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["index"], "medical-chat");
        assert_eq!(value["top_k"], 2);
    }
}
