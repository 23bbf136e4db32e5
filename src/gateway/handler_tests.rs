//! Tests for the gateway handlers and request contract.

use axum::{Router, body::Body, http::Request, http::StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

use crate::constants::REQUEST_ID_HEADER;
use crate::engine::{DeviceKind, MockEngine};
use crate::gateway::create_router_with_state;
use crate::gateway::error::GatewayError;
use crate::gateway::schema::{ScoreItem, ScoreRequest};
use crate::gateway::state::HandlerState;
use crate::runner::{Runner, RunnerCell};

/// Creates the single-item request used across scenarios.
fn cat_request_json() -> serde_json::Value {
    serde_json::json!({
        "items": [
            {"context": "A cat sat on a mat.", "claim": "A cat was sitting on a mat."}
        ]
    })
}

fn setup_test_router() -> (Arc<MockEngine>, Router) {
    let engine = Arc::new(MockEngine::new());
    let runner = Runner::with_engine(engine.clone(), DeviceKind::Cpu, "nli_sp", 8);
    let state = HandlerState::new(RunnerCell::from_runner(runner));
    (engine, create_router_with_state(state))
}

fn router_with_engine(engine: MockEngine) -> Router {
    let runner = Runner::with_engine(Arc::new(engine), DeviceKind::Cpu, "nli_sp", 8);
    create_router_with_state(HandlerState::new(RunnerCell::from_runner(runner)))
}

async fn send_score_request(router: &Router, body: serde_json::Value) -> axum::response::Response {
    let request = Request::builder()
        .method("POST")
        .uri("/score")
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap();

    router.clone().oneshot(request).await.unwrap()
}

async fn send_health_request(router: &Router) -> axum::response::Response {
    let request = Request::builder()
        .method("GET")
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();

    router.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

mod validate_tests {
    use super::*;

    fn item(context: &str, claim: &str) -> ScoreItem {
        ScoreItem {
            context: context.to_string(),
            claim: claim.to_string(),
        }
    }

    fn request(items: Vec<ScoreItem>) -> ScoreRequest {
        ScoreRequest {
            items,
            evaluation_mode: None,
            batch_size: None,
        }
    }

    fn expect_invalid(result: Result<impl std::fmt::Debug, GatewayError>) -> String {
        match result {
            Err(GatewayError::InvalidRequest(msg)) => msg,
            other => panic!("Expected InvalidRequest error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_request_is_trimmed() {
        let validated = request(vec![item("  A cat sat.\n", "\tA cat sat. ")])
            .validate()
            .unwrap();

        assert_eq!(validated.contexts, vec!["A cat sat.".to_string()]);
        assert_eq!(validated.claims, vec!["A cat sat.".to_string()]);
        assert_eq!(validated.len(), 1);
        assert_eq!(validated.batch_size, None);
        assert_eq!(validated.evaluation_mode, None);
    }

    #[test]
    fn test_rejects_empty_items() {
        let msg = expect_invalid(request(vec![]).validate());
        assert!(msg.contains("at least one item"));
    }

    #[test]
    fn test_rejects_blank_context() {
        let msg = expect_invalid(request(vec![item("ok", "ok"), item("   ", "claim")]).validate());
        assert!(msg.contains("items[1].context"));
        assert!(msg.contains("must not be empty"));
    }

    #[test]
    fn test_rejects_blank_claim() {
        let msg = expect_invalid(request(vec![item("context", "\n\t")]).validate());
        assert!(msg.contains("items[0].claim"));
    }

    #[test]
    fn test_rejects_non_positive_batch_size() {
        for size in [0, -1, -100] {
            let mut req = request(vec![item("a", "b")]);
            req.batch_size = Some(size);
            let msg = expect_invalid(req.validate());
            assert!(msg.contains("batch_size"));
        }
    }

    #[test]
    fn test_passes_mode_through_opaquely() {
        let mut req = request(vec![item("a", "b")]);
        req.evaluation_mode = Some("anything-goes".to_string());
        req.batch_size = Some(4);

        let validated = req.validate().unwrap();
        assert_eq!(validated.evaluation_mode.as_deref(), Some("anything-goes"));
        assert_eq!(validated.batch_size, Some(4));
    }
}

mod error_mapping_tests {
    use super::*;
    use crate::engine::EngineError;
    use crate::runner::RunnerError;

    #[test]
    fn test_invalid_input_maps_to_invalid_request() {
        let err: GatewayError = RunnerError::invalid_input("bad lengths").into();
        assert!(matches!(err, GatewayError::InvalidRequest(msg) if msg == "bad lengths"));
    }

    #[test]
    fn test_other_runner_errors_map_to_internal() {
        let err: GatewayError = RunnerError::Engine(EngineError::InferenceFailed {
            reason: "oom".to_string(),
        })
        .into();
        assert!(matches!(err, GatewayError::InternalError(_)));

        let err: GatewayError = RunnerError::Configuration {
            path: "/missing.ckpt".into(),
        }
        .into();
        assert!(matches!(err, GatewayError::InternalError(_)));
    }
}

mod score_handler_tests {
    use super::*;

    #[tokio::test]
    async fn test_single_item_uses_server_defaults() {
        let (engine, router) = setup_test_router();

        let response = send_score_request(&router, cat_request_json()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(REQUEST_ID_HEADER).is_some());

        let body = body_json(response).await;
        let scores = body["scores"].as_array().unwrap();
        assert_eq!(scores.len(), 1);
        assert!(scores[0].is_f64());
        assert_eq!(body["evaluation_mode"], "nli_sp");
        assert_eq!(body["batch_size"], 8);
        assert_eq!(body["device"], "cpu");
        assert_eq!(engine.call_count(), 1);
    }

    #[tokio::test]
    async fn test_scores_follow_item_order() {
        let (_, router) = setup_test_router();
        let body = serde_json::json!({
            "items": [
                {"context": "The sky is blue.", "claim": "Dogs bark loudly."},
                {"context": "A cat sat on a mat.", "claim": "A cat sat on a mat."},
                {"context": "Paris is in France.", "claim": "Paris is in Spain."}
            ]
        });

        let response = send_score_request(&router, body).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let scores: Vec<f64> = body["scores"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s.as_f64().unwrap())
            .collect();

        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0], 0.0);
        assert_eq!(scores[1], 1.0);
        assert!(scores[2] > 0.0 && scores[2] < 1.0);
    }

    #[tokio::test]
    async fn test_overrides_are_echoed_and_applied() {
        let (engine, router) = setup_test_router();
        let mut body = cat_request_json();
        body["batch_size"] = serde_json::json!(4);
        body["evaluation_mode"] = serde_json::json!("bin");

        let response = send_score_request(&router, body).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["batch_size"], 4);
        assert_eq!(body["evaluation_mode"], "bin");

        let call = engine.last_call().unwrap();
        assert_eq!(call.params.batch_size, 4);
        assert_eq!(call.params.evaluation_mode, "bin");
    }

    #[tokio::test]
    async fn test_texts_reach_runner_trimmed() {
        let (engine, router) = setup_test_router();
        let body = serde_json::json!({
            "items": [{"context": "  A cat sat.  ", "claim": "\nA cat sat.\n"}]
        });

        let response = send_score_request(&router, body).await;
        assert_eq!(response.status(), StatusCode::OK);

        let call = engine.last_call().unwrap();
        assert_eq!(call.contexts, vec!["A cat sat.".to_string()]);
        assert_eq!(call.claims, vec!["A cat sat.".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_items_is_bad_request() {
        let (engine, router) = setup_test_router();

        let response = send_score_request(&router, serde_json::json!({"items": []})).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().contains("at least one item"));
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_negative_batch_size_is_bad_request() {
        let (engine, router) = setup_test_router();
        let mut body = cat_request_json();
        body["batch_size"] = serde_json::json!(-1);

        let response = send_score_request(&router, body).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_claim_is_bad_request() {
        let (engine, router) = setup_test_router();
        let body = serde_json::json!({
            "items": [{"context": "A cat sat on a mat.", "claim": "   "}]
        });

        let response = send_score_request(&router, body).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().contains("items[0].claim"));
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_schema_errors_are_bad_request() {
        let (engine, router) = setup_test_router();

        for body in [
            serde_json::json!({}),
            serde_json::json!({"items": "not an array"}),
            serde_json::json!({"items": [{"context": "only context"}]}),
            serde_json::json!({"items": [{"context": "a", "claim": "b"}], "batch_size": 1.5}),
        ] {
            let response = send_score_request(&router, body.clone()).await;
            assert_eq!(
                response.status(),
                StatusCode::BAD_REQUEST,
                "body {body} should be rejected"
            );
            let body = body_json(response).await;
            assert!(
                body["detail"]
                    .as_str()
                    .unwrap()
                    .contains("Invalid request schema")
            );
        }
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_renders_detail() {
        let (engine, router) = setup_test_router();
        let request = Request::builder()
            .method("POST")
            .uri("/score")
            .header("Content-Type", "application/json")
            .body(Body::from("{items: [}"))
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(!body["detail"].as_str().unwrap().is_empty());
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_content_type_renders_detail() {
        let (engine, router) = setup_test_router();
        let request = Request::builder()
            .method("POST")
            .uri("/score")
            .body(Body::from(cat_request_json().to_string()))
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().contains("Content-Type"));
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_mode_is_bad_request() {
        let (_, router) = setup_test_router();
        let mut body = cat_request_json();
        body["evaluation_mode"] = serde_json::json!("similarity");

        let response = send_score_request(&router, body).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().contains("similarity"));
    }

    #[tokio::test]
    async fn test_engine_failure_is_opaque_internal_error() {
        let router = router_with_engine(MockEngine::failing());

        let response = send_score_request(&router, cat_request_json()).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Internal server error");
        assert!(!body.to_string().contains("device lost"));
    }

    #[tokio::test]
    async fn test_engine_panic_is_internal_error() {
        let router = router_with_engine(MockEngine::panicking());

        let response = send_score_request(&router, cat_request_json()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = send_health_request(&router).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

mod health_handler_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_runner_defaults() {
        let (engine, router) = setup_test_router();

        let response = send_health_request(&router).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["device"], "cpu");
        assert_eq!(body["evaluation_mode"], "nli_sp");
        assert_eq!(body["batch_size"], 8);
        assert_eq!(engine.call_count(), 0);
    }

    #[tokio::test]
    async fn test_health_triggers_lazy_initialization_once() {
        let constructions = Arc::new(AtomicUsize::new(0));
        let counter = constructions.clone();
        let cell = RunnerCell::with_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Runner::with_engine(
                Arc::new(MockEngine::new()),
                DeviceKind::Cpu,
                "bin",
                2,
            ))
        });
        let router = create_router_with_state(HandlerState::new(cell.clone()));
        assert!(!cell.is_initialized());

        let response = send_health_request(&router).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["evaluation_mode"], "bin");
        assert_eq!(body["batch_size"], 2);

        let response = send_score_request(&router, cat_request_json()).await;
        assert_eq!(response.status(), StatusCode::OK);

        assert!(cell.is_initialized());
        assert_eq!(constructions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_health_with_missing_checkpoint_is_internal_error() {
        let cell = RunnerCell::new(
            crate::config::ServiceSettings::default().with_model_path("/nonexistent/model.ckpt"),
        );
        let router = create_router_with_state(HandlerState::new(cell));

        let response = send_health_request(&router).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Internal server error");
    }
}
