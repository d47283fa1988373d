use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use fintrack_agents::{InsightsError, InsightsPipeline};
use shared_types::{ErrorResponse, FinancialSnapshot};
use std::sync::Arc;

#[derive(Clone)]
pub struct InsightsAppState {
    pub pipeline: Arc<InsightsPipeline>,
}

pub async fn generate_insights(
    data: web::Data<InsightsAppState>,
    request: web::Json<FinancialSnapshot>,
) -> ActixResult<HttpResponse> {
    let snapshot = request.into_inner();

    match data.pipeline.generate(&snapshot).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => {
            tracing::error!("AI insights request failed: {}", e);
            Ok(error_response(&e))
        }
    }
}

pub async fn health(data: web::Data<InsightsAppState>) -> ActixResult<HttpResponse> {
    let provider = data.pipeline.provider();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "provider": provider.provider_name(),
        "configured": provider.is_configured(),
    })))
}

/// Body and status for a failed insights request: upstream failures keep
/// the provider's status, everything else is a 500.
pub fn error_response(err: &InsightsError) -> HttpResponse {
    match err {
        InsightsError::Upstream { status, details } => {
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
            HttpResponse::build(status)
                .json(ErrorResponse::with_details("AI provider error", details.clone()))
        }
        other => HttpResponse::InternalServerError().json(ErrorResponse::new(other.to_string())),
    }
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        let response = HttpResponse::BadRequest()
            .json(ErrorResponse::with_details("Invalid request body", err.to_string()));
        actix_web::error::InternalError::from_response(err, response).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::configure;
    use actix_web::dev::ServerHandle;
    use actix_web::{test, App, HttpServer};
    use async_trait::async_trait;
    use fintrack_agents::error::RATE_LIMIT_MESSAGE;
    use fintrack_agents::{
        ApiInsightsClient, CompletionProvider, InsightsResult, InsightsSource, InsightsStore,
        MemoryKeyValueStore, OpenRouterConfig, OpenRouterGateway, StorePhase,
    };
    use shared_types::InsightsResponse;

    struct CannedProvider {
        reply: fn() -> InsightsResult<String>,
    }

    #[async_trait]
    impl CompletionProvider for CannedProvider {
        async fn complete(&self, _system: &str, _user: &str) -> InsightsResult<String> {
            (self.reply)()
        }

        fn is_configured(&self) -> bool {
            true
        }

        fn provider_name(&self) -> &'static str {
            "canned"
        }
    }

    fn state_with(provider: Arc<dyn CompletionProvider>) -> web::Data<InsightsAppState> {
        web::Data::new(InsightsAppState {
            pipeline: Arc::new(InsightsPipeline::new(provider)),
        })
    }

    const SNAPSHOT: &str = r#"{
        "totals": {"income": 5000, "expenses": 3000, "savings": 2000},
        "goals": [{"name": "Trip", "target_amount": 1000, "current_amount": 200, "status": "active"}],
        "transactions": [{"date": "2024-01-01", "description": "Coffee", "amount": 5, "type": "expense"}]
    }"#;

    fn insights_request() -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/ai-insights")
            .insert_header(("content-type", "application/json"))
            .set_payload(SNAPSHOT)
    }

    #[actix_web::test]
    async fn test_missing_key_returns_500_not_configured() {
        let gateway = OpenRouterGateway::new(OpenRouterConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..OpenRouterConfig::default()
        });
        let app = test::init_service(
            App::new()
                .app_data(state_with(Arc::new(gateway)))
                .configure(configure),
        )
        .await;

        let resp = test::call_service(&app, insights_request().to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.error.contains("not configured"));
    }

    #[actix_web::test]
    async fn test_success_returns_insights() {
        let provider = CannedProvider {
            reply: || {
                Ok(r#"{"insights":[{"id":"1","type":"success","title":"Saving well","description":"You keep 40% of income.","category":"savings"}],"summary":"Healthy."}"#.to_string())
            },
        };
        let app = test::init_service(
            App::new()
                .app_data(state_with(Arc::new(provider)))
                .configure(configure),
        )
        .await;

        let resp = test::call_service(&app, insights_request().to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: InsightsResponse = test::read_body_json(resp).await;
        assert_eq!(body.summary, "Healthy.");
        assert_eq!(body.insights.len(), 1);
        assert!(!body.timestamp.is_empty());
    }

    #[actix_web::test]
    async fn test_rate_limit_passes_through_as_generic_provider_error() {
        let provider = CannedProvider {
            reply: || {
                Err(InsightsError::Upstream {
                    status: 429,
                    details: "Rate limit exceeded".to_string(),
                })
            },
        };
        let app = test::init_service(
            App::new()
                .app_data(state_with(Arc::new(provider)))
                .configure(configure),
        )
        .await;

        let resp = test::call_service(&app, insights_request().to_request()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "AI provider error");
        assert_eq!(body.details.as_deref(), Some("Rate limit exceeded"));
    }

    /// Run the insights routes on an ephemeral port
    fn serve(state: web::Data<InsightsAppState>) -> (String, ServerHandle) {
        let server = HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (format!("http://{}", addr), handle)
    }

    fn snapshot() -> FinancialSnapshot {
        serde_json::from_str(SNAPSHOT).unwrap()
    }

    #[actix_web::test]
    async fn test_rate_limit_reaches_store_through_http_client() {
        let provider = CannedProvider {
            reply: || {
                Err(InsightsError::Upstream {
                    status: 429,
                    details: "Rate limit exceeded".to_string(),
                })
            },
        };
        let (base_url, handle) = serve(state_with(Arc::new(provider)));

        let store = InsightsStore::load(
            Arc::new(ApiInsightsClient::new(base_url)),
            Arc::new(MemoryKeyValueStore::new()),
        )
        .await;
        let err = store.fetch(snapshot()).await.unwrap_err();

        assert_eq!(err, RATE_LIMIT_MESSAGE);
        assert_eq!(store.phase(), StorePhase::Error);
        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_http_client_round_trip() {
        let provider = CannedProvider {
            reply: || {
                Ok(r#"{"insights":[{"id":"1","type":"info","title":"Steady","description":"No change this month.","category":"general"}],"summary":"Stable."}"#.to_string())
            },
        };
        let (base_url, handle) = serve(state_with(Arc::new(provider)));

        let response = ApiInsightsClient::new(base_url)
            .fetch_insights(&snapshot())
            .await
            .unwrap();

        assert_eq!(response.summary, "Stable.");
        assert_eq!(response.insights[0].title, "Steady");
        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_http_client_rejects_malformed_success_body() {
        let server = HttpServer::new(|| {
            App::new().route(
                "/api/ai-insights",
                web::post().to(|| async { HttpResponse::Ok().body("not json") }),
            )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        let err = ApiInsightsClient::new(format!("http://{}", addr))
            .fetch_insights(&snapshot())
            .await
            .unwrap_err();

        assert!(matches!(err, InsightsError::Serialization(_)));
        assert_eq!(err.status_code(), 500);
        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_parse_failure_returns_500_with_message() {
        let provider = CannedProvider {
            reply: || Ok("Here are some thoughts about your budget.".to_string()),
        };
        let app = test::init_service(
            App::new()
                .app_data(state_with(Arc::new(provider)))
                .configure(configure),
        )
        .await;

        let resp = test::call_service(&app, insights_request().to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(
            body.error,
            "Failed to parse AI response. The model didn't return valid JSON."
        );
    }

    #[actix_web::test]
    async fn test_malformed_body_is_400() {
        let provider = CannedProvider {
            reply: || Ok("{}".to_string()),
        };
        let app = test::init_service(
            App::new()
                .app_data(state_with(Arc::new(provider)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/ai-insights")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"totals\": ")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "Invalid request body");
    }

    #[actix_web::test]
    async fn test_health_reports_provider() {
        let gateway = OpenRouterGateway::new(OpenRouterConfig {
            api_key: Some("sk-or-test".to_string()),
            ..OpenRouterConfig::default()
        });
        let app = test::init_service(
            App::new()
                .app_data(state_with(Arc::new(gateway)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["provider"], "openrouter");
        assert_eq!(body["configured"], true);
    }
}
