mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{run_generations, PopulationBuilder};
use kinesis_lib::app::RenderSurface;
use kinesis_lib::server::{router, ServerState};
use std::sync::Arc;
use tower::util::ServiceExt;

async fn get_json(state: &Arc<ServerState>, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router(state.clone())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_endpoint() {
    let state = Arc::new(ServerState::new());
    let (status, body) = get_json(&state, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["frame"], 0);
    assert_eq!(body["clients"], 0);
}

#[tokio::test]
async fn test_champion_available_after_first_generation() {
    let state = Arc::new(ServerState::new());
    let (status, _) = get_json(&state, "/api/champion").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut population = PopulationBuilder::new().build();
    let report = run_generations(&mut population, 1).remove(0);
    state.surface().generation_complete(&report).unwrap();

    let (status, body) = get_json(&state, "/api/champion").await;
    assert_eq!(status, StatusCode::OK);
    let hex_dna = body["hex_dna"].as_str().unwrap();
    let genome = kinesis_io::genome_from_hex_dna(hex_dna).unwrap();
    assert_eq!(genome.node_count(), report.champion.node_count());
    assert_eq!(genome.spring_count(), report.champion.spring_count());
}

#[tokio::test]
async fn test_hud_and_history_follow_the_harness() {
    let state = Arc::new(ServerState::new());
    let mut harness = PopulationBuilder::new().with_lifespan_ms(90.0).build_harness();
    harness.add_surface(Box::new(state.surface()));

    for _ in 0..13 {
        harness.frame().unwrap();
    }

    let (status, hud) = get_json(&state, "/api/hud").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hud["generation"], 3);
    assert_eq!(hud["alive"], harness.population().alive_count());

    let (status, history) = get_json(&state, "/api/history").await;
    assert_eq!(status, StatusCode::OK);
    let generations: Vec<u64> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["generation"].as_u64().unwrap())
        .collect();
    assert_eq!(generations, vec![1, 2]);

    let (_, health) = get_json(&state, "/health").await;
    assert_eq!(health["frame"], 13);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let state = Arc::new(ServerState::new());
    let (status, _) = get_json(&state, "/api/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
