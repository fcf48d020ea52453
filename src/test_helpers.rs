//! Test helper factories and mock state builders
//!
//! Provides convenience functions for creating request payloads with sensible
//! defaults, and helpers for building contexts and app state over the mock store.
#![allow(dead_code)]

use crate::api::handlers::{ApiState, ServerState};
use crate::ingest::{FoodId, MenuPayload, SwipeRequest};
use crate::neo4j::mock::{MockConnector, MockGraphStore};
use crate::{AppState, GraphContext, GraphSettings};
use std::sync::Arc;

// ============================================================================
// Mock state builders
// ============================================================================

pub fn test_settings() -> GraphSettings {
    GraphSettings {
        uri: "bolt://mock:7687".to_string(),
        user: "neo4j".to_string(),
        password: "mock".to_string(),
        database: None,
        max_connections: None,
    }
}

/// Configured context over an empty mock store
pub fn mock_context() -> (GraphContext, Arc<MockConnector>, Arc<MockGraphStore>) {
    let store = Arc::new(MockGraphStore::new());
    let connector = Arc::new(MockConnector::new(store.clone()));
    let ctx = GraphContext::new(Ok(test_settings()), connector.clone());
    (ctx, connector, store)
}

/// Context with no connection settings
pub fn unconfigured_context() -> (GraphContext, Arc<MockConnector>) {
    let connector = Arc::new(MockConnector::new(Arc::new(MockGraphStore::new())));
    let ctx = GraphContext::new(
        Err(vec!["NEO4J_URI", "NEO4J_USER", "NEO4J_PASSWORD"]),
        connector.clone(),
    );
    (ctx, connector)
}

/// Wrap a context into AppState
pub fn mock_app_state_with(ctx: GraphContext) -> AppState {
    AppState {
        graph: Arc::new(ctx),
    }
}

/// Create a mock AppState over an empty mock store
pub fn mock_app_state() -> (AppState, Arc<MockGraphStore>) {
    let (ctx, _, store) = mock_context();
    (mock_app_state_with(ctx), store)
}

/// Router state built from AppState
pub fn mock_api_state(app: AppState) -> ApiState {
    Arc::new(ServerState::new(app))
}

// ============================================================================
// Payload factories
// ============================================================================

/// Menu payload carrying only an id
pub fn test_menu(food_id: &str) -> MenuPayload {
    MenuPayload {
        id: Some(FoodId::Text(food_id.to_string())),
        ..Default::default()
    }
}

/// Swipe request with the given user, food and action
pub fn swipe_request(user_id: &str, food_id: &str, action: &str) -> SwipeRequest {
    SwipeRequest {
        user_id: Some(user_id.to_string()),
        menu: Some(test_menu(food_id)),
        action: Some(action.to_string()),
        ..Default::default()
    }
}
