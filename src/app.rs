use axum::{
    extract::State,
    middleware::from_fn,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{protected, public};
use crate::state::AppState;

pub fn app(state: AppState, enable_cors: bool) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(share_public_routes())
        // Protected
        .merge(protected_routes().layer(from_fn(crate::middleware::jwt_auth_middleware)))
        .with_state(state);

    let router = if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http())
}

fn share_public_routes() -> Router<AppState> {
    Router::new()
        .route("/public/share/:token", get(public::share_get))
        .route("/public/share/:token/layout", post(public::share_layout))
}

fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/api/hierarchy", get(protected::hierarchy_get))
        .route("/api/hierarchy/layout", post(protected::hierarchy_layout))
        .route("/api/hierarchy/:id", get(protected::subtree_get))
        .route("/api/share", post(protected::share_create))
        .route("/api/share/:token", delete(protected::share_revoke))
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Org Chart API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Reporting-line hierarchy, layout and share links over staff data",
            "source": state.source.describe(),
            "endpoints": {
                "health": "/health (public)",
                "share": "/public/share/:token[/layout] (public - share token)",
                "hierarchy": "/api/hierarchy[/:id|/layout] (protected)",
                "share_admin": "/api/share[/:token] (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let active_shares = match state.shares.active_count().await {
        Ok(count) => json!(count),
        Err(e) => {
            tracing::warn!("Share store unavailable during health check: {}", e);
            Value::Null
        }
    };

    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": state.clock.now(),
            "active_shares": active_shares,
        }
    }))
}
