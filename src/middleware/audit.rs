// src/middleware/audit.rs

use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::middleware::auth::AuthenticatedUser;

// Registra "usuário | MÉTODO caminho?query" de toda requisição autenticada.
// Precisa ficar dentro do auth_guard.
pub async fn audit_log(request: Request<Body>, next: Next) -> Response {
    if let Some(AuthenticatedUser(user)) = request.extensions().get::<AuthenticatedUser>() {
        let uri = request.uri();
        let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or(uri.path());
        tracing::info!("👤 {} | {} {}", user.id, request.method(), target);
    }
    next.run(request).await
}
