use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{
    dashboard, expenses, invoices, projects, purchase_orders, sales_orders, timesheets,
    vendor_bills,
};
use engine::{Engine, users};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<users::Model> = users::Entity::find()
        .filter(users::Column::Username.eq(auth_header.username()))
        .filter(users::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let user = if let Some(user) = user {
        user
    } else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/finance/sales-orders",
            get(sales_orders::list).post(sales_orders::create),
        )
        .route("/finance/sales-orders/{id}", get(sales_orders::get_one))
        .route("/finance/sales-orders/{id}/confirm", post(sales_orders::confirm))
        .route("/finance/sales-orders/{id}/paid", post(sales_orders::mark_paid))
        .route(
            "/finance/sales-orders/{id}/convert-invoice",
            post(sales_orders::convert_invoice),
        )
        .route(
            "/finance/purchase-orders",
            get(purchase_orders::list).post(purchase_orders::create),
        )
        .route("/finance/purchase-orders/{id}", get(purchase_orders::get_one))
        .route(
            "/finance/purchase-orders/{id}/approve",
            post(purchase_orders::approve),
        )
        .route(
            "/finance/purchase-orders/{id}/paid",
            post(purchase_orders::mark_paid),
        )
        .route("/finance/invoices", get(invoices::list).post(invoices::create))
        .route("/finance/invoices/{id}", get(invoices::get_one))
        .route("/finance/invoices/{id}/paid", post(invoices::mark_paid))
        .route(
            "/finance/vendor-bills",
            get(vendor_bills::list).post(vendor_bills::create),
        )
        .route("/finance/vendor-bills/{id}", get(vendor_bills::get_one))
        .route("/finance/vendor-bills/{id}/paid", post(vendor_bills::mark_paid))
        .route("/finance/dashboard", get(dashboard::get_dashboard))
        .route("/projects", get(projects::list).post(projects::create))
        .route("/projects/{id}", get(projects::get_one))
        .route("/projects/{id}/members", post(projects::add_member))
        .route("/projects/{id}/ledger/rebuild", post(projects::rebuild_ledger))
        .route("/expenses", get(expenses::list).post(expenses::submit))
        .route("/expenses/{id}/approve", post(expenses::approve))
        .route("/expenses/{id}/reject", post(expenses::reject))
        .route("/expenses/{id}/reimburse", post(expenses::reimburse))
        .route("/timesheets", get(timesheets::list).post(timesheets::log))
        .route("/timesheets/{id}", axum::routing::delete(timesheets::remove))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use base64::Engine as _;
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ConnectionTrait, Database, Statement};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let backend = db.get_database_backend();
        for (username, role) in [("dana", "finance"), ("paula", "project_manager")] {
            db.execute(Statement::from_sql_and_values(
                backend,
                "INSERT INTO users (username, password, role, hourly_rate_minor) \
                 VALUES (?, ?, ?, 0)",
                vec![username.into(), "password".into(), role.into()],
            ))
            .await
            .unwrap();
        }
        let engine = Engine::builder()
            .database(db.clone())
            .build()
            .await
            .unwrap();
        router(ServerState {
            engine: Arc::new(engine),
            db,
        })
    }

    fn basic(username: &str, password: &str) -> String {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
        format!("Basic {encoded}")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn requests_without_valid_credentials_are_rejected() {
        let app = test_router().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/projects")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/projects")
                    .header(header::AUTHORIZATION, basic("dana", "wrong"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sales_order_roundtrip_over_http() {
        let app = test_router().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/projects")
                    .header(header::AUTHORIZATION, basic("dana", "password"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"name": "Website", "client": "Acme Corp", "manager_id": "paula"})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let project_id = body_json(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/finance/sales-orders")
                    .header(header::AUTHORIZATION, basic("dana", "password"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "customer": "Acme Corp",
                            "project_id": project_id,
                            "items": [
                                {"quantity": 10.0, "unit_price_minor": 15000, "tax_rate": 0.18}
                            ]
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/finance/sales-orders")
                    .header(header::AUTHORIZATION, basic("dana", "password"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let rows = body["sales_orders"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["number"], "SO-1001");
        assert_eq!(rows[0]["amount_minor"], 177_000);
    }

    #[tokio::test]
    async fn dashboard_is_finance_only() {
        let app = test_router().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/finance/dashboard")
                    .header(header::AUTHORIZATION, basic("paula", "password"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
