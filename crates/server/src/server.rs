use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::sync::Arc;

use crate::{books, categories, entries, reports, users};
use engine::{Engine, EngineError};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    /// Whether `POST /register` accepts new accounts.
    pub allow_registration: bool,
}

impl ServerState {
    pub fn new(engine: Engine, allow_registration: bool) -> Self {
        Self {
            engine: Arc::new(engine),
            allow_registration,
        }
    }
}

fn unauthorized() -> Response {
    let mut response = StatusCode::UNAUTHORIZED.into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"cashbook\""),
    );
    response
}

/// Resolve the HTTP Basic credentials into an [`engine::Actor`] request
/// extension.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let Some(TypedHeader(credentials)) = auth_header else {
        return Err(unauthorized());
    };
    if credentials.username().is_empty() || credentials.password().is_empty() {
        return Err(unauthorized());
    }

    let actor = match state
        .engine
        .authenticate(credentials.username(), credentials.password())
        .await
    {
        Ok(actor) => actor,
        Err(EngineError::Forbidden(_)) => {
            tracing::warn!(user = credentials.username(), "authentication failed");
            return Err(unauthorized());
        }
        Err(err) => return Err(crate::ServerError::from(err).into_response()),
    };

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/me", get(users::me))
        .route("/books", get(books::list).post(books::create))
        .route("/books/{book_id}", get(books::overview))
        .route(
            "/books/{book_id}/entries",
            get(entries::list).post(entries::create),
        )
        .route(
            "/books/{book_id}/entries/{entry_id}",
            get(entries::get)
                .patch(entries::update)
                .delete(entries::delete),
        )
        .route(
            "/books/{book_id}/categories",
            get(categories::list_for_book).post(categories::create),
        )
        .route("/categories", get(categories::list_all))
        .route(
            "/categories/{category_id}",
            patch(categories::rename).delete(categories::delete),
        )
        .route("/books/{book_id}/report", get(reports::download))
        .route(
            "/books/{book_id}/users",
            get(books::members).post(books::add_member),
        )
        .route("/books/{book_id}/users/candidates", get(books::candidates))
        .route(
            "/books/{book_id}/users/{user_id}",
            patch(users::edit_member).delete(users::remove_member),
        )
        .route("/users/managed", get(users::managed))
        .route(
            "/users/{user_id}",
            patch(users::edit).delete(users::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/register", post(users::register))
        .merge(protected)
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    allow_registration: bool,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState::new(engine, allow_registration);

    axum::serve(listener, router(state)).await
}
