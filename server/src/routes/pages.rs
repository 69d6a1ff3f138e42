use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::services::ServeFile;

// Sign-in and sign-out are handled by the platform's auth endpoints; these
// routes only point the browser at them.
const SIGNIN_REDIRECT: &str = "/.auth/login/aad?post_login_redirect_uri=/profile";
const SIGNOUT_REDIRECT: &str = "/.auth/logout?post_logout_redirect_uri=/";

async fn signin() -> Response {
    found(SIGNIN_REDIRECT)
}

async fn signout() -> Response {
    found(SIGNOUT_REDIRECT)
}

/// Plain 302, the status browsers expect from these navigation redirects.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub fn router() -> Router {
    Router::new()
        .route_service("/", ServeFile::new("static/index.html"))
        .route_service("/flwins.html", ServeFile::new("static/index.html"))
        .route_service("/profile", ServeFile::new("static/profile.html"))
        .route("/signin", get(signin))
        .route("/create-account", get(signin))
        .route("/signout", get(signout))
}
