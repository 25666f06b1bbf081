//! Fills the `path` of JSON error bodies.

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ErrorBody;

/// Re-render error responses with the request path.
///
/// Responses without an [`ErrorBody`] extension pass through untouched.
pub async fn error_path_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    let Some(mut body) = response.extensions_mut().remove::<ErrorBody>() else {
        return response;
    };
    body.path = path;

    let mut headers = response.headers().clone();
    headers.remove(header::CONTENT_LENGTH);

    let mut rendered = body.into_response();
    rendered.headers_mut().extend(headers);
    rendered
}
