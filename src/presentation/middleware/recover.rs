//! Recovery Middleware
//!
//! Outermost pipeline layer. A panic in any deeper layer is caught, logged
//! with the method that raised it, and turned into an opaque internal error
//! instead of killing the process.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;

use crate::shared::error::AppError;

pub async fn recover_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            tracing::error!(
                method = %method,
                path = %path,
                panic = %panic_message(panic.as_ref()),
                "panic recovered in request handler"
            );
            AppError::Internal("panic in request handler".into()).into_response()
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
