use axum::extract::{FromRequest, FromRequestParts};

use crate::error::Error;

/// JSON request body. Rejections answer with the usual `{"error": …}` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct PathParams<T>(pub T);
