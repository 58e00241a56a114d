use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResult<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResult<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Return type of every action handler.
pub type ActionResult<T> = Result<Json<ApiResult<T>>, AppError>;
