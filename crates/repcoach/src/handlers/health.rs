use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

pub async fn livez() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

#[derive(Serialize)]
pub struct ReadyzResponse {
    pub status: &'static str,
}

pub async fn readyz() -> Json<ReadyzResponse> {
    Json(ReadyzResponse { status: "ok" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_livez() {
        let (status, body) = livez().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_readyz() {
        let Json(body) = readyz().await;
        assert_eq!(body.status, "ok");
    }
}
