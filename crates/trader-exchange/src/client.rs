//! 공용 HTTP 클라이언트.
//!
//! 모든 요청은 단일 GET이며 재시도, 백오프, 페이지네이션을 하지 않습니다.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};

/// 기본 요청 타임아웃 (초)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const USER_AGENT: &str = concat!("trader/", env!("CARGO_PKG_VERSION"));

/// 타임아웃과 User-Agent가 설정된 HTTP 클라이언트 생성.
pub(crate) fn build_client(timeout: Duration) -> FetchResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FetchError::Network(format!("HTTP 클라이언트 생성 실패: {}", e)))
}

/// JSON GET 요청.
///
/// 2xx가 아닌 응답은 `FetchError::Http`, 본문 파싱 실패는 `FetchError::Parse`입니다.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> FetchResult<T> {
    debug!(url = url, "HTTP GET");

    let response = client.get(url).query(query).send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        warn!(url = url, status = status.as_u16(), "HTTP 요청 실패");
        return Err(FetchError::Http {
            status: status.as_u16(),
            body,
        });
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(FetchError::from)
}

/// base URL 끝의 `/` 제거.
pub(crate) fn normalize_base_url(base_url: impl Into<String>) -> String {
    base_url.into().trim_end_matches('/').to_string()
}
