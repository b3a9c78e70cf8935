//! 데이터 조회 에러 타입.

use thiserror::Error;
use trader_core::CoreError;

/// 데이터 조회 에러.
///
/// 모든 변형은 코어 경계에서 `CoreError::UpstreamUnavailable`로 변환됩니다.
#[derive(Debug, Error)]
pub enum FetchError {
    /// 네트워크/전송 오류
    #[error("네트워크 오류: {0}")]
    Network(String),

    /// HTTP 상태 코드 오류
    #[error("HTTP {status} 응답: {body}")]
    Http { status: u16, body: String },

    /// 응답 형식 오류
    #[error("응답 파싱 오류: {0}")]
    Parse(String),

    /// 사용할 수 있는 데이터 없음
    #[error("{symbol}: 사용할 수 있는 가격 데이터가 없습니다")]
    Empty { symbol: String },

    /// 지원하지 않는 캔들 간격
    #[error("지원하지 않는 간격: {0}")]
    UnsupportedInterval(String),

    /// 로컬 파일 오류
    #[error("파일 오류: {0}")]
    Io(String),
}

impl FetchError {
    /// 빈 응답 에러 생성 헬퍼
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self::Empty {
            symbol: symbol.into(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

impl From<csv::Error> for FetchError {
    fn from(err: csv::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::Io(err.to_string())
    }
}

impl From<FetchError> for CoreError {
    fn from(err: FetchError) -> Self {
        CoreError::UpstreamUnavailable(err.to_string())
    }
}

/// Result 타입 별칭
pub type FetchResult<T> = Result<T, FetchError>;
