//! 코어 에러 타입 정의.
//!
//! 지표 계산, 시뮬레이션, 데이터 수집 경계에서 공통으로 사용하는 에러 분류입니다.
//! 모든 에러는 호출 측에서 복구 가능하며, 코어는 프로세스를 중단시키지 않습니다.

use thiserror::Error;

/// 코어 에러 타입
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// 잘못된 파라미터 (윈도우, 수수료, 투자 비율, 초기 자본 등)
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),

    /// 데이터 부족
    #[error("데이터 부족: 최소 {required}개 필요, {provided}개 제공")]
    EmptySeries { required: usize, provided: usize },

    /// 외부 데이터 소스 사용 불가 (재시도하지 않고 그대로 전달)
    #[error("데이터 소스 사용 불가: {0}")]
    UpstreamUnavailable(String),
}

impl CoreError {
    /// InvalidParameter 생성 헬퍼
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// UpstreamUnavailable 생성 헬퍼
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }

    /// 입력 데이터 문제인지 여부 (파라미터 오류가 아닌 경우)
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::EmptySeries { .. } | Self::UpstreamUnavailable(_))
    }
}

/// Result 타입 별칭
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::EmptySeries {
            required: 2,
            provided: 1,
        };
        assert_eq!(err.to_string(), "데이터 부족: 최소 2개 필요, 1개 제공");

        let err = CoreError::invalid("fee_percent=150");
        assert!(err.to_string().contains("fee_percent=150"));
    }

    #[test]
    fn test_is_data_error() {
        assert!(CoreError::upstream("HTTP 500").is_data_error());
        assert!(CoreError::EmptySeries {
            required: 2,
            provided: 0
        }
        .is_data_error());
        assert!(!CoreError::invalid("window=0").is_data_error());
    }
}
