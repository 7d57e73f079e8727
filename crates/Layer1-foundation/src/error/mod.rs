//! Error types for LazyEl
//!
//! 모든 에러를 중앙에서 관리

use std::fmt;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// LazyEl 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// ComponentError - selector 단위 로딩 에러
// ============================================================================

/// 로딩 파이프라인 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadStage {
    /// loader 콜백 호출
    Fetch,
    /// raw descriptor 컴파일
    Resolve,
    /// descriptor 인스턴스화
    Instantiate,
    /// 이름으로 등록 (define)
    Define,
    /// 등록 가시성 확인 (whenDefined)
    WhenDefined,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoadStage::Fetch => "fetch",
            LoadStage::Resolve => "resolve",
            LoadStage::Instantiate => "instantiate",
            LoadStage::Define => "define",
            LoadStage::WhenDefined => "when_defined",
        };
        f.write_str(s)
    }
}

/// 컴포넌트 로딩 에러
///
/// 같은 selector를 기다리는 모든 호출자에게 동일한 에러가 전달되므로 `Clone`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    #[error("Unrecognized component \"{selector}\". Make sure it is registered in the component registry")]
    Unregistered { selector: String },

    #[error("Failed to load component \"{selector}\" ({stage}): {message}")]
    Load {
        selector: String,
        stage: LoadStage,
        message: String,
    },

    #[error("Load task for component \"{selector}\" aborted: {message}")]
    Aborted { selector: String, message: String },
}

impl ComponentError {
    /// 미등록 selector 에러 생성 헬퍼
    pub fn unregistered(selector: impl Into<String>) -> Self {
        ComponentError::Unregistered {
            selector: selector.into(),
        }
    }

    /// 단계별 로딩 에러 생성 헬퍼
    pub fn load(selector: impl Into<String>, stage: LoadStage, message: impl fmt::Display) -> Self {
        ComponentError::Load {
            selector: selector.into(),
            stage,
            message: message.to_string(),
        }
    }

    /// 에러가 발생한 selector
    pub fn selector(&self) -> &str {
        match self {
            ComponentError::Unregistered { selector }
            | ComponentError::Load { selector, .. }
            | ComponentError::Aborted { selector, .. } => selector,
        }
    }

    /// 재시도 가능한 에러인지 확인
    ///
    /// 실패한 로드는 다음 호출에서 새로 시도된다. 미등록 selector는 호출자 버그.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ComponentError::Unregistered { .. })
    }

    /// 실패한 단계 (로딩 에러인 경우)
    pub fn stage(&self) -> Option<LoadStage> {
        match self {
            ComponentError::Load { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
