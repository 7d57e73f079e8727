//! Loader Events - 완료 이벤트와 라이프사이클 이벤트

use lazyel_foundation::ComponentError;
use serde::Serialize;

// ============================================================================
// LoadedEvent - 완료 이벤트
// ============================================================================

/// selector 로드(또는 캐시 조회)가 끝났을 때 호출자에게 전달되는 값
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedEvent<I> {
    pub selector: String,

    /// `want_instance`로 요청한 경우 새로 만든 인스턴스
    pub instance: Option<I>,
}

impl<I> LoadedEvent<I> {
    pub fn new(selector: impl Into<String>, instance: Option<I>) -> Self {
        Self {
            selector: selector.into(),
            instance,
        }
    }
}

// ============================================================================
// LoaderEvent - 라이프사이클 이벤트
// ============================================================================

/// 로더 라이프사이클 이벤트 (broadcast)
#[derive(Debug, Clone)]
pub enum LoaderEvent {
    /// 새 로드 시작
    Started { selector: String },

    /// 로드 완료
    Loaded { selector: String, elapsed_ms: u64 },

    /// 로드 실패
    Failed {
        selector: String,
        error: ComponentError,
    },
}

impl LoaderEvent {
    pub fn selector(&self) -> &str {
        match self {
            Self::Started { selector }
            | Self::Loaded { selector, .. }
            | Self::Failed { selector, .. } => selector,
        }
    }
}

// ============================================================================
// LoaderStats
// ============================================================================

/// 로더 상태 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoaderStats {
    /// 선언되었고 로딩 중이 아닌 항목
    pub declared: usize,
    /// 로딩 중인 항목
    pub loading: usize,
    /// 로드 완료된 항목
    pub loaded: usize,
}
