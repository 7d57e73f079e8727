//! Registry Entry - 레지스트리 항목 정의

use crate::host::{ComponentHost, HostDescriptor};
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

// ============================================================================
// ComponentState - selector 상태
// ============================================================================

/// selector의 현재 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentState {
    /// 선언되지 않음
    Unknown,

    /// 선언됨, 아직 로드 안 됨
    Declared,

    /// 로딩 중
    Loading,

    /// 로드 완료
    Loaded,
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Declared => write!(f, "declared"),
            Self::Loading => write!(f, "loading"),
            Self::Loaded => write!(f, "loaded"),
        }
    }
}

// ============================================================================
// DeclaredEntry - 선언된 컴포넌트
// ============================================================================

/// loader 콜백
pub type LoaderFn<H> =
    Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<HostDescriptor<H>>> + Send + Sync>;

/// 선언된 (아직 로드되지 않은) 컴포넌트
pub struct DeclaredEntry<H: ComponentHost> {
    /// selector (태그 이름)
    pub selector: String,

    /// 구현을 가져오는 콜백
    pub(crate) loader: LoaderFn<H>,
}

impl<H: ComponentHost> DeclaredEntry<H> {
    /// 새 선언 생성
    ///
    /// ```ignore
    /// let entry = DeclaredEntry::<MemoryHost>::new("x-chart", || async {
    ///     Ok(Descriptor::Raw(RawModule::new("chart", "ChartComponent")))
    /// });
    /// ```
    pub fn new<F, Fut>(selector: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<HostDescriptor<H>>> + Send + 'static,
    {
        Self {
            selector: selector.into(),
            loader: Arc::new(move || loader().boxed()),
        }
    }

    /// loader 호출
    pub fn fetch(&self) -> BoxFuture<'static, anyhow::Result<HostDescriptor<H>>> {
        (self.loader)()
    }
}

impl<H: ComponentHost> Clone for DeclaredEntry<H> {
    fn clone(&self) -> Self {
        Self {
            selector: self.selector.clone(),
            loader: Arc::clone(&self.loader),
        }
    }
}

impl<H: ComponentHost> fmt::Debug for DeclaredEntry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeclaredEntry")
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// LoadedEntry - 로드된 컴포넌트
// ============================================================================

/// 로드 완료된 컴포넌트 (프로세스 수명 동안 유지)
pub struct LoadedEntry<H: ComponentHost> {
    pub selector: String,

    /// instantiate()가 만든 컨텍스트
    pub handle: Arc<H::Context>,
}

impl<H: ComponentHost> LoadedEntry<H> {
    pub fn new(selector: impl Into<String>, handle: Arc<H::Context>) -> Self {
        Self {
            selector: selector.into(),
            handle,
        }
    }
}

impl<H: ComponentHost> fmt::Debug for LoadedEntry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedEntry")
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}
