//! # Host Contracts
//!
//! 로더 코어가 필요로 하는 호스트 환경 기능
//!
//! 모듈 로딩, 이름 기반 등록(define/whenDefined), 서브트리 검색은 호스트가 제공한다.
//! 코어는 이 trait을 통해서만 접근하므로 테스트에서는 [`MemoryHost`]로 교체할 수 있다.
//!
//! ```text
//! loader() ──▶ Descriptor::Ready(factory) ───────────────┐
//!         └──▶ Descriptor::Raw(module) ──▶ resolve() ────┤
//!                                                        ▼
//!                                 instantiate() ──▶ define() ──▶ when_defined()
//! ```

mod memory;

pub use memory::{
    Element, ElementConstructor, ElementInstance, MemoryHost, ModuleFactory, ModuleRef, RawModule,
};

use async_trait::async_trait;
use lazyel_foundation::{ComponentError, LoadStage};

// ============================================================================
// Descriptor - loader 결과
// ============================================================================

/// loader 콜백이 돌려주는 구현 descriptor
///
/// 이미 컴파일된 형태(`Ready`)와 컴파일이 필요한 형태(`Raw`) 두 가지를 모두 지원한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor<M, F> {
    /// 바로 인스턴스화 가능한 factory
    Ready(F),
    /// resolve 단계가 필요한 raw 모듈
    Raw(M),
}

impl<M, F> Descriptor<M, F> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Descriptor::Ready(_))
    }
}

/// 호스트별 descriptor 타입
pub type HostDescriptor<H> = Descriptor<<H as ComponentHost>::Module, <H as ComponentHost>::Factory>;

/// instantiate 결과
#[derive(Debug)]
pub struct Instantiated<C, X> {
    /// define()에 넘길 생성자
    pub constructor: C,
    /// 로드 완료 후 레지스트리에 보관되는 컨텍스트
    pub context: X,
}

// ============================================================================
// ComponentHost - 호스트 환경 trait
// ============================================================================

/// 컴포넌트를 등록하고 검색하는 호스트 환경
#[async_trait]
pub trait ComponentHost: Send + Sync + 'static {
    /// 컴파일 전 raw 모듈
    type Module: Send + 'static;

    /// 인스턴스화 가능한 factory
    type Factory: Send + 'static;

    /// define()에 등록되는 생성자
    type Constructor: Send + 'static;

    /// 로드된 컴포넌트의 지원 컨텍스트 (레지스트리가 보관)
    type Context: Send + Sync + 'static;

    /// create_instance()가 만드는 인스턴스
    type Instance: Send + 'static;

    /// 검색 범위 (서브트리 루트)
    type Root: ?Sized + Sync;

    /// raw 모듈을 factory로 컴파일
    async fn resolve(&self, module: Self::Module) -> anyhow::Result<Self::Factory>;

    /// factory로부터 생성자와 컨텍스트 생성
    fn instantiate(
        &self,
        factory: Self::Factory,
    ) -> anyhow::Result<Instantiated<Self::Constructor, Self::Context>>;

    /// selector 이름으로 생성자 등록 (프로세스 전역 side effect)
    fn define(&self, selector: &str, constructor: Self::Constructor) -> anyhow::Result<()>;

    /// define()이 전역적으로 반영될 때까지 대기
    ///
    /// define() 성공 후 여기서 실패하면 이름은 이미 등록된 상태로 남는다.
    /// 이후 재시도는 Define 단계에서 중복 이름으로 실패하므로 재시도가 영구히 막힌다.
    async fn when_defined(&self, selector: &str) -> anyhow::Result<()>;

    /// root 아래에 selector와 일치하는 요소가 있는지
    fn matches(&self, root: &Self::Root, selector: &str) -> bool;

    /// 새 인스턴스 생성
    fn create_instance(&self, selector: &str) -> Self::Instance;
}

/// descriptor를 ready 형태로 변환 (Raw면 resolve 호출)
pub async fn resolve_descriptor<H: ComponentHost>(
    host: &H,
    selector: &str,
    descriptor: HostDescriptor<H>,
) -> Result<H::Factory, ComponentError> {
    match descriptor {
        Descriptor::Ready(factory) => Ok(factory),
        Descriptor::Raw(module) => host
            .resolve(module)
            .await
            .map_err(|e| ComponentError::load(selector, LoadStage::Resolve, format!("{e:#}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ready_descriptor_skips_resolve() {
        let host = MemoryHost::new();
        let descriptor = Descriptor::Ready(ModuleFactory::new("chart", "ChartComponent"));

        let factory = resolve_descriptor(&host, "x-chart", descriptor).await.unwrap();
        assert_eq!(factory.component, "ChartComponent");
        assert_eq!(host.resolve_count(), 0);
    }

    #[tokio::test]
    async fn test_raw_descriptor_is_compiled() {
        let host = MemoryHost::new();
        let descriptor = Descriptor::Raw(RawModule::new("chart", "ChartComponent"));
        assert!(!descriptor.is_ready());

        let factory = resolve_descriptor(&host, "x-chart", descriptor).await.unwrap();
        assert_eq!(factory.name, "chart");
        assert_eq!(host.resolve_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_failure_is_tagged() {
        let host = MemoryHost::new();
        let descriptor = Descriptor::Raw(RawModule::new("chart", "ChartComponent").broken("unexpected token"));

        let err = resolve_descriptor(&host, "x-chart", descriptor).await.unwrap_err();
        assert_eq!(err.stage(), Some(LoadStage::Resolve));
        assert_eq!(err.selector(), "x-chart");
    }
}
