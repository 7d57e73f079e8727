//! lazyel-core: Core Runtime for LazyEl
//!
//! Layer2 - 컴포넌트 지연 로딩 레이어
//!
//! # 주요 모듈
//!
//! - `registry`: 선언/로드 완료 컴포넌트 저장소
//! - `loader`: 로드 조정 (중복 제거), 서브트리 검색, 일괄 로드
//! - `host`: 호스트 환경 trait과 인메모리 구현
//!
//! # 사용 예시
//!
//! ```ignore
//! use lazyel_core::{ComponentLoader, DeclaredEntry, Descriptor, Element, MemoryHost, RawModule};
//!
//! let loader = ComponentLoader::new(
//!     Arc::new(MemoryHost::new()),
//!     vec![DeclaredEntry::new("x-chart", || async {
//!         Ok(Descriptor::Raw(RawModule::new("chart", "ChartComponent")))
//!     })],
//! );
//!
//! // 단일 컴포넌트
//! let event = loader.load_component("x-chart", false).await?;
//!
//! // 서브트리에 포함된 모든 컴포넌트
//! let events = loader.load_contained_components(&root).await?;
//! ```

pub mod host;
pub mod loader;
pub mod registry;

// Re-exports: Host
pub use host::{
    resolve_descriptor, ComponentHost, Descriptor, Element, ElementConstructor, ElementInstance,
    HostDescriptor, Instantiated, MemoryHost, ModuleFactory, ModuleRef, RawModule,
};

// Re-exports: Loader
pub use loader::{ComponentLoader, LoadFuture, LoadedEvent, LoaderEvent, LoaderStats};

// Re-exports: Registry
pub use registry::{ComponentState, DeclaredEntry, LoadedEntry, LoaderFn, Registry};

// Re-exports: Foundation
pub use lazyel_foundation::{ComponentError, LoadStage, LoaderConfig};
