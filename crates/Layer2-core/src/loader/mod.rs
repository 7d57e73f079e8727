//! # Component Loader
//!
//! 선언된 컴포넌트를 필요할 때 한 번만 로드한다.
//!
//! ```text
//! discover(root) ──▶ load_contained_components(root)
//!                          │  selector마다
//!                          ▼
//!                  load_component(selector)
//!                   │ in-flight? ──▶ 공유 future 대기
//!                   │ declared?  ──▶ 로드 태스크 시작 (in-flight 등록 후)
//!                   │ loaded?    ──▶ 즉시 완료
//!                   └ unknown    ──▶ Unregistered 에러
//! ```

mod batch;
mod coordinator;
mod discovery;
mod events;

pub use coordinator::{ComponentLoader, LoadFuture};
pub use events::{LoadedEvent, LoaderEvent, LoaderStats};
