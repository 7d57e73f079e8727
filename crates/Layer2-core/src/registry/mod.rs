//! # Component Registry
//!
//! selector 단위 컴포넌트 상태 저장소
//!
//! ## 상태
//!
//! ```text
//!            load 시작              whenDefined 확인
//! Declared ──────────────▶ Loading ──────────────────▶ Loaded
//!    ▲                        │
//!    └────────── 실패 ─────────┘   (선언은 재시도를 위해 유지)
//! ```
//!
//! - `Registry`: 선언 맵(selector → loader)과 로드 맵(selector → handle)
//! - Loading 상태는 로더(`ComponentLoader`)의 in-flight 맵이 관리한다.

mod entry;
mod store;

pub use entry::{ComponentState, DeclaredEntry, LoadedEntry, LoaderFn};
pub use store::Registry;
