//! Config - 로더 설정 관리
//!
//! - `loader.rs` - LoaderConfig (이벤트 채널 크기, 느린 로드 경고 임계값)

mod loader;

pub use loader::{LoaderConfig, LOADER_CONFIG_FILE};
