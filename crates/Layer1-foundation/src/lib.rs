//! # lazyel-foundation
//!
//! Foundation layer for LazyEl:
//! - Error: 공통 에러 타입 (Error, ComponentError)
//! - Config: 로더 설정 (LoaderConfig)

pub mod config;
pub mod error;

// ============================================================================
// Error
// ============================================================================
pub use error::{ComponentError, Error, LoadStage, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{LoaderConfig, LOADER_CONFIG_FILE};
