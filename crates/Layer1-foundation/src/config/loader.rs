//! Loader Config - 컴포넌트 로더 설정
//!
//! 선언된 selector 목록은 코드(클로저)로 제공되므로 여기에는 런타임 동작 설정만 둔다.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// 설정 파일명
pub const LOADER_CONFIG_FILE: &str = "lazyel.json";

/// 컴포넌트 로더 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderConfig {
    /// 라이프사이클 이벤트 broadcast 채널 크기
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// 이 시간(ms)보다 오래 걸린 로드는 warn 로그 (0 = 비활성화)
    #[serde(default = "default_slow_load_warn_ms")]
    pub slow_load_warn_ms: u64,
}

fn default_event_capacity() -> usize {
    64
}

fn default_slow_load_warn_ms() -> u64 {
    3_000
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            slow_load_warn_ms: default_slow_load_warn_ms(),
        }
    }
}

impl LoaderConfig {
    // ========================================================================
    // Load
    // ========================================================================

    /// JSON 파일에서 로드 (누락된 필드는 기본값)
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: LoaderConfig = serde_json::from_str(&content)?;
        config.validate()?;
        debug!("Loaded loader config from {:?}", path);
        Ok(config)
    }

    /// 파일이 없으면 기본값
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No loader config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// 설정 값 검증
    pub fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(Error::Config("eventCapacity must be greater than 0".into()));
        }
        Ok(())
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn with_slow_load_warn_ms(mut self, ms: u64) -> Self {
        self.slow_load_warn_ms = ms;
        self
    }

    /// 느린 로드 경고 대상인지
    pub fn is_slow(&self, elapsed_ms: u64) -> bool {
        self.slow_load_warn_ms > 0 && elapsed_ms > self.slow_load_warn_ms
    }
}
