//! Manifest - JSON으로 선언하는 데모 컴포넌트 목록

use anyhow::{anyhow, Context};
use lazyel_core::{DeclaredEntry, Descriptor, MemoryHost, ModuleFactory, RawModule};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 모듈 전달 형태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// 컴파일 필요
    #[default]
    Raw,
    /// 컴파일 완료
    Ready,
}

/// 매니페스트 항목
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub selector: String,

    /// 모듈 이름 (기본: selector)
    #[serde(default)]
    pub module: Option<String>,

    /// 모듈이 내보내는 컴포넌트 이름 (기본: 모듈 이름)
    #[serde(default)]
    pub component: Option<String>,

    #[serde(default)]
    pub kind: ModuleKind,

    /// fetch 지연 (ms)
    #[serde(default)]
    pub delay_ms: u64,

    /// fetch 실패 시뮬레이션
    #[serde(default)]
    pub fail: bool,

    /// 컴파일 실패 시뮬레이션 (raw 모듈만)
    #[serde(default)]
    pub compile_error: Option<String>,
}

impl ManifestEntry {
    /// 로더 선언으로 변환
    pub fn into_entry(self) -> DeclaredEntry<MemoryHost> {
        let module = self.module.unwrap_or_else(|| self.selector.clone());
        let component = self.component.unwrap_or_else(|| module.clone());
        let delay = Duration::from_millis(self.delay_ms);
        let (kind, fail, compile_error) = (self.kind, self.fail, self.compile_error);

        DeclaredEntry::new(self.selector, move || {
            let module = module.clone();
            let component = component.clone();
            let compile_error = compile_error.clone();
            async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if fail {
                    return Err(anyhow!("failed to fetch module '{}'", module));
                }
                Ok(match kind {
                    ModuleKind::Ready => Descriptor::Ready(ModuleFactory::new(module, component)),
                    ModuleKind::Raw => {
                        let raw = RawModule::new(module, component);
                        Descriptor::Raw(match compile_error {
                            Some(error) => raw.broken(error),
                            None => raw,
                        })
                    }
                })
            }
        })
    }
}

/// 매니페스트 파일
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub components: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid manifest {}", path.display()))
    }

    pub fn into_entries(self) -> Vec<DeclaredEntry<MemoryHost>> {
        self.components.into_iter().map(ManifestEntry::into_entry).collect()
    }
}
