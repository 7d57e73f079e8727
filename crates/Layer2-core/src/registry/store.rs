//! Component Registry - 선언/로드 완료 맵

use super::entry::{DeclaredEntry, LoadedEntry};
use crate::host::ComponentHost;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::warn;

/// 선언된 컴포넌트와 로드된 컴포넌트를 보관하는 레지스트리
///
/// 두 맵 모두 삽입 순서를 유지한다 (선언 순서 / 로드 완료 순서).
/// I/O 없음, 동기 연산만 제공.
pub struct Registry<H: ComponentHost> {
    /// selector -> 선언 (로드 성공 시 제거)
    declared: IndexMap<String, DeclaredEntry<H>>,

    /// selector -> 로드된 항목 (제거되지 않음)
    loaded: IndexMap<String, LoadedEntry<H>>,
}

impl<H: ComponentHost> Registry<H> {
    /// 초기 선언 목록으로 생성
    ///
    /// 같은 selector가 여러 번 선언되면 마지막 선언이 이긴다.
    pub fn new(entries: impl IntoIterator<Item = DeclaredEntry<H>>) -> Self {
        let mut declared = IndexMap::new();
        for entry in entries {
            if declared.contains_key(&entry.selector) {
                warn!("Component '{}' declared more than once, keeping the last declaration", entry.selector);
            }
            declared.insert(entry.selector.clone(), entry);
        }
        Self {
            declared,
            loaded: IndexMap::new(),
        }
    }

    // ========================================================================
    // Declared
    // ========================================================================

    pub fn has_declared(&self, selector: &str) -> bool {
        self.declared.contains_key(selector)
    }

    pub fn get_declared(&self, selector: &str) -> Option<&DeclaredEntry<H>> {
        self.declared.get(selector)
    }

    /// 선언 제거 (나머지 순서 유지)
    pub fn remove_declared(&mut self, selector: &str) -> Option<DeclaredEntry<H>> {
        self.declared.shift_remove(selector)
    }

    /// 선언된 selector (선언 순서)
    pub fn declared_selectors(&self) -> impl Iterator<Item = &str> {
        self.declared.keys().map(String::as_str)
    }

    pub fn declared_len(&self) -> usize {
        self.declared.len()
    }

    // ========================================================================
    // Loaded
    // ========================================================================

    pub fn has_loaded(&self, selector: &str) -> bool {
        self.loaded.contains_key(selector)
    }

    pub fn set_loaded(&mut self, selector: &str, handle: Arc<H::Context>) {
        self.loaded
            .insert(selector.to_string(), LoadedEntry::new(selector, handle));
    }

    pub fn get_loaded(&self, selector: &str) -> Option<Arc<H::Context>> {
        self.loaded.get(selector).map(|e| Arc::clone(&e.handle))
    }

    /// 로드된 selector (로드 완료 순서)
    pub fn loaded_selectors(&self) -> impl Iterator<Item = &str> {
        self.loaded.keys().map(String::as_str)
    }

    pub fn loaded_len(&self) -> usize {
        self.loaded.len()
    }
}
