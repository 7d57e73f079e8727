//! Memory Host - 인메모리 호스트 구현
//!
//! 이름 → 생성자 테이블, whenDefined 대기, 요소 트리 검색을 메모리에서 처리한다.
//! 데모 CLI와 테스트에서 사용.

use super::{ComponentHost, Instantiated};
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

// ============================================================================
// 모듈 / 생성자 / 인스턴스 타입
// ============================================================================

/// 컴파일 전 모듈
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModule {
    pub name: String,
    pub component: String,
    /// 설정되면 resolve()가 이 메시지로 실패
    pub compile_error: Option<String>,
}

impl RawModule {
    pub fn new(name: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            component: component.into(),
            compile_error: None,
        }
    }

    /// 컴파일에 실패하는 모듈
    pub fn broken(mut self, error: impl Into<String>) -> Self {
        self.compile_error = Some(error.into());
        self
    }
}

/// 컴파일된 모듈 factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFactory {
    pub name: String,
    pub component: String,
}

impl ModuleFactory {
    pub fn new(name: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            component: component.into(),
        }
    }
}

/// define()에 등록되는 생성자
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementConstructor {
    pub component: String,
}

/// 인스턴스화된 모듈 참조
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
    pub name: String,
    pub component: String,
}

/// create_instance()로 만들어진 요소
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInstance {
    pub tag: String,
    pub component: String,
    /// 생성 순번 (호출마다 새 값)
    pub id: u64,
}

// ============================================================================
// Element - 검색 대상 트리
// ============================================================================

/// 요소 트리 노드
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default)]
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// 자손 중 tag가 일치하는 첫 요소 (자기 자신은 제외)
    pub fn query_selector(&self, tag: &str) -> Option<&Element> {
        for child in &self.children {
            if child.tag.eq_ignore_ascii_case(tag) {
                return Some(child);
            }
            if let Some(found) = child.query_selector(tag) {
                return Some(found);
            }
        }
        None
    }
}

// ============================================================================
// MemoryHost
// ============================================================================

/// 인메모리 호스트
pub struct MemoryHost {
    /// 이름 → 생성자 테이블
    defined: Mutex<HashMap<String, ElementConstructor>>,

    /// whenDefined 대기자 깨우기
    defined_notify: Notify,

    /// define 후 가시화까지 지연
    visibility_delay: Option<Duration>,

    resolve_count: AtomicUsize,
    instance_seq: AtomicU64,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            defined: Mutex::new(HashMap::new()),
            defined_notify: Notify::new(),
            visibility_delay: None,
            resolve_count: AtomicUsize::new(0),
            instance_seq: AtomicU64::new(0),
        }
    }

    /// whenDefined가 확인 전에 지연하도록 설정
    pub fn with_visibility_delay(mut self, delay: Duration) -> Self {
        self.visibility_delay = Some(delay);
        self
    }

    /// 이름이 정의되었는지
    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.lock().contains_key(name)
    }

    /// 정의된 이름 목록 (정렬됨)
    pub fn defined_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.defined.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// resolve() 호출 횟수
    pub fn resolve_count(&self) -> usize {
        self.resolve_count.load(Ordering::SeqCst)
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComponentHost for MemoryHost {
    type Module = RawModule;
    type Factory = ModuleFactory;
    type Constructor = ElementConstructor;
    type Context = ModuleRef;
    type Instance = ElementInstance;
    type Root = Element;

    async fn resolve(&self, module: RawModule) -> anyhow::Result<ModuleFactory> {
        self.resolve_count.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if let Some(error) = module.compile_error {
            bail!("failed to compile module '{}': {}", module.name, error);
        }
        Ok(ModuleFactory::new(module.name, module.component))
    }

    fn instantiate(
        &self,
        factory: ModuleFactory,
    ) -> anyhow::Result<Instantiated<ElementConstructor, ModuleRef>> {
        if factory.component.is_empty() {
            return Err(anyhow!("module '{}' does not export a component", factory.name));
        }
        Ok(Instantiated {
            constructor: ElementConstructor {
                component: factory.component.clone(),
            },
            context: ModuleRef {
                name: factory.name,
                component: factory.component,
            },
        })
    }

    fn define(&self, selector: &str, constructor: ElementConstructor) -> anyhow::Result<()> {
        {
            let mut defined = self.defined.lock();
            if defined.contains_key(selector) {
                bail!("the name \"{}\" has already been used with this registry", selector);
            }
            defined.insert(selector.to_string(), constructor);
        }
        debug!("Defined element: {}", selector);
        self.defined_notify.notify_waiters();
        Ok(())
    }

    async fn when_defined(&self, selector: &str) -> anyhow::Result<()> {
        if let Some(delay) = self.visibility_delay {
            tokio::time::sleep(delay).await;
        }
        loop {
            // 확인 전에 등록해야 notify_waiters를 놓치지 않음
            let notified = self.defined_notify.notified();
            if self.is_defined(selector) {
                return Ok(());
            }
            notified.await;
        }
    }

    fn matches(&self, root: &Element, selector: &str) -> bool {
        root.query_selector(selector).is_some()
    }

    fn create_instance(&self, selector: &str) -> ElementInstance {
        let component = self
            .defined
            .lock()
            .get(selector)
            .map(|c| c.component.clone())
            .unwrap_or_default();
        ElementInstance {
            tag: selector.to_string(),
            component,
            id: self.instance_seq.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }
}
