//! Load Coordinator - selector 단위 로드 조정
//!
//! selector 하나에 대해 동시에 최대 하나의 로드만 실행되도록 보장한다.
//! 모든 상태 전이는 하나의 `Mutex` 임계 구역 안에서 일어나고, 락은 `.await`를 넘어
//! 유지되지 않는다.

use super::events::{LoadedEvent, LoaderEvent, LoaderStats};
use crate::host::{resolve_descriptor, ComponentHost, Instantiated};
use crate::registry::{ComponentState, DeclaredEntry, Registry};
use futures::future::{self, BoxFuture, FutureExt, Shared};
use lazyel_foundation::{ComponentError, LoadStage, LoaderConfig};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

type LoadResult = Result<(), ComponentError>;

/// 같은 selector를 기다리는 모든 호출자가 공유하는 로드 future
type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

/// load_component()가 돌려주는 future
pub type LoadFuture<I> = BoxFuture<'static, Result<LoadedEvent<I>, ComponentError>>;

// ============================================================================
// 내부 상태
// ============================================================================

struct LoaderState<H: ComponentHost> {
    registry: Registry<H>,

    /// selector -> 진행 중인 로드
    in_flight: HashMap<String, SharedLoad>,
}

struct LoaderInner<H: ComponentHost> {
    host: Arc<H>,
    state: Mutex<LoaderState<H>>,
    events: broadcast::Sender<LoaderEvent>,
    config: LoaderConfig,
}

// ============================================================================
// ComponentLoader
// ============================================================================

/// 선언된 컴포넌트를 지연 로드하는 로더
///
/// 로드는 별도 tokio 태스크로 실행되므로 tokio 런타임 안에서 호출해야 한다.
/// 시작된 로드는 기다리는 호출자가 모두 사라져도 끝까지 실행된다.
pub struct ComponentLoader<H: ComponentHost> {
    inner: Arc<LoaderInner<H>>,
}

impl<H: ComponentHost> Clone for ComponentLoader<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: ComponentHost> ComponentLoader<H> {
    /// 새 로더 생성
    pub fn new(host: Arc<H>, entries: impl IntoIterator<Item = DeclaredEntry<H>>) -> Self {
        Self::with_config(host, entries, LoaderConfig::default())
    }

    /// 설정과 함께 생성
    pub fn with_config(
        host: Arc<H>,
        entries: impl IntoIterator<Item = DeclaredEntry<H>>,
        config: LoaderConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let registry = Registry::new(entries);
        debug!("Component loader created with {} declarations", registry.declared_len());

        Self {
            inner: Arc::new(LoaderInner {
                host,
                state: Mutex::new(LoaderState {
                    registry,
                    in_flight: HashMap::new(),
                }),
                events,
                config,
            }),
        }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.inner.host
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }

    /// 라이프사이클 이벤트 구독
    pub fn subscribe(&self) -> broadcast::Receiver<LoaderEvent> {
        self.inner.events.subscribe()
    }

    // ========================================================================
    // 로드
    // ========================================================================

    /// selector의 컴포넌트 로드
    ///
    /// 상태 확인과 in-flight 등록은 이 함수 호출 시점에 동기적으로 끝난다.
    /// 반환된 future를 poll하기 전에 들어온 요청도 같은 로드를 공유한다.
    ///
    /// - 로딩 중: 진행 중인 로드를 기다림
    /// - 선언됨: 새 로드 시작
    /// - 로드됨: 즉시 완료 (`want_instance`면 새 인스턴스 생성)
    /// - 그 외: `ComponentError::Unregistered` (suspension 없이 즉시)
    pub fn load_component(&self, selector: &str, want_instance: bool) -> LoadFuture<H::Instance> {
        let mut state = self.inner.state.lock();

        if let Some(pending) = state.in_flight.get(selector) {
            debug!("Joining in-flight load: {}", selector);
            return Self::completion(selector, pending.clone());
        }

        if let Some(entry) = state.registry.get_declared(selector).cloned() {
            info!("Loading component: {}", selector);
            // 태스크의 Loaded/Failed보다 먼저 나가도록 락 안에서 전송
            let _ = self.inner.events.send(LoaderEvent::Started {
                selector: selector.to_string(),
            });

            let pending = self.spawn_load(entry);
            state.in_flight.insert(selector.to_string(), pending.clone());
            return Self::completion(selector, pending);
        }

        if state.registry.has_loaded(selector) {
            drop(state);
            debug!("Component already loaded: {}", selector);
            let instance = want_instance.then(|| self.inner.host.create_instance(selector));
            return future::ready(Ok(LoadedEvent::new(selector, instance))).boxed();
        }

        drop(state);
        future::ready(Err(ComponentError::unregistered(selector))).boxed()
    }

    /// 공유 로드 완료 후 완료 이벤트 생성
    fn completion(selector: &str, pending: SharedLoad) -> LoadFuture<H::Instance> {
        let selector = selector.to_string();
        async move {
            pending.await?;
            Ok(LoadedEvent::new(selector, None))
        }
        .boxed()
    }

    /// 로드 태스크 시작 후 공유 future 반환
    fn spawn_load(&self, entry: DeclaredEntry<H>) -> SharedLoad {
        let selector = entry.selector.clone();
        let handle = tokio::spawn(Self::run_load(Arc::clone(&self.inner), entry));

        async move {
            // 정리는 태스크 안에서 끝나므로 여기서는 JoinError만 변환
            handle.await.unwrap_or_else(|join_err| {
                Err(ComponentError::Aborted {
                    selector,
                    message: join_err.to_string(),
                })
            })
        }
        .boxed()
        .shared()
    }

    async fn run_load(inner: Arc<LoaderInner<H>>, entry: DeclaredEntry<H>) -> LoadResult {
        let selector = entry.selector.clone();
        let started = Instant::now();
        let outcome = AssertUnwindSafe(Self::load_pipeline(&inner.host, &entry))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(ComponentError::Aborted {
                    selector: selector.clone(),
                    message: panic_message(panic.as_ref()),
                })
            });
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(context) => {
                {
                    let mut state = inner.state.lock();
                    state.registry.set_loaded(&selector, Arc::new(context));
                    state.registry.remove_declared(&selector);
                    state.in_flight.remove(&selector);
                }

                if inner.config.is_slow(elapsed_ms) {
                    warn!("Slow component load: {} took {}ms", selector, elapsed_ms);
                } else {
                    info!("Loaded component: {} ({}ms)", selector, elapsed_ms);
                }
                let _ = inner.events.send(LoaderEvent::Loaded {
                    selector,
                    elapsed_ms,
                });
                Ok(())
            }
            Err(error) => {
                // 선언은 남겨두어 다음 호출이 새로 시도할 수 있게 함
                inner.state.lock().in_flight.remove(&selector);

                warn!("Failed to load component {}: {}", selector, error);
                let _ = inner.events.send(LoaderEvent::Failed {
                    selector,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    /// fetch → resolve → instantiate → define → when_defined
    async fn load_pipeline(host: &H, entry: &DeclaredEntry<H>) -> Result<H::Context, ComponentError> {
        let selector = entry.selector.as_str();

        let descriptor = entry
            .fetch()
            .await
            .map_err(host_error(selector, LoadStage::Fetch))?;
        let factory = resolve_descriptor(host, selector, descriptor).await?;

        let Instantiated {
            constructor,
            context,
        } = host
            .instantiate(factory)
            .map_err(host_error(selector, LoadStage::Instantiate))?;

        host.define(selector, constructor)
            .map_err(host_error(selector, LoadStage::Define))?;
        host.when_defined(selector)
            .await
            .map_err(host_error(selector, LoadStage::WhenDefined))?;

        Ok(context)
    }

    // ========================================================================
    // 조회
    // ========================================================================

    /// selector의 현재 상태 (Loading > Declared > Loaded 순으로 판단)
    pub fn state(&self, selector: &str) -> ComponentState {
        let state = self.inner.state.lock();
        if state.in_flight.contains_key(selector) {
            ComponentState::Loading
        } else if state.registry.has_declared(selector) {
            ComponentState::Declared
        } else if state.registry.has_loaded(selector) {
            ComponentState::Loaded
        } else {
            ComponentState::Unknown
        }
    }

    /// 로드된 컴포넌트의 컨텍스트
    pub fn loaded_handle(&self, selector: &str) -> Option<Arc<H::Context>> {
        self.inner.state.lock().registry.get_loaded(selector)
    }

    /// 선언된 selector (선언 순서, 로딩 중 포함)
    pub fn declared_selectors(&self) -> Vec<String> {
        let state = self.inner.state.lock();
        state.registry.declared_selectors().map(String::from).collect()
    }

    /// 로드된 selector (로드 완료 순서)
    pub fn loaded_selectors(&self) -> Vec<String> {
        let state = self.inner.state.lock();
        state.registry.loaded_selectors().map(String::from).collect()
    }

    /// 검색 후보: 선언된 selector 다음에 로드된 selector
    pub(super) fn candidate_selectors(&self) -> Vec<String> {
        let state = self.inner.state.lock();
        state
            .registry
            .declared_selectors()
            .chain(state.registry.loaded_selectors())
            .map(String::from)
            .collect()
    }

    pub fn stats(&self) -> LoaderStats {
        let state = self.inner.state.lock();
        let loading = state.in_flight.len();
        LoaderStats {
            declared: state.registry.declared_len().saturating_sub(loading),
            loading,
            loaded: state.registry.loaded_len(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("load panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("load panicked: {s}")
    } else {
        "load panicked".to_string()
    }
}

fn host_error(selector: &str, stage: LoadStage) -> impl FnOnce(anyhow::Error) -> ComponentError + '_ {
    move |e| ComponentError::load(selector, stage, format!("{e:#}"))
}
