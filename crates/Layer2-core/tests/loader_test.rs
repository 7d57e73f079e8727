//! Loader 통합 테스트 - 중복 제거, 캐시, 재시도, 일괄 로드 검증
//!
//! `cargo test -p lazyel-core --test loader_test`

use futures::future::{join_all, FutureExt};
use lazyel_core::{
    ComponentError, ComponentLoader, ComponentState, DeclaredEntry, Descriptor, Element,
    LoadStage, LoaderEvent, MemoryHost, ModuleFactory, RawModule,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Helpers
// ============================================================================

/// selector별 loader 호출 횟수
#[derive(Default, Clone)]
struct CallLog(Arc<parking_lot::Mutex<HashMap<String, usize>>>);

impl CallLog {
    fn hit(&self, selector: &str) {
        *self.0.lock().entry(selector.to_string()).or_default() += 1;
    }

    fn count(&self, selector: &str) -> usize {
        self.0.lock().get(selector).copied().unwrap_or(0)
    }
}

/// delay 후 raw 모듈을 돌려주는 선언
fn raw_after(selector: &str, delay: Duration, log: &CallLog) -> DeclaredEntry<MemoryHost> {
    let name = selector.to_string();
    let log = log.clone();
    DeclaredEntry::new(selector, move || {
        log.hit(&name);
        let name = name.clone();
        async move {
            tokio::time::sleep(delay).await;
            Ok(Descriptor::Raw(RawModule::new(name.clone(), format!("{name}Component"))))
        }
    })
}

/// 바로 ready factory를 돌려주는 선언
fn ready(selector: &str, log: &CallLog) -> DeclaredEntry<MemoryHost> {
    let name = selector.to_string();
    let log = log.clone();
    DeclaredEntry::new(selector, move || {
        log.hit(&name);
        let name = name.clone();
        async move { Ok(Descriptor::Ready(ModuleFactory::new(name.clone(), format!("{name}Component")))) }
    })
}

/// 항상 실패하는 선언
fn failing(selector: &str, delay: Duration, log: &CallLog) -> DeclaredEntry<MemoryHost> {
    let name = selector.to_string();
    let log = log.clone();
    DeclaredEntry::new(selector, move || {
        log.hit(&name);
        async move {
            tokio::time::sleep(delay).await;
            Err(anyhow::anyhow!("network error"))
        }
    })
}

fn scope(tags: &[&str]) -> Element {
    tags.iter()
        .fold(Element::new("body"), |root, tag| root.with_child(Element::new(*tag)))
}

// ============================================================================
// Dedup
// ============================================================================

#[tokio::test]
async fn test_concurrent_loads_invoke_loader_once() {
    let log = CallLog::default();
    let loader = ComponentLoader::new(
        Arc::new(MemoryHost::new()),
        vec![raw_after("x-chart", Duration::from_millis(10), &log)],
    );

    let requests: Vec<_> = (0..8).map(|_| loader.load_component("x-chart", false)).collect();
    let results = join_all(requests).await;

    assert_eq!(log.count("x-chart"), 1);
    for result in results {
        let event = result.expect("load failed");
        assert_eq!(event.selector, "x-chart");
        assert!(event.instance.is_none());
    }
}

#[tokio::test]
async fn test_concurrent_failure_shared_by_all_callers() {
    let log = CallLog::default();
    let loader = ComponentLoader::new(
        Arc::new(MemoryHost::new()),
        vec![failing("x-chart", Duration::from_millis(5), &log)],
    );

    let requests: Vec<_> = (0..4).map(|_| loader.load_component("x-chart", false)).collect();
    let errors: Vec<_> = join_all(requests)
        .await
        .into_iter()
        .map(|r| r.unwrap_err())
        .collect();

    assert_eq!(log.count("x-chart"), 1);
    assert!(errors.iter().all(|e| e == &errors[0]));
    assert_eq!(errors[0].stage(), Some(LoadStage::Fetch));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dedup_across_worker_threads() {
    let log = CallLog::default();
    let loader = ComponentLoader::new(
        Arc::new(MemoryHost::new()),
        vec![raw_after("x-chart", Duration::from_millis(20), &log)],
    );

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let loader = loader.clone();
            tokio::spawn(async move { loader.load_component("x-chart", false).await })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(log.count("x-chart"), 1);
    assert_eq!(loader.host().resolve_count(), 1);
}

// ============================================================================
// Cache / retry / unknown
// ============================================================================

#[tokio::test]
async fn test_loaded_component_is_never_refetched() {
    let log = CallLog::default();
    let loader = ComponentLoader::new(Arc::new(MemoryHost::new()), vec![ready("x-chart", &log)]);

    loader.load_component("x-chart", false).await.unwrap();
    for _ in 0..3 {
        loader.load_component("x-chart", false).await.unwrap();
    }

    assert_eq!(log.count("x-chart"), 1);
    assert_eq!(loader.state("x-chart"), ComponentState::Loaded);
    assert!(loader.declared_selectors().is_empty());
}

#[tokio::test]
async fn test_failed_load_is_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let loader = ComponentLoader::new(Arc::new(MemoryHost::new()), {
        let attempts = Arc::clone(&attempts);
        vec![DeclaredEntry::new("x-chart", move || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(anyhow::anyhow!("temporary failure"))
                } else {
                    Ok(Descriptor::Ready(ModuleFactory::new("chart", "ChartComponent")))
                }
            }
        })]
    });

    let err = loader.load_component("x-chart", false).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(loader.state("x-chart"), ComponentState::Declared);

    loader.load_component("x-chart", false).await.unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(loader.state("x-chart"), ComponentState::Loaded);
}

#[tokio::test]
async fn test_unknown_selector_fails_without_suspension() {
    let loader = ComponentLoader::<MemoryHost>::new(Arc::new(MemoryHost::new()), Vec::new());

    let result = loader
        .load_component("x-not-declared", false)
        .now_or_never()
        .expect("unknown selector must not suspend");

    assert_eq!(
        result.unwrap_err(),
        ComponentError::unregistered("x-not-declared")
    );
}

#[tokio::test]
async fn test_loaded_lookup_completes_without_suspension() {
    let log = CallLog::default();
    let loader = ComponentLoader::new(Arc::new(MemoryHost::new()), vec![ready("x-chart", &log)]);
    loader.load_component("x-chart", false).await.unwrap();

    let event = loader
        .load_component("x-chart", true)
        .now_or_never()
        .expect("cached lookup must not suspend")
        .unwrap();
    assert!(event.instance.is_some());
}

// ============================================================================
// Instance flag
// ============================================================================

#[tokio::test]
async fn test_instance_flag_creates_fresh_instances() {
    let log = CallLog::default();
    let loader = ComponentLoader::new(Arc::new(MemoryHost::new()), vec![ready("x-chart", &log)]);

    // 첫 로드에서는 인스턴스를 만들지 않음
    let first = loader.load_component("x-chart", true).await.unwrap();
    assert!(first.instance.is_none());

    let a = loader.load_component("x-chart", true).await.unwrap().instance.unwrap();
    let b = loader.load_component("x-chart", true).await.unwrap().instance.unwrap();
    assert_eq!(a.tag, "x-chart");
    assert_eq!(a.component, "x-chartComponent");
    assert_ne!(a.id, b.id);

    let none = loader.load_component("x-chart", false).await.unwrap();
    assert!(none.instance.is_none());
}

// ============================================================================
// Discovery + batch
// ============================================================================

#[tokio::test]
async fn test_contained_components_filter_and_order() {
    let log = CallLog::default();
    let loader = ComponentLoader::new(
        Arc::new(MemoryHost::new()),
        vec![ready("x-a", &log), ready("x-b", &log), ready("x-c", &log)],
    );
    loader.load_component("x-c", false).await.unwrap();

    let root = scope(&["x-c", "x-b"]);
    let events = loader.load_contained_components(&root).await.unwrap();

    let selectors: Vec<_> = events.iter().map(|e| e.selector.as_str()).collect();
    assert_eq!(selectors, vec!["x-b", "x-c"]);
    assert!(events.iter().all(|e| e.instance.is_none()));

    assert_eq!(log.count("x-a"), 0);
    assert_eq!(log.count("x-b"), 1);
    assert_eq!(log.count("x-c"), 1);
}

#[tokio::test]
async fn test_batch_failure_does_not_cancel_siblings() {
    let log = CallLog::default();
    let loader = ComponentLoader::new(
        Arc::new(MemoryHost::new()),
        vec![
            raw_after("x-a", Duration::from_millis(30), &log),
            failing("x-b", Duration::from_millis(1), &log),
        ],
    );

    let err = loader
        .load_contained_components(&scope(&["x-a", "x-b"]))
        .await
        .unwrap_err();
    assert_eq!(err.selector(), "x-b");

    // x-a 로드는 계속 진행되어 레지스트리에 반영됨
    let mut rx = loader.subscribe();
    if loader.state("x-a") == ComponentState::Loading {
        loop {
            match rx.recv().await.unwrap() {
                LoaderEvent::Loaded { selector, .. } if selector == "x-a" => break,
                _ => continue,
            }
        }
    }
    assert_eq!(loader.state("x-a"), ComponentState::Loaded);
    assert!(loader.loaded_handle("x-a").is_some());
    assert_eq!(log.count("x-a"), 1);
}

#[tokio::test]
async fn test_load_survives_dropped_callers() {
    let log = CallLog::default();
    let loader = ComponentLoader::new(
        Arc::new(MemoryHost::new()),
        vec![raw_after("x-chart", Duration::from_millis(5), &log)],
    );
    let mut rx = loader.subscribe();

    drop(loader.load_component("x-chart", false));
    assert_eq!(loader.state("x-chart"), ComponentState::Loading);

    loop {
        if let LoaderEvent::Loaded { selector, .. } = rx.recv().await.unwrap() {
            assert_eq!(selector, "x-chart");
            break;
        }
    }
    assert_eq!(loader.state("x-chart"), ComponentState::Loaded);
    assert_eq!(log.count("x-chart"), 1);
}

#[tokio::test]
async fn test_panicked_load_is_cleaned_up_without_waiters() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let loader = ComponentLoader::new(Arc::new(MemoryHost::new()), {
        let attempts = Arc::clone(&attempts);
        vec![DeclaredEntry::new("x-chart", move || {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("loader exploded");
            }
            async { Ok(Descriptor::Ready(ModuleFactory::new("chart", "ChartComponent"))) }
        })]
    });
    let mut rx = loader.subscribe();

    // 기다리는 호출자 없이 패닉
    drop(loader.load_component("x-chart", false));

    let error = loop {
        if let LoaderEvent::Failed { selector, error } = rx.recv().await.unwrap() {
            assert_eq!(selector, "x-chart");
            break error;
        }
    };
    assert!(matches!(error, ComponentError::Aborted { .. }));
    assert!(error.to_string().contains("loader exploded"));
    assert_eq!(loader.state("x-chart"), ComponentState::Declared);
    assert_eq!(loader.stats().loading, 0);

    // 다음 호출은 새 로드를 시작
    loader.load_component("x-chart", false).await.unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(loader.state("x-chart"), ComponentState::Loaded);
}

#[tokio::test]
async fn test_panicked_load_reports_aborted_to_waiters() {
    let loader = ComponentLoader::new(
        Arc::new(MemoryHost::new()),
        vec![DeclaredEntry::new("x-chart", || async {
            if true {
                panic!("compile step exploded");
            }
            Ok(Descriptor::Ready(ModuleFactory::new("chart", "ChartComponent")))
        })],
    );

    let (a, b) = futures::join!(
        loader.load_component("x-chart", false),
        loader.load_component("x-chart", false)
    );
    let err = a.unwrap_err();
    assert_eq!(Err(err.clone()), b.map(|_| ()));
    assert!(matches!(err, ComponentError::Aborted { ref selector, .. } if selector == "x-chart"));
    assert!(err.is_retryable());
    assert_eq!(loader.state("x-chart"), ComponentState::Declared);
}

#[tokio::test]
async fn test_started_event_precedes_outcome() {
    let log = CallLog::default();
    let loader = ComponentLoader::new(
        Arc::new(MemoryHost::new()),
        vec![ready("x-chart", &log), failing("x-broken", Duration::ZERO, &log)],
    );
    let mut rx = loader.subscribe();

    loader.load_component("x-chart", false).await.unwrap();
    loader.load_component("x-broken", false).await.unwrap_err();

    let mut order = Vec::new();
    while let Ok(event) = rx.try_recv() {
        let kind = match &event {
            LoaderEvent::Started { .. } => "started",
            LoaderEvent::Loaded { .. } => "loaded",
            LoaderEvent::Failed { .. } => "failed",
        };
        order.push((event.selector().to_string(), kind));
    }
    assert_eq!(
        order,
        vec![
            ("x-chart".to_string(), "started"),
            ("x-chart".to_string(), "loaded"),
            ("x-broken".to_string(), "started"),
            ("x-broken".to_string(), "failed"),
        ]
    );
}

#[tokio::test]
async fn test_request_during_visibility_wait_joins_load() {
    let log = CallLog::default();
    let host = Arc::new(MemoryHost::new().with_visibility_delay(Duration::from_millis(20)));
    let loader = ComponentLoader::new(Arc::clone(&host), vec![ready("x-chart", &log)]);

    let first = loader.load_component("x-chart", false);
    tokio::time::sleep(Duration::from_millis(5)).await;

    // 정의는 되었지만 아직 가시화 대기 중
    assert_eq!(loader.state("x-chart"), ComponentState::Loading);
    let second = loader.load_component("x-chart", false);

    let (a, b) = futures::join!(first, second);
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(log.count("x-chart"), 1);
    assert_eq!(host.defined_names(), vec!["x-chart".to_string()]);
}
