//! Batch Aggregator - 검색된 selector 일괄 로드

use super::coordinator::ComponentLoader;
use super::events::LoadedEvent;
use crate::host::ComponentHost;
use futures::future::{try_join_all, BoxFuture, FutureExt};
use lazyel_foundation::ComponentError;
use tracing::debug;

impl<H: ComponentHost> ComponentLoader<H> {
    /// root 아래의 모든 컴포넌트를 로드
    ///
    /// 검색된 순서대로 완료 이벤트를 돌려준다. 하나라도 실패하면 첫 실패로 끝나지만
    /// 이미 시작된 다른 로드는 취소되지 않고 계속 진행된다.
    pub fn load_contained_components(
        &self,
        root: &H::Root,
    ) -> BoxFuture<'static, Result<Vec<LoadedEvent<H::Instance>>, ComponentError>> {
        let selectors = self.discover(root);
        let pending: Vec<_> = selectors
            .iter()
            .map(|selector| self.load_component(selector, false))
            .collect();

        debug!("Waiting for {} component(s)", pending.len());
        try_join_all(pending).boxed()
    }
}
