//! Discovery Scanner - 서브트리에 존재하는 selector 검색

use super::coordinator::ComponentLoader;
use crate::host::ComponentHost;
use tracing::debug;

impl<H: ComponentHost> ComponentLoader<H> {
    /// root 아래에 존재하는 selector 목록
    ///
    /// 선언된 selector (선언 순서) 다음에 로드된 selector (로드 순서).
    /// 일치 여부는 호스트의 `matches`에 위임하며 상태는 변경하지 않는다.
    pub fn discover(&self, root: &H::Root) -> Vec<String> {
        // 호스트 코드가 로더를 다시 호출할 수 있으므로 락 밖에서 필터링
        let candidates = self.candidate_selectors();
        let host = self.host();

        let found: Vec<String> = candidates
            .into_iter()
            .filter(|selector| host.matches(root, selector))
            .collect();

        debug!("Discovered {} component(s): {:?}", found.len(), found);
        found
    }
}
