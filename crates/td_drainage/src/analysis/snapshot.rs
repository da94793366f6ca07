// crates/td_drainage/src/analysis/snapshot.rs

//! 分析快照
//!
//! 深拷贝特征图并通过句柄映射重写所有交叉引用。副本与原分析只共享
//! 只读的三角网、查找表与点定位索引，可以独立充水。

use std::collections::HashMap;
use std::sync::Arc;

use td_foundation::HandleMap;
use td_tin::TinAccess;
use tracing::debug;

use super::WaterAnalysis;
use crate::feature::{FeatureId, FeatureTag};

impl<'a, M: TinAccess + ?Sized> WaterAnalysis<'a, M> {
    /// 独立副本及旧句柄到新句柄的映射
    pub fn snapshot(&self) -> (WaterAnalysis<'a, M>, HandleMap<FeatureTag>) {
        let (mut features, map) = self.features.map_clone(|f| f.clone());
        for id in features.indices().collect::<Vec<_>>() {
            features[id].remap(&map);
        }
        let remap_memo = |memo: &HashMap<u32, FeatureId>| -> HashMap<u32, FeatureId> {
            memo.iter().map(|(&p, &id)| (p, map.get(id))).collect()
        };
        let copy = WaterAnalysis {
            surface: self.surface,
            config: self.config.clone(),
            tables: self.tables,
            locator: Arc::clone(&self.locator),
            point_memo: remap_memo(&self.point_memo),
            pond_memo: remap_memo(&self.pond_memo),
            exit_memo: remap_memo(&self.exit_memo),
            worklist: self.worklist.iter().map(|&id| map.get(id)).collect(),
            starts: self.starts.iter().map(|&id| map.get(id)).collect(),
            features,
            error: self.error.clone(),
            water: self.water,
            water_added: self.water_added,
        };
        debug!(features = copy.features.len(), "分析快照完成");
        (copy, map)
    }
}
