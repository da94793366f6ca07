// crates/td_drainage/src/analysis/water.rs

//! 充水模拟
//!
//! 从起点注入水量，按特征图广度优先向下游分配：
//!
//! - 追踪特征把水量累计到 `volume`，平均分给子特征；没有子特征时水离开网格
//! - 洼地先蓄到容量，满后把多余水量分给通向未满洼地的出口，没有时平均分给各出口
//! - 出口先把水交给共享它的未满洼地；否则按需计算溢出路径，
//!   死出口把水送回合并组内未满的洼地，组内都满时送入合并洼地
//!
//! 分配结束后，部分充水的洼地按蓄水量求解水位，满的洼地取出口高程。

use std::collections::VecDeque;

use td_tin::TinAccess;
use tracing::{debug, info, warn};

use super::{WaterAnalysis, WaterSummary};
use crate::error::{DrainageError, DrainageResult};
use crate::feature::{FeatureId, FeatureKind};

impl<'a, M: TinAccess + ?Sized> WaterAnalysis<'a, M> {
    /// 在 `(x, y)` 注入 `volume` 的水并重新分配
    ///
    /// 只有参数无效时返回错误；追踪与洼地求解中的错误记录在特征上。
    pub fn add_water_volume(&mut self, x: f64, y: f64, volume: f64) -> DrainageResult<WaterSummary> {
        if !(volume >= 0.0) || !volume.is_finite() {
            return Err(DrainageError::InvalidVolume { volume });
        }
        let start = self.trace(x, y);
        self.water_added = true;
        for id in self.features.indices().collect::<Vec<_>>() {
            self.features[id].pending_volume = 0.0;
        }
        self.water.injected += volume;
        self.features[start].pending_volume = volume;

        let mut queue = VecDeque::from([start]);
        let mut steps = 0usize;
        while let Some(id) = queue.pop_front() {
            let v = std::mem::take(&mut self.features[id].pending_volume);
            if v <= 0.0 {
                continue;
            }
            steps += 1;
            let limit = 64 * (self.features.len() + 16);
            if steps > limit {
                let rest: f64 = v + queue
                    .drain(..)
                    .map(|q| std::mem::take(&mut self.features[q].pending_volume))
                    .sum::<f64>();
                self.water.escaped += rest;
                let err = DrainageError::topology("add_water_volume", format!("水量分配超过 {limit} 步"));
                self.fail(id, &err);
                break;
            }
            self.features[id].volume += v;
            match self.features[id].kind {
                FeatureKind::Pond(_) => self.fill_pond(id, v, &mut queue),
                FeatureKind::PondExit(_) => self.pass_exit(id, v, &mut queue),
                _ => {
                    let children = self.features[id].children.clone();
                    self.split(v, &children, &mut queue);
                }
            }
        }

        self.settle_ponds();
        info!(
            injected = self.water.injected,
            stored = self.water.stored,
            escaped = self.water.escaped,
            "充水完成"
        );
        Ok(self.water)
    }

    /// 平均分给目标；没有目标时水离开网格
    fn split(&mut self, v: f64, targets: &[FeatureId], queue: &mut VecDeque<FeatureId>) {
        if targets.is_empty() {
            self.water.escaped += v;
            return;
        }
        let share = v / targets.len() as f64;
        for &t in targets {
            self.features[t].pending_volume += share;
            queue.push_back(t);
        }
    }

    fn fill_pond(&mut self, id: FeatureId, v: f64, queue: &mut VecDeque<FeatureId>) {
        if self.features[id].is_errored() {
            self.water.escaped += v;
            return;
        }
        let tolerance = self.config.volume_tolerance;
        let Some(pond) = self.features[id].pond_mut() else {
            return;
        };
        let mut excess = v;
        if !pond.full {
            let store = excess.min(pond.remaining());
            pond.current += store;
            excess -= store;
            if pond.remaining() <= tolerance {
                pond.full = true;
            }
            self.water.stored += store;
        }
        if excess <= 0.0 {
            return;
        }
        let exits = self.overflow_exits(id);
        debug!(pond = %id, excess, exits = exits.len(), "洼地已满，向出口溢出");
        self.split(excess, &exits, queue);
    }

    /// 满洼地的溢出出口
    ///
    /// 从自身出口开始逐层查找：尚未计算的出口，或有未满洼地共享的出口。
    /// 出口的洼地都满时继续查这些洼地的出口。一层找到即停；
    /// 都找不到时平均分给自身全部出口。
    fn overflow_exits(&self, id: FeatureId) -> Vec<FeatureId> {
        let own: Vec<FeatureId> = self.features[id].pond().map(|p| p.exits.clone()).unwrap_or_default();
        let mut seen = own.clone();
        let mut frontier = own.clone();
        let mut picked: Vec<FeatureId> = Vec::new();
        while picked.is_empty() && !frontier.is_empty() {
            for e in std::mem::take(&mut frontier) {
                let Some(exit) = self.features[e].exit() else {
                    continue;
                };
                if !exit.calculated {
                    if !picked.contains(&e) {
                        picked.push(e);
                    }
                    continue;
                }
                for &p in &exit.ponds {
                    if self.is_open_pond(p) {
                        if !picked.contains(&e) {
                            picked.push(e);
                        }
                        break;
                    }
                    let next = self.features[p].pond().map(|p| p.exits.as_slice()).unwrap_or_default();
                    for &n in next {
                        if !seen.contains(&n) {
                            seen.push(n);
                            frontier.push(n);
                        }
                    }
                }
            }
        }
        if picked.is_empty() {
            own
        } else {
            picked
        }
    }

    /// 洼地未满、仍有容量且未出错
    fn is_open_pond(&self, id: FeatureId) -> bool {
        let tolerance = self.config.volume_tolerance;
        !self.features[id].is_errored()
            && self.features[id].pond().is_some_and(|p| !p.full && p.remaining() > tolerance)
    }

    fn pass_exit(&mut self, id: FeatureId, v: f64, queue: &mut VecDeque<FeatureId>) {
        let calculated = self.features[id].exit().is_some_and(|e| e.calculated);
        if !calculated {
            match self.process_exit(id, true) {
                Ok(()) => self.drain(),
                Err(err) => self.fail(id, &err),
            }
        } else if self.features[id].exit().is_some_and(|e| e.merged.is_none()) {
            self.drain();
        }

        let Some(exit) = self.features[id].exit() else {
            return;
        };
        // 共享出口的未满洼地优先
        let siblings: Vec<FeatureId> = exit.ponds.iter().copied().filter(|&p| self.is_open_pond(p)).collect();
        if !siblings.is_empty() {
            self.split(v, &siblings, queue);
            return;
        }
        if exit.on_hull || self.features[id].is_errored() {
            self.water.escaped += v;
            return;
        }
        if let Some(merged) = exit.merged {
            let open: Vec<FeatureId> = self.features[merged]
                .pond()
                .map(|m| m.inner.iter().copied().filter(|&p| self.is_open_pond(p)).collect())
                .unwrap_or_default();
            let targets = if open.is_empty() { vec![merged] } else { open };
            self.split(v, &targets, queue);
            return;
        }
        let targets: Vec<FeatureId> = exit.outflow.into_iter().collect();
        self.split(v, &targets, queue);
    }

    /// 按蓄水量求解各洼地的水位
    fn settle_ponds(&mut self) {
        let surface = self.surface;
        let ponds: Vec<FeatureId> = self.ponds().collect();
        for id in ponds {
            let config = &self.config;
            let Some(pond) = self.features[id].pond_mut() else {
                continue;
            };
            if pond.current <= 0.0 {
                continue;
            }
            let result = if pond.full {
                pond.analysis.fill_to_capacity(&surface).map(Some)
            } else {
                let current = pond.current;
                pond.analysis.fill_to_volume(&surface, config, current)
            };
            if let Err(err) = result {
                let message = err.to_string();
                warn!(pond = %id, error = %message, "洼地水位求解失败");
                self.features[id].error = Some(message);
            }
        }
    }
}
