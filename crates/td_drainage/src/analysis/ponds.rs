// crates/td_drainage/src/analysis/ponds.rs

//! 洼地与出口特征
//!
//! 洼地特征求解满蓄边界，把出口挂成 `PondExit` 子特征。同一出口点只有一个
//! 出口特征，多个洼地共享时记在 `ponds` 中。
//!
//! 深度不超过假低点阈值的洼地立即计算出口的溢出路径；更深的洼地在出口处停下，
//! 等充水模拟按需计算。
//!
//! 溢出路径回到出口自己的某个洼地时，这组洼地没有外部出路（死洼地），
//! 从出口点生成一个上一级的合并洼地，原洼地被隐藏。

use td_tin::TinAccess;
use tracing::debug;

use super::WaterAnalysis;
use crate::descent::{exterior_descent, Descent};
use crate::error::DrainageResult;
use crate::feature::{FeatureId, FeatureKind, PondExitFeature, PondFeature};
use crate::pond::{PondAnalysis, PondKind, PondSeed};
use crate::tables::PondKey;

impl<'a, M: TinAccess + ?Sized> WaterAnalysis<'a, M> {
    /// 洼地特征（按低点记忆化）
    pub(crate) fn pond_feature(&mut self, parent: FeatureId, seed: PondSeed) -> DrainageResult<FeatureId> {
        let keys = match seed {
            PondSeed::Point(p) => vec![p],
            PondSeed::Edge(a, b) => vec![a, b],
            PondSeed::Triangle(a, b, c) => vec![a, b, c],
            PondSeed::Exit { exit_point, .. } => vec![exit_point],
        };
        if let Some(existing) = keys.iter().find_map(|p| self.pond_memo.get(p).copied()) {
            self.attach(parent, existing);
            return Ok(existing);
        }
        let analysis = PondAnalysis::new(&self.surface, seed)?;
        let id = self.add_child(parent, FeatureKind::Pond(Box::new(PondFeature::new(analysis))))?;
        self.pond_memo.insert(seed.low_point(), id);
        Ok(id)
    }

    pub(super) fn process_pond(&mut self, id: FeatureId) -> DrainageResult<()> {
        let surface = self.surface;
        self.features[id].finished = true;
        let Some(pond) = self.features[id].pond_mut() else {
            return Ok(());
        };
        if let Err(err) = pond.analysis.find_pond(&surface) {
            if pond.analysis.kind() == PondKind::FromExit {
                self.recover_inner(id);
            }
            return Err(err);
        }

        let (seed, low_points, exits, depth) = {
            let a = &pond.analysis;
            (a.seed(), a.low_points().to_vec(), a.exits().to_vec(), a.depth())
        };
        for p in low_points {
            self.pond_memo.entry(p).or_insert(id);
        }
        self.cross_check_exit(seed, &exits);

        for info in exits {
            if let Some(&exit) = self.exit_memo.get(&info.exit_point) {
                if let Some(e) = self.features[exit].exit_mut() {
                    if !e.ponds.contains(&id) {
                        e.ponds.push(id);
                    }
                }
                if let Some(p) = self.features[id].pond_mut() {
                    p.exits.push(exit);
                }
                self.attach(id, exit);
                // 新加入的洼地可能让出口满足计算条件
                let waiting = self.features[exit].exit().is_some_and(|e| !e.calculated);
                if waiting {
                    self.features[exit].finished = false;
                    self.worklist.push(exit);
                }
                continue;
            }
            let exit = self.add_child(
                id,
                FeatureKind::PondExit(PondExitFeature {
                    info,
                    ponds: vec![id],
                    calculated: false,
                    on_hull: false,
                    outflow: None,
                    merged: None,
                }),
            )?;
            self.exit_memo.insert(info.exit_point, exit);
            if let Some(p) = self.features[id].pond_mut() {
                p.exits.push(exit);
            }
        }

        debug!(
            pond = %id,
            low_point = seed.low_point(),
            depth,
            exits = self.features[id].pond().map_or(0, |p| p.exits.len()),
            "洼地求解完成"
        );
        Ok(())
    }

    /// 查找表中已知出口只用于核对
    fn cross_check_exit(&self, seed: PondSeed, exits: &[crate::ring::PondExitInfo]) {
        let Some(tables) = self.tables else {
            return;
        };
        let key = match seed {
            PondSeed::Point(p) => PondKey::Point(p),
            PondSeed::Edge(a, b) => PondKey::line(a, b),
            _ => return,
        };
        if let Some(known) = tables.known_pond_exit(key) {
            debug!(
                ?key,
                known = known.exit_point,
                matches = exits.iter().any(|e| e.exit_point == known.exit_point),
                "核对已知洼地出口"
            );
        }
    }

    /// 计算出口的溢出路径
    ///
    /// `ignore_false_low` 为 false 时，只有出口的某个洼地是假低点才计算。
    pub(crate) fn process_exit(&mut self, id: FeatureId, ignore_false_low: bool) -> DrainageResult<()> {
        self.features[id].finished = true;
        let Some(exit) = self.features[id].exit() else {
            return Ok(());
        };
        if exit.calculated {
            return Ok(());
        }
        let info = exit.info;
        if !ignore_false_low {
            let min_depth = self.config.minimum_pond_depth;
            let false_low = exit.ponds.iter().any(|&p| {
                self.features[p]
                    .pond()
                    .is_some_and(|pond| pond.analysis.depth() <= min_depth)
            });
            if !false_low {
                return Ok(());
            }
        }
        if let Some(e) = self.features[id].exit_mut() {
            e.calculated = true;
        }

        let p = info.exit_point;
        let here = self.surface.point(p);
        self.features[id].path.push(here);
        if self.surface.is_boundary(p) {
            if let Some(e) = self.features[id].exit_mut() {
                e.on_hull = true;
            }
            return Ok(());
        }

        let outflow = match exterior_descent(&self.surface, self.tables, p, info.prior, info.next)? {
            Descent::Edge { to, slope, sump } if slope > 0.0 => {
                self.features[id].sump = sump;
                self.features[id].path.push(self.surface.point(to));
                let angle = here.xy().angle_to(&self.surface.point(to).xy());
                self.on_point(id, to, Some(angle))?
            }
            Descent::Triangle { a, b, angle, slope } if slope > 0.0 => {
                let crossing = self.cross_edge(here, angle, a, b)?;
                self.follow_crossing(id, a, b, crossing, Some(angle))?
            }
            _ => {
                // 外侧没有下坡：沿等高邻点继续，找不到时从出口点本身继续
                let z = here.z;
                let flat = self
                    .surface
                    .neighbours(p)
                    .iter()
                    .copied()
                    .find(|&q| q != info.prior && q != info.next && self.surface.z(q) == z && !self.pond_memo.contains_key(&q));
                match flat {
                    Some(q) => {
                        self.features[id].path.push(self.surface.point(q));
                        self.on_point(id, q, None)?
                    }
                    None => self.on_point(id, p, None)?,
                }
            }
        };
        if let Some(e) = self.features[id].exit_mut() {
            e.outflow = Some(outflow);
        }
        Ok(())
    }

    /// 溢出路径到达的第一个洼地（只沿单子特征链），已合并的洼地换成合并后的洼地
    pub(crate) fn downstream_pond(&self, exit: FeatureId) -> Option<FeatureId> {
        let mut current = self.features[exit].exit()?.outflow?;
        for _ in 0..self.features.len() {
            let f = &self.features[current];
            if f.pond().is_some() {
                return Some(self.outermost_pond(current));
            }
            match f.children.as_slice() {
                [only] => current = *only,
                _ => return None,
            }
        }
        None
    }

    /// 沿死出口合并关系上溯到最外层的洼地
    fn outermost_pond(&self, mut pond: FeatureId) -> FeatureId {
        for _ in 0..self.features.len() {
            let merged = self.features[pond].pond().and_then(|p| {
                p.exits.iter().find_map(|&e| {
                    let m = self.features[e].exit()?.merged?;
                    let inner = &self.features[m].pond()?.inner;
                    inner.contains(&pond).then_some(m)
                })
            });
            match merged {
                Some(m) => pond = m,
                None => break,
            }
        }
        pond
    }

    /// 检查死出口；是死出口时生成合并洼地并返回 true
    pub(crate) fn check_dead_exit(&mut self, id: FeatureId) -> DrainageResult<bool> {
        let Some(exit) = self.features[id].exit() else {
            return Ok(false);
        };
        if exit.on_hull || !exit.calculated || exit.merged.is_some() {
            return Ok(false);
        }
        let Some(down) = self.downstream_pond(id) else {
            return Ok(false);
        };
        if !exit.ponds.contains(&down) {
            return Ok(false);
        }

        let inner = exit.ponds.clone();
        let exit_point = exit.info.exit_point;
        let bottom_z = inner
            .iter()
            .filter_map(|&p| self.features[p].pond())
            .map(|p| p.analysis.low_z())
            .fold(f64::INFINITY, f64::min);

        if let Some(&existing) = self.pond_memo.get(&exit_point) {
            if let Some(e) = self.features[id].exit_mut() {
                e.merged = Some(existing);
            }
            return Ok(false);
        }

        let seed = PondSeed::Exit { exit_point, bottom_z };
        let mut pond = PondFeature::new(PondAnalysis::new(&self.surface, seed)?);
        pond.inner = inner.clone();
        pond.source_exit = Some(id);
        let merged = self.add_child(id, FeatureKind::Pond(Box::new(pond)))?;
        self.pond_memo.insert(exit_point, merged);
        if let Some(e) = self.features[id].exit_mut() {
            e.merged = Some(merged);
        }

        for &p in &inner {
            self.features[p].hidden = true;
        }
        self.features[id].hidden = true;
        let mut current = self.features[id].exit().and_then(|e| e.outflow);
        while let Some(c) = current {
            if self.features[c].pond().is_some() {
                break;
            }
            self.features[c].hidden = true;
            current = match self.features[c].children.as_slice() {
                [only] => Some(*only),
                _ => None,
            };
        }

        debug!(exit = %id, exit_point, inner = inner.len(), bottom_z, "死洼地合并");
        Ok(true)
    }

    /// 合并洼地求解失败：恢复被隐藏的内部洼地
    fn recover_inner(&mut self, id: FeatureId) {
        let Some(pond) = self.features[id].pond() else {
            return;
        };
        let mut restore = pond.inner.clone();
        restore.extend(pond.source_exit);
        for f in restore {
            self.features[f].hidden = false;
        }
    }

    /// 处理所有计算过的出口上的死洼地，返回是否生成了新洼地
    pub(crate) fn merge_dead_exits(&mut self) -> bool {
        let exits: Vec<FeatureId> = self.exits().collect();
        let mut merged = false;
        for id in exits {
            match self.check_dead_exit(id) {
                Ok(true) => merged = true,
                Ok(false) => {}
                Err(err) => self.fail(id, &err),
            }
        }
        merged
    }

    /// 处理工作栈并合并死洼地，直到不再变化
    pub(crate) fn drain(&mut self) {
        loop {
            self.run();
            if !self.merge_dead_exits() {
                break;
            }
        }
    }
}
