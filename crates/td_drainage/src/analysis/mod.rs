// crates/td_drainage/src/analysis/mod.rs

//! 水流分析引擎（追踪特征图）
//!
//! `WaterAnalysis` 持有一次分析的全部可变状态：特征 Arena、按顶点/低点/出口点的
//! 记忆化映射、后进先出的工作栈，以及充水模拟的水量统计。三角网在分析期间只读。
//!
//! # 模块概览
//!
//! - `trace`: 起点、三角形内、边上、顶点四种追踪特征的处理
//! - `ponds`: 洼地与出口特征的处理、死洼地合并
//! - `water`: 充水模拟与水量再分配
//! - `emit`: 追踪视图与充水视图的结果输出
//! - `snapshot`: 深拷贝与句柄重映射
//!
//! # 错误处理
//!
//! 每个特征的处理返回 `DrainageResult`。出错时只把该特征标记为失败并记录第一条
//! 分析级错误，兄弟分支继续处理。
//!
//! # 使用示例
//!
//! ```
//! use td_drainage::prelude::*;
//! use td_tin::grid_tin;
//!
//! let tin = grid_tin(5, 5, 1.0, |x, y| x + 0.5 * y).unwrap();
//! let mut analysis = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap();
//! analysis.trace(2.2, 2.7);
//! assert!(!analysis.is_errored());
//! ```

mod emit;
mod ponds;
mod snapshot;
mod surface;
mod trace;
mod water;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use td_foundation::Arena;
use td_geo::Point3D;
use td_tin::{TinAccess, TinLocator};
use tracing::{debug, info, warn};

use crate::config::TraceConfig;
use crate::error::{DrainageError, DrainageResult};
use crate::feature::{Feature, FeatureCounts, FeatureId, FeatureKind, FeatureTag};
use crate::tables::DrainageTables;

use surface::Surface;

/// 充水模拟的水量统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterSummary {
    /// 注入总量
    pub injected: f64,
    /// 洼地蓄水总量
    pub stored: f64,
    /// 离开网格或无法分配的水量
    pub escaped: f64,
}

/// 水流分析引擎
pub struct WaterAnalysis<'a, M: TinAccess + ?Sized> {
    surface: Surface<'a, M>,
    config: TraceConfig,
    tables: Option<&'a DrainageTables>,
    locator: Arc<TinLocator>,

    features: Arena<Feature, FeatureTag>,
    point_memo: HashMap<u32, FeatureId>,
    pond_memo: HashMap<u32, FeatureId>,
    exit_memo: HashMap<u32, FeatureId>,
    worklist: Vec<FeatureId>,
    starts: Vec<FeatureId>,

    error: Option<String>,
    water: WaterSummary,
    water_added: bool,
}

impl<'a, M: TinAccess + ?Sized> WaterAnalysis<'a, M> {
    /// 创建分析（校验配置并建立点定位索引）
    pub fn new(tin: &'a M, config: TraceConfig) -> DrainageResult<Self> {
        config.validate()?;
        let surface = Surface::new(tin, config.direction);
        let locator = Arc::new(TinLocator::new(&surface));
        Ok(Self {
            surface,
            config,
            tables: None,
            locator,
            features: Arena::new(),
            point_memo: HashMap::new(),
            pond_memo: HashMap::new(),
            exit_memo: HashMap::new(),
            worklist: Vec::new(),
            starts: Vec::new(),
            error: None,
            water: WaterSummary::default(),
            water_added: false,
        })
    }

    /// 附加查找表；与分析面不一致的查找表不附加
    pub fn with_tables(mut self, tables: &'a DrainageTables) -> Self {
        if tables.is_valid_for(&self.surface) {
            self.tables = Some(tables);
        } else {
            debug!("查找表与分析面不一致，不附加");
        }
        self
    }

    // ===== 查询 =====

    /// 配置
    #[inline]
    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// 已附加的查找表
    #[inline]
    pub fn tables(&self) -> Option<&'a DrainageTables> {
        self.tables
    }

    /// 全部特征
    #[inline]
    pub fn features(&self) -> &Arena<Feature, FeatureTag> {
        &self.features
    }

    /// 单个特征
    #[inline]
    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(id)
    }

    /// 全部起点特征
    #[inline]
    pub fn starts(&self) -> &[FeatureId] {
        &self.starts
    }

    /// 顶点上的 OnPoint 特征
    pub fn point_feature(&self, p: u32) -> Option<FeatureId> {
        self.point_memo.get(&p).copied()
    }

    /// 以 `p` 为低点的洼地特征
    pub fn pond_at(&self, p: u32) -> Option<FeatureId> {
        self.pond_memo.get(&p).copied()
    }

    /// 以 `p` 为出口点的出口特征
    pub fn exit_at(&self, p: u32) -> Option<FeatureId> {
        self.exit_memo.get(&p).copied()
    }

    /// 全部洼地特征
    pub fn ponds(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.features
            .iter()
            .filter(|(_, f)| matches!(f.kind, FeatureKind::Pond(_)))
            .map(|(id, _)| id)
    }

    /// 全部出口特征
    pub fn exits(&self) -> impl Iterator<Item = FeatureId> + '_ {
        self.features
            .iter()
            .filter(|(_, f)| matches!(f.kind, FeatureKind::PondExit(_)))
            .map(|(id, _)| id)
    }

    /// 是否有特征处理失败
    #[inline]
    pub fn is_errored(&self) -> bool {
        self.error.is_some()
    }

    /// 第一条错误信息
    #[inline]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// 充水统计
    #[inline]
    pub fn water_summary(&self) -> WaterSummary {
        self.water
    }

    /// 特征统计
    pub fn counts(&self) -> FeatureCounts {
        let mut counts = FeatureCounts {
            features: self.features.len(),
            ..Default::default()
        };
        for (_, f) in self.features.iter() {
            match f.kind {
                FeatureKind::Pond(_) => counts.ponds += 1,
                FeatureKind::PondExit(_) => counts.exits += 1,
                _ => {}
            }
            if f.is_errored() {
                counts.errored += 1;
            }
        }
        counts
    }

    // ===== 追踪 =====

    /// 从平面坐标开始追踪，处理到工作栈为空
    pub fn trace(&mut self, x: f64, y: f64) -> FeatureId {
        let z = self.locator.locate(&self.surface, x, y).position().map_or(0.0, |p| p.z);
        let mut start = Feature::new(FeatureKind::StartPoint { at: Point3D::new(x, y, z) }, None);
        start.path.push(Point3D::new(x, y, z));
        let id = self.features.push(start);
        self.starts.push(id);
        self.worklist.push(id);
        self.drain();

        let counts = self.counts();
        info!(
            features = counts.features,
            ponds = counts.ponds,
            exits = counts.exits,
            errored = counts.errored,
            "追踪完成"
        );
        id
    }

    /// 处理工作栈直到为空
    pub(crate) fn run(&mut self) {
        while let Some(id) = self.worklist.pop() {
            if self.features[id].finished {
                continue;
            }
            debug!(feature = %id, kind = self.features[id].kind.label(), "处理特征");
            if let Err(err) = self.process(id) {
                let stop = matches!(err, DrainageError::FeatureLimit { .. });
                self.fail(id, &err);
                if stop {
                    self.worklist.clear();
                }
            }
        }
    }

    fn process(&mut self, id: FeatureId) -> DrainageResult<()> {
        match self.features[id].kind {
            FeatureKind::StartPoint { .. } => self.process_start(id),
            FeatureKind::InTriangle { .. } => self.process_in_triangle(id),
            FeatureKind::OnEdge { .. } => self.process_on_edge(id),
            FeatureKind::OnPoint { .. } => self.process_on_point(id),
            FeatureKind::Pond(_) => self.process_pond(id),
            FeatureKind::PondExit(_) => self.process_exit(id, false),
        }
    }

    fn fail(&mut self, id: FeatureId, err: &DrainageError) {
        let message = err.to_string();
        warn!(feature = %id, kind = self.features[id].kind.label(), error = %message, "特征处理失败");
        let feature = &mut self.features[id];
        feature.finished = true;
        feature.error = Some(message.clone());
        if self.error.is_none() {
            self.error = Some(message);
        }
    }

    /// 新建子特征并压入工作栈
    pub(crate) fn add_child(&mut self, parent: FeatureId, kind: FeatureKind) -> DrainageResult<FeatureId> {
        if self.features.len() >= self.config.max_features {
            return Err(DrainageError::FeatureLimit {
                limit: self.config.max_features,
            });
        }
        let id = self.features.push(Feature::new(kind, Some(parent)));
        self.features[parent].children.push(id);
        self.worklist.push(id);
        Ok(id)
    }

    /// 把已有特征挂到父特征下
    pub(crate) fn attach(&mut self, parent: FeatureId, child: FeatureId) {
        let children = &mut self.features[parent].children;
        if !children.contains(&child) {
            children.push(child);
        }
    }

    /// 顶点上的 OnPoint 特征（记忆化）
    pub(crate) fn on_point(
        &mut self,
        parent: FeatureId,
        point: u32,
        last_angle: Option<f64>,
    ) -> DrainageResult<FeatureId> {
        if let Some(&existing) = self.point_memo.get(&point) {
            self.attach(parent, existing);
            return Ok(existing);
        }
        let id = self.add_child(
            parent,
            FeatureKind::OnPoint {
                point,
                last_angle,
                on_hull: false,
            },
        )?;
        self.point_memo.insert(point, id);
        Ok(id)
    }

    /// 分析面上的点换回真实高程
    pub(crate) fn restore(&self, p: Point3D) -> Point3D {
        self.surface.restore(p)
    }
}
