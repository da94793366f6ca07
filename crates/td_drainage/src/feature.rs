// crates/td_drainage/src/feature.rs

//! 追踪特征
//!
//! 追踪特征图的节点。所有特征都存放在 [`WaterAnalysis`](crate::analysis::WaterAnalysis)
//! 的 Arena 中，父子关系、洼地与出口之间的关联都只保存句柄。
//!
//! 同一顶点的 `OnPoint`、同一低点的 `Pond`、同一出口点的 `PondExit` 各只有一个，
//! 多条路径汇入时共享下游子图，因此特征图是有向无环图而不是树。

use serde::{Deserialize, Serialize};
use td_foundation::{ArenaTag, HandleMap, Idx};
use td_geo::Point3D;

use crate::pond::PondAnalysis;
use crate::ring::PondExitInfo;

/// 特征 Arena 标记
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureTag;

impl ArenaTag for FeatureTag {}

/// 特征句柄
pub type FeatureId = Idx<FeatureTag>;

/// 洼地特征数据
#[derive(Debug, Clone)]
pub struct PondFeature {
    /// 边界集
    pub analysis: PondAnalysis,
    /// 本洼地的全部出口特征（含与其他洼地共享的）
    pub exits: Vec<FeatureId>,
    /// 合并前的内部洼地（仅死洼地合并生成的洼地）
    pub inner: Vec<FeatureId>,
    /// 生成本洼地的死出口
    pub source_exit: Option<FeatureId>,
    /// 已蓄水量
    pub current: f64,
    /// 是否已满
    pub full: bool,
}

impl PondFeature {
    /// 新洼地
    pub fn new(analysis: PondAnalysis) -> Self {
        Self {
            analysis,
            exits: Vec::new(),
            inner: Vec::new(),
            source_exit: None,
            current: 0.0,
            full: false,
        }
    }

    /// 剩余容量（尚未求解时为 0）
    pub fn remaining(&self) -> f64 {
        (self.analysis.capacity().unwrap_or(0.0) - self.current).max(0.0)
    }
}

/// 洼地出口特征数据
#[derive(Debug, Clone)]
pub struct PondExitFeature {
    /// 出口点与环上前后点
    pub info: PondExitInfo,
    /// 以此点为出口的全部洼地
    pub ponds: Vec<FeatureId>,
    /// 已计算溢出路径
    pub calculated: bool,
    /// 出口位于边界，水流离开网格
    pub on_hull: bool,
    /// 溢出路径的第一个特征
    pub outflow: Option<FeatureId>,
    /// 死出口合并生成的上一级洼地
    pub merged: Option<FeatureId>,
}

/// 特征种类
#[derive(Debug, Clone)]
pub enum FeatureKind {
    /// 用户给定的起点
    StartPoint {
        /// 起点位置
        at: Point3D,
    },
    /// 穿过逆时针三角形 `(p1, p2, p3)` 内部
    InTriangle {
        /// 顶点 1
        p1: u32,
        /// 顶点 2
        p2: u32,
        /// 顶点 3
        p3: u32,
        /// 入口位置
        at: Point3D,
    },
    /// 位于边 `p1-p2` 上，即将进入三角形 `(p1, p2, p3)`
    OnEdge {
        /// 边起点
        p1: u32,
        /// 边终点
        p2: u32,
        /// 对顶点，边外侧没有三角形时为 None
        p3: Option<u32>,
        /// 位置
        at: Point3D,
        /// 上一个下降方向
        last_angle: Option<f64>,
    },
    /// 到达顶点
    OnPoint {
        /// 顶点
        point: u32,
        /// 上一个下降方向
        last_angle: Option<f64>,
        /// 顶点位于边界，水流离开网格
        on_hull: bool,
    },
    /// 洼地
    Pond(Box<PondFeature>),
    /// 洼地出口
    PondExit(PondExitFeature),
}

impl FeatureKind {
    /// 种类名称（日志用）
    pub fn label(&self) -> &'static str {
        match self {
            Self::StartPoint { .. } => "start_point",
            Self::InTriangle { .. } => "in_triangle",
            Self::OnEdge { .. } => "on_edge",
            Self::OnPoint { .. } => "on_point",
            Self::Pond(_) => "pond",
            Self::PondExit(_) => "pond_exit",
        }
    }

    /// 是否为追踪线特征
    pub fn is_trace(&self) -> bool {
        !matches!(self, Self::Pond(_) | Self::PondExit(_))
    }
}

/// 特征节点
#[derive(Debug, Clone)]
pub struct Feature {
    /// 种类与数据
    pub kind: FeatureKind,
    /// 已处理完
    pub finished: bool,
    /// 子特征
    pub children: Vec<FeatureId>,
    /// 创建者（仅用于诊断）
    pub parent: Option<FeatureId>,
    /// 本轮充水待分配的水量
    pub pending_volume: f64,
    /// 累计流经的水量
    pub volume: f64,
    /// 在追踪视图中隐藏
    pub hidden: bool,
    /// 处理失败的原因
    pub error: Option<String>,
    /// 追踪路径
    pub path: Vec<Point3D>,
    /// 路径沿汇水线
    pub sump: bool,
}

impl Feature {
    /// 新特征
    pub fn new(kind: FeatureKind, parent: Option<FeatureId>) -> Self {
        Self {
            kind,
            finished: false,
            children: Vec::new(),
            parent,
            pending_volume: 0.0,
            volume: 0.0,
            hidden: false,
            error: None,
            path: Vec::new(),
            sump: false,
        }
    }

    /// 是否处理失败
    #[inline]
    pub fn is_errored(&self) -> bool {
        self.error.is_some()
    }

    /// 洼地数据
    pub fn pond(&self) -> Option<&PondFeature> {
        match &self.kind {
            FeatureKind::Pond(p) => Some(p),
            _ => None,
        }
    }

    /// 洼地数据（可变）
    pub fn pond_mut(&mut self) -> Option<&mut PondFeature> {
        match &mut self.kind {
            FeatureKind::Pond(p) => Some(p),
            _ => None,
        }
    }

    /// 出口数据
    pub fn exit(&self) -> Option<&PondExitFeature> {
        match &self.kind {
            FeatureKind::PondExit(e) => Some(e),
            _ => None,
        }
    }

    /// 出口数据（可变）
    pub fn exit_mut(&mut self) -> Option<&mut PondExitFeature> {
        match &mut self.kind {
            FeatureKind::PondExit(e) => Some(e),
            _ => None,
        }
    }

    /// 按深拷贝的句柄映射重写所有交叉引用
    pub fn remap(&mut self, map: &HandleMap<FeatureTag>) {
        let fix = |id: &mut FeatureId| *id = map.get(*id);
        self.children.iter_mut().for_each(fix);
        if let Some(parent) = self.parent.as_mut() {
            fix(parent);
        }
        match &mut self.kind {
            FeatureKind::Pond(p) => {
                p.exits.iter_mut().for_each(fix);
                p.inner.iter_mut().for_each(fix);
                if let Some(e) = p.source_exit.as_mut() {
                    fix(e);
                }
            }
            FeatureKind::PondExit(e) => {
                e.ponds.iter_mut().for_each(fix);
                if let Some(o) = e.outflow.as_mut() {
                    fix(o);
                }
                if let Some(m) = e.merged.as_mut() {
                    fix(m);
                }
            }
            _ => {}
        }
    }
}

/// 特征统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCounts {
    /// 特征总数
    pub features: usize,
    /// 洼地数
    pub ponds: usize,
    /// 出口数
    pub exits: usize,
    /// 失败特征数
    pub errored: usize,
}
