// crates/td_drainage/src/collector.rs

//! 结果收集接口
//!
//! 引擎不持有输出，只向收集器逐个推送结果：
//!
//! - [`TraceSink`]: 追踪视图（起点/低点/出口、追踪线、满蓄洼地轮廓）
//! - [`ResultCollector`]: 充水视图（点、带水量的水流线、带水量与深度的洼地）
//!
//! [`ResultBuffer`] 同时实现两者并可序列化；[`FeatureJoiner`] 在转发前合并首尾相接的水流线。

use serde::{Deserialize, Serialize};
use td_geo::Point3D;

/// 点的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointKind {
    /// 起点
    Start,
    /// 洼地低点
    Low,
    /// 洼地出口
    Exit,
}

/// 线的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// 下降追踪线
    Descent,
    /// 上溯追踪线
    Ascent,
    /// 汇水线
    Sump,
}

/// 点结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointResult {
    /// 分类
    pub kind: PointKind,
    /// 位置
    pub at: Point3D,
}

/// 水流线结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamResult {
    /// 分类
    pub kind: LineKind,
    /// 折线
    pub points: Vec<Point3D>,
    /// 流经水量（追踪视图为 0）
    pub volume: f64,
}

/// 洼地结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PondResult {
    /// 外边界（闭合）
    pub outer: Vec<Point3D>,
    /// 岛（闭合）
    pub holes: Vec<Vec<Point3D>>,
    /// 是否已满
    pub full: bool,
    /// 水量（追踪视图为满蓄容量）
    pub volume: f64,
    /// 水深
    pub depth: f64,
}

/// 追踪视图收集器
pub trait TraceSink {
    /// 起点、低点或出口
    fn trace_point(&mut self, kind: PointKind, at: Point3D);

    /// 追踪线
    fn trace_line(&mut self, kind: LineKind, points: &[Point3D]);

    /// 满蓄洼地轮廓
    fn trace_pond(&mut self, pond: &PondResult);
}

/// 充水视图收集器
pub trait ResultCollector {
    /// 起点、低点或出口
    fn add_point(&mut self, kind: PointKind, at: Point3D);

    /// 水流线
    fn add_stream(&mut self, kind: LineKind, points: &[Point3D], volume: f64);

    /// 洼地
    fn add_pond(&mut self, pond: &PondResult);
}

/// 内存结果缓冲
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultBuffer {
    /// 点
    pub points: Vec<PointResult>,
    /// 线
    pub streams: Vec<StreamResult>,
    /// 洼地
    pub ponds: Vec<PondResult>,
}

impl ResultBuffer {
    /// 空缓冲
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定分类的点
    pub fn points_of(&self, kind: PointKind) -> impl Iterator<Item = &PointResult> + '_ {
        self.points.iter().filter(move |p| p.kind == kind)
    }

    /// 是否没有任何结果
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.streams.is_empty() && self.ponds.is_empty()
    }
}

impl TraceSink for ResultBuffer {
    fn trace_point(&mut self, kind: PointKind, at: Point3D) {
        self.points.push(PointResult { kind, at });
    }

    fn trace_line(&mut self, kind: LineKind, points: &[Point3D]) {
        self.streams.push(StreamResult {
            kind,
            points: points.to_vec(),
            volume: 0.0,
        });
    }

    fn trace_pond(&mut self, pond: &PondResult) {
        self.ponds.push(pond.clone());
    }
}

impl ResultCollector for ResultBuffer {
    fn add_point(&mut self, kind: PointKind, at: Point3D) {
        self.points.push(PointResult { kind, at });
    }

    fn add_stream(&mut self, kind: LineKind, points: &[Point3D], volume: f64) {
        self.streams.push(StreamResult {
            kind,
            points: points.to_vec(),
            volume,
        });
    }

    fn add_pond(&mut self, pond: &PondResult) {
        self.ponds.push(pond.clone());
    }
}

// ============================================================
// 水流线合并
// ============================================================

/// 合并同类型、同水量且首尾相接的水流线后再转发
///
/// ```
/// use td_drainage::collector::{FeatureJoiner, LineKind, ResultBuffer, ResultCollector};
/// use td_geo::Point3D;
///
/// let mut joiner = FeatureJoiner::new(ResultBuffer::new());
/// let (a, b, c) = (Point3D::new(0.0, 0.0, 2.0), Point3D::new(1.0, 0.0, 1.0), Point3D::new(2.0, 0.0, 0.0));
/// joiner.add_stream(LineKind::Descent, &[a, b], 1.0);
/// joiner.add_stream(LineKind::Descent, &[b, c], 1.0);
/// let buffer = joiner.finish();
/// assert_eq!(buffer.streams.len(), 1);
/// assert_eq!(buffer.streams[0].points.len(), 3);
/// ```
#[derive(Debug)]
pub struct FeatureJoiner<S: ResultCollector> {
    inner: S,
    pending: Option<StreamResult>,
    joined: usize,
}

impl<S: ResultCollector> FeatureJoiner<S> {
    /// 包装收集器
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pending: None,
            joined: 0,
        }
    }

    /// 合并次数
    pub fn joined(&self) -> usize {
        self.joined
    }

    /// 输出剩余的线并返回内部收集器
    pub fn finish(mut self) -> S {
        self.flush();
        self.inner
    }

    fn flush(&mut self) {
        if let Some(stream) = self.pending.take() {
            self.inner.add_stream(stream.kind, &stream.points, stream.volume);
        }
    }
}

impl<S: ResultCollector> ResultCollector for FeatureJoiner<S> {
    fn add_point(&mut self, kind: PointKind, at: Point3D) {
        self.flush();
        self.inner.add_point(kind, at);
    }

    fn add_stream(&mut self, kind: LineKind, points: &[Point3D], volume: f64) {
        let Some(first) = points.first() else {
            return;
        };
        if let Some(pending) = self.pending.as_mut() {
            let touches = pending.points.last().is_some_and(|last| last.same_xy(first));
            if pending.kind == kind && pending.volume == volume && touches {
                pending.points.extend_from_slice(&points[1..]);
                self.joined += 1;
                return;
            }
        }
        self.flush();
        self.pending = Some(StreamResult {
            kind,
            points: points.to_vec(),
            volume,
        });
    }

    fn add_pond(&mut self, pond: &PondResult) {
        self.flush();
        self.inner.add_pond(pond);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64) -> Point3D {
        Point3D::new(x, 0.0, -x)
    }

    #[test]
    fn test_joiner_keeps_different_kinds_apart() {
        let mut joiner = FeatureJoiner::new(ResultBuffer::new());
        joiner.add_stream(LineKind::Descent, &[p(0.0), p(1.0)], 2.0);
        joiner.add_stream(LineKind::Sump, &[p(1.0), p(2.0)], 2.0);
        joiner.add_stream(LineKind::Sump, &[p(2.0), p(3.0)], 2.0);
        assert_eq!(joiner.joined(), 1);
        let buffer = joiner.finish();
        assert_eq!(buffer.streams.len(), 2);
        assert_eq!(buffer.streams[1].points.len(), 3);
    }

    #[test]
    fn test_joiner_breaks_on_gap_and_volume() {
        let mut joiner = FeatureJoiner::new(ResultBuffer::new());
        joiner.add_stream(LineKind::Descent, &[p(0.0), p(1.0)], 1.0);
        joiner.add_stream(LineKind::Descent, &[p(5.0), p(6.0)], 1.0);
        joiner.add_stream(LineKind::Descent, &[p(6.0), p(7.0)], 0.5);
        joiner.add_point(PointKind::Low, p(7.0));
        let buffer = joiner.finish();
        assert_eq!(buffer.streams.len(), 3);
        assert_eq!(buffer.points.len(), 1);
    }

    #[test]
    fn test_buffer_serializes() {
        let mut buffer = ResultBuffer::new();
        buffer.trace_point(PointKind::Start, p(1.0));
        buffer.trace_line(LineKind::Ascent, &[p(0.0), p(1.0)]);
        let json = serde_json::to_string(&buffer).unwrap();
        assert!(json.contains("\"start\""));
        assert!(json.contains("\"ascent\""));
        let back: ResultBuffer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, buffer);
        assert_eq!(back.points_of(PointKind::Start).count(), 1);
    }
}
