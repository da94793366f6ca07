// crates/td_drainage/src/analysis/emit.rs

//! 结果输出
//!
//! 所有坐标在输出前换回真实高程（上溯模式下分析面高程取反）。

use td_geo::Point3D;
use td_tin::TinAccess;

use super::WaterAnalysis;
use crate::collector::{LineKind, PointKind, PondResult, ResultCollector, TraceSink};
use crate::config::TraceDirection;
use crate::feature::{Feature, FeatureKind, PondFeature};
use crate::pond::{PondKind, PondSeed};

impl<'a, M: TinAccess + ?Sized> WaterAnalysis<'a, M> {
    /// 追踪视图：起点、追踪线、低点、满蓄洼地轮廓、出口
    ///
    /// 隐藏的特征（被合并的死洼地）只在充过水之后输出。
    pub fn emit_trace<S: TraceSink + ?Sized>(&self, sink: &mut S) {
        for (_, f) in self.features.iter() {
            if f.hidden && !self.water_added {
                continue;
            }
            match &f.kind {
                FeatureKind::StartPoint { at } => sink.trace_point(PointKind::Start, self.restore(*at)),
                FeatureKind::Pond(pond) => {
                    sink.trace_point(PointKind::Low, self.low_position(pond));
                    if let Some(line) = self.sump_line(pond) {
                        sink.trace_line(LineKind::Sump, &line);
                    }
                    let capacity = pond.analysis.capacity();
                    let result = self.pond_result(pond, capacity.unwrap_or(0.0), pond.analysis.depth(), capacity.is_some());
                    if let Some(result) = result {
                        sink.trace_pond(&result);
                    }
                }
                FeatureKind::PondExit(exit) => {
                    let at = self.surface.point(exit.info.exit_point);
                    sink.trace_point(PointKind::Exit, self.restore(at));
                    if f.path.len() >= 2 {
                        sink.trace_line(self.line_kind(f), &self.restored_path(f));
                    }
                }
                _ => {
                    if f.path.len() >= 2 {
                        sink.trace_line(self.line_kind(f), &self.restored_path(f));
                    }
                }
            }
        }
    }

    /// 充水视图：起点、有水流经的线、蓄水的洼地及其低点、过水的出口
    pub fn emit_results<C: ResultCollector + ?Sized>(&self, collector: &mut C) {
        for (_, f) in self.features.iter() {
            match &f.kind {
                FeatureKind::StartPoint { at } => collector.add_point(PointKind::Start, self.restore(*at)),
                FeatureKind::Pond(pond) => {
                    if pond.current <= 0.0 {
                        continue;
                    }
                    collector.add_point(PointKind::Low, self.low_position(pond));
                    let depth = pond
                        .analysis
                        .fill_z()
                        .map_or(0.0, |z| (z - pond.analysis.low_z()).abs());
                    if let Some(result) = self.pond_result(pond, pond.current, depth, pond.full) {
                        collector.add_pond(&result);
                    }
                }
                FeatureKind::PondExit(exit) => {
                    if f.volume <= 0.0 {
                        continue;
                    }
                    let at = self.surface.point(exit.info.exit_point);
                    collector.add_point(PointKind::Exit, self.restore(at));
                    if f.path.len() >= 2 {
                        collector.add_stream(self.line_kind(f), &self.restored_path(f), f.volume);
                    }
                }
                _ => {
                    if f.volume > 0.0 && f.path.len() >= 2 {
                        collector.add_stream(self.line_kind(f), &self.restored_path(f), f.volume);
                    }
                }
            }
        }
    }

    fn line_kind(&self, f: &Feature) -> LineKind {
        if f.sump {
            LineKind::Sump
        } else if self.config.direction == TraceDirection::Ascent {
            LineKind::Ascent
        } else {
            LineKind::Descent
        }
    }

    fn restored_path(&self, f: &Feature) -> Vec<Point3D> {
        f.path.iter().map(|&p| self.restore(p)).collect()
    }

    fn low_position(&self, pond: &PondFeature) -> Point3D {
        let low = pond.analysis.low_point();
        let at = self.surface.point(low);
        self.restore(at.with_z(pond.analysis.low_z()))
    }

    /// 零深度平边洼地输出为汇水线
    fn sump_line(&self, pond: &PondFeature) -> Option<Vec<Point3D>> {
        if pond.analysis.kind() != PondKind::Edge || pond.analysis.depth() > 0.0 {
            return None;
        }
        let PondSeed::Edge(a, b) = pond.analysis.seed() else {
            return None;
        };
        Some(vec![
            self.restore(self.surface.point(a)),
            self.restore(self.surface.point(b)),
        ])
    }

    fn pond_result(&self, pond: &PondFeature, volume: f64, depth: f64, full: bool) -> Option<PondResult> {
        let mut polygons = pond.analysis.boundary(&self.surface).into_iter();
        let outer: Vec<Point3D> = polygons.next()?.into_iter().map(|p| self.restore(p)).collect();
        let holes = polygons
            .map(|ring| ring.into_iter().map(|p| self.restore(p)).collect())
            .collect();
        Some(PondResult {
            outer,
            holes,
            full,
            volume,
            depth,
        })
    }
}
