// crates/td_drainage/tests/scenarios.rs

//! 追踪场景测试
//!
//! # 测试覆盖
//!
//! - 单点漏斗：洼地、出口、追踪视图
//! - 平面：水流离开网格
//! - 记忆化：同一顶点/低点只有一个特征
//! - 假低点与死洼地合并
//! - 上溯模式、网格外起点、特征数上限、查找表
//! - 空洞：起点落在空洞内、洼地经空洞顶点溢出
//! - 平三角形：形成洼地，或沿上一个方向继续追踪
//! - 过期查找表不附加

use td_drainage::prelude::*;
use td_drainage::{PondExitInfo, RingLocation};
use td_tin::{grid_tin, radial_tin, Tin, TinAccess};

// ============================================================================
// 测试辅助函数
// ============================================================================

/// 六边形漏斗：中心 0 高程 0，六个凸包点高程 5
fn hexagon_pit() -> Tin {
    radial_tin(6, 1, 1.0, |x, y| if x.hypot(y) < 0.5 { 0.0 } else { 5.0 }).unwrap()
}

const PIT_A: u32 = 16;
const SADDLE: u32 = 17;
const PIT_B: u32 = 18;
const SPILL: u32 = 20;

/// 7x5 格网：两个坑 (2,2)、(4,2) 被 (3,2) 处高程 5 的鞍点隔开，
/// 凸包高程 10，只有 (6,2) 高程 8
fn twin_pits() -> Tin {
    let mut tin = grid_tin(7, 5, 1.0, |_, _| 10.0).unwrap();
    for j in 1..4 {
        for i in 1..6 {
            let p = (j * 7 + i) as u32;
            tin.set_elevation(p, 6.0 + 0.05 * p as f64).unwrap();
        }
    }
    tin.set_elevation(PIT_A, 1.0).unwrap();
    tin.set_elevation(SADDLE, 5.0).unwrap();
    tin.set_elevation(PIT_B, 2.0).unwrap();
    tin.set_elevation(SPILL, 8.0).unwrap();
    tin
}

/// 7x5 格网：坑 (2,2) 高程 1，三角形 [11, 12, 19] 为空洞，凸包高程 10
fn void_basin() -> Tin {
    let mut tin = grid_tin(7, 5, 1.0, |_, _| 10.0).unwrap();
    for j in 1..4 {
        for i in 1..6 {
            let p = (j * 7 + i) as u32;
            tin.set_elevation(p, 6.0 + 0.05 * p as f64).unwrap();
        }
    }
    tin.set_elevation(PIT_A, 1.0).unwrap();
    tin.with_voids(&[[11, 12, 19]]).unwrap()
}

/// 7x5 格网：三角形 [16, 17, 24] 高程 0，平边 16-17 另一侧的 (2,1) 高程 -1
fn flat_triangle() -> Tin {
    let mut tin = grid_tin(7, 5, 1.0, |_, _| 10.0).unwrap();
    for j in 1..4 {
        for i in 1..6 {
            let p = (j * 7 + i) as u32;
            tin.set_elevation(p, 6.0 + 0.05 * p as f64).unwrap();
        }
    }
    for p in [16, 17, 24] {
        tin.set_elevation(p, 0.0).unwrap();
    }
    tin.set_elevation(9, -1.0).unwrap();
    tin
}

fn has_pond_kind<M: TinAccess>(analysis: &WaterAnalysis<'_, M>, kind: PondKind) -> bool {
    analysis
        .ponds()
        .filter_map(|id| analysis.feature(id).and_then(|f| f.pond()))
        .any(|p| p.analysis.kind() == kind)
}

fn pond_of<'a, M: TinAccess>(analysis: &'a WaterAnalysis<'_, M>, low: u32) -> &'a td_drainage::feature::PondFeature {
    let id = analysis.pond_at(low).expect("洼地不存在");
    analysis.feature(id).and_then(|f| f.pond()).unwrap()
}

// ============================================================================
// 单点漏斗
// ============================================================================

#[test]
fn test_hexagon_trace_finds_pond() {
    let tin = hexagon_pit();
    let mut analysis = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap();
    analysis.trace(0.3, 0.1);

    assert!(!analysis.is_errored(), "{:?}", analysis.error_message());
    let counts = analysis.counts();
    assert_eq!(counts.ponds, 1);
    assert_eq!(counts.exits, 6);
    assert_eq!(counts.errored, 0);

    let pond = pond_of(&analysis, 0);
    assert_eq!(pond.analysis.kind(), PondKind::LowPoint);
    assert_eq!(pond.analysis.exit_z(), Some(5.0));
    let rings = pond.analysis.rings();
    assert_eq!(rings.len(), 1);
    assert_eq!(rings[0].location, RingLocation::Outer);

    // 深洼地的出口在普通追踪中不计算
    for exit in analysis.exits() {
        let e = analysis.feature(exit).unwrap().exit().unwrap();
        assert!(!e.calculated);
        assert!(tin.is_hull(e.info.exit_point));
    }
}

#[test]
fn test_hexagon_trace_view() {
    let tin = hexagon_pit();
    let mut analysis = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap();
    analysis.trace(0.3, 0.1);

    let mut buffer = ResultBuffer::new();
    analysis.emit_trace(&mut buffer);
    assert_eq!(buffer.points_of(PointKind::Start).count(), 1);
    assert_eq!(buffer.points_of(PointKind::Low).count(), 1);
    assert_eq!(buffer.points_of(PointKind::Exit).count(), 6);
    assert_eq!(buffer.ponds.len(), 1);

    let pond = &buffer.ponds[0];
    assert!(pond.full);
    assert!(pond.holes.is_empty());
    assert_eq!(pond.outer.len(), 7);
    assert!((pond.depth - 5.0).abs() < 1e-12);
    assert!(buffer.streams.iter().all(|s| s.kind != LineKind::Ascent));

    // 追踪线从起点开始，终点在低点
    let first = buffer.streams.first().unwrap();
    assert!((first.points[0].x - 0.3).abs() < 1e-12);
    let last = buffer.streams.last().unwrap().points.last().copied().unwrap();
    assert!(last.x.abs() < 1e-9 && last.y.abs() < 1e-9);
}

#[test]
fn test_start_on_vertex() {
    let tin = hexagon_pit();
    let mut analysis = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap();
    analysis.trace(0.0, 0.0);
    assert!(analysis.point_feature(0).is_some());
    assert!(analysis.pond_at(0).is_some());
}

// ============================================================================
// 平面
// ============================================================================

#[test]
fn test_plane_trace_leaves_mesh() {
    let tin = grid_tin(5, 5, 1.0, |x, y| x + 0.5 * y).unwrap();
    let mut analysis = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap();
    analysis.trace(2.2, 2.7);

    assert!(!analysis.is_errored(), "{:?}", analysis.error_message());
    assert_eq!(analysis.counts().ponds, 0);

    // 每一步都在下降
    let mut buffer = ResultBuffer::new();
    analysis.emit_trace(&mut buffer);
    for stream in &buffer.streams {
        for w in stream.points.windows(2) {
            assert!(w[1].z <= w[0].z + 1e-12);
        }
    }
}

// ============================================================================
// 记忆化
// ============================================================================

#[test]
fn test_memoization_uniqueness() {
    let tin = twin_pits();
    let mut analysis = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap();
    for (x, y) in [(2.0, 2.0), (1.6, 1.3), (2.4, 2.8), (4.2, 1.7), (4.0, 2.0), (1.5, 2.5)] {
        analysis.trace(x, y);
    }
    assert!(!analysis.is_errored(), "{:?}", analysis.error_message());

    let mut points = Vec::new();
    let mut lows = Vec::new();
    for (_, f) in analysis.features().iter() {
        match &f.kind {
            FeatureKind::OnPoint { point, .. } => points.push(*point),
            FeatureKind::Pond(p) => lows.push(p.analysis.low_point()),
            _ => {}
        }
    }
    let n_points = points.len();
    points.sort_unstable();
    points.dedup();
    assert_eq!(points.len(), n_points);

    let n_lows = lows.len();
    lows.sort_unstable();
    lows.dedup();
    assert_eq!(lows.len(), n_lows);
    assert_eq!(lows, vec![PIT_A, PIT_B]);
    assert_eq!(analysis.starts().len(), 6);
}

// ============================================================================
// 假低点与死洼地
// ============================================================================

#[test]
fn test_false_lows_continue_and_merge() {
    let tin = twin_pits();
    let config = TraceConfig {
        minimum_pond_depth: 10.0,
        ..Default::default()
    };
    let mut analysis = WaterAnalysis::new(&tin, config).unwrap();
    analysis.trace(2.0, 2.0);
    assert!(!analysis.is_errored(), "{:?}", analysis.error_message());

    // 两个坑共用鞍点出口，溢出回到自己：合并成上一级洼地
    let saddle = analysis.exit_at(SADDLE).unwrap();
    let exit = analysis.feature(saddle).unwrap().exit().unwrap();
    assert!(exit.calculated);
    assert_eq!(exit.ponds.len(), 2);
    let merged = exit.merged.unwrap();
    assert_eq!(analysis.pond_at(SADDLE), Some(merged));

    let merged_pond = analysis.feature(merged).unwrap().pond().unwrap();
    assert_eq!(merged_pond.analysis.kind(), PondKind::FromExit);
    assert_eq!(merged_pond.analysis.exit_z(), Some(8.0));
    assert_eq!(merged_pond.inner.len(), 2);
    assert_eq!(merged_pond.source_exit, Some(saddle));

    for low in [PIT_A, PIT_B] {
        let id = analysis.pond_at(low).unwrap();
        assert!(analysis.feature(id).unwrap().hidden);
    }

    // 合并洼地从 (6,2) 溢出网格
    let spill = analysis.exit_at(SPILL).unwrap();
    assert!(analysis.feature(spill).unwrap().exit().unwrap().on_hull);

    // 隐藏的洼地不出现在追踪视图中
    let mut buffer = ResultBuffer::new();
    analysis.emit_trace(&mut buffer);
    assert_eq!(buffer.points_of(PointKind::Low).count(), 1);
}

#[test]
fn test_deep_pond_stops_trace() {
    let tin = twin_pits();
    let mut analysis = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap();
    analysis.trace(2.0, 2.0);
    assert_eq!(analysis.counts().ponds, 1);
    let saddle = analysis.exit_at(SADDLE).unwrap();
    let exit = analysis.feature(saddle).unwrap().exit().unwrap();
    assert!(!exit.calculated);
    assert!(exit.outflow.is_none());
    assert_eq!(exit.info.exit_point, SADDLE);
    assert_ne!(exit.info.prior, exit.info.next);
}

// ============================================================================
// 上溯、错误与查找表
// ============================================================================

#[test]
fn test_ascent_trace_restores_elevation() {
    let tin = hexagon_pit();
    let mut analysis = WaterAnalysis::new(&tin, TraceConfig::ascent()).unwrap();
    analysis.trace(0.0, 0.0);
    assert!(!analysis.is_errored(), "{:?}", analysis.error_message());
    assert_eq!(analysis.counts().ponds, 0);

    let mut buffer = ResultBuffer::new();
    analysis.emit_trace(&mut buffer);
    let start = buffer.points_of(PointKind::Start).next().unwrap();
    assert_eq!(start.at.z, 0.0);
    let line = buffer.streams.iter().find(|s| s.kind == LineKind::Ascent).unwrap();
    assert_eq!(line.points[0].z, 0.0);
    assert!((line.points.last().unwrap().z - 5.0).abs() < 1e-12);
}

#[test]
fn test_off_mesh_start_is_errored() {
    let tin = hexagon_pit();
    let mut analysis = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap();
    let start = analysis.trace(100.0, 100.0);
    assert!(analysis.is_errored());
    assert!(analysis.error_message().unwrap().contains("网格外"));
    let feature = analysis.feature(start).unwrap();
    assert!(feature.finished);
    assert!(feature.children.is_empty());
    assert_eq!(analysis.counts().errored, 1);
}

#[test]
fn test_feature_limit() {
    let tin = twin_pits();
    let config = TraceConfig {
        max_features: 2,
        ..Default::default()
    };
    let mut analysis = WaterAnalysis::new(&tin, config).unwrap();
    analysis.trace(2.0, 2.0);
    assert!(analysis.is_errored());
    assert!(analysis.error_message().unwrap().contains("上限"));
    assert!(analysis.features().len() <= 2);
}

#[test]
fn test_invalid_config_rejected() {
    let tin = hexagon_pit();
    let config = TraceConfig {
        minimum_pond_depth: -1.0,
        ..Default::default()
    };
    assert!(WaterAnalysis::new(&tin, config).is_err());
}

#[test]
fn test_tables_do_not_change_results() {
    let tin = twin_pits();
    let mut tables = DrainageTables::build(&tin);
    tables.insert_known_pond_exit(
        td_drainage::PondKey::Point(PIT_A),
        PondExitInfo {
            exit_point: SADDLE,
            prior: 0,
            next: 0,
        },
    );

    let mut plain = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap();
    let mut cached = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap().with_tables(&tables);
    for (x, y) in [(1.6, 1.3), (4.2, 1.7)] {
        plain.trace(x, y);
        cached.trace(x, y);
    }
    assert_eq!(plain.counts(), cached.counts());
    assert_eq!(plain.pond_at(PIT_A).is_some(), cached.pond_at(PIT_A).is_some());
}

#[test]
fn test_stale_tables_not_attached() {
    let mut tin = hexagon_pit();
    let tables = DrainageTables::build(&tin);
    {
        let analysis = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap().with_tables(&tables);
        assert!(analysis.tables().is_some());
    }

    // 改高程后表过期
    tin.set_elevation(0, -1.0).unwrap();
    assert!(!tables.is_valid_for(&tin));
    let mut analysis = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap().with_tables(&tables);
    assert!(analysis.tables().is_none());
    analysis.trace(0.3, 0.1);
    assert!(!analysis.is_errored(), "{:?}", analysis.error_message());
    assert_eq!(pond_of(&analysis, 0).analysis.low_z(), -1.0);
}

// ============================================================================
// 空洞
// ============================================================================

#[test]
fn test_start_in_void_is_errored() {
    let tin = void_basin();
    let mut analysis = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap();
    let start = analysis.trace(14.0 / 3.0, 4.0 / 3.0);
    assert!(analysis.is_errored());
    assert!(analysis.error_message().unwrap().contains("空洞"));
    assert!(analysis.feature(start).unwrap().children.is_empty());
    assert_eq!(analysis.counts().ponds, 0);
}

#[test]
fn test_pond_spills_into_void() {
    let tin = void_basin();
    let mut pond = PondAnalysis::new(&tin, PondSeed::Point(PIT_A)).unwrap();
    pond.find_pond(&tin).unwrap();
    // 空洞顶点 11 (4,1) 是区域外最低的边界点
    assert_eq!(pond.exit_z(), Some(tin.z(11)));
    assert_eq!(pond.exits().len(), 1);
    assert_eq!(pond.exits()[0].exit_point, 11);
    let capacity = pond.capacity().unwrap();

    let mut analysis = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap();
    let summary = analysis.add_water_volume(2.0, 2.0, capacity + 1.0).unwrap();
    assert!(!analysis.is_errored(), "{:?}", analysis.error_message());
    assert!((summary.escaped - 1.0).abs() < 1e-9);

    let exit = analysis.exit_at(11).unwrap();
    let exit = analysis.feature(exit).unwrap();
    assert!(exit.exit().unwrap().on_hull);
    assert!((exit.volume - 1.0).abs() < 1e-9);
}

// ============================================================================
// 平三角形
// ============================================================================

#[test]
fn test_flat_triangle_start_makes_pond() {
    let tin = flat_triangle();
    let mut analysis = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap();
    analysis.trace(2.8, 2.3);
    assert!(!analysis.is_errored(), "{:?}", analysis.error_message());
    assert!(has_pond_kind(&analysis, PondKind::Triangle));
}

#[test]
fn test_trace_into_flat_triangle_makes_pond() {
    let tin = flat_triangle();
    let mut analysis = WaterAnalysis::new(&tin, TraceConfig::default()).unwrap();
    // 三角形 [16, 24, 23] 内沿 315° 下降，在 (2.45, 2.45) 进入平三角形
    analysis.trace(2.2, 2.7);
    assert!(!analysis.is_errored(), "{:?}", analysis.error_message());
    assert!(has_pond_kind(&analysis, PondKind::Triangle));
}

#[test]
fn test_last_angle_crosses_flat_triangle() {
    let tin = flat_triangle();
    let config = TraceConfig {
        zero_slope: ZeroSlopeOption::TraceLastAngle,
        ..Default::default()
    };
    let mut analysis = WaterAnalysis::new(&tin, config).unwrap();
    // 沿 315° 穿过平三角形，在 (2.9, 2) 越过平边后沿谷线流向 9
    analysis.trace(2.2, 2.7);
    assert!(!analysis.is_errored(), "{:?}", analysis.error_message());
    assert!(!has_pond_kind(&analysis, PondKind::Triangle));
    let pond = pond_of(&analysis, 9);
    assert_eq!(pond.analysis.kind(), PondKind::LowPoint);
}

#[test]
fn test_last_angle_without_direction_is_errored() {
    let tin = flat_triangle();
    let config = TraceConfig {
        zero_slope: ZeroSlopeOption::TraceLastAngle,
        ..Default::default()
    };
    let mut analysis = WaterAnalysis::new(&tin, config).unwrap();
    analysis.trace(2.8, 2.3);
    assert!(analysis.is_errored());
    assert!(analysis.error_message().unwrap().contains("方向"));
    assert_eq!(analysis.counts().ponds, 0);
}
