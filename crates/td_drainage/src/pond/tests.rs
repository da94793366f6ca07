// crates/td_drainage/src/pond/tests.rs

use std::f64::consts::TAU;

use td_geo::polygon::signed_area;
use td_geo::volume::prism_to_plane;
use td_tin::{grid_tin, radial_tin, Tin, TinAccess};

use super::*;
use crate::config::TraceConfig;

/// 六边形漏斗：中心 0 高程 0，六个凸包点高程 5
fn hexagon_pit() -> Tin {
    radial_tin(6, 1, 1.0, |x, y| if x.hypot(y) < 0.5 { 0.0 } else { 5.0 }).unwrap()
}

/// 6x5 格网：内部 (2,2)-(3,2) 为高程 0 的平边，其余内部点高程互异，凸包高程 5
fn edge_valley() -> Tin {
    let mut tin = grid_tin(6, 5, 1.0, |_, _| 5.0).unwrap();
    for j in 1..4 {
        for i in 1..5 {
            let p = (j * 6 + i) as u32;
            tin.set_elevation(p, 2.0 + 0.1 * p as f64).unwrap();
        }
    }
    tin.set_elevation(14, 0.0).unwrap();
    tin.set_elevation(15, 0.0).unwrap();
    tin
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

/// 8 扇区 4 圈放射网：中心岛（8 / 8.5）、环形洼槽（1 起逐扇区升高）、
/// 堤（9）、凸包（10）
fn moat_island() -> Tin {
    radial_tin(8, 4, 1.0, |x, y| {
        let ring = x.hypot(y).round() as usize;
        let sector = (y.atan2(x).rem_euclid(TAU) / (TAU / 8.0)).round() as usize % 8;
        match ring {
            0 => 8.0,
            1 => 8.5,
            2 => 1.0 + 0.5 * sector as f64,
            3 => 9.0,
            _ => 10.0,
        }
    })
    .unwrap()
}

fn total_fill<M: TinAccess>(tin: &M, z: f64, filter: impl Fn(&[u32; 3]) -> bool) -> f64 {
    tin.triangles()
        .iter()
        .filter(|t| filter(t))
        .map(|t| prism_to_plane(&tin.point(t[0]), &tin.point(t[1]), &tin.point(t[2]), z).fill_volume)
        .sum()
}

fn ring_area<M: TinAccess>(tin: &M, ring: &BoundaryRing) -> f64 {
    ring.signed_area(tin)
}

/// 环上没有重复顶点，相邻两点是网格邻点
fn assert_simple_rings<M: TinAccess>(tin: &M, pond: &PondAnalysis) {
    for ring in pond.rings() {
        for &p in ring.points() {
            assert_eq!(ring.occurrences(p), 1, "顶点 {p} 在环上重复: {:?}", ring.points());
        }
        if ring.len() < 3 {
            continue;
        }
        for i in 0..ring.len() {
            let (a, b) = (ring.at(i), ring.at(ring.next_index(i)));
            assert!(tin.is_neighbour(a, b), "{a}-{b} 不相邻: {:?}", ring.points());
        }
    }
}

/// 8 扇区 3 圈棱锥：中心 0 高程 0，每圈升高 5/3，凸包高程 5
fn octagon_cone() -> Tin {
    radial_tin(8, 3, 1.0, |x, y| 5.0 * x.hypot(y).round() / 3.0).unwrap()
}

#[test]
fn test_hexagon_pit_capacity() {
    let tin = hexagon_pit();
    let mut pond = PondAnalysis::new(&tin, PondSeed::Point(0)).unwrap();
    pond.find_pond(&tin).unwrap();

    assert_eq!(pond.kind(), PondKind::LowPoint);
    assert_eq!(pond.exit_z(), Some(5.0));
    assert_eq!(pond.exits().len(), 6);
    assert!((pond.depth() - 5.0).abs() < 1e-12);
    assert_eq!(pond.low_points(), &[0]);

    let area = 6.0 * 3f64.sqrt() / 4.0;
    let capacity = pond.capacity().unwrap();
    assert!((capacity - area * 5.0 / 3.0).abs() < 1e-9, "capacity = {capacity}");
}

#[test]
fn test_hexagon_initial_ring_is_ccw() {
    let tin = hexagon_pit();
    let mut pond = PondAnalysis::new(&tin, PondSeed::Point(0)).unwrap();
    pond.create_initial_rings(&tin).unwrap();
    assert_eq!(pond.rings().len(), 1);
    let ring = pond.outer_ring().unwrap();
    assert_eq!(ring.len(), 6);
    assert!(ring_area(&tin, ring) > 0.0);
}

#[test]
fn test_fill_half_capacity() {
    let tin = hexagon_pit();
    let config = TraceConfig::default();
    let mut pond = PondAnalysis::new(&tin, PondSeed::Point(0)).unwrap();
    pond.find_pond(&tin).unwrap();
    let capacity = pond.capacity().unwrap();

    let z = pond.fill_to_volume(&tin, &config, capacity / 2.0).unwrap().unwrap();
    // 倒棱锥：V(h) ∝ h³
    let expected = 5.0 * 0.5f64.powf(1.0 / 3.0);
    assert!((z - expected).abs() < 1e-4, "z = {z}");
    assert_eq!(pond.fill_z(), Some(z));
    assert!((pond.volume_at(&tin, z) - capacity / 2.0).abs() < 1e-5);

    // 多边形为缩小的六边形
    let polygons = pond.boundary(&tin);
    assert_eq!(polygons.len(), 1);
    assert_eq!(polygons[0].len(), 7);
    assert!(signed_area(&polygons[0]) > 0.0);
    assert!(polygons[0].iter().all(|p| (p.z - z).abs() < 1e-12));
}

#[test]
fn test_fill_beyond_capacity_is_full() {
    let tin = hexagon_pit();
    let config = TraceConfig::default();
    let mut pond = PondAnalysis::new(&tin, PondSeed::Point(0)).unwrap();
    let z = pond.fill_to_volume(&tin, &config, 1e6).unwrap();
    assert_eq!(z, Some(5.0));
    assert_eq!(pond.fill_volume(), pond.capacity().unwrap());

    // 再充少量水时重新求解
    let z = pond.fill_to_volume(&tin, &config, 0.1).unwrap().unwrap();
    assert!(z > 0.0 && z < 5.0);
    assert_eq!(pond.fill_to_volume(&tin, &config, 0.0).unwrap(), None);
}

#[test]
fn test_edge_pond() {
    let tin = edge_valley();
    let mut pond = PondAnalysis::new(&tin, PondSeed::Edge(14, 15)).unwrap();
    pond.find_pond(&tin).unwrap();

    assert_eq!(pond.kind(), PondKind::Edge);
    assert_eq!(pond.exit_z(), Some(5.0));
    assert!(pond.low_points().contains(&14));
    assert!(pond.low_points().contains(&15));
    assert!(pond.exits().iter().all(|e| tin.is_hull(e.exit_point)));

    let expected = total_fill(&tin, 5.0, |_| true);
    assert!((pond.capacity().unwrap() - expected).abs() < 1e-9);
}

#[test]
fn test_low_point_exit_at_saddle() {
    let tin = twin_pits();
    let mut pond = PondAnalysis::new(&tin, PondSeed::Point(PIT_A)).unwrap();
    pond.find_pond(&tin).unwrap();

    assert_eq!(pond.exit_z(), Some(5.0));
    assert_eq!(pond.exits().len(), 1);
    assert_eq!(pond.exits()[0].exit_point, SADDLE);
    assert!((pond.depth() - 4.0).abs() < 1e-12);

    let expected = total_fill(&tin, 5.0, |t| t.contains(&PIT_A));
    assert!((pond.capacity().unwrap() - expected).abs() < 1e-9);
}

#[test]
fn test_merged_pond_from_exit() {
    let tin = twin_pits();
    let seed = PondSeed::Exit {
        exit_point: SADDLE,
        bottom_z: 1.0,
    };
    let mut pond = PondAnalysis::new(&tin, seed).unwrap();
    pond.find_pond(&tin).unwrap();

    assert_eq!(pond.kind(), PondKind::FromExit);
    assert_eq!(pond.low_point(), SADDLE);
    assert_eq!(pond.low_z(), 1.0);
    assert_eq!(pond.exit_z(), Some(8.0));
    assert_eq!(pond.exits().len(), 1);
    assert_eq!(pond.exits()[0].exit_point, SPILL);
    assert!((pond.depth() - 7.0).abs() < 1e-12);

    // 只计鞍点高程以上的水量
    let expected = total_fill(&tin, 8.0, |_| true) - total_fill(&tin, 5.0, |_| true);
    assert!((pond.capacity().unwrap() - expected).abs() < 1e-9);
}

/// 外环取非岛环中唯一逆时针的一条，不按最小顶点编号判定：
/// 放射网中岛上顶点编号最小，按编号会把岛环当成外环。
#[test]
fn test_ring_splits_around_island() {
    let tin = moat_island();
    let moat_low = 9;
    let mut pond = PondAnalysis::new(&tin, PondSeed::Point(moat_low)).unwrap();
    pond.expand_to_elevation(&tin, 7.5).unwrap();

    assert_eq!(pond.rings().len(), 2);
    let outer = pond.outer_ring().unwrap();
    let inner = pond
        .rings()
        .iter()
        .find(|r| r.location == RingLocation::Inner)
        .unwrap();

    let mut outer_points = outer.points().to_vec();
    outer_points.sort_unstable();
    assert_eq!(outer_points, (17..=24).collect::<Vec<u32>>());
    let mut inner_points = inner.points().to_vec();
    inner_points.sort_unstable();
    assert_eq!(inner_points, (1..=8).collect::<Vec<u32>>());

    assert!(ring_area(&tin, outer) > 0.0);
    assert!(ring_area(&tin, inner) < 0.0);

    let expected = total_fill(&tin, 7.5, |_| true);
    assert!((pond.volume_at(&tin, 7.5) - expected).abs() < 1e-9);

    let polygons = pond.polygon_at_elevation(&tin, 7.5);
    assert_eq!(polygons.len(), 2);
    assert!(signed_area(&polygons[0]) > 0.0);
    assert!(signed_area(&polygons[1]) < 0.0);
}

#[test]
fn test_expand_is_idempotent_and_monotonic() {
    let tin = moat_island();
    let mut pond = PondAnalysis::new(&tin, PondSeed::Point(9)).unwrap();
    pond.expand_to_elevation(&tin, 3.0).unwrap();
    let rings: Vec<Vec<u32>> = pond.rings().iter().map(|r| r.points().to_vec()).collect();
    let volume = pond.volume_at(&tin, 3.0);

    pond.expand_to_elevation(&tin, 3.0).unwrap();
    let again: Vec<Vec<u32>> = pond.rings().iter().map(|r| r.points().to_vec()).collect();
    assert_eq!(rings, again);
    assert!((pond.volume_at(&tin, 3.0) - volume).abs() < 1e-12);

    let levels = pond.expansion_elevations();
    assert!(levels.windows(2).all(|w| w[0] < w[1]));

    assert!(matches!(
        pond.expand_to_elevation(&tin, 2.0),
        Err(DrainageError::ElevationBelowCurrent { .. })
    ));
}

#[test]
fn test_boundary_seed_rejected() {
    let tin = hexagon_pit();
    let mut pond = PondAnalysis::new(&tin, PondSeed::Point(1)).unwrap();
    assert!(matches!(
        pond.create_initial_rings(&tin),
        Err(DrainageError::EmptySeed { low_point: 1, .. })
    ));

    assert!(PondAnalysis::new(&tin, PondSeed::Point(99)).is_err());
    assert!(PondAnalysis::new(&tin, PondSeed::Edge(0, 7)).is_err());

    let seed = PondSeed::Exit {
        exit_point: 2,
        bottom_z: 0.0,
    };
    let mut pond = PondAnalysis::new(&tin, seed).unwrap();
    assert!(matches!(
        pond.find_pond(&tin),
        Err(DrainageError::EmptySeed { low_point: 2, .. })
    ));
}

#[test]
fn test_non_adjacent_edge_seed_rejected() {
    let tin = edge_valley();
    let mut pond = PondAnalysis::new(&tin, PondSeed::Edge(7, 15)).unwrap();
    assert!(matches!(
        pond.create_initial_rings(&tin),
        Err(DrainageError::Topology { .. })
    ));
}

#[test]
fn test_island_exit_freezes_only_island_ring() {
    let tin = moat_island();
    let mut pond = PondAnalysis::new(&tin, PondSeed::Point(9)).unwrap();
    pond.find_pond(&tin).unwrap();

    // 水位 8.5 时岛环外侧的中心点 0 更低，岛环停止扩展，水位继续上升
    let inner = pond
        .rings()
        .iter()
        .find(|r| r.location == RingLocation::Inner)
        .unwrap();
    assert!(inner.finished);
    assert!(!inner.exits.is_empty());
    let mut inner_points = inner.points().to_vec();
    inner_points.sort_unstable();
    assert_eq!(inner_points, (1..=8).collect::<Vec<u32>>());

    assert_eq!(pond.exit_z(), Some(10.0));
    assert!(pond.outer_ring().unwrap().finished);
    assert_eq!(pond.exits().len(), 8);
    assert!(pond.exits().iter().all(|e| tin.is_hull(e.exit_point)));
    assert!((pond.depth() - 9.0).abs() < 1e-12);

    // 岛中心的三角形不蓄水
    let expected = total_fill(&tin, 10.0, |t| !t.contains(&0));
    assert!((pond.capacity().unwrap() - expected).abs() < 1e-6);
}

#[test]
fn test_stable_rings_are_simple() {
    let tin = hexagon_pit();
    let mut pond = PondAnalysis::new(&tin, PondSeed::Point(0)).unwrap();
    pond.find_pond(&tin).unwrap();
    assert_simple_rings(&tin, &pond);

    let tin = twin_pits();
    let mut pond = PondAnalysis::new(&tin, PondSeed::Point(PIT_A)).unwrap();
    pond.find_pond(&tin).unwrap();
    assert_simple_rings(&tin, &pond);

    let tin = moat_island();
    let mut pond = PondAnalysis::new(&tin, PondSeed::Point(9)).unwrap();
    pond.expand_to_elevation(&tin, 7.5).unwrap();
    assert_eq!(pond.rings().len(), 2);
    assert_simple_rings(&tin, &pond);

    let mut pond = PondAnalysis::new(&tin, PondSeed::Point(9)).unwrap();
    pond.find_pond(&tin).unwrap();
    assert_simple_rings(&tin, &pond);
}

#[test]
fn test_fill_to_capacity_after_partial_fill() {
    let tin = octagon_cone();
    let config = TraceConfig::default();

    let mut fresh = PondAnalysis::new(&tin, PondSeed::Point(0)).unwrap();
    fresh.find_pond(&tin).unwrap();
    let capacity = fresh.capacity().unwrap();
    let full_area = signed_area(&fresh.boundary(&tin)[0]);

    // 部分充水后边界环停在第二圈
    let mut pond = PondAnalysis::new(&tin, PondSeed::Point(0)).unwrap();
    pond.find_pond(&tin).unwrap();
    let z = pond.fill_to_volume(&tin, &config, 0.1 * capacity).unwrap().unwrap();
    assert!(z > 5.0 / 3.0 && z < 10.0 / 3.0, "z = {z}");
    assert!(!pond.at_exit());

    assert_eq!(pond.fill_to_capacity(&tin).unwrap(), 5.0);
    assert!(pond.at_exit());
    assert!((pond.fill_volume() - capacity).abs() < 1e-9);
    let polygons = pond.boundary(&tin);
    assert_eq!(polygons.len(), 1);
    assert!((signed_area(&polygons[0]) - full_area).abs() < 1e-9);
}
