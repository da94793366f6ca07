// crates/td_tin/src/generation.rs

//! 规则三角网生成
//!
//! 生成矩形格网与放射状三角网，高程由闭包给出，用于测试和命令行演示。

use std::f64::consts::TAU;

use td_geo::Point3D;

use crate::error::{TinError, TinResult};
use crate::tin::Tin;

/// 矩形格网三角网
///
/// 顶点按行主序编号：`index = j * nx + i`，坐标 `(i * spacing, j * spacing)`。
/// 每个格子沿 `(i, j) - (i+1, j+1)` 对角线剖分为两个三角形。
pub fn grid_tin(nx: usize, ny: usize, spacing: f64, z: impl Fn(f64, f64) -> f64) -> TinResult<Tin> {
    if nx < 2 || ny < 2 {
        return Err(TinError::Format(format!("格网尺寸过小: {nx} x {ny}")));
    }
    if !(spacing > 0.0) {
        return Err(TinError::Format(format!("格网间距无效: {spacing}")));
    }

    let mut points = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let (x, y) = (i as f64 * spacing, j as f64 * spacing);
            points.push(Point3D::new(x, y, z(x, y)));
        }
    }

    let id = |i: usize, j: usize| (j * nx + i) as u32;
    let mut triangles = Vec::with_capacity(2 * (nx - 1) * (ny - 1));
    for j in 0..ny - 1 {
        for i in 0..nx - 1 {
            let (a, b, c, d) = (id(i, j), id(i + 1, j), id(i, j + 1), id(i + 1, j + 1));
            triangles.push([a, b, d]);
            triangles.push([a, d, c]);
        }
    }
    Tin::new(points, &triangles)
}

/// 放射状三角网
///
/// 顶点 0 位于原点，第 `k` 圈（`1..=rings`）有 `sectors` 个顶点，
/// 半径 `k * spacing`，编号 `1 + (k - 1) * sectors + s`。
pub fn radial_tin(sectors: usize, rings: usize, spacing: f64, z: impl Fn(f64, f64) -> f64) -> TinResult<Tin> {
    if sectors < 3 || rings == 0 {
        return Err(TinError::Format(format!("放射网参数无效: {sectors} 扇区, {rings} 圈")));
    }
    if !(spacing > 0.0) {
        return Err(TinError::Format(format!("放射网间距无效: {spacing}")));
    }

    let mut points = Vec::with_capacity(1 + sectors * rings);
    points.push(Point3D::new(0.0, 0.0, z(0.0, 0.0)));
    for k in 1..=rings {
        let radius = k as f64 * spacing;
        for s in 0..sectors {
            let angle = TAU * s as f64 / sectors as f64;
            let (x, y) = (radius * angle.cos(), radius * angle.sin());
            points.push(Point3D::new(x, y, z(x, y)));
        }
    }

    let id = |k: usize, s: usize| (1 + (k - 1) * sectors + s % sectors) as u32;
    let mut triangles = Vec::with_capacity(sectors * (2 * rings - 1));
    for s in 0..sectors {
        triangles.push([0, id(1, s), id(1, s + 1)]);
    }
    for k in 1..rings {
        for s in 0..sectors {
            let (a, b) = (id(k, s), id(k, s + 1));
            let (c, d) = (id(k + 1, s), id(k + 1, s + 1));
            triangles.push([a, c, d]);
            triangles.push([a, d, b]);
        }
    }
    Tin::new(points, &triangles)
}
