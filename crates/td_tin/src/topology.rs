//! 三角网拓扑数据结构
//!
//! 以 CSR (Compressed Sparse Row) 格式存储每个顶点的环形邻接表：
//! - `offsets[p]` 和 `offsets[p+1]` 之间是顶点 p 的邻点，按逆时针排列
//! - 凸包顶点的邻点从 `hull_next` 开始、到 `hull_prev` 结束，中间无缺口
//!
//! # 示例
//!
//! ```
//! use td_tin::topology::CsrConnectivity;
//!
//! let csr = CsrConnectivity::from_rows(&[&[1, 2][..], &[0, 2, 3][..], &[][..]]);
//! assert_eq!(csr.row(1), &[0, 2, 3]);
//! assert_eq!(csr.n_rows(), 3);
//! assert!(csr.row(2).is_empty());
//! ```

use serde::{Deserialize, Serialize};

/// CSR 格式连接性
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsrConnectivity {
    /// 行偏移数组，长度 = n_rows + 1
    pub offsets: Vec<u32>,
    /// 列索引数组
    pub indices: Vec<u32>,
}

impl CsrConnectivity {
    /// 从行列表构建 CSR
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> Self {
        let mut offsets = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();

        offsets.push(0);
        for row in rows {
            indices.extend_from_slice(row.as_ref());
            offsets.push(indices.len() as u32);
        }

        Self { offsets, indices }
    }

    /// 获取第 row 行的切片
    #[inline]
    pub fn row(&self, row: usize) -> &[u32] {
        let start = self.offsets[row] as usize;
        let end = self.offsets[row + 1] as usize;
        &self.indices[start..end]
    }

    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// 非零元素总数
    #[inline]
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// 第 row 行中某元素的位置
    #[inline]
    pub fn position(&self, row: usize, value: u32) -> Option<usize> {
        self.row(row).iter().position(|&v| v == value)
    }
}
