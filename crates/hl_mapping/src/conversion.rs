// crates/hl_mapping/src/conversion.rs

//! 储量交换单位换算项
//!
//! 非饱和带模型给出的储量为 `SC1 · area`。地下水模型使用储水系数
//! （storage coefficient）时只需除以面积，使用单位储水量（specific storage）
//! 时还要除以层厚：
//!
//! ```text
//! term[t] = 1 / area[t]                          (储水系数)
//! term[t] = 1 / (area[t] · (top[t] - bottom[t]))  (单位储水量)
//! ```

use hl_foundation::{HlError, HlResult};

/// 地下水单元几何，由编排层从地下水内核读取后传入
#[derive(Debug, Clone, Copy)]
pub struct CellGeometry<'a> {
    /// 单元面积 [m²]
    pub area: &'a [f64],
    /// 单元顶高程 [m]
    pub top: &'a [f64],
    /// 单元底高程 [m]
    pub bottom: &'a [f64],
}

/// 计算储量交换的对角换算项
///
/// # 参数
///
/// - `storage_coefficient`: 接收系统是否使用储水系数公式
/// - `geometry`: 接收系统单元几何
///
/// # 错误
///
/// 数组长度不一致、面积非正或（单位储水量公式下）层厚非正时返回配置错误。
pub fn storage_conversion_term(
    storage_coefficient: bool,
    geometry: CellGeometry<'_>,
) -> HlResult<Vec<f64>> {
    let n = geometry.area.len();
    HlError::check_size("top", n, geometry.top.len())?;
    HlError::check_size("bottom", n, geometry.bottom.len())?;

    let mut term = Vec::with_capacity(n);
    for i in 0..n {
        let area = geometry.area[i];
        if !(area > 0.0) {
            return Err(HlError::invalid_config(
                format!("area[{i}]"),
                area.to_string(),
                "单元面积必须为正",
            ));
        }
        if storage_coefficient {
            term.push(1.0 / area);
        } else {
            let thickness = geometry.top[i] - geometry.bottom[i];
            if !(thickness > 0.0) {
                return Err(HlError::invalid_config(
                    format!("top[{i}] - bottom[{i}]"),
                    thickness.to_string(),
                    "单位储水量公式要求层厚为正",
                ));
            }
            term.push(1.0 / (area * thickness));
        }
    }
    Ok(term)
}
