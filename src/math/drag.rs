use crate::math::error::MathError;
use crate::math::lerp;

/// マッハ数をキーとする零揚力抗力係数テーブル
///
/// 構築後は不変。参照点の間は線形補間し、最初の参照点より下は原点
/// (0, 0) からの補間、最後の参照点より上は一定値として扱う。
#[derive(Debug, Clone)]
pub struct DragTable {
    points: Vec<(f64, f64)>, // (マッハ数, Cx0) 昇順
}

impl DragTable {
    /// 参照点列からテーブルを生成する
    ///
    /// # 引数
    /// * `points` - (マッハ数, 抗力係数) の列。マッハ数は正かつ狭義昇順
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self, MathError> {
        if points.is_empty() {
            return Err(MathError::EmptyDragTable);
        }
        if points[0].0 <= 0.0 {
            return Err(MathError::UnorderedDragTable { index: 0 });
        }
        for i in 1..points.len() {
            if points[i].0 <= points[i - 1].0 {
                return Err(MathError::UnorderedDragTable { index: i });
            }
        }
        Ok(Self { points })
    }

    /// マッハ数に対応する零揚力抗力係数を引く
    ///
    /// 小数第1位へ丸めた値が参照点と一致する場合はその値をそのまま
    /// 返し、一致しない場合のみ実マッハ数で線形補間する。
    pub fn zero_lift_cd(&self, mach: f64) -> f64 {
        let rounded = (mach * 10.0).round() / 10.0;
        for &(bp_mach, bp_cd) in &self.points {
            if (rounded - bp_mach).abs() < 1e-9 {
                return bp_cd;
            }
        }

        let (mut prev_mach, mut prev_cd) = (0.0, 0.0);
        for &(bp_mach, bp_cd) in &self.points {
            if mach < bp_mach {
                return lerp(mach, prev_mach, prev_cd, bp_mach, bp_cd);
            }
            prev_mach = bp_mach;
            prev_cd = bp_cd;
        }
        // 最終参照点より上は一定
        prev_cd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_table() -> DragTable {
        DragTable::new(vec![
            (0.5, 0.012),
            (0.9, 0.015),
            (1.2, 0.046),
            (1.5, 0.044),
            (2.0, 0.038),
            (3.0, 0.030),
            (4.0, 0.026),
        ])
        .unwrap()
    }

    #[test]
    fn test_exact_breakpoint() {
        let table = reference_table();
        assert_eq!(table.zero_lift_cd(1.5), 0.044);
        assert_eq!(table.zero_lift_cd(4.0), 0.026);
    }

    #[test]
    fn test_rounded_match_hits_breakpoint() {
        // 小数第1位へ丸めて一致すれば補間せず参照値を返す
        let table = reference_table();
        assert_eq!(table.zero_lift_cd(1.52), 0.044);
        assert_eq!(table.zero_lift_cd(0.94), 0.015);
    }

    #[test]
    fn test_interpolation_between_breakpoints() {
        let table = reference_table();
        let cd = table.zero_lift_cd(1.05);
        assert!((cd - 0.0305).abs() < 1e-12);
    }

    #[test]
    fn test_below_first_breakpoint_anchored_at_origin() {
        let table = reference_table();
        let cd = table.zero_lift_cd(0.25);
        assert!((cd - 0.006).abs() < 1e-12);
        assert_eq!(table.zero_lift_cd(0.0), 0.0);
    }

    #[test]
    fn test_above_last_breakpoint_is_flat() {
        let table = reference_table();
        assert_eq!(table.zero_lift_cd(4.5), 0.026);
        assert_eq!(table.zero_lift_cd(9.0), 0.026);
    }

    #[test]
    fn test_new_rejects_empty_table() {
        assert!(matches!(
            DragTable::new(vec![]),
            Err(MathError::EmptyDragTable)
        ));
    }

    #[test]
    fn test_new_rejects_unordered_machs() {
        let result = DragTable::new(vec![(0.5, 0.012), (1.2, 0.046), (0.9, 0.015)]);
        assert!(matches!(
            result,
            Err(MathError::UnorderedDragTable { index: 2 })
        ));
    }

    #[test]
    fn test_new_rejects_nonpositive_first_mach() {
        let result = DragTable::new(vec![(0.0, 0.01), (1.0, 0.02)]);
        assert!(matches!(
            result,
            Err(MathError::UnorderedDragTable { index: 0 })
        ));
    }
}
