use thiserror::Error;

/// 数値計算層で発生するエラー
#[derive(Error, Debug)]
pub enum MathError {
    /// ゼロベクトルは正規化できない
    #[error("ゼロベクトルは正規化できません。")]
    NormalizeZeroVector,

    /// 長さゼロのベクトルが角度計算に渡された
    #[error("長さゼロのベクトルの方位角は定義できません。")]
    DegenerateAngle,

    /// PID制御器の時間刻みがゼロ
    #[error("PID制御器の時間刻みはゼロにできません。")]
    ZeroTimeStep,

    /// PID制御器の出力範囲が逆転している
    #[error("PID制御器の出力範囲が不正です (min={min}, max={max})。")]
    InvalidBoundaries { min: f64, max: f64 },

    /// 動圧ゼロでは誘導限界を計算できない
    #[error("動圧ゼロでは迎角限界を計算できません。")]
    ZeroDynamicPressure,

    /// 抗力係数テーブルが空
    #[error("抗力係数テーブルが空です。")]
    EmptyDragTable,

    /// 抗力係数テーブルのマッハ数が昇順でない
    #[error("抗力係数テーブルのマッハ数が昇順ではありません (index={index})。")]
    UnorderedDragTable { index: usize },
}
