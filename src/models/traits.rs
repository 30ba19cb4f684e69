use crate::math::Vec2;

/// 運動状態を読み出す共通インターフェース
///
/// シミュレーションエンジンとテレメトリ出力はこの窓口だけを通して
/// 機体の状態を参照する。
pub trait Mobile {
    /// 現在位置の取得
    fn position(&self) -> Vec2;

    /// 現在速度の取得
    fn velocity(&self) -> Vec2;

    /// 速度の大きさ
    fn speed(&self) -> f64 {
        self.velocity().magnitude()
    }
}

/// 2機体間の距離
pub fn separation(a: &dyn Mobile, b: &dyn Mobile) -> f64 {
    (a.position() - b.position()).magnitude()
}
