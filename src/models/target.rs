use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::math::{Vec2, angle_between};
use crate::models::common::Body;
use crate::models::traits::Mobile;
use crate::scenario::{ManeuverConfig, TargetConfig};

/// 回避機動を行う目標機
///
/// 設定された速さで基準-y方向へ進入し、横加速度を一定時間保持しては
/// 抽選し直す蛇行飛行を行います。機動中も速さの大きさは変わりません。
/// 回避機動を無効にすると横加速度はゼロに固定されます。
#[derive(Debug, Clone)]
pub struct Target {
    /// 目標機の一意識別子
    id: String,
    /// 運動状態
    body: Body,
    /// 横加速度ベクトル [g]。使用時に重力加速度を乗じる
    acceleration: Vec2,
    /// 回避機動の有効・無効
    evasive_action: bool,
    /// 現在の加速度を保持した経過時間 [s]
    time_since_accel_change: f64,
    /// 現在の加速度を保持する時間 [s]
    time_to_proceed: f64,
    /// 機動抽選のパラメータ範囲
    maneuver: ManeuverConfig,
    /// 重力加速度 [m/s²]
    freefall_acc: f64,
}

impl Target {
    /// 新しい目標機を生成する
    ///
    /// # 引数
    ///
    /// * `id` - 目標機の一意識別子
    /// * `config` - 目標機設定（正の speed_mps は -y 方向への飛行になる）
    /// * `freefall_acc` - 重力加速度 [m/s²]
    /// * `rng` - 機動抽選用の乱数源
    pub fn new(id: String, config: &TargetConfig, freefall_acc: f64, rng: ChaCha8Rng) -> Self {
        let position = Vec2::new(config.position.x_m, config.position.y_m);
        let mut target = Self {
            id,
            body: Body::new(-config.speed_mps, position, rng),
            acceleration: Vec2::zero(),
            evasive_action: config.evasive_action,
            time_since_accel_change: 0.0,
            time_to_proceed: 0.0,
            maneuver: config.maneuver,
            freefall_acc,
        };
        target.roll_maneuver();
        target
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn evasive_action(&self) -> bool {
        self.evasive_action
    }

    /// 現在の横加速度の大きさ [g]
    pub fn acceleration_rate(&self) -> f64 {
        self.acceleration.magnitude()
    }

    /// 横加速度を設定する
    ///
    /// 加速度は現在の進行方向に対して垂直に取り直される。符号で
    /// 旋回方向が決まり、停止中は基準+x軸へ加える。
    ///
    /// # 引数
    ///
    /// * `rate_g` - 横加速度 [g]
    pub fn set_acceleration_rate(&mut self, rate_g: f64) {
        let lateral = match self.body.velocity().try_normalized() {
            Ok(direction) => direction.perp(),
            Err(_) => Vec2::new(1.0, 0.0),
        };
        self.acceleration = lateral * rate_g;
    }

    /// 回避機動の有効・無効を切り替える
    ///
    /// 切り替え時点で横加速度を捨て、保持タイマーを抽選し直します。
    pub fn set_evasive_action(&mut self, enabled: bool) {
        self.evasive_action = enabled;
        self.acceleration = Vec2::zero();
        self.roll_maneuver();
        debug!(
            target_id = %self.id,
            enabled = enabled,
            "TARGET_EVASIVE_ACTION: 回避機動設定を変更しました"
        );
    }

    /// 1ティック分の剛体運動
    ///
    /// 変位 = 速度×dt + 横加速度×(dt²/2)×g。進行方向が実際の変位方向と
    /// 一致するよう速度と加速度のベクトルを回転させてから位置を進める。
    /// 速度または変位が長さゼロの場合は回転を行わない。
    pub fn basic_move(&mut self, dt: f64) {
        let mut displacement = self.body.velocity() * dt;
        if self.acceleration.magnitude() > 0.0 {
            displacement += self.acceleration * (0.5 * dt * dt * self.freefall_acc);
        }

        if displacement.magnitude() > 0.0 && self.body.speed() > 0.0 {
            if let Ok(rotation) = angle_between(self.body.velocity(), displacement) {
                self.rotate_frame(rotation);
            }
        }

        self.body.displace(displacement);
        self.body.advance_lifetime(dt);
    }

    /// 機動判断込みの1ティック
    ///
    /// 剛体運動の後に保持タイマーを進め、満了したら横加速度と保持時間を
    /// 抽選し直す。
    pub fn advanced_move(&mut self, dt: f64) {
        self.basic_move(dt);

        self.time_since_accel_change += dt;
        if self.time_since_accel_change >= self.time_to_proceed {
            self.roll_maneuver();
        }
    }

    /// 初期状態へ復元する
    ///
    /// 位置・速度・経過時間を初期値へ戻し、機動状態を抽選し直します。
    /// 乱数系列は巻き戻しません。
    pub fn restore(&mut self) {
        self.body.restore();
        self.acceleration = Vec2::zero();
        self.roll_maneuver();
        debug!(target_id = %self.id, "TARGET_RESTORED: 目標機を初期状態へ復元しました");
    }

    /// 保持時間と横加速度を抽選し直す
    ///
    /// 回避機動が無効の間は加速度をゼロに固定し、抽選をスキップする。
    fn roll_maneuver(&mut self) {
        self.time_since_accel_change = 0.0;
        self.time_to_proceed = self
            .body
            .random_in_range(self.maneuver.hold_min_s, self.maneuver.hold_max_s);
        if self.evasive_action {
            let rate_g = self
                .body
                .random_in_range(self.maneuver.accel_min_g, self.maneuver.accel_max_g);
            self.set_acceleration_rate(rate_g);
            debug!(
                target_id = %self.id,
                accel_g = rate_g,
                hold_s = self.time_to_proceed,
                "TARGET_MANEUVER: 横加速度を抽選しました"
            );
        } else {
            self.set_acceleration_rate(0.0);
        }
    }

    /// 速度と横加速度をまとめて回転し、機体座標系を一貫させる
    fn rotate_frame(&mut self, angle_rad: f64) {
        self.body.rotate_velocity(angle_rad);
        self.acceleration = self.acceleration.rotated(angle_rad);
    }
}

impl Mobile for Target {
    fn position(&self) -> Vec2 {
        self.body.position()
    }

    fn velocity(&self) -> Vec2 {
        self.body.velocity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn make_target(speed: f64, evasive: bool, seed: u64) -> Target {
        let config = TargetConfig {
            speed_mps: speed,
            evasive_action: evasive,
            ..TargetConfig::default()
        };
        Target::new(
            "T001".to_string(),
            &config,
            9.80665,
            ChaCha8Rng::seed_from_u64(seed),
        )
    }

    #[test]
    fn test_positive_speed_flies_toward_minus_y() {
        let target = make_target(250.0, false, 1);
        assert_eq!(target.velocity(), Vec2::new(0.0, -250.0));
        assert_eq!(target.position(), Vec2::new(0.0, 10_000.0));
    }

    #[test]
    fn test_straight_flight_when_evasive_disabled() {
        let mut target = make_target(250.0, false, 1);
        for _ in 0..100 {
            target.advanced_move(0.01);
        }
        assert_eq!(target.acceleration_rate(), 0.0);
        assert!((target.position().x - 0.0).abs() < 1e-9);
        assert!((target.position().y - 9_750.0).abs() < 1e-9);
    }

    #[test]
    fn test_speed_magnitude_invariant_under_maneuver() {
        let mut target = make_target(250.0, true, 7);
        for _ in 0..500 {
            target.advanced_move(0.01);
            assert!((target.speed() - 250.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_acceleration_is_lateral_and_signed() {
        let mut target = make_target(250.0, false, 1);
        // 速度 (0, -250) の左垂直は (1, 0)
        target.set_acceleration_rate(5.0);
        assert!((target.acceleration.x - 5.0).abs() < 1e-12);
        assert!(target.acceleration.y.abs() < 1e-12);
        target.set_acceleration_rate(-5.0);
        assert!((target.acceleration.x + 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_reroll_happens_after_hold_expires() {
        let mut target = make_target(250.0, false, 3);
        // 手動で与えた加速度は保持満了の抽選で再びゼロに固定される
        target.set_acceleration_rate(3.0);
        assert_eq!(target.acceleration_rate(), 3.0);
        for _ in 0..3001 {
            target.advanced_move(0.01);
        }
        assert_eq!(target.acceleration_rate(), 0.0);
    }

    #[test]
    fn test_maneuver_values_stay_in_configured_range() {
        let mut target = make_target(250.0, true, 11);
        for _ in 0..2000 {
            target.advanced_move(0.01);
            assert!(target.acceleration_rate() <= 9.0 + 1e-9);
        }
    }

    #[test]
    fn test_stationary_target_is_legal() {
        let mut target = make_target(0.0, false, 1);
        let before = target.position();
        target.advanced_move(0.01);
        assert_eq!(target.position(), before);
        assert_eq!(target.speed(), 0.0);
    }

    #[test]
    fn test_restore_resets_position_and_velocity() {
        let mut target = make_target(250.0, true, 5);
        for _ in 0..300 {
            target.advanced_move(0.01);
        }
        target.restore();
        assert_eq!(target.position(), Vec2::new(0.0, 10_000.0));
        assert_eq!(target.velocity(), Vec2::new(0.0, -250.0));
    }
}
