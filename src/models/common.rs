use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::math::Vec2;

/// 剛体運動の共通状態
///
/// 位置・速度・経過時間と復元用の初期値を保持する。機動抽選に使う
/// 乱数源は所有者が種値から生成して注入する。
#[derive(Debug, Clone)]
pub struct Body {
    position: Vec2,          // m
    velocity: Vec2,          // m/s
    lifetime: f64,           // s
    initial_position: Vec2,  // m
    initial_speed: f64,      // m/s
    rng: ChaCha8Rng,
}

impl Body {
    /// 剛体を生成する
    ///
    /// # 引数
    /// * `initial_speed` - 初期速さ [m/s]。符号込みで基準+y軸方向の速度ベクトルに展開される
    /// * `initial_position` - 初期位置 [m]
    /// * `rng` - 機体専用の乱数源
    pub fn new(initial_speed: f64, initial_position: Vec2, rng: ChaCha8Rng) -> Self {
        Self {
            position: initial_position,
            velocity: Vec2::new(0.0, initial_speed),
            lifetime: 0.0,
            initial_position,
            initial_speed,
            rng,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// 速度ベクトルの大きさ
    pub fn speed(&self) -> f64 {
        self.velocity.magnitude()
    }

    /// 生成または復元からの経過時間 [s]
    pub fn lifetime(&self) -> f64 {
        self.lifetime
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// 速度ベクトルを反時計回りに回転する
    pub fn rotate_velocity(&mut self, angle_rad: f64) {
        self.velocity = self.velocity.rotated(angle_rad);
    }

    /// 位置を変位ベクトル分進める
    pub fn displace(&mut self, delta: Vec2) {
        self.position = self.position + delta;
    }

    pub fn advance_lifetime(&mut self, dt: f64) {
        self.lifetime += dt;
    }

    /// [min, max] の一様乱数を引く
    pub fn random_in_range(&mut self, min: f64, max: f64) -> f64 {
        self.rng.gen_range(min..=max)
    }

    /// 位置・速度・経過時間を生成時の値へ戻す。乱数状態は保持される
    pub fn restore(&mut self) {
        self.position = self.initial_position;
        self.velocity = Vec2::new(0.0, self.initial_speed);
        self.lifetime = 0.0;
    }
}
