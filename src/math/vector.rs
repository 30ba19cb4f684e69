use std::ops::{Add, AddAssign, Mul, Sub};

use crate::math::error::MathError;

/// 2次元平面上のベクトル
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// ベクトルの長さ
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }

    /// 単位ベクトルを返す。長さゼロのベクトルはエラー
    pub fn try_normalized(&self) -> Result<Vec2, MathError> {
        let mag = self.magnitude();
        if mag > 0.0 {
            Ok(Vec2::new(self.x / mag, self.y / mag))
        } else {
            Err(MathError::NormalizeZeroVector)
        }
    }

    /// 原点まわりに反時計回りへ回転したベクトルを返す
    pub fn rotated(&self, angle_rad: f64) -> Vec2 {
        let (sin, cos) = angle_rad.sin_cos();
        Vec2::new(
            self.x * cos - self.y * sin,
            self.x * sin + self.y * cos,
        )
    }

    /// 左回りに90度回転した垂直ベクトル
    pub fn perp(&self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Vec2::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Vec2::new(self.x * scalar, self.y * scalar)
    }
}

/// ベクトル from から to への符号付き角度をラジアンで返す
///
/// # 引数
/// * `from` - 基準ベクトル
/// * `to` - 対象ベクトル
///
/// # 戻り値
/// (-π, π] に正規化された角度。反時計回りが正。
/// いずれかが長さゼロの場合は `MathError::DegenerateAngle`
pub fn angle_between(from: Vec2, to: Vec2) -> Result<f64, MathError> {
    if from.magnitude() == 0.0 || to.magnitude() == 0.0 {
        return Err(MathError::DegenerateAngle);
    }
    let mut angle = to.y.atan2(to.x) - from.y.atan2(from.x);
    // atan2 の差は (-2π, 2π) に収まるため補正は一度で済む
    if angle > std::f64::consts::PI {
        angle -= 2.0 * std::f64::consts::PI;
    } else if angle <= -std::f64::consts::PI {
        angle += 2.0 * std::f64::consts::PI;
    }
    Ok(angle)
}
