pub mod drag;
pub mod error;
pub mod pid;
pub mod vector;

pub use drag::DragTable;
pub use error::MathError;
pub use pid::PidController;
pub use vector::{Vec2, angle_between};

/// 度をラジアンに変換
pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// ラジアンを度に変換
pub fn rad_to_deg(radians: f64) -> f64 {
    radians * 180.0 / std::f64::consts::PI
}

/// 2点 (x0, y0), (x1, y1) を通る直線上で x に対応する y を求める
pub fn lerp(x: f64, x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deg_rad_conversion() {
        assert!((deg_to_rad(180.0) - std::f64::consts::PI).abs() < 1e-12);
        assert!((rad_to_deg(std::f64::consts::FRAC_PI_2) - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_lerp_midpoint_and_endpoints() {
        assert_eq!(lerp(0.5, 0.0, 0.0, 1.0, 2.0), 1.0);
        assert_eq!(lerp(0.0, 0.0, 0.0, 1.0, 2.0), 0.0);
        assert_eq!(lerp(1.0, 0.0, 0.0, 1.0, 2.0), 2.0);
    }
}
