use crate::math::error::MathError;

/// 汎用PID制御器
///
/// 出力は可変の上下限へ飽和する。誘導側が毎ティック `set_boundaries` で
/// 荷重限界から求めた範囲を設定してから `calculate` を呼ぶ。
#[derive(Debug, Clone)]
pub struct PidController {
    dt: f64,              // s
    min_boundary: f64,
    max_boundary: f64,
    kp: f64,
    ki: f64,
    kd: f64,
    integral: f64,
    previous_deviation: f64,
}

impl PidController {
    /// PID制御器を生成する
    ///
    /// # 引数
    /// * `dt` - 制御周期 [s]（ゼロは不可）
    /// * `min_boundary` / `max_boundary` - 出力の下限・上限
    /// * `kp` / `ki` / `kd` - 各ゲイン
    pub fn new(
        dt: f64,
        min_boundary: f64,
        max_boundary: f64,
        kp: f64,
        ki: f64,
        kd: f64,
    ) -> Result<Self, MathError> {
        if dt == 0.0 {
            return Err(MathError::ZeroTimeStep);
        }
        if min_boundary > max_boundary {
            return Err(MathError::InvalidBoundaries {
                min: min_boundary,
                max: max_boundary,
            });
        }
        Ok(Self {
            dt,
            min_boundary,
            max_boundary,
            kp,
            ki,
            kd,
            integral: 0.0,
            previous_deviation: 0.0,
        })
    }

    /// 出力の上下限を更新する
    pub fn set_boundaries(&mut self, min: f64, max: f64) -> Result<(), MathError> {
        if min > max {
            return Err(MathError::InvalidBoundaries { min, max });
        }
        self.min_boundary = min;
        self.max_boundary = max;
        Ok(())
    }

    pub fn boundaries(&self) -> (f64, f64) {
        (self.min_boundary, self.max_boundary)
    }

    /// 1ステップ分の制御量を計算する
    ///
    /// 偏差の符号が反転したティックでは蓄積した積分を破棄し、反転後の
    /// 偏差から積み直す（+1, +1, -1 と入力すると積分は -dt になる）。
    pub fn calculate(&mut self, target: f64, current: f64) -> f64 {
        let deviation = target - current;
        let proportional = self.kp * deviation;
        if deviation * self.previous_deviation > 0.0 {
            self.integral += deviation * self.dt;
        } else {
            self.integral = deviation * self.dt;
        }
        let integral = self.ki * self.integral;
        let derivative = self.kd * (deviation - self.previous_deviation) / self.dt;
        self.previous_deviation = deviation;
        (proportional + integral + derivative).clamp(self.min_boundary, self.max_boundary)
    }

    /// 積分と前回偏差を初期状態へ戻す
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_deviation = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-10;

    #[test]
    fn test_new_rejects_zero_dt() {
        let result = PidController::new(0.0, -1.0, 1.0, 0.1, 0.5, 0.01);
        assert!(matches!(result, Err(MathError::ZeroTimeStep)));
    }

    #[test]
    fn test_new_rejects_inverted_boundaries() {
        let result = PidController::new(0.01, 1.0, -1.0, 0.1, 0.5, 0.01);
        assert!(matches!(result, Err(MathError::InvalidBoundaries { .. })));
    }

    #[test]
    fn test_proportional_term() {
        let mut pid = PidController::new(0.01, -100.0, 100.0, 2.0, 0.0, 0.0).unwrap();
        let out = pid.calculate(3.0, 1.0);
        assert!((out - 4.0).abs() < EPS);
    }

    #[test]
    fn test_derivative_term() {
        let mut pid = PidController::new(0.01, -100.0, 100.0, 0.0, 0.0, 1.0).unwrap();
        let out = pid.calculate(0.5, 0.0);
        assert!((out - 50.0).abs() < EPS);
    }

    #[test]
    fn test_output_saturates_inclusive() {
        let mut pid = PidController::new(0.01, -5.0, 5.0, 1000.0, 0.0, 0.0).unwrap();
        assert_eq!(pid.calculate(1.0, 0.0), 5.0);
        assert_eq!(pid.calculate(-1.0, 0.0), -5.0);
    }

    #[test]
    fn test_zero_width_boundaries_pin_output() {
        // 初期境界 (0, 0) では出力は常にゼロ
        let mut pid = PidController::new(0.01, 0.0, 0.0, 0.1, 0.5, 0.01).unwrap();
        assert_eq!(pid.calculate(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_integral_reseeds_on_sign_flip() {
        let dt = 0.01;
        let mut pid = PidController::new(dt, -100.0, 100.0, 0.0, 1.0, 0.0).unwrap();
        assert!((pid.calculate(1.0, 0.0) - dt).abs() < EPS);
        assert!((pid.calculate(1.0, 0.0) - 2.0 * dt).abs() < EPS);
        // 符号反転で積分は反転ティックの偏差から積み直される
        assert!((pid.calculate(-1.0, 0.0) - (-dt)).abs() < EPS);
    }

    #[test]
    fn test_set_boundaries_rejects_inverted() {
        let mut pid = PidController::new(0.01, 0.0, 0.0, 0.1, 0.5, 0.01).unwrap();
        assert!(pid.set_boundaries(2.0, -2.0).is_err());
        assert!(pid.set_boundaries(-2.0, 2.0).is_ok());
        assert_eq!(pid.boundaries(), (-2.0, 2.0));
    }

    #[test]
    fn test_reset_clears_accumulators() {
        let dt = 0.01;
        let mut pid = PidController::new(dt, -100.0, 100.0, 0.0, 1.0, 0.0).unwrap();
        pid.calculate(1.0, 0.0);
        pid.calculate(1.0, 0.0);
        pid.reset();
        // リセット後は初回呼び出しと同じ振る舞いに戻る
        assert!((pid.calculate(1.0, 0.0) - dt).abs() < EPS);
    }
}
