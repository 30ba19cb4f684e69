//! シミュレーションエンジンモジュール
//!
//! 目標機とミサイルを固定時間刻みで前進させる中核エンジンを提供します。
//!
//! # 主要機能
//!
//! - シナリオ設定からの機体生成と初期化
//! - 1ティック分の状態更新(`iterate`)
//! - 命中判定・追跡継続判定
//! - 軌跡テレメトリのCSV記録
//! - 初期状態への復元(`restore`)
//!
//! # 処理順序
//!
//! 各ティックは記録→目標機更新→ミサイル更新→時刻前進の順で処理されます。
//! 記録を先頭に置くことで、初期状態が必ず1レコード目として残ります。
//! 終了判定は呼び出し側が各ティック後に行います。
//!
//! # 使用例
//!
//! ```no_run
//! use mgsim::scenario::ScenarioConfig;
//! use mgsim::simulation::Simulation;
//!
//! let config = ScenarioConfig::default();
//! let mut sim = Simulation::new(&config, 42).unwrap();
//! while !sim.msl_within_tgt_hit_radius() {
//!     sim.iterate().unwrap();
//! }
//! ```

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::math::MathError;
use crate::models::{Missile, Mobile, Target, separation};
use crate::output::OutputWriter;
use crate::scenario::{ScenarioConfig, ScenarioError};

/// シミュレーション実行時のエラー
#[derive(Error, Debug)]
pub enum SimError {
    /// 数値計算の前提条件違反
    #[error(transparent)]
    Math(#[from] MathError),
    /// シナリオ設定の不備
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// 実行スレッドの起動失敗
    #[error("実行スレッドを起動できません: {0}")]
    Spawn(#[from] std::io::Error),
}

/// 1ティック分の観測値
///
/// エンジン内部状態のコピーで、スレッド間の受け渡しにそのまま使える。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimSnapshot {
    /// シミュレーション開始からの経過時間 [s]
    pub elapsed_s: f64,
    /// 経過ティック数
    pub step: u64,
    /// 目標機位置x [m]
    pub target_x_m: f64,
    /// 目標機位置y [m]
    pub target_y_m: f64,
    /// 目標機速さ [m/s]
    pub target_speed_mps: f64,
    /// ミサイル位置x [m]
    pub missile_x_m: f64,
    /// ミサイル位置y [m]
    pub missile_y_m: f64,
    /// ミサイル速さ [m/s]
    pub missile_speed_mps: f64,
    /// ミサイル残燃料 [kg]
    pub remaining_fuel_kg: f64,
    /// 目標機とミサイルの距離 [m]
    pub separation_m: f64,
    /// ミサイルが目標を捕捉中か
    pub target_locked: bool,
    /// 近接信管の作動圏内か
    pub within_hit_radius: bool,
    /// 追跡を継続できる状態か
    pub intercept_viable: bool,
}

/// 追尾シミュレーションエンジン
///
/// 1機の目標機と1発のミサイルを保持し、固定時間刻みで両者を前進させる。
/// 乱数は機体ごとに独立ストリームを割り当て、同一シードなら同一軌跡を
/// 再生する。
pub struct Simulation {
    /// 時間刻み [s]
    dt_s: f64,
    /// 経過時間 [s]
    elapsed_s: f64,
    /// 経過ティック数
    step_count: u64,
    /// 目標機
    target: Target,
    /// ミサイル
    missile: Missile,
    /// テレメトリ出力(無効時・書き込み失敗後は None)
    output: Option<OutputWriter>,
    /// テレメトリ出力先パス
    output_path: String,
    /// 小数点記号をカンマにするか
    decimal_comma: bool,
}

impl Simulation {
    /// シナリオ設定からエンジンを構築する
    ///
    /// # 引数
    ///
    /// * `config` - 検証済みとは限らないシナリオ設定。ここで再検証する
    /// * `seed` - 乱数シード。機体ごとに独立ストリームへ分配される
    ///
    /// # 戻り値
    ///
    /// 構築済みエンジン。設定不備や抗力表の不正は Err
    pub fn new(config: &ScenarioConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;

        let mut target_rng = ChaCha8Rng::seed_from_u64(seed);
        target_rng.set_stream(0);
        let mut missile_rng = ChaCha8Rng::seed_from_u64(seed);
        missile_rng.set_stream(1);

        let target = Target::new(
            "T001".to_string(),
            &config.target,
            config.environment.freefall_acc_mps2,
            target_rng,
        );
        let mut missile = Missile::new(
            "M001".to_string(),
            &config.missile,
            &config.environment,
            config.sim.dt_s,
            missile_rng,
        )?;
        missile.set_target(target.id());

        let output = if config.output.enabled {
            match OutputWriter::create(&config.output.path, config.output.decimal_comma) {
                Ok(writer) => Some(writer),
                Err(e) => {
                    warn!(
                        path = %config.output.path,
                        error = %e,
                        "OUTPUT_DISABLED: テレメトリ出力を開けないため記録なしで実行します"
                    );
                    None
                }
            }
        } else {
            None
        };

        info!(
            seed = seed,
            dt_s = config.sim.dt_s,
            target_x_m = target.position().x,
            target_y_m = target.position().y,
            target_speed_mps = target.speed(),
            missile_speed_mps = missile.speed(),
            evasive_action = target.evasive_action(),
            "SIM_INITIALIZED: シミュレーションを初期化しました"
        );

        Ok(Self {
            dt_s: config.sim.dt_s,
            elapsed_s: 0.0,
            step_count: 0,
            target,
            missile,
            output,
            output_path: config.output.path.clone(),
            decimal_comma: config.output.decimal_comma,
        })
    }

    /// 1ティック分シミュレーションを前進させる
    ///
    /// 現在状態の記録、目標機の機動、ミサイルの誘導と運動、時刻前進を
    /// この順で行う。テレメトリ書き込みの失敗は警告して記録を打ち切り、
    /// シミュレーション自体は継続する。
    pub fn iterate(&mut self) -> Result<(), SimError> {
        if let Some(writer) = self.output.as_mut() {
            if let Err(e) = writer.write_record(self.elapsed_s, &self.target, &self.missile) {
                warn!(
                    error = %e,
                    "OUTPUT_DISABLED: テレメトリ書き込みに失敗したため記録を打ち切ります"
                );
                self.output = None;
            }
        }

        self.target.advanced_move(self.dt_s);

        let target_position = if self.missile.target_id() == Some(self.target.id()) {
            Some(self.target.position())
        } else {
            None
        };
        self.missile.advanced_move(self.dt_s, target_position)?;

        self.elapsed_s += self.dt_s;
        self.step_count += 1;

        if self.step_count % 100 == 0 {
            debug!(
                step = self.step_count,
                elapsed_s = self.elapsed_s,
                separation_m = self.missile_target_distance_m(),
                missile_speed_mps = self.missile.speed(),
                remaining_fuel_kg = self.missile.remaining_fuel_kg(),
                "SIM_PROGRESS: シミュレーション進行中"
            );
        }

        Ok(())
    }

    /// ミサイルが近接信管の作動圏内に入ったか
    ///
    /// 距離が作動半径と一致する場合も命中として扱う。
    pub fn msl_within_tgt_hit_radius(&self) -> bool {
        separation(&self.target, &self.missile) <= self.missile.proxy_fuze_radius_m()
    }

    /// ミサイルが追跡を継続できる状態か
    ///
    /// 燃焼中は加速余地があるため速度によらず継続可能と判定する。
    /// 燃焼終了後は目標機より速い間だけ継続可能。
    pub fn msl_speed_more_than_tgt_speed(&self) -> bool {
        if self.missile.remaining_fuel_kg() > 0.0 {
            return true;
        }
        self.missile.speed() > self.target.speed()
    }

    /// 両機体を初期状態へ戻し、経過時間とティック数をゼロにする
    ///
    /// 乱数ストリームは巻き戻さないため、回避機動中の目標機は復元後に
    /// 別の機動列を引く。テレメトリ出力の有効・無効は変化しない。
    pub fn restore(&mut self) {
        self.target.restore();
        self.missile.restore();
        let target_id = self.target.id().to_string();
        self.missile.set_target(&target_id);
        self.elapsed_s = 0.0;
        self.step_count = 0;
        info!("SIM_RESTORED: シミュレーションを初期状態へ復元しました");
    }

    /// テレメトリ記録の有効・無効を切り替える
    ///
    /// 有効化は出力ファイルを作り直すため、それまでの記録は失われる。
    /// 作成に失敗した場合は警告して記録なしのまま続行する。
    pub fn set_recording(&mut self, enabled: bool) {
        if enabled {
            if self.output.is_some() {
                return;
            }
            match OutputWriter::create(&self.output_path, self.decimal_comma) {
                Ok(writer) => {
                    info!(path = %self.output_path, "OUTPUT_ENABLED: テレメトリ記録を開始します");
                    self.output = Some(writer);
                }
                Err(e) => {
                    warn!(
                        path = %self.output_path,
                        error = %e,
                        "OUTPUT_DISABLED: テレメトリ出力を開けません"
                    );
                }
            }
        } else if let Some(mut writer) = self.output.take() {
            if let Err(e) = writer.finish() {
                warn!(error = %e, "OUTPUT_FLUSH_FAILED: テレメトリの書き出しに失敗しました");
            }
            info!("OUTPUT_CLOSED: テレメトリ記録を停止しました");
        }
    }

    /// 目標機の回避機動を有効・無効にする
    pub fn set_evasive_action(&mut self, enabled: bool) {
        self.target.set_evasive_action(enabled);
    }

    /// 現在状態の観測値を取り出す
    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            elapsed_s: self.elapsed_s,
            step: self.step_count,
            target_x_m: self.target.position().x,
            target_y_m: self.target.position().y,
            target_speed_mps: self.target.speed(),
            missile_x_m: self.missile.position().x,
            missile_y_m: self.missile.position().y,
            missile_speed_mps: self.missile.speed(),
            remaining_fuel_kg: self.missile.remaining_fuel_kg(),
            separation_m: self.missile_target_distance_m(),
            target_locked: self.missile.has_target(),
            within_hit_radius: self.msl_within_tgt_hit_radius(),
            intercept_viable: self.msl_speed_more_than_tgt_speed(),
        }
    }

    /// 経過時間 [s]
    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }

    /// 経過ティック数
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// 時間刻み [s]
    pub fn dt_s(&self) -> f64 {
        self.dt_s
    }

    /// 目標機とミサイルの距離 [m]
    pub fn missile_target_distance_m(&self) -> f64 {
        separation(&self.target, &self.missile)
    }

    /// テレメトリ記録が有効か
    pub fn is_recording(&self) -> bool {
        self.output.is_some()
    }

    /// 目標機への参照
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// ミサイルへの参照
    pub fn missile(&self) -> &Missile {
        &self.missile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Position2D;
    use std::fs;

    fn quiet_config() -> ScenarioConfig {
        let mut config = ScenarioConfig::default();
        config.target.evasive_action = false;
        config.output.enabled = false;
        config
    }

    #[test]
    fn test_hit_radius_boundary_is_inclusive() {
        let mut config = quiet_config();
        config.target.position = Position2D { x_m: 0.0, y_m: 15.0 };
        config.target.speed_mps = 0.0;
        let sim = Simulation::new(&config, 1).unwrap();
        assert!(sim.msl_within_tgt_hit_radius());

        config.target.position.y_m = 15.0 + 1e-6;
        let sim = Simulation::new(&config, 1).unwrap();
        assert!(!sim.msl_within_tgt_hit_radius());
    }

    #[test]
    fn test_intercept_viable_while_fuel_remains() {
        let mut config = quiet_config();
        config.target.position = Position2D {
            x_m: 0.0,
            y_m: 100_000.0,
        };
        config.missile.speed_mps = 200.0;
        config.missile.motor.fuel_mass_kg = 0.5;
        config.missile.motor.burn_time_s = 0.1;
        let mut sim = Simulation::new(&config, 1).unwrap();

        for _ in 0..5 {
            sim.iterate().unwrap();
        }
        // 目標より遅いが燃焼中なので継続可能
        assert!(sim.missile().speed() < sim.target().speed());
        assert!(sim.msl_speed_more_than_tgt_speed());

        for _ in 0..15 {
            sim.iterate().unwrap();
        }
        assert_eq!(sim.missile().remaining_fuel_kg(), 0.0);
        assert!(!sim.msl_speed_more_than_tgt_speed());
    }

    #[test]
    fn test_restore_returns_to_initial_snapshot() {
        let config = quiet_config();
        let mut sim = Simulation::new(&config, 9).unwrap();
        let initial = sim.snapshot();

        for _ in 0..500 {
            sim.iterate().unwrap();
        }
        assert_ne!(sim.snapshot(), initial);

        sim.restore();
        assert_eq!(sim.snapshot(), initial);
        assert!(sim.missile().has_target());
    }

    #[test]
    fn test_restore_rerun_matches_fresh_run_without_evasion() {
        let config = quiet_config();
        let mut restored = Simulation::new(&config, 5).unwrap();
        for _ in 0..300 {
            restored.iterate().unwrap();
        }
        restored.restore();
        for _ in 0..100 {
            restored.iterate().unwrap();
        }

        let mut fresh = Simulation::new(&config, 5).unwrap();
        for _ in 0..100 {
            fresh.iterate().unwrap();
        }

        assert_eq!(restored.snapshot(), fresh.snapshot());
    }

    #[test]
    fn test_same_seed_runs_are_identical_with_evasion() {
        let mut config = quiet_config();
        config.target.evasive_action = true;
        let mut first = Simulation::new(&config, 1234).unwrap();
        let mut second = Simulation::new(&config, 1234).unwrap();

        for _ in 0..300 {
            first.iterate().unwrap();
            second.iterate().unwrap();
            assert_eq!(first.snapshot(), second.snapshot());
        }
    }

    #[test]
    fn test_head_on_engagement_reaches_hit() {
        let config = quiet_config();
        let mut sim = Simulation::new(&config, 42).unwrap();

        let mut hit = false;
        for _ in 0..2000 {
            sim.iterate().unwrap();
            if sim.msl_within_tgt_hit_radius() {
                hit = true;
                break;
            }
        }

        assert!(hit, "正面対進で2000ティック以内に命中しない");
        assert!(sim.elapsed_s() > 4.0 && sim.elapsed_s() < 15.0);
        assert!(sim.missile_target_distance_m() <= 15.0);
    }

    #[test]
    fn test_first_record_is_initial_state() {
        let path = std::env::temp_dir().join("mgsim_sim_record_order_test.csv");
        let mut config = quiet_config();
        config.output.enabled = true;
        config.output.path = path.to_string_lossy().into_owned();

        let mut sim = Simulation::new(&config, 3).unwrap();
        assert!(sim.is_recording());
        for _ in 0..3 {
            sim.iterate().unwrap();
        }
        sim.set_recording(false);

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("0.00000;"));
        assert!(lines[2].starts_with("0.01000;"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_unwritable_output_path_degrades_to_no_recording() {
        let mut config = quiet_config();
        config.output.enabled = true;
        config.output.path = "/no_such_dir_mgsim/telemetry.csv".to_string();

        let mut sim = Simulation::new(&config, 3).unwrap();
        assert!(!sim.is_recording());
        sim.iterate().unwrap();
        assert_eq!(sim.step_count(), 1);
    }
}
