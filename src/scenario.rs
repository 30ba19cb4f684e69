use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    pub description: String,
}

impl Default for ScenarioMeta {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: "default_engagement".to_string(),
            description: "接近する目標機への正面迎撃".to_string(),
        }
    }
}

/// シミュレーション設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub dt_s: f64,
    pub t_max_s: f64,
    /// 機動抽選の乱数シード。未指定なら実行時にエントロピーから決める
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt_s: 0.01,
            t_max_s: 60.0,
            seed: None,
        }
    }
}

/// 大気・重力の環境設定
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub air_density_kgpm3: f64,
    pub speed_of_sound_mps: f64,
    pub freefall_acc_mps2: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            air_density_kgpm3: 1.225,
            speed_of_sound_mps: 343.0,
            freefall_acc_mps2: 9.80665,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct Position2D {
    pub x_m: f64,
    pub y_m: f64,
}

impl Default for Position2D {
    fn default() -> Self {
        Self { x_m: 0.0, y_m: 0.0 }
    }
}

/// 目標機の回避機動パラメータ
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct ManeuverConfig {
    /// 横加速度の抽選範囲 [g]
    pub accel_min_g: f64,
    pub accel_max_g: f64,
    /// 加速度を保持する時間の抽選範囲 [s]
    pub hold_min_s: f64,
    pub hold_max_s: f64,
}

impl Default for ManeuverConfig {
    fn default() -> Self {
        Self {
            accel_min_g: -9.0,
            accel_max_g: 9.0,
            hold_min_s: 0.5,
            hold_max_s: 30.0,
        }
    }
}

/// 目標機設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetConfig {
    pub position: Position2D,
    /// 初期速度の大きさ [m/s]。正の値は基準-y方向への飛行として展開される
    pub speed_mps: f64,
    /// 回避機動の有効・無効
    pub evasive_action: bool,
    pub maneuver: ManeuverConfig,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            position: Position2D {
                x_m: 0.0,
                y_m: 10_000.0,
            },
            speed_mps: 250.0,
            evasive_action: true,
            maneuver: ManeuverConfig::default(),
        }
    }
}

/// 機体諸元
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct AirframeConfig {
    pub empty_mass_kg: f64,
    /// 翼平面面積 [m²]（抗力・揚力の基準面積）
    pub planform_area_m2: f64,
    /// 揚力傾斜 [1/rad]
    pub polar_slope_per_rad: f64,
    /// 構造荷重限界 [g]
    pub max_load_g: f64,
}

impl Default for AirframeConfig {
    fn default() -> Self {
        Self {
            empty_mass_kg: 230.0,
            planform_area_m2: 0.9,
            polar_slope_per_rad: 1.5,
            max_load_g: 30.0,
        }
    }
}

/// ロケットモーター諸元
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct MotorConfig {
    pub fuel_mass_kg: f64,
    pub burn_time_s: f64,
    pub specific_impulse_s: f64,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            fuel_mass_kg: 60.0,
            burn_time_s: 6.0,
            specific_impulse_s: 235.0,
        }
    }
}

/// シーカー・誘導諸元
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct SeekerConfig {
    /// 発射からシーカー起動までの遅延 [s]
    pub arming_delay_s: f64,
    /// 視軸からの最大離角 [deg]。超えると目標を見失う
    pub max_off_boresight_deg: f64,
    /// 近接信管の作動半径 [m]
    pub proxy_fuze_radius_m: f64,
    /// 比例航法定数
    pub nav_constant: f64,
}

impl Default for SeekerConfig {
    fn default() -> Self {
        Self {
            arming_delay_s: 0.5,
            max_off_boresight_deg: 60.0,
            proxy_fuze_radius_m: 15.0,
            nav_constant: 3.0,
        }
    }
}

/// 操舵PIDゲイン
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct GuidanceGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Default for GuidanceGains {
    fn default() -> Self {
        Self {
            kp: 0.1,
            ki: 0.5,
            kd: 0.01,
        }
    }
}

/// 抗力係数テーブルの参照点
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct DragPoint {
    pub mach: f64,
    pub cd: f64,
}

/// 迎撃ミサイル設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MissileConfig {
    pub position: Position2D,
    /// 初期速度の大きさ [m/s]。基準+y方向への発射として展開される
    pub speed_mps: f64,
    pub airframe: AirframeConfig,
    pub motor: MotorConfig,
    pub seeker: SeekerConfig,
    pub guidance: GuidanceGains,
    pub drag_table: Vec<DragPoint>,
}

impl Default for MissileConfig {
    fn default() -> Self {
        Self {
            position: Position2D::default(),
            speed_mps: 900.0,
            airframe: AirframeConfig::default(),
            motor: MotorConfig::default(),
            seeker: SeekerConfig::default(),
            guidance: GuidanceGains::default(),
            drag_table: default_drag_table(),
        }
    }
}

/// 標準の零揚力抗力係数テーブル
pub fn default_drag_table() -> Vec<DragPoint> {
    vec![
        DragPoint {
            mach: 0.5,
            cd: 0.012,
        },
        DragPoint {
            mach: 0.9,
            cd: 0.015,
        },
        DragPoint {
            mach: 1.2,
            cd: 0.046,
        },
        DragPoint {
            mach: 1.5,
            cd: 0.044,
        },
        DragPoint {
            mach: 2.0,
            cd: 0.038,
        },
        DragPoint {
            mach: 3.0,
            cd: 0.030,
        },
        DragPoint {
            mach: 4.0,
            cd: 0.026,
        },
    ]
}

/// テレメトリ出力設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub enabled: bool,
    pub path: String,
    /// 小数点をカンマで出力するロケール互換モード
    pub decimal_comma: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "outputData.csv".to_string(),
            decimal_comma: false,
        }
    }
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    pub environment: EnvironmentConfig,
    pub target: TargetConfig,
    pub missile: MissileConfig,
    pub output: OutputConfig,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        // ファイル存在チェック
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        // ファイル読み込み
        let contents =
            fs::read_to_string(path).map_err(|e| ScenarioError::Io(path.to_path_buf(), e))?;

        // YAML解析
        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::Parse(path.to_path_buf(), e))?;

        // 基本的な検証
        config.validate()?;

        Ok(config)
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        // 時間設定の検証
        if !self.sim.dt_s.is_finite() || self.sim.dt_s <= 0.0 {
            return Err(ScenarioError::Validation(
                "dt_s must be positive".to_string(),
            ));
        }
        if self.sim.t_max_s <= 0.0 {
            return Err(ScenarioError::Validation(
                "t_max_s must be positive".to_string(),
            ));
        }

        // 環境の検証
        if self.environment.air_density_kgpm3 < 0.0 {
            return Err(ScenarioError::Validation(
                "air_density_kgpm3 must be non-negative".to_string(),
            ));
        }
        if self.environment.speed_of_sound_mps <= 0.0 {
            return Err(ScenarioError::Validation(
                "speed_of_sound_mps must be positive".to_string(),
            ));
        }
        if self.environment.freefall_acc_mps2 < 0.0 {
            return Err(ScenarioError::Validation(
                "freefall_acc_mps2 must be non-negative".to_string(),
            ));
        }

        // 目標機の検証
        if self.target.speed_mps < 0.0 {
            return Err(ScenarioError::Validation(
                "target speed_mps must be non-negative".to_string(),
            ));
        }
        let maneuver = &self.target.maneuver;
        if maneuver.accel_min_g > maneuver.accel_max_g {
            return Err(ScenarioError::Validation(
                "maneuver accel range is inverted".to_string(),
            ));
        }
        if maneuver.hold_min_s <= 0.0 || maneuver.hold_min_s > maneuver.hold_max_s {
            return Err(ScenarioError::Validation(
                "maneuver hold range is invalid".to_string(),
            ));
        }

        // ミサイルの検証
        if self.missile.speed_mps == 0.0 {
            return Err(ScenarioError::Validation(
                "missile speed_mps must be non-zero".to_string(),
            ));
        }
        let airframe = &self.missile.airframe;
        if airframe.empty_mass_kg <= 0.0 {
            return Err(ScenarioError::Validation(
                "empty_mass_kg must be positive".to_string(),
            ));
        }
        if airframe.planform_area_m2 <= 0.0 {
            return Err(ScenarioError::Validation(
                "planform_area_m2 must be positive".to_string(),
            ));
        }
        if airframe.polar_slope_per_rad <= 0.0 {
            return Err(ScenarioError::Validation(
                "polar_slope_per_rad must be positive".to_string(),
            ));
        }
        if airframe.max_load_g < 0.0 {
            return Err(ScenarioError::Validation(
                "max_load_g must be non-negative".to_string(),
            ));
        }
        let motor = &self.missile.motor;
        if motor.fuel_mass_kg < 0.0 {
            return Err(ScenarioError::Validation(
                "fuel_mass_kg must be non-negative".to_string(),
            ));
        }
        if motor.burn_time_s <= 0.0 {
            return Err(ScenarioError::Validation(
                "burn_time_s must be positive".to_string(),
            ));
        }
        if motor.specific_impulse_s < 0.0 {
            return Err(ScenarioError::Validation(
                "specific_impulse_s must be non-negative".to_string(),
            ));
        }
        let seeker = &self.missile.seeker;
        if seeker.arming_delay_s < 0.0 {
            return Err(ScenarioError::Validation(
                "arming_delay_s must be non-negative".to_string(),
            ));
        }
        if seeker.max_off_boresight_deg <= 0.0 || seeker.max_off_boresight_deg > 180.0 {
            return Err(ScenarioError::Validation(
                "max_off_boresight_deg must be within (0, 180]".to_string(),
            ));
        }
        if seeker.proxy_fuze_radius_m < 0.0 {
            return Err(ScenarioError::Validation(
                "proxy_fuze_radius_m must be non-negative".to_string(),
            ));
        }
        if seeker.nav_constant <= 0.0 {
            return Err(ScenarioError::Validation(
                "nav_constant must be positive".to_string(),
            ));
        }

        // 抗力係数テーブルの検証
        let table = &self.missile.drag_table;
        if table.is_empty() {
            return Err(ScenarioError::Validation(
                "drag_table must not be empty".to_string(),
            ));
        }
        if table[0].mach <= 0.0 {
            return Err(ScenarioError::Validation(
                "drag_table mach values must be positive".to_string(),
            ));
        }
        for i in 1..table.len() {
            if table[i].mach <= table[i - 1].mach {
                return Err(ScenarioError::Validation(format!(
                    "drag_table mach values must be strictly increasing (index {})",
                    i
                )));
            }
        }
        for point in table {
            if point.cd < 0.0 {
                return Err(ScenarioError::Validation(
                    "drag_table cd values must be non-negative".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("時間刻み: {:.3}秒", self.sim.dt_s);
        println!(
            "最大時間: {:.1}秒 ({:.1}分)",
            self.sim.t_max_s,
            self.sim.t_max_s / 60.0
        );
        match self.sim.seed {
            Some(seed) => println!("乱数シード: {}", seed),
            None => println!("乱数シード: 指定なし（実行時に生成）"),
        }
        println!();

        println!("=== 目標機 ===");
        println!(
            "初期位置: ({:.0}, {:.0}) m",
            self.target.position.x_m, self.target.position.y_m
        );
        println!("速度: {:.1} m/s", self.target.speed_mps);
        println!(
            "回避機動: {}",
            if self.target.evasive_action {
                "有効"
            } else {
                "無効"
            }
        );
        println!(
            "横加速度範囲: {:.1}〜{:.1} g / 保持時間: {:.1}〜{:.1}秒",
            self.target.maneuver.accel_min_g,
            self.target.maneuver.accel_max_g,
            self.target.maneuver.hold_min_s,
            self.target.maneuver.hold_max_s
        );
        println!();

        println!("=== 迎撃ミサイル ===");
        println!(
            "初期位置: ({:.0}, {:.0}) m",
            self.missile.position.x_m, self.missile.position.y_m
        );
        println!("初期速度: {:.1} m/s", self.missile.speed_mps);
        println!(
            "質量: 空虚 {:.1} kg + 燃料 {:.1} kg",
            self.missile.airframe.empty_mass_kg, self.missile.motor.fuel_mass_kg
        );
        println!(
            "燃焼時間: {:.1}秒 / 比推力: {:.0}秒",
            self.missile.motor.burn_time_s, self.missile.motor.specific_impulse_s
        );
        println!(
            "シーカー離角限界: {:.0}度 / 近接信管半径: {:.0} m",
            self.missile.seeker.max_off_boresight_deg, self.missile.seeker.proxy_fuze_radius_m
        );
        println!(
            "抗力係数テーブル: {}点 (M{:.1}〜M{:.1})",
            self.missile.drag_table.len(),
            self.missile.drag_table.first().map(|p| p.mach).unwrap_or(0.0),
            self.missile.drag_table.last().map(|p| p.mach).unwrap_or(0.0)
        );
        println!();

        println!("=== 出力設定 ===");
        if self.output.enabled {
            println!("テレメトリ出力: {}", self.output.path);
            println!(
                "小数点記号: {}",
                if self.output.decimal_comma {
                    "カンマ"
                } else {
                    "ピリオド"
                }
            );
        } else {
            println!("テレメトリ出力: 無効");
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(std::path::PathBuf),

    #[error("ファイル読み込みエラー {}: {1}", .0.display())]
    Io(std::path::PathBuf, #[source] std::io::Error),

    #[error("YAML解析エラー {}: {1}", .0.display())]
    Parse(std::path::PathBuf, #[source] serde_yaml::Error),

    #[error("設定検証エラー: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario_is_valid() {
        let config = ScenarioConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
target:
  speed_mps: 300.0
  evasive_action: false
"#;
        let config: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.target.speed_mps, 300.0);
        assert!(!config.target.evasive_action);
        assert_eq!(config.sim.dt_s, 0.01);
        assert_eq!(config.missile.speed_mps, 900.0);
        assert_eq!(config.missile.drag_table.len(), 7);
    }

    #[test]
    fn test_validate_rejects_zero_dt() {
        let mut config = ScenarioConfig::default();
        config.sim.dt_s = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ScenarioError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_missile_speed() {
        let mut config = ScenarioConfig::default();
        config.missile.speed_mps = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_maneuver_range() {
        let mut config = ScenarioConfig::default();
        config.target.maneuver.accel_min_g = 5.0;
        config.target.maneuver.accel_max_g = -5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unordered_drag_table() {
        let mut config = ScenarioConfig::default();
        config.missile.drag_table = vec![
            DragPoint {
                mach: 1.2,
                cd: 0.046,
            },
            DragPoint {
                mach: 0.9,
                cd: 0.015,
            },
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_missing_path() {
        let result = ScenarioConfig::from_file("no_such_scenario.yaml");
        assert!(matches!(result, Err(ScenarioError::FileNotFound(_))));
    }
}
