use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::math::{DragTable, MathError, PidController, Vec2, angle_between, deg_to_rad, rad_to_deg};
use crate::models::common::Body;
use crate::models::traits::Mobile;
use crate::scenario::{EnvironmentConfig, MissileConfig};

/// 迎撃ミサイル
///
/// ロケットモーターの推力と空力抵抗で加減速しながら、シーカーが捉えた
/// 目標への視線角を比例航法とPID操舵で打ち消すように飛翔します。
/// 視線角がシーカーの離角限界を超えると目標を見失い、以降は無誘導で
/// 直進します。目標の喪失は `has_target` で観測できます。
#[derive(Debug, Clone)]
pub struct Missile {
    /// ミサイルの一意識別子
    id: String,
    /// 運動状態
    body: Body,

    /// 空虚質量 [kg]
    empty_mass_kg: f64,
    /// 翼平面面積 [m²]
    planform_area_m2: f64,
    /// 揚力傾斜 [1/rad]
    polar_slope_per_rad: f64,
    /// 構造荷重限界 [g]
    max_load_g: f64,

    /// 初期燃料質量 [kg]
    initial_fuel_kg: f64,
    /// 残燃料質量 [kg]
    remaining_fuel_kg: f64,
    /// 燃料消費率 [kg/s]
    fuel_consumption_rate_kgps: f64,
    /// モーター推力 [N]
    engine_thrust_n: f64,

    /// シーカー起動までの遅延 [s]
    arming_delay_s: f64,
    /// 視軸からの最大離角 [rad]
    max_off_boresight_rad: f64,
    /// 近接信管の作動半径 [m]
    proxy_fuze_radius_m: f64,
    /// 比例航法定数
    nav_constant: f64,

    /// 大気密度 [kg/m³]
    air_density_kgpm3: f64,
    /// 音速 [m/s]
    speed_of_sound_mps: f64,
    /// 重力加速度 [m/s²]
    freefall_acc_mps2: f64,

    /// 零揚力抗力係数テーブル
    drag_table: DragTable,
    /// 操舵PID制御器
    pid: PidController,
    /// 捕捉中の目標ID。見失うと None
    acquired_target: Option<String>,
}

impl Missile {
    /// 新しい迎撃ミサイルを生成する
    ///
    /// # 引数
    ///
    /// * `id` - ミサイルの一意識別子
    /// * `config` - ミサイル設定（speed_mps は +y 方向への発射になる）
    /// * `environment` - 大気・重力の環境設定
    /// * `dt_s` - 誘導周期 [s]（PID制御器の時間刻み）
    /// * `rng` - 機体専用の乱数源
    ///
    /// # 戻り値
    ///
    /// 生成されたミサイル。PID時間刻みや抗力係数テーブルが不正な場合はエラー
    pub fn new(
        id: String,
        config: &MissileConfig,
        environment: &EnvironmentConfig,
        dt_s: f64,
        rng: ChaCha8Rng,
    ) -> Result<Self, MathError> {
        let drag_table = DragTable::new(
            config
                .drag_table
                .iter()
                .map(|point| (point.mach, point.cd))
                .collect(),
        )?;
        // 出力境界は誘導ティックごとに荷重限界から設定し直される
        let pid = PidController::new(
            dt_s,
            0.0,
            0.0,
            config.guidance.kp,
            config.guidance.ki,
            config.guidance.kd,
        )?;

        let fuel_consumption_rate_kgps = config.motor.fuel_mass_kg / config.motor.burn_time_s;
        let engine_thrust_n = config.motor.specific_impulse_s
            * fuel_consumption_rate_kgps
            * environment.freefall_acc_mps2;

        let position = Vec2::new(config.position.x_m, config.position.y_m);
        let missile = Self {
            id,
            body: Body::new(config.speed_mps, position, rng),
            empty_mass_kg: config.airframe.empty_mass_kg,
            planform_area_m2: config.airframe.planform_area_m2,
            polar_slope_per_rad: config.airframe.polar_slope_per_rad,
            max_load_g: config.airframe.max_load_g,
            initial_fuel_kg: config.motor.fuel_mass_kg,
            remaining_fuel_kg: config.motor.fuel_mass_kg,
            fuel_consumption_rate_kgps,
            engine_thrust_n,
            arming_delay_s: config.seeker.arming_delay_s,
            max_off_boresight_rad: deg_to_rad(config.seeker.max_off_boresight_deg),
            proxy_fuze_radius_m: config.seeker.proxy_fuze_radius_m,
            nav_constant: config.seeker.nav_constant,
            air_density_kgpm3: environment.air_density_kgpm3,
            speed_of_sound_mps: environment.speed_of_sound_mps,
            freefall_acc_mps2: environment.freefall_acc_mps2,
            drag_table,
            pid,
            acquired_target: None,
        };

        info!(
            missile_id = %missile.id,
            initial_speed_mps = config.speed_mps,
            total_mass_kg = missile.total_mass_kg(),
            engine_thrust_n = missile.engine_thrust_n,
            fuel_consumption_rate_kgps = missile.fuel_consumption_rate_kgps,
            "MISSILE_LAUNCHED: ミサイルを発射しました"
        );

        Ok(missile)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// 残燃料質量 [kg]
    pub fn remaining_fuel_kg(&self) -> f64 {
        self.remaining_fuel_kg
    }

    /// 近接信管の作動半径 [m]
    pub fn proxy_fuze_radius_m(&self) -> f64 {
        self.proxy_fuze_radius_m
    }

    /// シーカーが起動済みかどうか
    pub fn is_armed(&self) -> bool {
        self.body.lifetime() >= self.arming_delay_s
    }

    /// 目標を捕捉しているかどうか
    pub fn has_target(&self) -> bool {
        self.acquired_target.is_some()
    }

    /// 捕捉中の目標ID
    pub fn target_id(&self) -> Option<&str> {
        self.acquired_target.as_deref()
    }

    /// 目標を捕捉する
    pub fn set_target(&mut self, target_id: &str) {
        self.acquired_target = Some(target_id.to_string());
        debug!(
            missile_id = %self.id,
            target_id = %target_id,
            "MISSILE_TARGET_ACQUIRED: 目標を捕捉しました"
        );
    }

    /// 全備質量 [kg]
    pub fn total_mass_kg(&self) -> f64 {
        self.empty_mass_kg + self.remaining_fuel_kg
    }

    /// 現在のマッハ数
    pub fn mach_number(&self) -> f64 {
        self.body.speed() / self.speed_of_sound_mps
    }

    /// 動圧 q = ρv²/2 [Pa]
    fn dynamic_pressure_pa(&self) -> f64 {
        0.5 * self.air_density_kgpm3 * self.body.speed().powi(2)
    }

    /// 推力による加速度 [m/s²]。燃料切れ後は常にゼロ
    fn propulsion_acceleration_mps2(&self) -> f64 {
        if self.remaining_fuel_kg > 0.0 {
            self.engine_thrust_n / self.total_mass_kg()
        } else {
            0.0
        }
    }

    /// 抗力による減速度 [m/s²]
    ///
    /// 零揚力抗力係数はマッハ数でテーブルを引き、誘導抗力係数は
    /// 迎角の絶対値に揚力傾斜を乗じて求める。
    fn drag_deceleration_mps2(&self, aoa_rad: f64) -> f64 {
        let zero_lift_cd = self.drag_table.zero_lift_cd(self.mach_number());
        let induced_cd = self.polar_slope_per_rad * aoa_rad.abs();
        self.dynamic_pressure_pa() * self.planform_area_m2 * (zero_lift_cd + induced_cd)
            / self.total_mass_kg()
    }

    /// 荷重限界から許容迎角を求めてPID境界を更新する
    ///
    /// 許容迎角 = (全備質量×荷重限界×g / (q×S)) / 揚力傾斜。境界は
    /// ±許容迎角の対称で、動圧とともに毎ティック変わる。
    fn update_guidance_boundary(&mut self) -> Result<(), MathError> {
        let pressure_area = self.dynamic_pressure_pa() * self.planform_area_m2;
        if pressure_area <= 0.0 {
            return Err(MathError::ZeroDynamicPressure);
        }
        let max_normal_force_n = self.total_mass_kg() * self.max_load_g * self.freefall_acc_mps2;
        let induced_cd_limit = max_normal_force_n / pressure_area;
        let max_aoa_rad = induced_cd_limit / self.polar_slope_per_rad;
        self.pid.set_boundaries(-max_aoa_rad, max_aoa_rad)
    }

    /// 1ティック分の剛体運動
    ///
    /// 速度方向の単位ベクトルに (推力加速度 - 抗力減速度)×dt を加えて
    /// 速度を更新し、更新後の速度で位置を進める。燃料は消費率×dt だけ
    /// 減り、ゼロを下回らない。
    ///
    /// # 引数
    ///
    /// * `dt` - 時間刻み [s]
    /// * `aoa_rad` - このティックの迎角 [rad]（誘導抗力の算出に使う）
    pub fn basic_move(&mut self, dt: f64, aoa_rad: f64) -> Result<(), MathError> {
        let direction = self.body.velocity().try_normalized()?;
        let net_acceleration =
            self.propulsion_acceleration_mps2() - self.drag_deceleration_mps2(aoa_rad);

        self.body
            .set_velocity(self.body.velocity() + direction * (dt * net_acceleration));
        self.body.displace(self.body.velocity() * dt);

        let fuel_before = self.remaining_fuel_kg;
        self.remaining_fuel_kg =
            (self.remaining_fuel_kg - self.fuel_consumption_rate_kgps * dt).max(0.0);
        if fuel_before > 0.0 && self.remaining_fuel_kg == 0.0 {
            info!(
                missile_id = %self.id,
                flight_time_s = self.body.lifetime(),
                speed_mps = self.body.speed(),
                "MISSILE_BURNOUT: モーターの燃焼が終了しました"
            );
        }

        self.body.advance_lifetime(dt);
        Ok(())
    }

    /// 誘導判断込みの1ティック
    ///
    /// シーカー起動後に目標位置が与えられていれば視線角を測り、離角限界の
    /// 範囲内なら比例航法の要求角をPIDへ通して操舵する。限界を超えた場合は
    /// 目標を見失い、そのティックの残りは無誘導で飛翔する。
    ///
    /// # 引数
    ///
    /// * `dt` - 時間刻み [s]
    /// * `target_position` - 捕捉中の目標の現在位置。喪失後は None
    pub fn advanced_move(
        &mut self,
        dt: f64,
        target_position: Option<Vec2>,
    ) -> Result<(), MathError> {
        let mut steering_rad = 0.0;

        if let Some(tgt_pos) = target_position {
            if self.acquired_target.is_some() && self.is_armed() {
                let line_of_sight = tgt_pos - self.body.position();
                // 完全に重なった瞬間は視線方向が定義できないため操舵しない
                if line_of_sight.magnitude() > 0.0 {
                    let boresight_angle_rad =
                        angle_between(self.body.velocity(), line_of_sight)?;

                    if boresight_angle_rad.abs() > self.max_off_boresight_rad {
                        self.acquired_target = None;
                        warn!(
                            missile_id = %self.id,
                            boresight_angle_deg = rad_to_deg(boresight_angle_rad),
                            limit_deg = rad_to_deg(self.max_off_boresight_rad),
                            flight_time_s = self.body.lifetime(),
                            "MISSILE_TARGET_LOST: 視線角が離角限界を超え目標を見失いました"
                        );
                    } else {
                        self.update_guidance_boundary()?;
                        let demanded_rad = self
                            .pid
                            .calculate(self.nav_constant * boresight_angle_rad, 0.0);
                        steering_rad = demanded_rad
                            .clamp(-self.max_off_boresight_rad, self.max_off_boresight_rad);
                        self.rotate_frame(steering_rad);
                    }
                }
            }
        }

        self.basic_move(dt, steering_rad)
    }

    /// 初期状態へ復元する
    ///
    /// 位置・速度・経過時間・燃料を初期値へ戻し、PIDの蓄積を消す。
    /// 目標の捕捉は所有者が改めて行う。
    pub fn restore(&mut self) {
        self.body.restore();
        self.remaining_fuel_kg = self.initial_fuel_kg;
        self.pid.reset();
        self.acquired_target = None;
        debug!(missile_id = %self.id, "MISSILE_RESTORED: ミサイルを初期状態へ復元しました");
    }

    fn rotate_frame(&mut self, angle_rad: f64) {
        self.body.rotate_velocity(angle_rad);
    }
}

impl Mobile for Missile {
    fn position(&self) -> Vec2 {
        self.body.position()
    }

    fn velocity(&self) -> Vec2 {
        self.body.velocity()
    }
}
