//! 実行ループモジュール
//!
//! エンジンを終了条件まで回す同期ランナーと、観測値をチャネルで配信しながら
//! 別スレッドで回すストリーミングランナーを提供します。
//!
//! 判定順序はどちらも共通で、最大時間→1ティック前進→命中→追跡継続の順に
//! 評価します。命中と追跡不能が同じティックで成立した場合は命中を優先します。

use std::sync::mpsc;
use std::thread;

use tracing::{info, warn};

use crate::simulation::{SimError, SimSnapshot, Simulation};

/// シミュレーションの終了理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCondition {
    /// 近接信管の作動圏内に入った
    Hit,
    /// 燃焼終了後に目標機へ追いつけなくなった
    TargetOutran,
    /// 最大時間まで決着しなかった
    TimeLimit,
    /// 受信側が切断し実行を打ち切った
    Cancelled,
}

impl EndCondition {
    /// 迎撃成功か
    pub fn is_hit(&self) -> bool {
        matches!(self, EndCondition::Hit)
    }
}

/// 実行結果の要約
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub end_condition: EndCondition,
    /// 終了時点の経過時間 [s]
    pub elapsed_s: f64,
    /// 消費ティック数
    pub steps: u64,
    /// 終了時点の目標機との距離 [m]
    pub missile_target_distance_m: f64,
    /// 終了時点のミサイル残燃料 [kg]
    pub remaining_fuel_kg: f64,
}

fn summarize(sim: &Simulation, end_condition: EndCondition) -> RunSummary {
    RunSummary {
        end_condition,
        elapsed_s: sim.elapsed_s(),
        steps: sim.step_count(),
        missile_target_distance_m: sim.missile_target_distance_m(),
        remaining_fuel_kg: sim.missile().remaining_fuel_kg(),
    }
}

fn log_end_condition(summary: &RunSummary) {
    match summary.end_condition {
        EndCondition::Hit => info!(
            elapsed_s = summary.elapsed_s,
            distance_m = summary.missile_target_distance_m,
            "RUN_HIT: 目標に命中しました"
        ),
        EndCondition::TargetOutran => warn!(
            elapsed_s = summary.elapsed_s,
            distance_m = summary.missile_target_distance_m,
            "RUN_TARGET_OUTRAN: 目標機に追いつけず迎撃に失敗しました"
        ),
        EndCondition::TimeLimit => warn!(
            elapsed_s = summary.elapsed_s,
            "RUN_TIME_LIMIT: 最大時間まで決着しませんでした"
        ),
        EndCondition::Cancelled => info!(
            elapsed_s = summary.elapsed_s,
            "RUN_CANCELLED: 受信側の切断により実行を打ち切りました"
        ),
    }
}

/// 終了条件を満たすまで同期的に実行する
///
/// # 引数
///
/// * `sim` - 実行するエンジン。終了時点の状態のまま返される
/// * `t_max_s` - 打ち切り時間 [s]
pub fn run_to_completion(sim: &mut Simulation, t_max_s: f64) -> Result<RunSummary, SimError> {
    let end_condition = loop {
        if sim.elapsed_s() >= t_max_s {
            break EndCondition::TimeLimit;
        }
        sim.iterate()?;
        if sim.msl_within_tgt_hit_radius() {
            break EndCondition::Hit;
        }
        if !sim.msl_speed_more_than_tgt_speed() {
            break EndCondition::TargetOutran;
        }
    };

    let summary = summarize(sim, end_condition);
    log_end_condition(&summary);
    Ok(summary)
}

/// ストリーミング実行のハンドル
///
/// `receiver` からはティックごとの観測値が届き、実行終了とともに切断される。
/// `handle.join()` で要約を回収する。受信側を先に破棄した場合、送信失敗を
/// 検知した実行スレッドは速やかに打ち切られる。
pub struct StreamingRun {
    pub receiver: mpsc::Receiver<SimSnapshot>,
    pub handle: thread::JoinHandle<Result<RunSummary, SimError>>,
}

/// エンジンを専用スレッドへ移して実行し、観測値を配信する
///
/// 最初に初期状態の観測値を送ってから前進を始めるため、受信側は
/// 必ず時刻ゼロのスナップショットから受け取る。
pub fn run_streaming(mut sim: Simulation, t_max_s: f64) -> Result<StreamingRun, SimError> {
    let (sender, receiver) = mpsc::channel::<SimSnapshot>();

    let handle = thread::Builder::new()
        .name("mgsim-run-loop".to_string())
        .spawn(move || -> Result<RunSummary, SimError> {
            let end_condition = loop {
                if sim.elapsed_s() >= t_max_s {
                    break EndCondition::TimeLimit;
                }
                if sender.send(sim.snapshot()).is_err() {
                    break EndCondition::Cancelled;
                }
                sim.iterate()?;
                if sim.msl_within_tgt_hit_radius() {
                    break EndCondition::Hit;
                }
                if !sim.msl_speed_more_than_tgt_speed() {
                    break EndCondition::TargetOutran;
                }
            };

            // 終了時点の観測値も届ける。切断済みなら無視してよい
            if end_condition != EndCondition::Cancelled {
                let _ = sender.send(sim.snapshot());
            }

            let summary = summarize(&sim, end_condition);
            log_end_condition(&summary);
            Ok(summary)
        })?;

    Ok(StreamingRun { receiver, handle })
}
