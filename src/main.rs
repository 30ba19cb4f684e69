use clap::{Arg, Command};
use tracing::{Level, info};

use mgsim::logging::{LogConfig, LogOutput, ensure_log_directory, init_logging};
use mgsim::math::{DragTable, PidController, Vec2};
use mgsim::models::Mobile;
use mgsim::runner::{EndCondition, run_streaming};
use mgsim::scenario::{ScenarioConfig, default_drag_table};
use mgsim::simulation::Simulation;

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("mgsim")
        .version("0.1.0")
        .about("ミサイル追尾シミュレーション (Missile Guidance Simulation)")
        .long_about(
            "回避機動する目標機と迎撃ミサイルの追尾シミュレーション\n\
             固定時間刻みの2次元シミュレーションで誘導性能の評価を行います。",
        )
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .long_help(
                    "実行するシナリオファイル(.yaml)のパスを指定します。\n\
                     指定しない場合、組み込みの標準シナリオで実行されます。",
                ),
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
                .conflicts_with("test"),
        )
        .arg(
            Arg::new("test")
                .short('t')
                .long("test")
                .action(clap::ArgAction::SetTrue)
                .help("飛翔体モデルの動作確認を実行")
                .conflicts_with("info"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 進行表示, -vv: デバッグ, -vvv: トレース)"),
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("DEST")
                .default_value("console")
                .help("ログ出力先 (console, file, both)"),
        )
        .get_matches();

    // 詳細レベルからログレベルへの対応付け
    let verbose_level = matches.get_count("verbose");
    let level = match verbose_level {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let log_output = match matches
        .get_one::<String>("log-output")
        .map(String::as_str)
        .unwrap_or("console")
        .parse::<LogOutput>()
    {
        Ok(output) => output,
        Err(e) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    };

    let log_config = LogConfig {
        level,
        output: log_output,
        ..LogConfig::default()
    };

    if log_output != LogOutput::Console {
        if let Err(e) = ensure_log_directory(&log_config.log_dir) {
            eprintln!("エラー: ログディレクトリを作成できません: {}", e);
            std::process::exit(1);
        }
    }

    if let Err(e) = init_logging(log_config) {
        eprintln!("エラー: ログ初期化に失敗しました: {}", e);
        std::process::exit(1);
    }

    println!("ミサイル追尾シミュレーション (Missile Guidance Simulation) - mgsim v0.1.0");
    println!();

    if verbose_level > 0 {
        println!("詳細出力レベル: {}", verbose_level);
    }

    // テストモードの実行
    if matches.get_flag("test") {
        println!("=== 飛翔体モデルテストモード ===");
        if let Err(e) = test_flight_models() {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // シナリオの決定
    let scenario = match matches.get_one::<String>("scenario") {
        Some(path) => match ScenarioConfig::from_file(path) {
            Ok(scenario) => {
                if verbose_level > 0 {
                    println!("シナリオファイル読み込み完了: {}", path);
                }
                scenario
            }
            Err(e) => {
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            println!("シナリオ未指定のため組み込みの標準シナリオを実行します。");
            println!();
            ScenarioConfig::default()
        }
    };

    // 情報表示のみの場合
    if matches.get_flag("info") {
        scenario.print_summary();
        return;
    }

    match execute_scenario(&scenario, verbose_level) {
        Ok(_) => {
            if verbose_level > 0 {
                println!("シナリオ実行が正常に完了しました。");
            }
        }
        Err(e) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    }
}

/// シナリオの実行
fn execute_scenario(
    scenario: &ScenarioConfig,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    scenario.print_summary();
    println!();

    // シードはここで一度だけ確定し、以後の経路はすべて決定的になる
    let seed = scenario.sim.seed.unwrap_or_else(rand::random);
    info!(seed = seed, "SEED_RESOLVED: 乱数シードを確定しました");

    let t_max_s = scenario.sim.t_max_s;
    let sim = Simulation::new(scenario, seed)?;
    let run = run_streaming(sim, t_max_s)?;

    println!("=== シミュレーション実行開始 ===");

    for snapshot in &run.receiver {
        if verbose_level > 0 && snapshot.step % 100 == 0 {
            let progress = (snapshot.elapsed_s / t_max_s) * 100.0;
            println!(
                "進行状況: {:.1}% ({:.2}/{:.1}秒) 距離: {:.0} m / ミサイル速度: {:.0} m/s",
                progress,
                snapshot.elapsed_s,
                t_max_s,
                snapshot.separation_m,
                snapshot.missile_speed_mps
            );
        }
    }

    let summary = run
        .handle
        .join()
        .map_err(|_| "シミュレーションスレッドが異常終了しました")??;

    println!("=== シミュレーション完了 ===");
    let outcome = match summary.end_condition {
        EndCondition::Hit => "命中",
        EndCondition::TargetOutran => "迎撃失敗（目標機に追いつけません）",
        EndCondition::TimeLimit => "時間切れ",
        EndCondition::Cancelled => "実行中断",
    };
    println!("結果: {}", outcome);
    println!(
        "経過時間: {:.2}秒 ({}ティック)",
        summary.elapsed_s, summary.steps
    );
    println!("最終距離: {:.1} m", summary.missile_target_distance_m);
    println!("残燃料: {:.1} kg", summary.remaining_fuel_kg);

    Ok(())
}

/// 飛翔体モデルの動作確認
///
/// 各部品を組み立てて短時間だけ飛ばし、基本動作を画面で確認する。
fn test_flight_models() -> Result<(), Box<dyn std::error::Error>> {
    // ベクトル演算
    let line_of_sight = Vec2::new(3.0, 4.0);
    println!("ベクトル演算: |(3, 4)| = {}", line_of_sight.magnitude());

    // PID制御器
    let mut pid = PidController::new(0.01, -1.0, 1.0, 0.1, 0.5, 0.01)?;
    let steering = pid.calculate(0.5, 0.0);
    println!("PID制御器が作成されました: 操舵要求 {:.4} rad", steering);

    // 抗力係数テーブル
    let table = DragTable::new(
        default_drag_table()
            .iter()
            .map(|point| (point.mach, point.cd))
            .collect(),
    )?;
    println!(
        "抗力係数テーブルが作成されました: Cd(M1.05) = {:.4}",
        table.zero_lift_cd(1.05)
    );

    // 目標機とミサイルを標準シナリオで1秒間飛ばす
    let config = ScenarioConfig::default();
    let mut sim = Simulation::new(&config, 42)?;
    for _ in 0..100 {
        sim.iterate()?;
    }
    println!(
        "目標機が作成されました: {} (位置: ({:.0}, {:.0}) m)",
        sim.target().id(),
        sim.target().position().x,
        sim.target().position().y
    );
    println!(
        "ミサイルが作成されました: {} (速度: {:.0} m/s / 残燃料: {:.1} kg)",
        sim.missile().id(),
        sim.missile().speed(),
        sim.missile().remaining_fuel_kg()
    );
    println!(
        "1秒分の飛翔を確認しました (距離: {:.0} m)",
        sim.missile_target_distance_m()
    );

    println!();
    println!("全ての飛翔体モデルが正常に動作しました！");
    Ok(())
}
