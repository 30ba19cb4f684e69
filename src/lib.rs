//! ミサイル追尾シミュレーション (mgsim)
//!
//! 2次元平面上で回避機動する目標機と迎撃ミサイルの追尾を、固定時間刻みで
//! 再現するシミュレーションライブラリです。比例航法にPID操舵を組み合わせた
//! 誘導、比推力ベースのロケットモーター、マッハ数参照の抗力モデルを備えます。
//!
//! 実行の入り口は [`simulation::Simulation`] と [`runner`] モジュールです。

pub mod logging;
pub mod math;
pub mod models;
pub mod output;
pub mod runner;
pub mod scenario;
pub mod simulation;
