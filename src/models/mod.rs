// 基本的なデータ型
pub mod common;

// 機体の共通インターフェース（trait）定義
pub mod traits;

// 各機体モデルの実装
pub mod missile;
pub mod target;

// 便利な re-export
pub use common::Body;
pub use missile::Missile;
pub use target::Target;
pub use traits::{Mobile, separation};
