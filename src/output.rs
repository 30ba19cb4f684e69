use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::Mobile;

/// テレメトリCSVの列見出し
const HEADER: &str =
    "Time;Target X;Target Y;Target Speed (m/s);Missile X;Missile Y;Missile Speed (m/s);";

/// 軌跡テレメトリのCSV出力
///
/// 書き込み失敗は呼び出し側が警告して記録を打ち切る回復可能な事象で、
/// シミュレーション本体を止めることはない。
#[derive(Debug)]
pub struct OutputWriter {
    writer: BufWriter<File>,
    decimal_comma: bool,
    path: PathBuf,
}

impl OutputWriter {
    /// 出力ファイルを作成して見出し行を書き込む
    ///
    /// # 引数
    ///
    /// * `path` - 出力先。既存ファイルは切り詰められる
    /// * `decimal_comma` - true なら小数点記号をカンマで出力する
    pub fn create<P: AsRef<Path>>(path: P, decimal_comma: bool) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", HEADER)?;
        Ok(Self {
            writer,
            decimal_comma,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 1ティック分のレコードを書き込む
    ///
    /// 列順は経過時間、目標機x・y・速さ、ミサイルx・y・速さ。各値は
    /// 固定小数5桁、セミコロン区切りで末尾にも区切りが付く。
    pub fn write_record(
        &mut self,
        elapsed_s: f64,
        target: &dyn Mobile,
        missile: &dyn Mobile,
    ) -> io::Result<()> {
        let fields = [
            elapsed_s,
            target.position().x,
            target.position().y,
            target.speed(),
            missile.position().x,
            missile.position().y,
            missile.speed(),
        ];
        let mut record = String::with_capacity(fields.len() * 16);
        for value in fields {
            record.push_str(&format_fixed(value, 5, self.decimal_comma));
            record.push(';');
        }
        writeln!(self.writer, "{}", record)
    }

    /// バッファを吐き出す
    pub fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// 数値を固定小数の文字列へ変換する
///
/// # 引数
///
/// * `value` - 変換する値
/// * `precision` - 小数部の桁数
/// * `decimal_comma` - true なら小数点記号をカンマにする
pub fn format_fixed(value: f64, precision: usize, decimal_comma: bool) -> String {
    let formatted = format!("{:.*}", precision, value);
    if decimal_comma {
        formatted.replace('.', ",")
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;
    use std::fs;

    struct Probe {
        position: Vec2,
        velocity: Vec2,
    }

    impl Mobile for Probe {
        fn position(&self) -> Vec2 {
            self.position
        }

        fn velocity(&self) -> Vec2 {
            self.velocity
        }
    }

    #[test]
    fn test_format_fixed_five_decimals() {
        assert_eq!(format_fixed(0.0, 5, false), "0.00000");
        assert_eq!(format_fixed(123.456789, 5, false), "123.45679");
        assert_eq!(format_fixed(-2.5, 5, false), "-2.50000");
    }

    #[test]
    fn test_format_fixed_decimal_comma() {
        assert_eq!(format_fixed(9_750.25, 5, true), "9750,25000");
    }

    #[test]
    fn test_header_and_record_layout() {
        let path = std::env::temp_dir().join("mgsim_output_layout_test.csv");
        let mut writer = OutputWriter::create(&path, false).unwrap();
        let target = Probe {
            position: Vec2::new(0.0, 10_000.0),
            velocity: Vec2::new(0.0, -250.0),
        };
        let missile = Probe {
            position: Vec2::new(0.0, 0.0),
            velocity: Vec2::new(0.0, 900.0),
        };
        writer.write_record(0.0, &target, &missile).unwrap();
        writer.finish().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Time;Target X;Target Y;Target Speed (m/s);Missile X;Missile Y;Missile Speed (m/s);"
        );
        assert_eq!(
            lines.next().unwrap(),
            "0.00000;0.00000;10000.00000;250.00000;0.00000;0.00000;900.00000;"
        );
        assert!(lines.next().is_none());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_create_fails_in_missing_directory() {
        let result = OutputWriter::create("/no_such_dir_mgsim/out.csv", false);
        assert!(result.is_err());
    }
}
