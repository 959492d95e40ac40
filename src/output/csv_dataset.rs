// 该文件是 Shuzi （数字） 项目的一部分。
// src/output/csv_dataset.rs - 追加式 CSV 像素数据集
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{
  fs::{File, OpenOptions},
  io::{ErrorKind, Write},
  path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::{
  frame::GrayFrame,
  output::{DatasetError, FeedbackLabel, Persist},
};

/// 数据集默认文件名，同时用作下载时的文件名
pub const DATASET_FILENAME: &str = "user_pixel_data.csv";

/// `label,pixel0,...,pixel{n-1}`
pub fn dataset_header(pixel_count: usize) -> Vec<String> {
  std::iter::once("label".to_string())
    .chain((0..pixel_count).map(|i| format!("pixel{}", i)))
    .collect()
}

/// 只追加的 CSV 数据集，每次反馈写入一行 `[label, pixel...]`。
///
/// 不加锁：每行（首次创建时连同表头）在内存中编码后以一次 `write_all`
/// 追加写入，并发写入之间的交错只依赖文件系统追加写的原子性。
#[derive(Debug, Clone)]
pub struct CsvDataset {
  path: PathBuf,
}

impl CsvDataset {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    CsvDataset { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn exists(&self) -> bool {
    self.path.is_file()
  }

  /// 追加一行；文件不存在时先写表头
  pub fn append(&self, label: FeedbackLabel, pixels: &[u8]) -> Result<(), DatasetError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    let (mut file, created) = self.open_append()?;

    let mut writer = csv::WriterBuilder::new()
      .has_headers(false)
      .terminator(csv::Terminator::Any(b'\n'))
      .from_writer(Vec::new());
    if created {
      writer.write_record(dataset_header(pixels.len()))?;
    }
    writer.write_record(
      std::iter::once(label.to_string()).chain(pixels.iter().map(|p| p.to_string())),
    )?;
    let bytes = writer
      .into_inner()
      .map_err(|e| DatasetError::IoError(e.into_error()))?;

    self.commit(&mut file, &bytes, created)?;

    if created {
      info!("创建数据集文件并写入表头: {}", self.path.display());
    }
    debug!(
      "追加标注 {} 的像素数据 ({} 字节) 到 {}",
      label,
      bytes.len(),
      self.path.display()
    );
    Ok(())
  }

  // 新建文件写入失败时删除它，避免留下没有表头的空文件
  fn commit<Out: Write>(
    &self,
    out: &mut Out,
    bytes: &[u8],
    created: bool,
  ) -> Result<(), DatasetError> {
    let Err(e) = out.write_all(bytes) else {
      return Ok(());
    };
    if created {
      warn!("写入新建的数据集失败，删除文件: {}", self.path.display());
      if let Err(remove_err) = std::fs::remove_file(&self.path) {
        warn!("删除数据集文件失败: {}", remove_err);
      }
    }
    Err(e.into())
  }

  // create_new 保证只有一个写入者会创建文件并写表头
  fn open_append(&self) -> Result<(File, bool), DatasetError> {
    match OpenOptions::new()
      .append(true)
      .create_new(true)
      .open(&self.path)
    {
      Ok(file) => Ok((file, true)),
      Err(e) if e.kind() == ErrorKind::AlreadyExists => {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        Ok((file, false))
      }
      Err(e) => Err(e.into()),
    }
  }
}

impl<const W: u32, const H: u32> Persist<GrayFrame<W, H>, FeedbackLabel> for CsvDataset {
  type Error = DatasetError;

  fn persist(&self, frame: &GrayFrame<W, H>, label: &FeedbackLabel) -> Result<(), Self::Error> {
    self.append(*label, frame.pixels())
  }
}

#[cfg(test)]
mod tests {
  use tempfile::tempdir;

  use super::*;
  use crate::frame::DigitFrame;

  fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
      .unwrap()
      .lines()
      .map(str::to_string)
      .collect()
  }

  #[test]
  fn test_header_layout() {
    let header = dataset_header(784);
    assert_eq!(header.len(), 785);
    assert_eq!(header[0], "label");
    assert_eq!(header[1], "pixel0");
    assert_eq!(header[784], "pixel783");
  }

  #[test]
  fn test_first_append_writes_header() {
    let dir = tempdir().unwrap();
    let dataset = CsvDataset::new(dir.path().join(DATASET_FILENAME));
    assert!(!dataset.exists());

    let mut frame = DigitFrame::default();
    frame.as_mut()[0] = 255;
    frame.as_mut()[783] = 17;
    dataset.persist(&frame, &FeedbackLabel::Digit(5)).unwrap();
    assert!(dataset.exists());

    let lines = read_lines(dataset.path());
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], dataset_header(784).join(","));

    let fields: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(fields.len(), 785);
    assert_eq!(fields[0], "5");
    assert_eq!(fields[1], "255");
    assert_eq!(fields[784], "17");
    assert!(fields[2..784].iter().all(|f| *f == "0"));
  }

  #[test]
  fn test_identical_appends_are_not_deduplicated() {
    let dir = tempdir().unwrap();
    let dataset = CsvDataset::new(dir.path().join(DATASET_FILENAME));
    let frame = DigitFrame::default();

    for _ in 0..3 {
      dataset.persist(&frame, &FeedbackLabel::Digit(1)).unwrap();
    }

    let lines = read_lines(dataset.path());
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1], lines[2]);
    assert_eq!(lines[2], lines[3]);
    assert_eq!(lines.iter().filter(|l| l.starts_with("label,")).count(), 1);
  }

  #[test]
  fn test_unknown_label_written_as_nan() {
    let dir = tempdir().unwrap();
    let dataset = CsvDataset::new(dir.path().join(DATASET_FILENAME));
    dataset
      .persist(&DigitFrame::default(), &FeedbackLabel::Unknown)
      .unwrap();

    let mut reader = csv::Reader::from_path(dataset.path()).unwrap();
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(&records[0][0], "NaN");
    assert_eq!(records[0].len(), 785);
  }

  struct FullDisk;

  impl Write for FullDisk {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
      Err(std::io::Error::other("no space left on device"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
      Ok(())
    }
  }

  #[test]
  fn test_failed_first_write_removes_file() {
    let dir = tempdir().unwrap();
    let dataset = CsvDataset::new(dir.path().join(DATASET_FILENAME));
    let (_file, created) = dataset.open_append().unwrap();
    assert!(created);

    let result = dataset.commit(&mut FullDisk, b"label,pixel0\n3,0\n", true);
    assert!(matches!(result, Err(DatasetError::IoError(_))));
    assert!(!dataset.exists());

    // 下一次追加重新创建文件并写表头
    dataset.append(FeedbackLabel::Digit(3), &[0]).unwrap();
    assert_eq!(read_lines(dataset.path()), vec!["label,pixel0", "3,0"]);
  }

  #[test]
  fn test_failed_later_write_keeps_file() {
    let dir = tempdir().unwrap();
    let dataset = CsvDataset::new(dir.path().join(DATASET_FILENAME));
    dataset.append(FeedbackLabel::Digit(1), &[7]).unwrap();

    let result = dataset.commit(&mut FullDisk, b"2,0\n", false);
    assert!(result.is_err());
    assert_eq!(read_lines(dataset.path()), vec!["label,pixel0", "1,7"]);
  }

  #[test]
  fn test_creates_parent_directory() {
    let dir = tempdir().unwrap();
    let dataset = CsvDataset::new(dir.path().join("nested/data").join(DATASET_FILENAME));
    dataset
      .append(FeedbackLabel::Digit(9), &[1, 2, 3])
      .unwrap();

    let lines = read_lines(dataset.path());
    assert_eq!(lines, vec!["label,pixel0,pixel1,pixel2", "9,1,2,3"]);
  }
}
