//! Sink construction options / 构造配置

use std::{fs, path::PathBuf};

use crate::consts::BUF_SIZE;

/// Target and buffer capacity. Exactly one of `fd` / `dest` is used;
/// `fd` wins when both are set
/// 目标与缓冲容量。`fd` 与 `dest` 二选一；同时设置时 `fd` 优先
#[derive(Default)]
pub struct Conf {
  /// Already-open regular file / 已打开的普通文件
  pub fd: Option<fs::File>,
  /// Path to open for appending / 以追加方式打开的路径
  pub dest: Option<PathBuf>,
  /// Buffer capacity, 0 = default 64 KiB / 缓冲容量，0 表示默认
  pub cap: usize,
}

impl Conf {
  /// Target a path / 目标为路径
  pub fn path(dest: impl Into<PathBuf>) -> Self {
    Self {
      dest: Some(dest.into()),
      ..Default::default()
    }
  }

  /// Target an open handle. Rotation needs a path and stays unavailable
  /// 目标为已打开句柄。轮转需要路径，此方式不可轮转
  pub fn file(fd: fs::File) -> Self {
    Self {
      fd: Some(fd),
      ..Default::default()
    }
  }

  /// Set capacity / 设置容量
  pub fn with_cap(mut self, cap: usize) -> Self {
    self.cap = cap;
    self
  }

  #[inline]
  pub(crate) fn real_cap(&self) -> usize {
    if self.cap == 0 { BUF_SIZE } else { self.cap }
  }
}
