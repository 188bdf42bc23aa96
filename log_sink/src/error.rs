//! Error types / 错误类型

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
  /// Operation after destroy / 销毁后的操作
  #[error("sink destroyed")]
  Closed,

  /// Handle not open yet / 句柄尚未打开
  #[error("sink not ready")]
  NotReady,

  /// Single payload over buffer capacity / 单次负载超过缓冲容量
  #[error("payload {len} exceeds capacity {cap}")]
  TooLarge { len: usize, cap: usize },

  /// Reopen on a handle-only sink / 对无路径的句柄执行轮转
  #[error("no path to reopen")]
  NoPath,

  /// Neither fd nor dest / 既无 fd 也无 dest
  #[error("conf needs fd or dest")]
  NoTarget,

  /// EAGAIN from a flush write. Not retried, the bytes are dropped
  /// 刷盘写返回 EAGAIN。不重试，字节丢弃
  #[error("write would block")]
  WouldBlock,

  #[error("io: {0}")]
  Io(#[from] std::io::Error),
}
