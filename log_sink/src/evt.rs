//! Sink notifications / 通知事件

use evt_hook::Emitter;

use crate::Error;

/// The five sink events / 五种事件
#[derive(Default)]
pub(crate) struct Evt {
  /// Handle opened, buffered bytes flushed / 句柄已打开，积压已刷出
  pub ready: Emitter<()>,
  /// Scheduled flush ran, producers may resume / 延迟刷盘已跑，生产者可继续
  pub drain: Emitter<()>,
  /// Flush, open or close failure / 刷盘、打开或关闭失败
  pub error: Emitter<Error>,
  /// Graceful end completed / 优雅关闭完成
  pub finish: Emitter<()>,
  /// Handle closed / 句柄已关闭
  pub close: Emitter<()>,
}
