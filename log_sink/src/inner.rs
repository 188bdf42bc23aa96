//! Sink internal state / 内部状态

use std::{
  cell::UnsafeCell,
  future::Future,
  path::PathBuf,
  pin::Pin,
  rc::Rc,
  task::{Context, Poll, Waker},
};

use compio_fs::File;

/// Mutable sink state. Borrows stay short and never cross an await or a
/// hook call
/// 可变状态。借用保持短暂，不跨越 await 或回调
pub(crate) struct Inner {
  pub cap: usize,
  /// Unflushed bytes, len is the cursor / 未刷盘字节，len 即游标
  pub buf: Vec<u8>,
  /// None until opened, also while a flush holds the handle
  /// 打开前为 None，刷盘取走句柄期间亦然
  pub file: Option<File>,
  pub path: Option<PathBuf>,
  /// Pending rotation target, None = current path
  /// 待轮转目标，None 表示沿用当前路径
  pub reopen_to: Option<PathBuf>,
  /// File write offset / 文件写偏移
  pub offset: u64,
  pub ready: bool,
  pub writing: bool,
  pub reopening: bool,
  pub drain_scheduled: bool,
  pub ending: bool,
  pub destroyed: bool,
  /// Close emission already ran / 关闭事件已发出
  pub closed: bool,
  /// Close deferred until the first open completes
  /// 延迟到首次打开完成后再关闭
  pub close_on_ready: bool,
  pub wakers: Vec<Waker>,
}

impl Inner {
  pub fn new(cap: usize, path: Option<PathBuf>) -> Self {
    Self {
      cap,
      buf: Vec::with_capacity(cap),
      file: None,
      path,
      reopen_to: None,
      offset: 0,
      ready: false,
      writing: false,
      reopening: false,
      drain_scheduled: false,
      ending: false,
      destroyed: false,
      closed: false,
      close_on_ready: false,
      wakers: Vec::new(),
    }
  }

  /// Free space before capacity / 容量内剩余空间
  #[inline]
  pub fn avail(&self) -> usize {
    self.cap - self.buf.len()
  }

  /// Terminal: buffer and handle are never mutated again
  /// 终态：缓冲与句柄不再变更
  pub fn mark_destroyed(&mut self) {
    self.destroyed = true;
    self.buf = Vec::new();
  }

  pub fn wake_all(&mut self) {
    for w in self.wakers.drain(..) {
      w.wake();
    }
  }
}

impl Drop for Inner {
  #[cold]
  fn drop(&mut self) {
    if !self.buf.is_empty() {
      log::warn!("sink dropped with {} unflushed bytes", self.buf.len());
    }
  }
}

/// Wait until no flush is in flight / 等待没有进行中的刷盘
pub(crate) struct WaitIdle {
  pub inner: Rc<UnsafeCell<Inner>>,
}

impl Future for WaitIdle {
  type Output = ();

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
    // Safe: single-threaded runtime / 安全：单线程运行时
    let i = unsafe { &mut *self.inner.get() };
    if !i.writing {
      return Poll::Ready(());
    }
    i.wakers.push(cx.waker().clone());
    Poll::Pending
  }
}
