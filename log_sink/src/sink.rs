//! Buffered append-only sink / 缓冲追加写入器

use std::{
  cell::UnsafeCell,
  os::fd::{FromRawFd, IntoRawFd},
  path::PathBuf,
  rc::Rc,
};

use compio_fs::File;

use crate::{
  Conf, Error, Result,
  close::close_file,
  evt::Evt,
  flush::{actual_write, schedule_drain},
  inner::{Inner, WaitIdle},
  open::{finish_reopen, open_task},
};

/// Buffered append-only log sink. Create inside a compio runtime
/// 缓冲追加日志写入器。须在 compio 运行时内创建
///
/// Clones share the same buffer and handle / 克隆共享同一缓冲与句柄
#[derive(Clone)]
pub struct Sink {
  pub(crate) inner: Rc<UnsafeCell<Inner>>,
  pub(crate) evt: Rc<Evt>,
}

impl Sink {
  /// Create from conf. With `fd` the sink is usable at once and `ready`
  /// fires on the next tick; with `dest` the open completes in the
  /// background and earlier writes stay buffered
  /// 根据配置创建。`fd` 方式立即可用，`ready` 在下个 tick 触发；
  /// `dest` 方式后台打开，此前的写入先缓冲
  pub fn new(conf: Conf) -> Result<Self> {
    let cap = conf.real_cap();
    let Conf { fd, dest, .. } = conf;

    if let Some(fd) = fd {
      let offset = fd.metadata()?.len();
      let mut inner = Inner::new(cap, None);
      inner.file = Some(unsafe { File::from_raw_fd(fd.into_raw_fd()) });
      inner.offset = offset;
      inner.ready = true;
      let sink = Self::wrap(inner);
      let evt = Rc::clone(&sink.evt);
      compio::runtime::spawn(async move {
        evt.ready.emit(&());
      })
      .detach();
      return Ok(sink);
    }

    if let Some(dest) = dest {
      let sink = Self::wrap(Inner::new(cap, Some(dest)));
      compio::runtime::spawn(open_task(sink.clone())).detach();
      return Ok(sink);
    }

    Err(Error::NoTarget)
  }

  fn wrap(inner: Inner) -> Self {
    Self {
      inner: Rc::new(UnsafeCell::new(inner)),
      evt: Rc::new(Evt::default()),
    }
  }

  #[inline(always)]
  #[allow(clippy::mut_from_ref)]
  pub(crate) fn i(&self) -> &mut Inner {
    // Safe: single-threaded runtime / 安全：单线程运行时
    unsafe { &mut *self.inner.get() }
  }

  /// Append `data`. Filling the buffer flushes before returning; anything
  /// less waits for the coalesced drain task on the next tick
  /// 追加数据。写满容量则返回前刷盘；否则等下个 tick 的合并 drain 任务
  pub async fn write(&self, data: &[u8]) -> Result<()> {
    let avail = {
      let i = self.i();
      if i.destroyed {
        return Err(Error::Closed);
      }
      if data.len() > i.cap {
        return Err(Error::TooLarge {
          len: data.len(),
          cap: i.cap,
        });
      }
      let avail = i.avail();
      if data.len() > avail && i.file.is_none() {
        // The overflow cannot flush without a handle
        // 无句柄，溢出无法刷出
        return Err(Error::NotReady);
      }
      let head = avail.min(data.len());
      i.buf.extend_from_slice(&data[..head]);
      avail
    };

    if data.len() < avail {
      schedule_drain(self);
      return Ok(());
    }

    // Capacity reached, flush before returning / 已到容量，返回前刷盘
    actual_write(self).await;

    let rest = &data[avail..];
    if !rest.is_empty() {
      let i = self.i();
      if i.destroyed {
        return Err(Error::Closed);
      }
      if i.buf.len() + rest.len() > i.cap {
        // The flush could not run without a handle / 无句柄，刷盘未执行
        return Err(Error::NotReady);
      }
      i.buf.extend_from_slice(rest);
    }
    schedule_drain(self);
    Ok(())
  }

  /// Force buffered bytes out. Write failures surface on the error hooks,
  /// not here
  /// 强制刷出缓冲。写失败走 error 回调而非返回值
  pub async fn flush(&self) -> Result<()> {
    if self.i().destroyed {
      return Err(Error::Closed);
    }
    self.wait_idle().await;
    actual_write(self).await;
    Ok(())
  }

  /// As [`flush`](Self::flush), but fails when the handle never opened,
  /// distinguishing "closed" from "not yet open"
  /// 同 [`flush`](Self::flush)，但句柄尚未打开时报错，
  /// 以区分“已销毁”与“未就绪”
  pub async fn flush_now(&self) -> Result<()> {
    {
      let i = self.i();
      if i.destroyed {
        return Err(Error::Closed);
      }
      if !i.ready {
        return Err(Error::NotReady);
      }
    }
    self.wait_idle().await;
    actual_write(self).await;
    Ok(())
  }

  /// Flush then fsync / 刷盘并同步到磁盘
  pub async fn sync(&self) -> Result<()> {
    self.flush().await?;
    let file = self.i().file.take();
    if let Some(file) = file {
      let res = file.sync_all().await;
      if !self.i().destroyed {
        self.i().file = Some(file);
      }
      res?;
    }
    Ok(())
  }

  /// Rotate: close the current handle and reopen `path`, or the same path
  /// for a plain rotation. Waits out an in-flight flush instead of
  /// opening over it
  /// 轮转：关闭当前句柄并重新打开 `path`（None 表示原路径）。
  /// 与进行中的刷盘串行，不会叠加打开
  pub async fn reopen(&self, path: Option<PathBuf>) -> Result<()> {
    {
      let i = self.i();
      if i.destroyed {
        return Err(Error::Closed);
      }
      if i.ending {
        return Ok(());
      }
      if i.path.is_none() {
        return Err(Error::NoPath);
      }
      if let Some(p) = path {
        i.reopen_to = Some(p);
      }
      i.reopening = true;
      if i.writing {
        // Finished by the in-flight flush on completion
        // 由进行中的刷盘在完成时接续
        return Ok(());
      }
    }
    finish_reopen(self).await;
    Ok(())
  }

  /// Graceful shutdown: flush the remainder, close, then `finish` and
  /// `close` fire
  /// 优雅关闭：刷出剩余数据后关闭，随后触发 `finish` 与 `close`
  pub async fn end(&self) -> Result<()> {
    {
      let i = self.i();
      if i.destroyed {
        return Err(Error::Closed);
      }
      if i.ending {
        return Ok(());
      }
      i.ending = true;
    }
    self.wait_idle().await;

    let do_flush = {
      let i = self.i();
      !i.buf.is_empty() && i.file.is_some()
    };
    if do_flush {
      actual_write(self).await;
    }

    let file = {
      let i = self.i();
      if i.destroyed {
        // Destroyed while flushing, the close already ran
        // 刷盘期间被销毁，关闭已执行
        return Ok(());
      }
      if !i.ready {
        i.close_on_ready = true;
        return Ok(());
      }
      i.mark_destroyed();
      i.file.take()
    };
    close_file(self, file).await;
    Ok(())
  }

  /// Unconditional close: idempotent, never fails, buffered bytes are
  /// discarded. Before the first open completes the close waits for
  /// `ready`; during a flush it waits for the write to return
  /// 无条件关闭：幂等不报错，缓冲字节丢弃。首次打开未完成时等 `ready`；
  /// 刷盘期间等写返回
  pub fn destroy(&self) {
    let deferred = {
      let i = self.i();
      if i.destroyed {
        return;
      }
      if !i.ready {
        i.close_on_ready = true;
        return;
      }
      if i.writing {
        i.mark_destroyed();
        return;
      }
      i.mark_destroyed();
      i.file.take()
    };

    let sink = self.clone();
    compio::runtime::spawn(async move {
      close_file(&sink, deferred).await;
    })
    .detach();
  }

  #[inline]
  async fn wait_idle(&self) {
    WaitIdle {
      inner: Rc::clone(&self.inner),
    }
    .await
  }

  /// Unflushed byte count / 未刷盘字节数
  #[inline]
  pub fn pos(&self) -> usize {
    self.i().buf.len()
  }

  /// Buffer capacity / 缓冲容量
  #[inline]
  pub fn cap(&self) -> usize {
    self.i().cap
  }

  /// Handle finished its first open / 句柄已完成首次打开
  #[inline]
  pub fn is_ready(&self) -> bool {
    self.i().ready
  }

  #[inline]
  pub fn is_destroyed(&self) -> bool {
    self.i().destroyed
  }

  /// Current target path, None on a handle-only sink
  /// 当前目标路径，句柄方式为 None
  #[inline]
  pub fn path(&self) -> Option<PathBuf> {
    self.i().path.clone()
  }

  pub fn on_ready(&self, f: impl Fn() + 'static) {
    self.evt.ready.on(move |_| f());
  }

  pub fn on_drain(&self, f: impl Fn() + 'static) {
    self.evt.drain.on(move |_| f());
  }

  pub fn on_error(&self, f: impl Fn(&Error) + 'static) {
    self.evt.error.on(f);
  }

  pub fn on_finish(&self, f: impl Fn() + 'static) {
    self.evt.finish.on(move |_| f());
  }

  pub fn on_close(&self, f: impl Fn() + 'static) {
    self.evt.close.on(move |_| f());
  }
}
