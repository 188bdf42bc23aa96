//! Flush engine and drain scheduling / 刷盘引擎与 drain 调度

use std::io;

use compio::io::AsyncWriteAtExt;

use crate::{Error, Sink, close::close_file, open::finish_reopen};

/// Coalesce appends in one tick into a single deferred flush, then notify
/// drain. At most one task is outstanding
/// 将同一 tick 的追加合并为一次延迟刷盘并通知 drain。至多一个任务在途
pub(crate) fn schedule_drain(sink: &Sink) {
  {
    let i = sink.i();
    if i.drain_scheduled {
      return;
    }
    i.drain_scheduled = true;
  }

  let sink = sink.clone();
  compio::runtime::spawn(async move {
    let pending = {
      let i = sink.i();
      i.drain_scheduled = false;
      !i.buf.is_empty() && !i.destroyed
    };
    if pending {
      actual_write(&sink).await;
    }
    // Always notify, producers resume on drain / 始终通知，生产者凭 drain 恢复
    sink.evt.drain.emit(&());
  })
  .detach();
}

/// Write all buffered bytes at the current offset. The buffer is taken
/// before the write is issued, so appends during the write fill fresh
/// space and a failed write never replays
/// 将缓冲全部写到当前偏移。写前取走缓冲，写期间的追加进入新缓冲，
/// 失败也不会重放
pub(crate) async fn actual_write(sink: &Sink) {
  let (mut file, buf, offset) = {
    let i = sink.i();
    if i.buf.is_empty() {
      return;
    }
    let Some(file) = i.file.take() else {
      // No handle yet, the open path flushes what accumulated
      // 尚无句柄，打开流程会刷出积压
      return;
    };
    let cap = i.cap;
    let buf = std::mem::replace(&mut i.buf, Vec::with_capacity(cap));
    i.writing = true;
    (file, buf, i.offset)
  };

  let len = buf.len() as u64;
  let res = file.write_all_at(buf, offset).await.0;

  {
    let i = sink.i();
    i.writing = false;
    if res.is_ok() {
      i.offset += len;
    }
    i.wake_all();
  }

  if let Err(e) = res {
    release(sink, e);
  }

  let destroyed = sink.i().destroyed;
  if destroyed {
    // destroy() arrived mid-write, run its deferred close
    // 写入期间被销毁，执行延迟的关闭
    close_file(sink, Some(file)).await;
    return;
  }

  let rotate = {
    let i = sink.i();
    i.file = Some(file);
    i.reopening && !i.ending
  };
  if rotate {
    // The rotation deferred by this write runs now, on its own task
    // 被本次写入推迟的轮转此刻以独立任务执行
    let sink = sink.clone();
    compio::runtime::spawn(async move {
      finish_reopen(&sink).await;
    })
    .detach();
  }
}

/// Flush failure dispatch. EAGAIN is a documented gap: fatal, not retried
/// 刷盘失败分发。EAGAIN 为已知缺口：视为致命，不重试
pub(crate) fn release(sink: &Sink, err: io::Error) {
  log::error!("flush write: {err}");
  let err = if err.kind() == io::ErrorKind::WouldBlock {
    Error::WouldBlock
  } else {
    Error::Io(err)
  };
  sink.evt.error.emit(&err);
}
