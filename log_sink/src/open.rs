//! Open and rotation / 打开与轮转

use std::path::Path;

use compio_fs::{File, OpenOptions};

use crate::{Error, Sink, close::close_file, flush::actual_write};

/// Open for appending: write/create, offset at the end
/// 以追加方式打开：写入并按需创建，偏移取文件末尾
async fn open_append(path: &Path) -> std::io::Result<(File, u64)> {
  let file = OpenOptions::new()
    .write(true)
    .create(true)
    .open(path)
    .await?;
  let len = file.metadata().await?.len();
  Ok((file, len))
}

/// First open by path: flush what accumulated before the handle existed,
/// notify `ready`, then honor a close deferred by destroy/end
/// 首次按路径打开：刷出句柄存在前的积压，通知 `ready`，
/// 再处理 destroy/end 延迟的关闭
pub(crate) async fn open_task(sink: Sink) {
  let path = {
    let i = sink.i();
    if i.destroyed || i.file.is_some() || i.reopening {
      // A rotation already owns the open / 轮转已接管打开
      return;
    }
    match &i.path {
      Some(p) => p.clone(),
      None => return,
    }
  };

  match open_append(&path).await {
    Err(e) => {
      log::error!("open {}: {e}", path.display());
      sink.evt.error.emit(&Error::Io(e));
      let deferred = sink.i().close_on_ready;
      if deferred {
        sink.i().mark_destroyed();
        close_file(&sink, None).await;
      }
    }
    Ok((file, len)) => {
      let pending = {
        let i = sink.i();
        i.file = Some(file);
        i.offset = len;
        !i.buf.is_empty() && !i.destroyed
      };
      if pending {
        actual_write(&sink).await;
      }
      sink.i().ready = true;
      sink.evt.ready.emit(&());

      let deferred = {
        let i = sink.i();
        i.close_on_ready && !i.destroyed
      };
      if deferred {
        let file = {
          let i = sink.i();
          i.mark_destroyed();
          i.file.take()
        };
        close_file(&sink, file).await;
      }
    }
  }
}

/// Rotation: close the old handle (errors surface on the error hooks),
/// open the target, flush what accumulated while rotating
/// 轮转：关闭旧句柄（错误走 error 回调），打开目标，刷出轮转期间的积压
pub(crate) async fn finish_reopen(sink: &Sink) {
  let (old, path) = {
    let i = sink.i();
    if i.destroyed || i.ending {
      i.reopening = false;
      return;
    }
    let path = match i.reopen_to.take() {
      Some(p) => {
        i.path = Some(p.clone());
        p
      }
      None => match &i.path {
        Some(p) => p.clone(),
        None => {
          i.reopening = false;
          return;
        }
      },
    };
    (i.file.take(), path)
  };

  if let Some(f) = old {
    if let Err(e) = f.close().await {
      log::error!("close for reopen: {e}");
      sink.evt.error.emit(&Error::Io(e));
    }
  }

  match open_append(&path).await {
    Err(e) => {
      sink.i().reopening = false;
      log::error!("reopen {}: {e}", path.display());
      sink.evt.error.emit(&Error::Io(e));
    }
    Ok((file, len)) => {
      if sink.i().destroyed {
        // Destroyed while rotating, the handle is surplus
        // 轮转期间被销毁，句柄多余
        drop(file);
        return;
      }
      let pending = {
        let i = sink.i();
        i.file = Some(file);
        i.offset = len;
        i.ready = true;
        i.reopening = false;
        !i.buf.is_empty()
      };
      if pending {
        actual_write(sink).await;
      }

      let deferred = {
        let i = sink.i();
        i.close_on_ready && !i.destroyed
      };
      if deferred {
        let file = {
          let i = sink.i();
          i.mark_destroyed();
          i.file.take()
        };
        close_file(sink, file).await;
      }
    }
  }
}
