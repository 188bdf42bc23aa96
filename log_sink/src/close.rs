//! Close completion / 关闭完成

use compio_fs::File;

use crate::{Error, Sink};

/// Close the handle and emit the terminal events: `finish` (only when
/// ending) then `close`. A close failure surfaces on the error hooks and
/// suppresses both
/// 关闭句柄并发终态事件：ending 时先 `finish` 再 `close`。
/// 关闭失败走 error 回调并抑制两者
pub(crate) async fn close_file(sink: &Sink, file: Option<File>) {
  {
    let i = sink.i();
    if i.closed {
      return;
    }
    i.closed = true;
  }

  let res = match file {
    Some(f) => f.close().await,
    None => Ok(()),
  };

  match res {
    Err(e) => {
      log::error!("close: {e}");
      sink.evt.error.emit(&Error::Io(e));
    }
    Ok(()) => {
      if sink.i().ending {
        sink.evt.finish.emit(&());
      }
      sink.evt.close.emit(&());
    }
  }
}
