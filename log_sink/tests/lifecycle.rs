//! End and destroy / 优雅关闭与销毁

use std::{
  cell::{Cell, RefCell},
  path::PathBuf,
  rc::Rc,
  time::Duration,
};

use log_sink::{Conf, Error, Sink};
use tempfile::TempDir;

fn tmp() -> (TempDir, PathBuf) {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("out.log");
  (dir, path)
}

async fn wait_ready(sink: &Sink) {
  while !sink.is_ready() {
    compio::time::sleep(Duration::from_millis(1)).await;
  }
}

fn counter(sink: &Sink, evt: &str) -> Rc<Cell<u32>> {
  let n = Rc::new(Cell::new(0u32));
  let c = Rc::clone(&n);
  match evt {
    "drain" => sink.on_drain(move || c.set(c.get() + 1)),
    "finish" => sink.on_finish(move || c.set(c.get() + 1)),
    "close" => sink.on_close(move || c.set(c.get() + 1)),
    _ => unreachable!(),
  }
  n
}

#[compio::test]
async fn end_flushes_then_finish_then_close() {
  let (_dir, path) = tmp();
  let sink = Sink::new(Conf::path(&path)).unwrap();
  wait_ready(&sink).await;

  let order = Rc::new(RefCell::new(Vec::new()));
  let o = Rc::clone(&order);
  sink.on_finish(move || o.borrow_mut().push("finish"));
  let o = Rc::clone(&order);
  sink.on_close(move || o.borrow_mut().push("close"));

  sink.write(b"abc").await.unwrap();
  sink.end().await.unwrap();

  assert_eq!(std::fs::read(&path).unwrap(), b"abc");
  assert_eq!(*order.borrow(), ["finish", "close"]);
  assert!(sink.is_destroyed());
  assert!(matches!(sink.write(b"x").await, Err(Error::Closed)));
}

#[compio::test]
async fn end_before_ready_closes_after_open() {
  let (_dir, path) = tmp();
  let sink = Sink::new(Conf::path(&path)).unwrap();
  let finishes = counter(&sink, "finish");
  let closes = counter(&sink, "close");

  sink.write(b"late").await.unwrap();
  sink.end().await.unwrap();
  // Close waits for the pending open / 关闭等待尚未完成的打开
  assert!(!sink.is_destroyed());

  compio::time::sleep(Duration::from_millis(50)).await;
  assert_eq!(std::fs::read(&path).unwrap(), b"late");
  assert_eq!(finishes.get(), 1);
  assert_eq!(closes.get(), 1);
  assert!(sink.is_destroyed());
}

#[compio::test]
async fn end_twice_is_noop_then_closed() {
  let (_dir, path) = tmp();
  let sink = Sink::new(Conf::path(&path)).unwrap();
  wait_ready(&sink).await;

  sink.end().await.unwrap();
  assert!(matches!(sink.end().await, Err(Error::Closed)));
}

#[compio::test]
async fn destroy_is_idempotent() {
  let (_dir, path) = tmp();
  let sink = Sink::new(Conf::path(&path)).unwrap();
  wait_ready(&sink).await;

  let finishes = counter(&sink, "finish");
  let closes = counter(&sink, "close");

  sink.destroy();
  assert!(sink.is_destroyed());
  sink.destroy();

  compio::time::sleep(Duration::from_millis(20)).await;
  assert_eq!(closes.get(), 1);
  // No end() was requested / 未请求优雅关闭
  assert_eq!(finishes.get(), 0);
}

#[compio::test]
async fn destroy_discards_buffer_but_drain_still_fires() {
  let (_dir, path) = tmp();
  let sink = Sink::new(Conf::path(&path)).unwrap();
  wait_ready(&sink).await;

  let drains = counter(&sink, "drain");

  sink.write(b"zz").await.unwrap();
  sink.destroy();
  assert!(matches!(sink.write(b"q").await, Err(Error::Closed)));

  compio::time::sleep(Duration::from_millis(20)).await;
  assert_eq!(drains.get(), 1);
  assert_eq!(std::fs::read(&path).unwrap(), b"");
}

#[compio::test]
async fn destroy_before_ready_waits_for_open() {
  let (_dir, path) = tmp();
  let sink = Sink::new(Conf::path(&path)).unwrap();
  let closes = counter(&sink, "close");

  sink.write(b"q").await.unwrap();
  sink.destroy();
  assert!(!sink.is_destroyed());

  compio::time::sleep(Duration::from_millis(50)).await;
  assert!(sink.is_destroyed());
  assert_eq!(closes.get(), 1);
  // Pending bytes still flushed by the open / 打开流程仍刷出积压
  assert_eq!(std::fs::read(&path).unwrap(), b"q");
}

#[compio::test]
async fn flush_now_distinguishes_not_ready_from_closed() {
  let (_dir, path) = tmp();
  let sink = Sink::new(Conf::path(&path)).unwrap();
  assert!(matches!(sink.flush_now().await, Err(Error::NotReady)));

  wait_ready(&sink).await;
  sink.write(b"ok").await.unwrap();
  sink.flush_now().await.unwrap();
  assert_eq!(std::fs::read(&path).unwrap(), b"ok");

  sink.destroy();
  assert!(matches!(sink.flush_now().await, Err(Error::Closed)));
}

#[compio::test]
async fn ops_after_destroy_fail() {
  let (_dir, path) = tmp();
  let sink = Sink::new(Conf::path(&path)).unwrap();
  wait_ready(&sink).await;
  sink.destroy();

  assert!(matches!(sink.write(b"x").await, Err(Error::Closed)));
  assert!(matches!(sink.flush().await, Err(Error::Closed)));
  assert!(matches!(sink.end().await, Err(Error::Closed)));
  assert!(matches!(sink.reopen(None).await, Err(Error::Closed)));
}
