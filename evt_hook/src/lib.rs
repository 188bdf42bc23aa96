#![cfg_attr(docsrs, feature(doc_cfg))]

//! Single-threaded event hooks / 单线程事件回调
//!
//! Register with [`Emitter::on`], fire with [`Emitter::emit`]
//! 用 [`Emitter::on`] 注册，用 [`Emitter::emit`] 触发

use std::{cell::UnsafeCell, rc::Rc};

/// Hook callback / 回调函数
pub type Hook<T> = Rc<dyn Fn(&T)>;

/// Hook list for one event / 单个事件的回调列表
pub struct Emitter<T: 'static> {
  hook: UnsafeCell<Vec<Hook<T>>>,
}

impl<T: 'static> Default for Emitter<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: 'static> Emitter<T> {
  pub fn new() -> Self {
    Self {
      hook: UnsafeCell::new(Vec::new()),
    }
  }

  /// Add hook / 添加回调
  pub fn on(&self, f: impl Fn(&T) + 'static) {
    // Safe: single-threaded / 安全：单线程
    unsafe { (*self.hook.get()).push(Rc::new(f)) };
  }

  /// Fire all hooks. Snapshot first, a hook may register more hooks
  /// 触发所有回调。先快照，回调中可继续注册
  pub fn emit(&self, arg: &T) {
    // Safe: single-threaded / 安全：单线程
    let hook = unsafe { (*self.hook.get()).clone() };
    for f in &hook {
      f(arg);
    }
  }

  /// Hook count / 回调数量
  pub fn len(&self) -> usize {
    // Safe: single-threaded / 安全：单线程
    unsafe { (*self.hook.get()).len() }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
