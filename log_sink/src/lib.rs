#![cfg_attr(docsrs, feature(doc_cfg))]

//! Buffered append-only log sink / 缓冲追加日志写入器
//!
//! Writes land in a fixed-capacity buffer; a coalesced deferred task drains
//! them to the file, so a burst of records costs one write syscall
//! 写入先进固定容量缓冲；延迟任务合并刷盘，一批记录只花一次写系统调用
//!
//! Rotation ([`Sink::reopen`]) and shutdown ([`Sink::end`] /
//! [`Sink::destroy`]) serialize against an in-flight flush
//! 轮转与关闭会与进行中的刷盘串行

mod close;
mod conf;
mod consts;
mod error;
mod evt;
mod flush;
mod inner;
mod open;
mod sink;

pub use conf::Conf;
pub use consts::BUF_SIZE;
pub use error::{Error, Result};
pub use sink::Sink;
