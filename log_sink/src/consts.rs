//! Constants / 常量

/// Default buffer capacity (64 KiB) / 默认缓冲区容量（64 KiB）
pub const BUF_SIZE: usize = 64 * 1024;
