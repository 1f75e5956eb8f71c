use std::{fmt, io};

use thiserror::Error;

/// 歌词加载、卡拉OK 转换与 ASS 输出过程中可能发生的错误。
///
/// 可恢复的问题（空注音、零间隔、解码失败等）只记录日志，不会出现在这里。
#[derive(Error, Debug)]
pub enum ConvertError {
    /// 文件读写等IO错误。
    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),
    /// 向字符串写入格式化文本失败。
    #[error("格式错误: {0}")]
    Format(#[from] fmt::Error),
    /// 整数解析错误。
    #[error("解析错误: {0}")]
    ParseInt(#[from] std::num::ParseIntError),
    /// 无效的时间格式字符串。
    #[error("无效的时间格式: {0}")]
    InvalidTime(String),
    /// QRC 行格式无效。
    #[error("无效的 QRC 行格式 (行 {line_num}): {message}")]
    InvalidQrcFormat { line_num: usize, message: String },
    /// 十六进制字符串解码失败。
    #[error("无效的十六进制字符串: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    /// 从字节序列转换为 UTF-8 字符串失败。
    #[error("UTF-8 转换错误: {0}")]
    FromUtf8(#[from] std::string::FromUtf8Error),
    /// Zlib 解压缩失败。
    #[error("解压缩错误: {0}")]
    Decompression(#[source] io::Error),
    /// 外部解码器调用失败。
    #[error("外部解码器错误: {0}")]
    Decoder(String),
    /// INI 配置文件加载失败。
    #[error("配置文件错误: {0}")]
    Ini(#[from] ini::Error),
    /// 配置项的值无效。
    #[error("配置项 `{key}` 的值无效: '{value}'")]
    InvalidConfig { key: String, value: String },
    /// 日志记录器初始化失败。
    #[error("日志初始化失败: {0}")]
    Logger(String),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
