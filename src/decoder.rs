//! QRC 容器解码。
//!
//! 解密由外部解码器完成：容器内容的十六进制字符串写入解码器的标准输入，
//! 标准输出是 zlib 压缩数据的十六进制字符串。解压后得到的 XML 中，
//! `Lyric_1` 元素的 `LyricContent` 属性就是 QRC 文本。
//!
//! 这里的任何失败都只记录日志并返回空字符串，由调用方按“没有歌词”处理。

use std::io::{Read, Write};
use std::process::{Command, Stdio};

use flate2::read::ZlibDecoder;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ConvertError, Result};

static LYRIC_CONTENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<Lyric_1\s[^>]*?LyricContent\s*=\s*"(?P<content>.*?)"\s*/>"#)
        .expect("未能编译 LYRIC_CONTENT_REGEX")
});

/// 外部解码器的调用方式。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl DecoderCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// 按空白拆分命令行，第一个词为程序名。
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut words = command_line.split_whitespace();
        let program = words.next()?;
        Some(Self {
            program: program.to_string(),
            args: words.map(String::from).collect(),
        })
    }

    /// 运行解码器，返回其标准输出。
    pub fn run(&self, input: &str) -> Result<String> {
        log::debug!(
            "[QRC 解码] 调用解码器 '{}' {:?}，输入 {} 字节",
            self.program,
            self.args,
            input.len()
        );
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ConvertError::Decoder(format!("无法启动 '{}': {e}", self.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ConvertError::Decoder("无法获取解码器的标准输入".to_string()))?;
        let payload = input.to_string();
        let writer = std::thread::spawn(move || stdin.write_all(payload.as_bytes()));

        let output = child.wait_with_output()?;
        match writer.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ConvertError::Io(e)),
            Err(_) => return Err(ConvertError::Decoder("写入解码器输入的线程异常退出".to_string())),
        }

        if !output.status.success() {
            return Err(ConvertError::Decoder(format!(
                "解码器退出状态 {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8(output.stdout)?)
    }
}

/// 十六进制字符串 → 字节 → zlib 解压 → UTF-8 文本。会去掉开头的 BOM。
pub fn decode_hex_zlib(hex_text: &str) -> Result<String> {
    let compressed = hex::decode(hex_text.trim())?;
    let mut decoder = ZlibDecoder::new(compressed.as_slice());
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(ConvertError::Decompression)?;

    if decompressed.starts_with(&[0xEF, 0xBB, 0xBF]) {
        decompressed.drain(..3);
    }
    Ok(String::from_utf8(decompressed)?)
}

/// 从 QRC XML 中取出 `Lyric_1` 的 `LyricContent`，并反转义 XML 实体。
pub fn extract_lyric_content(xml: &str) -> Option<String> {
    let caps = LYRIC_CONTENT_REGEX.captures(xml)?;
    let raw = &caps["content"];
    match quick_xml::escape::unescape(raw) {
        Ok(text) => Some(text.into_owned()),
        Err(e) => {
            log::warn!("[QRC 解码] LyricContent 反转义失败，使用原始文本: {e}");
            Some(raw.to_string())
        }
    }
}

/// 解码整个容器，返回 QRC 文本；失败时返回空字符串。
pub fn decode_container(container: &[u8], decoder: &DecoderCommand) -> String {
    let stdout = match decoder.run(&hex::encode(container)) {
        Ok(out) => out,
        Err(e) => {
            log::error!("[QRC 解码] 调用外部解码器失败: {e}");
            return String::new();
        }
    };
    if stdout.trim().is_empty() {
        log::warn!("[QRC 解码] 解码器的标准输出为空。");
        return String::new();
    }

    let xml = match decode_hex_zlib(&stdout) {
        Ok(xml) => xml,
        Err(e) => {
            log::error!("[QRC 解码] 解码器输出无法解压: {e}");
            return String::new();
        }
    };

    extract_lyric_content(&xml).unwrap_or_else(|| {
        log::warn!("[QRC 解码] XML 中没有找到 LyricContent。");
        String::new()
    })
}
