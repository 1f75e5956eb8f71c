//! 解析解密后的 QRC 文本。
//!
//! 行格式为 `[行开始,行时长]字(开始,时长)字(开始,时长)...`，时间单位为毫秒；
//! 另外可能有 `[ti:...]` 之类的元数据行。

use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ConvertError, Result};
use crate::kana::{KANA_METADATA_KEY, apply_kana};
use crate::lrc::format_lrc_time;
use crate::lyric::{Lyric, LyricLine, LyricPart};

static QRC_LINE_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(?P<start>\d+),(?P<duration>\d+)\]")
        .expect("未能编译 QRC_LINE_TIMESTAMP_REGEX")
});

static WORD_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\((?P<start>\d+),(?P<duration>\d+)\)").expect("未能编译 WORD_TIMESTAMP_REGEX")
});

static METADATA_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(?P<key>[a-zA-Z0-9_]+):(?P<value>.*?)\]$").expect("未能编译 METADATA_TAG_REGEX")
});

/// 解析单行 QRC 歌词。
pub fn parse_qrc_line(line_str: &str, line_num: usize) -> Result<LyricLine> {
    let line_ts = QRC_LINE_TIMESTAMP_REGEX
        .captures(line_str)
        .ok_or_else(|| ConvertError::InvalidQrcFormat {
            line_num,
            message: "行首缺少行时间戳标记 [start,duration]".to_string(),
        })?;

    let line_start: i64 = line_ts["start"].parse()?;
    let line_duration: i64 = line_ts["duration"].parse()?;
    let content = &line_str[line_ts.get(0).map_or(0, |m| m.end())..];

    let mut parts = Vec::new();
    let mut last_end = 0;
    for caps in WORD_TIMESTAMP_REGEX.captures_iter(content) {
        let Some(tag) = caps.get(0) else { continue };
        let text = &content[last_end..tag.start()];
        let start: i64 = caps["start"].parse()?;
        let duration: i64 = caps["duration"].parse()?;
        parts.push(LyricPart::new(start, Some(start + duration), text));
        last_end = tag.end();
    }

    let remaining = &content[last_end..];
    if !remaining.trim().is_empty() {
        log::warn!(
            "[QRC 解析] 行 {line_num}: 在最后一个音节时间戳后发现未处理的文本: '{remaining}'，已忽略"
        );
    }

    if parts.is_empty() && !content.trim().is_empty() {
        return Err(ConvertError::InvalidQrcFormat {
            line_num,
            message: format!("无法从内容 '{content}' 中解析出任何有效音节时间戳。"),
        });
    }

    Ok(LyricLine {
        start: line_start,
        end: Some(line_start + line_duration),
        content: parts,
    })
}

/// 解析完整的 QRC 文本。无法解析的行会被记录并跳过，结果按行开始时间排序。
pub fn parse_qrc(qrc_content: &str) -> Lyric {
    let mut lyric = Lyric::default();

    for (i, raw) in qrc_content.lines().enumerate() {
        let line_num = i + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(meta) = METADATA_TAG_REGEX.captures(trimmed) {
            lyric
                .metadata
                .push((meta["key"].to_string(), meta["value"].trim().to_string()));
        } else if QRC_LINE_TIMESTAMP_REGEX.is_match(trimmed) {
            match parse_qrc_line(trimmed, line_num) {
                Ok(line) if line.content.is_empty() => {
                    log::debug!("[QRC 解析] 行 {line_num}: 空行，已跳过。");
                }
                Ok(line) => lyric.lines.push(line),
                Err(e) => log::error!("[QRC 解析] 解析行 {line_num} ('{trimmed}') 失败: {e}"),
            }
        } else {
            log::warn!("[QRC 解析] 行 {line_num}: 无法识别的 QRC 行: '{trimmed}'");
        }
    }

    // 振假名流按文件中的音节顺序分配，必须在排序之前
    if let Some(stream) = lyric.metadata_value(KANA_METADATA_KEY).map(str::to_owned) {
        let annotated = apply_kana(&mut lyric.lines, &stream);
        log::debug!("[QRC 解析] 振假名: {annotated} 个音节带有注音。");
    }

    lyric.lines.sort_by_key(|line| line.start);
    log::info!(
        "[QRC 解析] 解析完成: {} 行歌词，{} 条元数据。",
        lyric.lines.len(),
        lyric.metadata.len()
    );
    lyric
}

/// 把 QRC 文本转换为增强 LRC，便于人工检查。
pub fn to_enhanced_lrc(qrc_content: &str) -> Result<String> {
    let lyric = parse_qrc(qrc_content);
    let mut out = String::new();

    for (key, value) in &lyric.metadata {
        writeln!(out, "[{key}:{value}]")?;
    }
    for line in &lyric.lines {
        write!(out, "[{}]", format_lrc_time(line.start))?;
        for part in &line.content {
            write!(out, "<{}>{}", format_lrc_time(part.start), part.text)?;
        }
        if let Some(end) = line.content.last().and_then(|p| p.end).or(line.end) {
            write!(out, "<{}>", format_lrc_time(end))?;
        }
        writeln!(out)?;
    }
    Ok(out)
}
