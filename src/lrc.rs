//! 增强 LRC 解析。
//!
//! 支持 `[mm:ss.xx]` 行时间标签（一行可带多个，表示重复）、`<mm:ss.xx>` 逐字标签以及
//! `[ti:...]` 等元数据标签。行尾的逐字标签表示该行的结束时间。

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::kana::{KANA_METADATA_KEY, KanaReader};
use crate::lyric::{Lyric, LyricLine, LyricPart};

static LRC_LINE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(?P<min>\d+):(?P<sec>\d{1,2})(?:[.:](?P<frac>\d{1,3}))?\]")
        .expect("未能编译 LRC_LINE_TAG_REGEX")
});

static LRC_WORD_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(?P<min>\d+):(?P<sec>\d{1,2})(?:[.:](?P<frac>\d{1,3}))?>")
        .expect("未能编译 LRC_WORD_TAG_REGEX")
});

static LRC_METADATA_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(?P<key>[a-zA-Z_#]+):(?P<value>.*)\]$").expect("未能编译 LRC_METADATA_TAG_REGEX")
});

/// 毫秒格式化为 `mm:ss.xx`，分钟不设上限。
pub fn format_lrc_time(ms: i64) -> String {
    let ms = ms.max(0);
    format!(
        "{:02}:{:02}.{:02}",
        ms / 60_000,
        ms / 1000 % 60,
        ms % 1000 / 10
    )
}

fn tag_time(caps: &Captures<'_>) -> Option<i64> {
    let minutes: i64 = caps["min"].parse().ok()?;
    let seconds: i64 = caps["sec"].parse().ok()?;
    let fraction = caps.name("frac").map_or(Some(0), |m| {
        let digits = m.as_str();
        let value: i64 = digits.parse().ok()?;
        Some(match digits.len() {
            1 => value * 100,
            2 => value * 10,
            _ => value,
        })
    })?;
    minutes
        .checked_mul(60_000)?
        .checked_add(seconds * 1000 + fraction)
}

/// 解析行时间标签之后的内容，返回片段和（由行尾标签给出的）结束时间。
fn parse_body(body: &str, line_start: i64) -> (Vec<LyricPart>, Option<i64>) {
    let tags: Vec<(usize, usize, i64)> = LRC_WORD_TAG_REGEX
        .captures_iter(body)
        .filter_map(|caps| {
            let m = caps.get(0)?;
            Some((m.start(), m.end(), tag_time(&caps)?))
        })
        .collect();

    if tags.is_empty() {
        if body.trim().is_empty() {
            return (Vec::new(), None);
        }
        return (vec![LyricPart::new(line_start, None, body)], None);
    }

    let mut parts = Vec::with_capacity(tags.len() + 1);
    let mut line_end = None;

    let leading = &body[..tags[0].0];
    if !leading.is_empty() {
        parts.push(LyricPart::new(line_start, Some(tags[0].2), leading));
    }

    for (k, &(_, tag_end, time)) in tags.iter().enumerate() {
        let next = tags.get(k + 1);
        let text = &body[tag_end..next.map_or(body.len(), |t| t.0)];
        match next {
            None if text.is_empty() => line_end = Some(time),
            None => parts.push(LyricPart::new(time, None, text)),
            Some(&(_, _, next_time)) if !text.is_empty() => {
                parts.push(LyricPart::new(time, Some(next_time), text));
            }
            Some(_) => {}
        }
    }

    (parts, line_end)
}

/// 按文件顺序分配振假名流。同一行的重复时间标签共用一份注音，只消耗一次流。
fn apply_row_kana(rows: &mut [Vec<LyricLine>], stream: &str) -> usize {
    let mut reader = KanaReader::new(stream);
    let mut annotated = 0;
    for row in rows {
        let Some((first, copies)) = row.split_first_mut() else {
            continue;
        };
        for part in &mut first.content {
            if reader.annotate(part) {
                annotated += 1;
            }
        }
        for copy in copies {
            for (part, source) in copy.content.iter_mut().zip(&first.content) {
                part.sup.clone_from(&source.sup);
            }
        }
    }
    annotated
}

/// 解析 LRC 文本。无法识别的行记录后跳过；结果按行开始时间排序。
pub fn parse_lrc(lrc_content: &str) -> Lyric {
    let mut lyric = Lyric::default();
    let mut rows: Vec<Vec<LyricLine>> = Vec::new();

    for (i, raw) in lrc_content.lines().enumerate() {
        let line_num = i + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut starts = Vec::new();
        let mut rest = trimmed;
        while let Some(caps) = LRC_LINE_TAG_REGEX.captures(rest) {
            let Some(whole) = caps.get(0) else { break };
            match tag_time(&caps) {
                Some(t) => starts.push(t),
                None => log::warn!("[LRC 解析] 行 {line_num}: 无效的时间标签 '{}'", whole.as_str()),
            }
            rest = &rest[whole.end()..];
        }

        if starts.is_empty() {
            if let Some(meta) = LRC_METADATA_TAG_REGEX.captures(trimmed) {
                lyric
                    .metadata
                    .push((meta["key"].to_string(), meta["value"].trim().to_string()));
            } else {
                log::warn!("[LRC 解析] 行 {line_num}: 无法识别的 LRC 行: '{trimmed}'");
            }
            continue;
        }

        rows.push(
            starts
                .into_iter()
                .map(|start| {
                    let (content, end) = parse_body(rest, start);
                    LyricLine {
                        start,
                        end,
                        content,
                    }
                })
                .collect(),
        );
    }

    if let Some(stream) = lyric.metadata_value(KANA_METADATA_KEY).map(str::to_owned) {
        let annotated = apply_row_kana(&mut rows, &stream);
        log::debug!("[LRC 解析] 振假名: {annotated} 个音节带有注音。");
    }

    lyric.lines = rows.into_iter().flatten().collect();
    lyric.lines.sort_by_key(|line| line.start);
    log::info!(
        "[LRC 解析] 解析完成: {} 行歌词，{} 条元数据。",
        lyric.lines.len(),
        lyric.metadata.len()
    );
    lyric
}
