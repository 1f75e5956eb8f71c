//! `[kana:...]` 振假名流。
//!
//! 流由若干 `字数` + `读音` 片段组成，例如 `1あした1そら`，按文件顺序依次分配给含汉字的音节。
//! 读音可以写成 `か(100,50)な(150,50)` 的逐段计时形式；只有字数没有读音的片段表示这些字不注音。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lyric::{LyricLine, LyricPart, Sup};

/// 携带振假名流的元数据键。
pub const KANA_METADATA_KEY: &str = "kana";

static HAS_KANJI_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Han}").expect("未能编译 HAS_KANJI_REGEX"));

static TIMED_KANA_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<text>.*?)\((?P<start>\d+),(?P<duration>\d+)\)")
        .expect("未能编译 TIMED_KANA_REGEX")
});

/// 按顺序消费振假名流的读取器。
#[derive(Debug, Clone)]
pub struct KanaReader {
    chars: Vec<char>,
    cursor: usize,
}

impl KanaReader {
    pub fn new(stream: &str) -> Self {
        Self {
            chars: stream.chars().collect(),
            cursor: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.cursor).copied()
    }

    fn read_count(&mut self) -> String {
        let start = self.cursor;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.cursor += 1;
        }
        self.chars[start..self.cursor].iter().collect()
    }

    /// 读取到括号外的下一个数字为止。
    fn read_reading(&mut self) -> String {
        let start = self.cursor;
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '(' | '（' => depth += 1,
                ')' | '）' if depth > 0 => depth -= 1,
                c if c.is_ascii_digit() && depth == 0 => break,
                _ => {}
            }
            self.cursor += 1;
        }
        self.chars[start..self.cursor].iter().collect()
    }

    /// 为一个音节读取注音并写入 `part.sup`，返回是否写入了注音。
    ///
    /// 不含汉字的音节不消耗流。
    pub fn annotate(&mut self, part: &mut LyricPart) -> bool {
        let text = part.text.trim();
        if text.is_empty() || !HAS_KANJI_REGEX.is_match(text) {
            return false;
        }

        let mut sup = Vec::new();
        let mut remaining = text.chars().count();
        while remaining > 0 && !self.is_exhausted() {
            let count = self.read_count();
            if count.is_empty() {
                self.cursor += 1;
                continue;
            }
            let parsed: usize = count.parse().unwrap_or(0);
            let reading = self.read_reading();

            let applied = if reading.is_empty() {
                if parsed > remaining {
                    // 流末尾多出的数字留给后面的音节
                    let used = remaining.to_string().len();
                    self.cursor -= count.len().saturating_sub(used);
                    remaining
                } else {
                    parsed
                }
            } else {
                push_reading(&mut sup, part, &reading);
                parsed
            };

            if applied == 0 {
                break;
            }
            remaining = remaining.saturating_sub(applied);
        }

        if sup.is_empty() {
            return false;
        }
        part.sup = sup;
        true
    }
}

/// 计时的读音逐段写入；不计时的读音并入上一段，没有上一段时覆盖整个音节。
fn push_reading(sup: &mut Vec<Sup>, part: &LyricPart, reading: &str) {
    if reading.contains('(') {
        for caps in TIMED_KANA_REGEX.captures_iter(reading) {
            let start: i64 = caps["start"].parse().unwrap_or(part.start);
            let duration: i64 = caps["duration"].parse().unwrap_or(0);
            sup.push(Sup {
                start,
                end: Some(start.saturating_add(duration)),
                notation: caps["text"].to_string(),
            });
        }
        return;
    }

    let reading = reading.trim();
    match sup.last_mut() {
        Some(last) => last.notation.push_str(reading),
        None => sup.push(Sup {
            start: part.start,
            end: part.end,
            notation: reading.to_string(),
        }),
    }
}

/// 按给定顺序把振假名流分配给各行的音节，返回写入注音的音节数。
pub fn apply_kana(lines: &mut [LyricLine], stream: &str) -> usize {
    let mut reader = KanaReader::new(stream);
    let mut annotated = 0;
    for part in lines.iter_mut().flat_map(|l| l.content.iter_mut()) {
        if reader.is_exhausted() {
            break;
        }
        if reader.annotate(part) {
            annotated += 1;
        }
    }
    annotated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notations(part: &LyricPart) -> Vec<&str> {
        part.sup.iter().map(|s| s.notation.as_str()).collect()
    }

    #[test]
    fn test_counts_skip_kana_only_syllables() {
        let mut line = LyricLine {
            start: 0,
            end: Some(3000),
            content: vec![
                LyricPart::new(0, Some(1000), "明日"),
                LyricPart::new(1000, Some(1500), "の"),
                LyricPart::new(1500, Some(3000), "空"),
            ],
        };
        let annotated = apply_kana(std::slice::from_mut(&mut line), "2あした1そら");
        assert_eq!(annotated, 2);

        assert_eq!(notations(&line.content[0]), vec!["あした"]);
        assert_eq!(
            (line.content[0].sup[0].start, line.content[0].sup[0].end),
            (0, Some(1000)),
            "不计时的读音覆盖整个音节"
        );
        assert!(line.content[1].sup.is_empty());
        assert_eq!(notations(&line.content[2]), vec!["そら"]);
    }

    #[test]
    fn test_per_character_readings_merge() {
        let mut part = LyricPart::new(0, Some(1000), "明日");
        let mut reader = KanaReader::new("1あ1した");
        assert!(reader.annotate(&mut part));
        assert_eq!(notations(&part), vec!["あした"]);
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_timed_readings() {
        let mut part = LyricPart::new(1000, Some(2000), "紅");
        let mut reader = KanaReader::new("1べ(1000,400)に(1400,600)1そら");
        assert!(reader.annotate(&mut part));
        assert_eq!(notations(&part), vec!["べ", "に"]);
        assert_eq!((part.sup[1].start, part.sup[1].end), (1400, Some(2000)));

        let mut next = LyricPart::new(2000, Some(2500), "空");
        assert!(reader.annotate(&mut next));
        assert_eq!(notations(&next), vec!["そら"]);
    }

    #[test]
    fn test_count_without_reading() {
        let mut lines = vec![LyricLine {
            start: 0,
            end: None,
            content: vec![
                LyricPart::new(0, Some(500), "一"),
                LyricPart::new(500, Some(1000), "空"),
            ],
        }];
        // 流末尾的 `12` 中，`1` 跳过第一个字，`2` 留给下一个音节
        let annotated = apply_kana(&mut lines, "12");
        assert_eq!(annotated, 0);
        assert!(lines[0].content.iter().all(|p| p.sup.is_empty()));

        let mut part = LyricPart::new(0, Some(500), "abc");
        let mut reader = KanaReader::new("1か");
        assert!(!reader.annotate(&mut part), "不含汉字的音节不消耗流");
        assert!(!reader.is_exhausted());
    }
}
