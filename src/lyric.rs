//! 解析后的逐字歌词结构，时间单位均为毫秒。
//!
//! 这是歌词源（QRC、增强 LRC 或外部解析器）与字幕模型之间的交接格式。

/// 注音条目，例如一个汉字上的假名。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sup {
    pub start: i64,
    pub end: Option<i64>,
    pub notation: String,
}

/// 行内的一个计时片段。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LyricPart {
    pub start: i64,
    pub end: Option<i64>,
    pub text: String,
    pub sup: Vec<Sup>,
}

impl LyricPart {
    pub fn new(start: i64, end: Option<i64>, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            sup: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_sup(mut self, start: i64, end: Option<i64>, notation: impl Into<String>) -> Self {
        self.sup.push(Sup {
            start,
            end,
            notation: notation.into(),
        });
        self
    }
}

/// 一行歌词。`end` 缺省时由下一行的开始时间补齐。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LyricLine {
    pub start: i64,
    pub end: Option<i64>,
    pub content: Vec<LyricPart>,
}

/// 完整的歌词及其元数据标签。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Lyric {
    pub lines: Vec<LyricLine>,
    pub metadata: Vec<(String, String)>,
}

impl Lyric {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 查找第一个匹配的元数据值，例如 `ti`。
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}
