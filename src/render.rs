//! 把字幕行渲染为带 `\kf` 标签的文本，并按时间间隔切分段落。

use std::fmt::Write as _;

use crate::config::FuriganaMode;
use crate::subtitle::{Line, RetimeAnchor, Subtitle, Syllable, retime_span};

/// 毫秒转换为百分之一秒，半数向上取整。
pub const fn centiseconds(ms: i64) -> i64 {
    (ms + 5).div_euclid(10)
}

/// 渲染后的行，供引导算法和 ASS 输出使用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub start: i64,
    pub end: i64,
    pub text: String,
    /// 引导时间（毫秒）：渲染时为第一个音节之前的空白，之后由引导算法累加。
    pub lead: i64,
}

impl RenderedLine {
    pub fn new(start: i64, end: i64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            lead: 0,
        }
    }

    /// 正值使歌词提前显示。
    pub const fn offset(&mut self, ms: i64) {
        self.start -= ms;
        self.end -= ms;
    }

    pub fn retime(&mut self, delta_start: i64, delta_end: i64, anchor: Option<RetimeAnchor>) {
        (self.start, self.end) =
            retime_span((self.start, self.end), delta_start, delta_end, anchor);
    }
}

/// 时间上连续的一组渲染行。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub lines: Vec<RenderedLine>,
}

impl Paragraph {
    pub const fn new(lines: Vec<RenderedLine>) -> Self {
        Self { lines }
    }

    pub fn push(&mut self, line: RenderedLine) {
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn write_kf(out: &mut String, duration_ms: i64) {
    let _ = write!(out, "{{\\kf{}}}", centiseconds(duration_ms));
}

fn render_accurate(line: &Line, out: &mut String) {
    let syllables = line.syllables();
    for (i, syl) in syllables.iter().enumerate() {
        let next = syllables.get(i + 1).map_or(line.end(), Syllable::start);
        write_kf(out, next - syl.start());
        if !syl.is_null() {
            out.push_str(syl.text().unwrap_or("#"));
        }
        if let Some(ruby) = syl.ruby()
            && !ruby.is_empty()
        {
            out.push_str(if syl.is_linked() { "|" } else { "|<" });
            out.push_str(ruby);
        }
    }
}

/// 按词输出。`Simple` 模式下每个词都带 `|<` 标记，没有注音时标记后为空。
fn render_words(line: &Line, with_ruby: bool, out: &mut String) {
    let words: Vec<Syllable> = line.words().collect();
    for (i, word) in words.iter().enumerate() {
        let next = words.get(i + 1).map_or(line.end(), Syllable::start);
        write_kf(out, next - word.start());
        out.push_str(word.text().unwrap_or_default());
        if with_ruby {
            out.push_str("|<");
            out.push_str(word.ruby().unwrap_or_default());
        }
    }
}

/// 渲染一行。
///
/// 行开始到第一个音节之间的空白记入 `lead`，由引导算法继续累加，
/// 最终在输出时写成一个 `\k` 标签。没有音节时整行都算作空白。
pub fn render_line(line: &Line, mode: FuriganaMode) -> RenderedLine {
    let (start, end) = line.duration();
    let first = match mode {
        FuriganaMode::Accurate => line.syllables().first().map(Syllable::start),
        FuriganaMode::Simple | FuriganaMode::None => line.words().peek().map(|w| w.start()),
    };

    let mut text = String::new();
    match mode {
        FuriganaMode::Accurate => render_accurate(line, &mut text),
        FuriganaMode::Simple => render_words(line, true, &mut text),
        FuriganaMode::None => render_words(line, false, &mut text),
    }

    let mut rendered = RenderedLine::new(start, end, text);
    rendered.lead = (first.unwrap_or(end) - start).max(0);
    rendered
}

/// 按顺序渲染所有可见行。
pub fn render_subtitle(subtitle: &Subtitle, mode: FuriganaMode) -> Vec<RenderedLine> {
    subtitle
        .dialogues()
        .map(|line| render_line(line, mode))
        .collect()
}

/// 相邻两行间隔 `|start - 上一行 end|` 超过 `threshold` 时开始新段落。
pub fn divide_paragraphs(lines: Vec<RenderedLine>, threshold: i64) -> Vec<Paragraph> {
    let mut paragraphs: Vec<Paragraph> = Vec::new();
    let mut prev_end: Option<i64> = None;

    for line in lines {
        let within = prev_end.is_some_and(|end| (line.start - end).abs() <= threshold);
        prev_end = Some(line.end);
        match paragraphs.last_mut() {
            Some(paragraph) if within => paragraph.push(line),
            _ => paragraphs.push(Paragraph::new(vec![line])),
        }
    }

    log::debug!("[段落切分] 阈值 {threshold}ms，共 {} 段。", paragraphs.len());
    paragraphs
}
