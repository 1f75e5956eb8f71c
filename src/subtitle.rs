//! # 字幕模型
//!
//! 音节 (`Syllable`) → 行 (`Line`) → 字幕 (`Subtitle`)。
//!
//! 行按“词”遍历时，连接音节（没有自身文本、只携带注音的音节）会被并入前一个词；
//! 字幕按“对白”遍历时，被隐藏的行会被跳过。两种遍历都基于 [`SkipCursor`]。

use std::cmp::Ordering;
use std::fmt::{self, Write as _};
use std::ops::Range;

use crate::cursor::{Eligibility, SkipCursor};
use crate::lyric::Lyric;

/// 最后一行没有结束时间时使用的上限（毫秒）。
pub const DEFAULT_CEILING_MS: i64 = 3_600_000;

pub(crate) fn seconds_fixed(ms: i64) -> String {
    format!("{:.2}", ms as f64 / 1000.0)
}

/// 不可变的计时音节。
///
/// `text` 为空表示连接音节，它只为前一个音节贡献注音。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syllable {
    start: i64,
    text: Option<String>,
    ruby: Option<String>,
}

impl Syllable {
    pub const fn new(start: i64, text: Option<String>, ruby: Option<String>) -> Self {
        Self { start, text, ruby }
    }

    pub fn plain(start: i64, text: impl Into<String>) -> Self {
        Self::new(start, Some(text.into()), None)
    }

    pub fn annotated(start: i64, text: impl Into<String>, ruby: impl Into<String>) -> Self {
        Self::new(start, Some(text.into()), Some(ruby.into()))
    }

    pub fn linked(start: i64, ruby: impl Into<String>) -> Self {
        Self::new(start, None, Some(ruby.into()))
    }

    pub const fn start(&self) -> i64 {
        self.start
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn ruby(&self) -> Option<&str> {
        self.ruby.as_deref()
    }

    pub const fn is_linked(&self) -> bool {
        self.text.is_none()
    }

    /// 既没有文本也没有注音的空音节。
    pub const fn is_null(&self) -> bool {
        self.is_linked() && self.ruby.is_none()
    }

    /// 把后续音节的注音按顺序拼接到主音节上，文本保持不变。
    pub fn combine<'a>(master: &Self, slaves: impl IntoIterator<Item = &'a Self>) -> Self {
        let mut ruby = master.ruby.clone();
        for slave in slaves {
            if let Some(r) = &slave.ruby {
                ruby.get_or_insert_with(String::new).push_str(r);
            }
        }
        Self::new(master.start, master.text.clone(), ruby)
    }

    /// 把从属音节的文本并入主音节，注音则转为跟随其后的连接音节。
    ///
    /// 注音为空的从属音节会被丢弃并记录警告。
    pub fn link(master: &Self, slaves: &[Self]) -> Vec<Self> {
        let mut text = master.text.clone().unwrap_or_default();
        for slave in slaves {
            if let Some(t) = slave.text.as_deref() {
                text.push_str(t);
            }
        }

        let mut linked = Vec::with_capacity(slaves.len() + 1);
        linked.push(Self::new(master.start, Some(text), master.ruby.clone()));
        for slave in slaves {
            match slave.ruby.as_deref() {
                Some(ruby) if !ruby.is_empty() => linked.push(Self::linked(slave.start, ruby)),
                _ => log::warn!(
                    "[字幕模型] 检测到空的注音音节 {}，已忽略。",
                    slave.inspect(false)
                ),
            }
        }
        linked
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        self.start.cmp(&other.start)
    }

    pub fn inspect(&self, expand: bool) -> String {
        let start = seconds_fixed(self.start);
        if expand {
            format!(
                "{start} {} {}",
                self.text.as_deref().unwrap_or("<Linked>"),
                self.ruby.as_deref().unwrap_or_default()
            )
        } else {
            format!(
                "[{start}]{}({})",
                self.text.as_deref().unwrap_or_default(),
                self.ruby.as_deref().unwrap_or_default()
            )
        }
    }
}

/// `retime` 的锚点：`Pre` 以开始时间为基准计算结束时间，`Post` 反之。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetimeAnchor {
    Pre,
    Post,
}

pub(crate) fn retime_span(
    (start, end): (i64, i64),
    delta_start: i64,
    delta_end: i64,
    anchor: Option<RetimeAnchor>,
) -> (i64, i64) {
    let new_start = if anchor == Some(RetimeAnchor::Post) { end } else { start } + delta_start;
    let new_end = if anchor == Some(RetimeAnchor::Pre) { start } else { end } + delta_end;
    (new_start, new_end)
}

/// 一行字幕，音节按开始时间非递减排列。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    start: i64,
    end: i64,
    syllables: Vec<Syllable>,
}

impl Line {
    /// 空音节（无文本也无注音）会被丢弃并记录警告。
    pub fn new(start: i64, end: i64, syllables: Vec<Syllable>) -> Self {
        let syllables = syllables
            .into_iter()
            .filter(|syl| {
                if syl.is_null() {
                    log::warn!("[字幕模型] 丢弃空音节 {}。", syl.inspect(false));
                }
                !syl.is_null()
            })
            .collect();
        Self {
            start,
            end,
            syllables,
        }
    }

    pub const fn start(&self) -> i64 {
        self.start
    }

    pub const fn end(&self) -> i64 {
        self.end
    }

    pub const fn duration(&self) -> (i64, i64) {
        (self.start, self.end)
    }

    pub fn syllables(&self) -> &[Syllable] {
        &self.syllables
    }

    /// 按词遍历，连接音节会被合并到它前面的词上。
    pub fn words(&self) -> WordCursor<'_> {
        WordCursor::new(&self.syllables)
    }

    pub fn count(&self, words: bool) -> usize {
        if words {
            self.words().count()
        } else {
            self.syllables.len()
        }
    }

    pub fn sort(&mut self) {
        self.syllables.sort_by(Syllable::compare);
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.end.cmp(&other.end))
    }

    pub fn adjust(&mut self, start: Option<i64>, end: Option<i64>) {
        self.start = start.unwrap_or(self.start);
        self.end = end.unwrap_or(self.end);
    }

    pub fn retime(&mut self, delta_start: i64, delta_end: i64, anchor: Option<RetimeAnchor>) {
        (self.start, self.end) = retime_span(self.duration(), delta_start, delta_end, anchor);
    }

    /// 以 (当前, 上一个, 下一个) 的形式遍历所有词。
    pub fn for_each_with_neighbors<F>(&self, mut f: F)
    where
        F: FnMut(Syllable, Option<Syllable>, Option<Syllable>),
    {
        let mut cur = self.words();
        let mut prev = self.words();
        let mut next = self.words();
        prev.prev();
        next.next();
        while cur.valid() {
            let (c, p, n) = (cur.next(), prev.next(), next.next());
            if let Some(c) = c {
                f(c, p, n);
            }
        }
    }

    pub fn inspect(&self, time: bool, ruby: bool, link: bool) -> String {
        let head = format!(
            "{}->{}",
            seconds_fixed(self.start),
            seconds_fixed(self.end)
        );
        if self.syllables.is_empty() {
            return head + "  <Empty>";
        }
        let mut out = format!("{head} <{}>:", self.syllables.len());
        for syl in &self.syllables {
            out.push(' ');
            if time && (!syl.is_linked() || link) {
                let _ = write!(out, "[{}]", seconds_fixed(syl.start));
            }
            out.push_str(syl.text().unwrap_or_default());
            if ruby && let Some(r) = syl.ruby() {
                let _ = write!(out, "({r})");
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
struct WordFilter<'a>(&'a [Syllable]);

impl Eligibility for WordFilter<'_> {
    fn is_eligible(&self, index: usize) -> bool {
        !self.0[index].is_linked()
    }
}

/// 行内的双向“词”游标。
#[derive(Debug, Clone)]
pub struct WordCursor<'a> {
    syllables: &'a [Syllable],
    cursor: SkipCursor<WordFilter<'a>>,
}

impl<'a> WordCursor<'a> {
    fn new(syllables: &'a [Syllable]) -> Self {
        Self {
            syllables,
            cursor: SkipCursor::new(syllables.len(), WordFilter(syllables)),
        }
    }

    fn merge(&self, index: usize) -> Syllable {
        let followers = self.syllables[index + 1..]
            .iter()
            .take_while(|syl| syl.is_linked());
        Syllable::combine(&self.syllables[index], followers)
    }

    pub const fn index(&self) -> isize {
        self.cursor.index()
    }

    pub const fn has_next(&self) -> bool {
        self.cursor.has_next()
    }

    pub const fn has_prev(&self) -> bool {
        self.cursor.has_prev()
    }

    pub const fn valid(&self) -> bool {
        self.cursor.valid()
    }

    pub fn peek(&self) -> Option<Syllable> {
        self.cursor.current().map(|i| self.merge(i))
    }

    /// 返回当前词，然后后退到上一个词。
    pub fn prev(&mut self) -> Option<Syllable> {
        self.cursor.retreat().map(|i| self.merge(i))
    }
}

impl Iterator for WordCursor<'_> {
    type Item = Syllable;

    fn next(&mut self) -> Option<Syllable> {
        self.cursor.advance().map(|i| self.merge(i))
    }
}

/// 单行的可见性状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineState {
    pub hidden: bool,
}

/// `hide`/`show` 的目标：连续的 `[start, end)` 区间或一组下标。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSelection {
    Range(Range<usize>),
    Indices(Vec<usize>),
}

impl From<Range<usize>> for LineSelection {
    fn from(range: Range<usize>) -> Self {
        Self::Range(range)
    }
}

impl From<Vec<usize>> for LineSelection {
    fn from(indices: Vec<usize>) -> Self {
        Self::Indices(indices)
    }
}

impl From<&[usize]> for LineSelection {
    fn from(indices: &[usize]) -> Self {
        Self::Indices(indices.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for LineSelection {
    fn from(indices: [usize; N]) -> Self {
        Self::Indices(indices.to_vec())
    }
}

/// 写成 `a-b`（闭区间）或逗号分隔的下标，与配置文件中 `Hide` 的格式一致。
impl fmt::Display for LineSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range(range) if range.is_empty() => Ok(()),
            Self::Range(range) => write!(f, "{}-{}", range.start, range.end - 1),
            Self::Indices(indices) => {
                for (k, i) in indices.iter().enumerate() {
                    if k > 0 {
                        f.write_char(',')?;
                    }
                    write!(f, "{i}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct VisibleFilter<'a>(&'a [LineState]);

impl Eligibility for VisibleFilter<'_> {
    fn is_eligible(&self, index: usize) -> bool {
        !self.0[index].hidden
    }
}

/// 字幕中可见行（对白）的双向游标。
#[derive(Debug, Clone)]
pub struct DialogueCursor<'a> {
    lines: &'a [Line],
    cursor: SkipCursor<VisibleFilter<'a>>,
}

impl<'a> DialogueCursor<'a> {
    pub const fn index(&self) -> isize {
        self.cursor.index()
    }

    pub const fn has_next(&self) -> bool {
        self.cursor.has_next()
    }

    pub const fn has_prev(&self) -> bool {
        self.cursor.has_prev()
    }

    pub const fn valid(&self) -> bool {
        self.cursor.valid()
    }

    pub fn peek(&self) -> Option<&'a Line> {
        self.cursor.current().map(|i| &self.lines[i])
    }

    pub fn prev(&mut self) -> Option<&'a Line> {
        self.cursor.retreat().map(|i| &self.lines[i])
    }
}

impl<'a> Iterator for DialogueCursor<'a> {
    type Item = &'a Line;

    fn next(&mut self) -> Option<&'a Line> {
        self.cursor.advance().map(|i| &self.lines[i])
    }
}

/// 行序列及与之一一对应的可见性状态。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtitle {
    lines: Vec<Line>,
    state: Vec<LineState>,
    ceiling: i64,
}

impl Default for Subtitle {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Subtitle {
    pub fn new(lines: Vec<Line>) -> Self {
        Self::with_ceiling(lines, DEFAULT_CEILING_MS)
    }

    pub fn with_ceiling(lines: Vec<Line>, ceiling: i64) -> Self {
        let state = vec![LineState::default(); lines.len()];
        Self {
            lines,
            state,
            ceiling,
        }
    }

    /// 从解析后的歌词构建字幕。
    ///
    /// 缺少结束时间的行以下一行的开始时间（最后一行则以 `ceiling`）作为结束；
    /// 没有内容的行被跳过。带多个注音的片段会拆成一个主音节加若干连接音节。
    pub fn from_lyric(lyric: &Lyric, ceiling: i64) -> Self {
        let n = lyric.lines.len();
        let mut lines = Vec::with_capacity(n);

        for (i, line) in lyric.lines.iter().enumerate() {
            let end = line.end.unwrap_or_else(|| {
                lyric
                    .lines
                    .get(i + 1)
                    .map_or(ceiling, |next_line| next_line.start)
            });
            if line.content.is_empty() {
                continue;
            }

            let mut syllables = Vec::with_capacity(line.content.len());
            for part in &line.content {
                let notation = |idx: usize| {
                    part.sup
                        .get(idx)
                        .map(|s| s.notation.clone())
                        .filter(|n| !n.is_empty())
                };
                if part.sup.len() > 1 {
                    let master = Syllable::new(part.start, Some(part.text.clone()), notation(0));
                    let slaves: Vec<Syllable> = part.sup[1..]
                        .iter()
                        .map(|s| Syllable::new(s.start, None, Some(s.notation.clone())))
                        .collect();
                    syllables.extend(Syllable::link(&master, &slaves));
                } else {
                    syllables.push(Syllable::new(
                        part.start,
                        Some(part.text.clone()),
                        notation(0),
                    ));
                }
            }
            lines.push(Line::new(line.start, end, syllables));
        }

        Self::with_ceiling(lines, ceiling)
    }

    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
        self.state.push(LineState::default());
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn visibility(&self) -> &[LineState] {
        &self.state
    }

    pub fn is_hidden(&self, index: usize) -> Option<bool> {
        self.state.get(index).map(|s| s.hidden)
    }

    /// 字幕的时长上限。
    pub const fn duration(&self) -> i64 {
        self.ceiling
    }

    /// 遍历所有未隐藏的行。
    pub fn dialogues(&self) -> DialogueCursor<'_> {
        DialogueCursor {
            lines: &self.lines,
            cursor: SkipCursor::new(self.lines.len(), VisibleFilter(&self.state)),
        }
    }

    pub fn count(&self, all: bool) -> usize {
        if all {
            self.lines.len()
        } else {
            self.dialogues().count()
        }
    }

    pub fn hide(&mut self, selection: impl Into<LineSelection>) {
        self.apply(&selection.into(), true);
    }

    pub fn show(&mut self, selection: impl Into<LineSelection>) {
        self.apply(&selection.into(), false);
    }

    fn apply(&mut self, selection: &LineSelection, hidden: bool) {
        let n = self.lines.len();
        match selection {
            LineSelection::Range(range) => {
                let start = range.start.min(n);
                let end = range.end.min(n).max(start);
                for state in &mut self.state[start..end] {
                    state.hidden = hidden;
                }
            }
            LineSelection::Indices(indices) => {
                for &i in indices {
                    if let Some(state) = self.state.get_mut(i) {
                        state.hidden = hidden;
                    } else {
                        log::debug!("[字幕模型] 忽略越界的行号 {i} (共 {n} 行)。");
                    }
                }
            }
        }
    }

    /// 按时间排序，可见性状态随行一起移动。
    pub fn sort(&mut self) {
        let mut paired: Vec<(Line, LineState)> = self
            .lines
            .drain(..)
            .zip(self.state.drain(..))
            .collect();
        paired.sort_by(|a, b| a.0.compare(&b.0));
        (self.lines, self.state) = paired.into_iter().unzip();
    }

    /// 以 (当前, 上一个, 下一个) 的形式遍历所有可见行。
    pub fn for_each_with_neighbors<'a, F>(&'a self, mut f: F)
    where
        F: FnMut(&'a Line, Option<&'a Line>, Option<&'a Line>),
    {
        let mut cur = self.dialogues();
        let mut prev = self.dialogues();
        let mut next = self.dialogues();
        prev.prev();
        next.next();
        while cur.valid() {
            let (c, p, n) = (cur.next(), prev.next(), next.next());
            if let Some(c) = c {
                f(c, p, n);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyric::{LyricLine, LyricPart};

    fn sample_line() -> Line {
        Line::new(
            1000,
            4000,
            vec![
                Syllable::annotated(1000, "明", "あ"),
                Syllable::linked(1200, "し"),
                Syllable::linked(1400, "た"),
                Syllable::plain(2000, "の"),
                Syllable::annotated(3000, "空", "そら"),
            ],
        )
    }

    #[test]
    fn test_word_iteration_merges_linked_ruby() {
        let line = sample_line();
        let words: Vec<Syllable> = line.words().collect();

        assert_eq!(words.len(), 3);
        assert_eq!(words[0].text(), Some("明"), "合并后文本保持主音节不变");
        assert_eq!(words[0].ruby(), Some("あした"), "注音应按顺序拼接");
        assert_eq!(words[0].start(), 1000);
        assert_eq!(words[1].text(), Some("の"));
        assert_eq!(words[1].ruby(), None);
        assert_eq!(words[2].ruby(), Some("そら"));
        assert_eq!(line.count(true), 3);
        assert_eq!(line.count(false), 5);
    }

    #[test]
    fn test_word_cursor_walks_backwards() {
        let line = sample_line();
        let mut cursor = line.words();
        cursor.next();
        cursor.next();
        assert_eq!(cursor.index(), 4);
        assert_eq!(cursor.prev().and_then(|w| w.text().map(String::from)), Some("空".into()));
        assert_eq!(cursor.index(), 3);
        assert_eq!(cursor.prev().map(|w| w.start()), Some(2000));
        assert_eq!(cursor.prev().and_then(|w| w.ruby().map(String::from)), Some("あした".into()));
        assert_eq!(cursor.index(), -1);
        assert!(!cursor.valid());
    }

    #[test]
    fn test_link_drops_empty_ruby() {
        let master = Syllable::annotated(0, "今", "い");
        let slaves = vec![
            Syllable::new(100, None, Some(String::new())),
            Syllable::linked(200, "ま"),
            Syllable::new(300, None, None),
        ];
        let linked = Syllable::link(&master, &slaves);

        assert_eq!(linked.len(), 2, "空注音的从属音节应被丢弃");
        assert_eq!(linked[0].text(), Some("今"));
        assert!(linked[1].is_linked());
        assert_eq!(linked[1].ruby(), Some("ま"));
        assert_eq!(linked[1].start(), 200);
    }

    #[test]
    fn test_line_drops_null_syllables() {
        let line = Line::new(
            0,
            1000,
            vec![Syllable::plain(0, "a"), Syllable::new(500, None, None)],
        );
        assert_eq!(line.syllables().len(), 1);
    }

    #[test]
    fn test_line_neighbors_walk() {
        let line = sample_line();
        let mut seen = Vec::new();
        line.for_each_with_neighbors(|cur, prev, next| {
            seen.push((
                cur.start(),
                prev.map(|p| p.start()),
                next.map(|n| n.start()),
            ));
        });
        assert_eq!(
            seen,
            vec![
                (1000, None, Some(2000)),
                (2000, Some(1000), Some(3000)),
                (3000, Some(2000), None),
            ]
        );
    }

    #[test]
    fn test_line_retime_and_adjust() {
        let mut line = sample_line();
        line.retime(-500, 200, None);
        assert_eq!(line.duration(), (500, 4200));

        line.retime(0, 300, Some(RetimeAnchor::Pre));
        assert_eq!(line.duration(), (500, 800), "pre 模式以开始时间为基准计算结束时间");

        line.retime(-100, 0, Some(RetimeAnchor::Post));
        assert_eq!(line.duration(), (700, 800), "post 模式以结束时间为基准计算开始时间");

        line.adjust(None, Some(5000));
        assert_eq!(line.duration(), (700, 5000));
    }

    #[test]
    fn test_line_inspect() {
        let line = sample_line();
        assert_eq!(
            line.inspect(true, true, false),
            "1.00->4.00 <5>: [1.00]明(あ) (し) (た) [2.00]の [3.00]空(そら)"
        );
        let empty = Line::new(0, 10, Vec::new());
        assert_eq!(empty.inspect(false, false, false), "0.00->0.01  <Empty>");
    }

    fn three_line_subtitle() -> Subtitle {
        Subtitle::new(
            (0..3)
                .map(|i| Line::new(i * 1000, i * 1000 + 800, vec![Syllable::plain(i * 1000, "x")]))
                .collect(),
        )
    }

    #[test]
    fn test_hide_single_index_skips_dialogue() {
        let mut sub = three_line_subtitle();
        sub.hide([1]);

        let starts: Vec<i64> = sub.dialogues().map(Line::start).collect();
        assert_eq!(starts, vec![0, 2000], "对白遍历应只产出第 0 和第 2 行");
        assert_eq!(sub.count(false), 2);
        assert_eq!(sub.count(true), 3);
    }

    #[test]
    fn test_hide_range_is_clamped() {
        let mut sub = three_line_subtitle();
        sub.hide(1..10);
        assert_eq!(sub.count(false), 1);

        sub.show(2..1);
        assert_eq!(sub.count(false), 1, "反向区间不应产生任何效果");

        sub.show(vec![2, 7]);
        assert_eq!(sub.is_hidden(2), Some(false));
        assert_eq!(sub.is_hidden(1), Some(true));
        assert_eq!(sub.is_hidden(7), None);
    }

    #[test]
    fn test_dialogue_cursor_starts_at_first_visible() {
        let mut sub = three_line_subtitle();
        sub.hide(0..2);
        let cursor = sub.dialogues();
        assert_eq!(cursor.index(), 2);
        assert_eq!(cursor.peek().map(Line::start), Some(2000));

        sub.hide([2]);
        assert_eq!(sub.dialogues().index(), 3);
        assert_eq!(sub.dialogues().next(), None);
    }

    #[test]
    fn test_subtitle_neighbors_skip_hidden() {
        let mut sub = three_line_subtitle();
        sub.push(Line::new(3000, 3800, vec![Syllable::plain(3000, "y")]));
        sub.hide([2]);

        let mut triples = Vec::new();
        sub.for_each_with_neighbors(|cur, prev, next| {
            triples.push((cur.start(), prev.map(Line::start), next.map(Line::start)));
        });
        assert_eq!(
            triples,
            vec![
                (0, None, Some(1000)),
                (1000, Some(0), Some(3000)),
                (3000, Some(1000), None),
            ]
        );
    }

    #[test]
    fn test_sort_keeps_visibility_aligned() {
        let mut sub = Subtitle::new(vec![
            Line::new(2000, 2500, vec![Syllable::plain(2000, "b")]),
            Line::new(1000, 1500, vec![Syllable::plain(1000, "a")]),
        ]);
        sub.hide([0]);
        sub.sort();

        assert_eq!(sub.lines()[0].start(), 1000);
        assert_eq!(sub.is_hidden(0), Some(false));
        assert_eq!(sub.is_hidden(1), Some(true), "隐藏状态应跟随原来的行");
    }

    #[test]
    fn test_from_lyric_fills_end_and_splits_sup() {
        let lyric = Lyric {
            lines: vec![
                LyricLine {
                    start: 1000,
                    end: None,
                    content: vec![
                        LyricPart::new(1000, Some(1500), "明日")
                            .with_sup(1000, Some(1200), "あ")
                            .with_sup(1200, Some(1500), "した"),
                        LyricPart::new(1500, Some(2000), "へ"),
                    ],
                },
                LyricLine {
                    start: 3000,
                    end: None,
                    content: Vec::new(),
                },
                LyricLine {
                    start: 5000,
                    end: None,
                    content: vec![LyricPart::new(5000, None, "空").with_sup(5000, None, "そら")],
                },
            ],
            metadata: Vec::new(),
        };

        let sub = Subtitle::from_lyric(&lyric, 60_000);
        assert_eq!(sub.count(true), 2, "没有内容的行应被跳过");
        assert_eq!(sub.lines()[0].duration(), (1000, 3000), "结束时间取下一行的开始时间");
        assert_eq!(sub.lines()[1].duration(), (5000, 60_000), "最后一行使用上限");

        let syllables = sub.lines()[0].syllables();
        assert_eq!(syllables.len(), 3);
        assert_eq!(syllables[0].ruby(), Some("あ"));
        assert!(syllables[1].is_linked());
        assert_eq!(syllables[1].ruby(), Some("した"));
        assert_eq!(sub.lines()[1].syllables()[0].ruby(), Some("そら"));
    }
}
