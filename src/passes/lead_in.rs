//! 自动引导：把行间的空白转化为下一行的引导动画时间。

use crate::config::{LeadInMode, LeadInOptions, LeadInOverride};
use crate::karaoke::Karaoke;
use crate::render::Paragraph;

use super::{Pass, PassEnv};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeadIn {
    options: LeadInOptions,
}

impl LeadIn {
    pub const fn new(options: LeadInOptions) -> Self {
        Self { options }
    }

    pub fn from_override(ov: LeadInOverride) -> Self {
        Self::new(LeadInOptions::default().merge(ov))
    }

    pub const fn options(&self) -> &LeadInOptions {
        &self.options
    }
}

impl Pass for LeadIn {
    fn name(&self) -> &str {
        "Karaoke auto lead-in"
    }

    fn execute(&self, karaoke: &mut Karaoke, env: &dyn PassEnv) {
        let LeadInOptions {
            mode,
            extend,
            extend2,
        } = self.options;
        env.debug(&format!(
            "[引导] 模式 {mode}，extend={extend}ms，extend2={extend2}ms"
        ));
        for paragraph in karaoke.paragraphs_mut() {
            match mode {
                LeadInMode::Standard => standard_lead_in(paragraph, env),
                LeadInMode::DoubleChannel => double_channel_lead_in(paragraph, extend, extend2),
            }
        }
    }
}

/// 单通道引导：正的行间隔被并入后一行的 `lead`，其开始时间提前到上一行结束。
pub fn standard_lead_in(paragraph: &mut Paragraph, env: &dyn PassEnv) {
    let lines = &mut paragraph.lines;
    let mut min_gap: Option<i64> = None;

    for i in 1..lines.len() {
        let (head, tail) = lines.split_at_mut(i);
        let prev = &head[i - 1];
        let cur = &mut tail[0];

        let gap = cur.start - prev.end;
        if gap > 0 {
            min_gap = Some(min_gap.map_or(gap, |m| m.min(gap)));
            cur.start = prev.end;
            cur.lead += gap;
        } else {
            env.warn(&format!(
                "[引导] 两行之间的间隔为零或负数 ({gap}ms): '{}' / '{}'",
                prev.text, cur.text
            ));
        }
    }

    if let Some(gap) = min_gap {
        env.debug(&format!("[引导] 段落内最小间隔 {gap}ms"));
    }
}

/// 双通道引导：偶数行与奇数行各维护一条边界，交替占用两个显示通道。
///
/// 偶数行 `i` 的结束时间由 `i + 2` 行的开始（不存在时取 `i + 1` 行的结束，
/// 再不存在取自身结束）推算；奇数行顺延 `extend2`。
pub fn double_channel_lead_in(paragraph: &mut Paragraph, extend: i64, extend2: i64) {
    let lines = &mut paragraph.lines;
    let n = lines.len();
    if n == 0 {
        return;
    }

    let mut l1 = lines[0].start - extend;
    let mut l2 = l1;

    for i in (0..n).step_by(2) {
        let successor_start = lines.get(i + 2).map(|l| l.start);
        let neighbor_end = lines.get(i + 1).map(|l| l.end);
        let cur = &mut lines[i];

        cur.lead += cur.start - l1;
        cur.start = l1;
        l1 = -extend + successor_start.or(neighbor_end).unwrap_or(cur.end);
        l1 += extend
            + if successor_start.is_some() {
                -extend
            } else if neighbor_end.is_some() {
                extend2
            } else {
                extend
            };
        cur.end = l1;
    }

    for cur in lines.iter_mut().skip(1).step_by(2) {
        cur.lead += cur.start - l2;
        cur.start = l2;
        cur.end += extend2;
        l2 = cur.end;
    }
}
