use crate::karaoke::Karaoke;
use crate::render::RenderedLine;

use super::{Pass, PassEnv};

/// 修正引导后出现的负时间。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KillNegative;

/// 开始时间为负时从 `lead` 中扣除被截掉的部分（不低于 0）并把开始时间置 0，
/// 之后保证 `end >= start`。
pub fn kill_negative(line: &mut RenderedLine) {
    let cut = -line.start;
    if cut > 0 {
        line.lead = (line.lead - cut).max(0);
        line.start = 0;
    }
    line.end = line.end.max(line.start);
}

impl Pass for KillNegative {
    fn name(&self) -> &str {
        "Kill negative time-tags"
    }

    fn description(&self) -> Option<&str> {
        Some("Replace negative time-tags that caused by lead-in.")
    }

    fn execute(&self, karaoke: &mut Karaoke, env: &dyn PassEnv) {
        let mut fixed = 0usize;
        for line in karaoke.lines_mut() {
            if line.start < 0 || line.end < line.start {
                fixed += 1;
            }
            kill_negative(line);
        }
        if fixed > 0 {
            env.debug(&format!("[负时间修正] 修正了 {fixed} 行"));
        }
    }
}
