use crate::karaoke::Karaoke;
use crate::render::Paragraph;

use super::{Pass, PassEnv};

/// 整体平移所有行的时间。正值使歌词提前。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignOffset {
    pub offset: i64,
}

impl AlignOffset {
    pub const fn new(offset: i64) -> Self {
        Self { offset }
    }
}

pub fn align_offset(paragraphs: &mut [Paragraph], offset: i64) {
    for line in paragraphs.iter_mut().flat_map(|p| p.lines.iter_mut()) {
        line.offset(offset);
    }
}

impl Pass for AlignOffset {
    fn name(&self) -> &str {
        "Align offset to lines"
    }

    fn execute(&self, karaoke: &mut Karaoke, env: &dyn PassEnv) {
        if self.offset != 0 {
            env.debug(&format!("[偏移] 所有行平移 {}ms", self.offset));
        }
        align_offset(karaoke.paragraphs_mut(), self.offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderedLine;

    fn paragraphs() -> Vec<Paragraph> {
        vec![
            Paragraph::new(vec![
                RenderedLine::new(1000, 2000, "a"),
                RenderedLine::new(2100, 3000, "b"),
            ]),
            Paragraph::new(vec![RenderedLine::new(-300, 40, "c")]),
        ]
    }

    #[test]
    fn test_offsets_compose() {
        for (a, b) in [(250, 750), (-400, 100), (0, -1234), (333, 333)] {
            let mut twice = paragraphs();
            align_offset(&mut twice, a);
            align_offset(&mut twice, b);

            let mut once = paragraphs();
            align_offset(&mut once, a + b);

            assert_eq!(twice, once, "先偏移 {a} 再偏移 {b} 应等价于一次偏移 {}", a + b);
        }
    }

    #[test]
    fn test_positive_offset_advances() {
        let mut ps = paragraphs();
        align_offset(&mut ps, 500);
        assert_eq!((ps[0].lines[0].start, ps[0].lines[0].end), (500, 1500));
        assert_eq!(ps[1].lines[0].lead, 0, "偏移不改变 lead");
    }
}
