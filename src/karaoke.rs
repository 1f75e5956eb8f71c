//! # 卡拉OK 引擎
//!
//! 持有按段落切分的渲染行，按顺序执行 pass，并输出带卡拉OK模板的 ASS 文档。
//!
//! 输出中的模板注释行（`code`、`template syl` 等）供 Aegisub 的卡拉OK模板器使用，
//! 每一行歌词本身以 `karaoke` 特效的 `Comment` 事件写出。

use std::fmt::{self, Write as _};

use once_cell::sync::Lazy;

use crate::ass::{EventLine, EventType, Margins, RenderedAss, V4PlusStyle, ass_color, format_time};
use crate::config::{KaraokeConfig, KaraokeConfigOverride, Retime, RetimePair};
use crate::error::Result;
use crate::passes::{LogEnv, Pass, PassEnv};
use crate::render::{Paragraph, RenderedLine, centiseconds, divide_paragraphs, render_subtitle};
use crate::subtitle::{Subtitle, seconds_fixed};

pub const STYLE_K1: &str = "K1";
pub const STYLE_K2: &str = "K2";
pub const STYLE_K1_FURIGANA: &str = "K1-furigana";
pub const STYLE_K2_FURIGANA: &str = "K2-furigana";

static STYLE_PRESETS: Lazy<Vec<V4PlusStyle>> = Lazy::new(|| {
    [
        "Style: K1,Noto Serif CJK SC Black,130,&H00FFFFFF,&H00FFFFFF,&H00000000,&H80000000,0,0,0,0,100,100,0,0,1,4,0,1,120,30,220,1",
        "Style: K2,Noto Serif CJK SC Black,130,&H00FFFFFF,&H00FFFFFF,&H00000000,&H80000000,0,0,0,0,100,100,0,0,1,4,0,3,30,120,40,1",
        "Style: K1-furigana,Noto Serif CJK SC Black,60,&H00FFFFFF,&H00FFFFFF,&H00000000,&H80000000,0,0,0,0,100,100,0,0,1,2,0,1,200,30,150,1",
        "Style: K2-furigana,Noto Serif CJK SC Black,60,&H00FFFFFF,&H00FFFFFF,&H00000000,&H80000000,0,0,0,0,100,100,0,0,1,2,0,3,30,200,40,1",
    ]
    .iter()
    .map(|s| V4PlusStyle::parse(s).expect("未能解析内置样式预设"))
    .collect()
});

const OVERLAY_FALLBACK: RetimePair = (-100, 500);
const BASE_FALLBACK: RetimePair = (-500, 500);

/// 模板器注释行：(layer, name, effect, text)。
fn code_templates(color: &str) -> [(i32, &'static str, &'static str, String); 6] {
    let overlay = |pos: &str| {
        format!(
            "{{\\pos({pos})\\an5\\shad0\\1c{color}\\3c&HFFFFFF&\\clip(!$sleft-3!,0,!$sleft-3!,1080)\\t($sstart,$send,\\clip(!$sleft-3!,0,!$sright+3!,1080))\\bord5}}"
        )
    };
    [
        (0, "", "code syl all", "fxgroup.kara=syl.inline_fx==\"\"".to_string()),
        (1, "overlay", "template syl noblank all fxgroup kara", overlay("$center,$middle")),
        (0, "", "template syl all fxgroup kara", "{\\pos($center,$middle)\\an5}".to_string()),
        (1, "overlay", "template furi all", overlay("$center,!$middle+10!")),
        (0, "", "template furi all", "{\\pos($center,!$middle+10!)\\an5}".to_string()),
        (
            0,
            "music",
            "template fx no_k",
            "{\\pos($center,!$middle!)\\an5\\1c&H505050&\\3c&HFFFFFFF&}".to_string(),
        ),
    ]
}

/// 生成六条模板注释行，没有 retime 配置时使用内置回退值。
fn code_presets(color: [i32; 3], retime: Option<&Retime>) -> Vec<EventLine> {
    let (overlay, base, nok) = retime.map_or(
        (OVERLAY_FALLBACK, BASE_FALLBACK, BASE_FALLBACK),
        |r| (r.overlay, r.base, r.nok.unwrap_or(r.base)),
    );
    let pairs = [None, Some(overlay), Some(base), Some(overlay), Some(base), Some(nok)];
    let [r, g, b] = color.map(f64::from);
    let color = ass_color(r, g, b, None);

    code_templates(&color)
        .into_iter()
        .zip(pairs)
        .map(|((layer, name, effect, text), pair)| {
            let prefix = pair.map_or_else(String::new, |(lead, lag)| {
                format!("!retime(\"line\",{lead},{lag})!")
            });
            EventLine {
                event_type: EventType::Comment,
                layer,
                start: 0,
                end: 0,
                style: STYLE_K1.to_string(),
                name: name.to_string(),
                margins: Margins::default(),
                effect: effect.to_string(),
                text: prefix + &text,
            }
        })
        .collect()
}

fn karaoke_event(line: &RenderedLine, style: &str) -> EventLine {
    let mut text = String::with_capacity(line.text.len() + 8);
    if line.lead != 0 {
        let _ = write!(text, "{{\\k{}}}", centiseconds(line.lead));
    }
    text.push_str(&line.text);
    EventLine {
        event_type: EventType::Comment,
        layer: 0,
        start: line.start,
        end: line.end,
        style: style.to_string(),
        name: String::new(),
        margins: Margins::default(),
        effect: "karaoke".to_string(),
        text,
    }
}

pub struct Karaoke {
    paragraphs: Vec<Paragraph>,
    config: KaraokeConfig,
    passes: Vec<Box<dyn Pass>>,
}

impl fmt::Debug for Karaoke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Karaoke")
            .field("paragraphs", &self.paragraphs)
            .field("config", &self.config)
            .field(
                "passes",
                &self.passes.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Karaoke {
    /// 把用户配置合并到默认值上，然后渲染并切分段落。
    pub fn new(subtitle: &Subtitle, config: KaraokeConfigOverride) -> Self {
        Self::with_config(subtitle, KaraokeConfig::from_override(config))
    }

    pub fn with_config(subtitle: &Subtitle, config: KaraokeConfig) -> Self {
        let lines = render_subtitle(subtitle, config.furigana);
        log::debug!(
            "[卡拉OK] 渲染了 {} 行 (注音模式: {})",
            lines.len(),
            config.furigana
        );
        Self::from_lines(lines, config)
    }

    pub fn from_lines(lines: Vec<RenderedLine>, config: KaraokeConfig) -> Self {
        let paragraphs = divide_paragraphs(lines, config.interval);
        Self {
            paragraphs,
            config,
            passes: Vec::new(),
        }
    }

    pub fn time(ms: i64) -> String {
        format_time(ms)
    }

    pub fn parse_time(time: &str) -> Result<i64> {
        crate::ass::parse_time(time)
    }

    pub fn lines(&self) -> impl Iterator<Item = &RenderedLine> {
        self.paragraphs.iter().flat_map(|p| p.lines.iter())
    }

    pub fn lines_mut(&mut self) -> impl Iterator<Item = &mut RenderedLine> {
        self.paragraphs.iter_mut().flat_map(|p| p.lines.iter_mut())
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn paragraphs_mut(&mut self) -> &mut [Paragraph] {
        &mut self.paragraphs
    }

    pub const fn config(&self) -> &KaraokeConfig {
        &self.config
    }

    pub const fn config_mut(&mut self) -> &mut KaraokeConfig {
        &mut self.config
    }

    pub fn register(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    pub fn registered(&self) -> impl Iterator<Item = &str> {
        self.passes.iter().map(|p| p.name())
    }

    /// 依次执行给定的 pass；列表为空时执行已注册的 pass。
    pub fn exec(&mut self, passes: &[&dyn Pass]) {
        self.exec_with(passes, &LogEnv);
    }

    pub fn exec_with(&mut self, passes: &[&dyn Pass], env: &dyn PassEnv) {
        if passes.is_empty() {
            let registered = std::mem::take(&mut self.passes);
            for pass in &registered {
                self.run(pass.as_ref(), env);
            }
            let added = std::mem::replace(&mut self.passes, registered);
            self.passes.extend(added);
        } else {
            for pass in passes {
                self.run(*pass, env);
            }
        }
    }

    fn run(&mut self, pass: &dyn Pass, env: &dyn PassEnv) {
        env.log(&format!("[卡拉OK] 正在执行 '{}'...", pass.name()));
        pass.execute(self, env);
    }

    /// 逐段列出每行的时间、引导时间与文本，段落之间以 `---` 分隔。
    pub fn inspect(&self) -> String {
        let mut out = String::new();
        for (i, paragraph) in self.paragraphs.iter().enumerate() {
            if i > 0 {
                out.push_str("---\n");
            }
            for line in &paragraph.lines {
                let _ = writeln!(
                    out,
                    "{} -> {}: wait={} {}",
                    format_time(line.start),
                    format_time(line.end),
                    seconds_fixed(line.lead),
                    line.text
                );
            }
        }
        out
    }

    /// 输出 ASS 文档：四个样式预设、六条模板注释行，然后每个渲染行一条事件。
    /// 段内偶数行使用 K1，奇数行使用 K2。
    pub fn to_ass(&self) -> RenderedAss {
        let mut events = code_presets(self.config.color, self.config.retime.as_ref());
        for paragraph in &self.paragraphs {
            for (i, line) in paragraph.lines.iter().enumerate() {
                let style = if i % 2 == 1 { STYLE_K2 } else { STYLE_K1 };
                events.push(karaoke_event(line, style));
            }
        }

        let mut ass = RenderedAss::new(self.config.resolution, STYLE_PRESETS.clone(), events);
        ass.title.clone_from(&self.config.title);
        ass
    }
}

#[cfg(test)]
mod tests {
    use log::Level;

    use super::*;
    use crate::config::{FuriganaMode, LeadInMode, LeadInOptions};
    use crate::passes::testing::RecordingEnv;
    use crate::passes::{AlignOffset, KillNegative, LeadIn};
    use crate::subtitle::{Line, Syllable};

    fn subtitle() -> Subtitle {
        Subtitle::new(vec![
            Line::new(1000, 3000, vec![Syllable::plain(1000, "a"), Syllable::plain(2000, "b")]),
            Line::new(3500, 5000, vec![Syllable::plain(3500, "c")]),
            Line::new(9000, 10_000, vec![Syllable::annotated(9000, "空", "そら")]),
        ])
    }

    #[test]
    fn test_new_renders_and_divides() {
        let kara = Karaoke::new(&subtitle(), KaraokeConfigOverride::default());
        let sizes: Vec<usize> = kara.paragraphs().iter().map(Paragraph::len).collect();
        assert_eq!(sizes, vec![2, 1]);
        assert_eq!(kara.lines().count(), 3);
        assert_eq!(kara.lines().next().map(|l| l.text.as_str()), Some("{\\kf100}a|<{\\kf100}b|<"));
    }

    #[test]
    fn test_exec_runs_passes_in_order() {
        let mut kara = Karaoke::new(&subtitle(), KaraokeConfigOverride::default());
        let env = RecordingEnv::default();
        kara.exec_with(&[&AlignOffset::new(2000), &KillNegative], &env);

        let first = kara.lines().next().cloned().unwrap_or_else(|| RenderedLine::new(-1, -1, ""));
        assert_eq!((first.start, first.end), (0, 1000), "偏移后再修正负时间");
        assert_eq!(env.count(Level::Info), 2, "每个 pass 都应记录名称");
        assert!(env.entries.borrow()[0].1.contains("Align offset to lines"));
    }

    #[test]
    fn test_exec_without_list_uses_registered() {
        let mut kara = Karaoke::new(&subtitle(), KaraokeConfigOverride::default());
        kara.register(AlignOffset::new(-500));
        kara.register(AlignOffset::new(-500));
        kara.exec(&[]);

        assert_eq!(kara.lines().next().map(|l| l.start), Some(2000));
        assert_eq!(kara.registered().count(), 2, "执行后注册列表保持不变");
    }

    #[test]
    fn test_to_ass_events() {
        let mut kara = Karaoke::new(&subtitle(), KaraokeConfigOverride::default());
        if let Some(line) = kara.lines_mut().nth(1) {
            line.lead = 1234;
        }
        let ass = kara.to_ass();

        let names: Vec<&str> = ass.styles.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![STYLE_K1, STYLE_K2, STYLE_K1_FURIGANA, STYLE_K2_FURIGANA]);
        assert_eq!(ass.events.len(), 6 + 3);

        let karaoke: Vec<&EventLine> = ass.events.iter().skip(6).collect();
        assert!(karaoke.iter().all(|e| e.effect == "karaoke" && e.event_type == EventType::Comment));
        assert_eq!(karaoke[0].style, STYLE_K1);
        assert_eq!(karaoke[1].style, STYLE_K2);
        assert_eq!(karaoke[2].style, STYLE_K1, "新段落重新从 K1 开始");
        assert_eq!(karaoke[1].text, "{\\k123}{\\kf150}c|<");
        assert_eq!(karaoke[2].text, "{\\kf100}空|<そら");
    }

    #[test]
    fn test_code_presets_use_color_and_retime() {
        let kara = Karaoke::new(
            &subtitle(),
            KaraokeConfigOverride {
                color: Some([255, 162, 40]),
                ..Default::default()
            },
        );
        let ass = kara.to_ass();
        let code: Vec<&EventLine> = ass.events.iter().take(6).collect();

        assert_eq!(code[0].effect, "code syl all");
        assert_eq!(code[0].text, "fxgroup.kara=syl.inline_fx==\"\"");
        assert_eq!(code[1].name, "overlay");
        assert_eq!(code[1].layer, 1);
        assert!(code[1].text.starts_with("!retime(\"line\",0,0)!{\\pos($center,$middle)\\an5\\shad0\\1c&H28A2FF&"));
        assert_eq!(code[4].text, "!retime(\"line\",0,0)!{\\pos($center,!$middle+10!)\\an5}");
        assert_eq!(code[5].name, "music");
        assert_eq!(
            code[5].to_string(),
            "Comment: 0,0:00:00.00,0:00:00.00,K1,music,0,0,0,template fx no_k,!retime(\"line\",0,0)!{\\pos($center,!$middle!)\\an5\\1c&H505050&\\3c&HFFFFFFF&}"
        );
    }

    #[test]
    fn test_code_presets_fallback_without_retime() {
        let kara = Karaoke::new(
            &subtitle(),
            KaraokeConfigOverride {
                retime: Some(None),
                ..Default::default()
            },
        );
        let ass = kara.to_ass();
        let prefixes: Vec<String> = ass
            .events
            .iter()
            .take(6)
            .map(|e| e.text.split('{').next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(prefixes[0], "fxgroup.kara=syl.inline_fx==\"\"");
        assert_eq!(prefixes[1], "!retime(\"line\",-100,500)!");
        assert_eq!(prefixes[2], "!retime(\"line\",-500,500)!");
        assert_eq!(prefixes[3], "!retime(\"line\",-100,500)!");
        assert_eq!(prefixes[5], "!retime(\"line\",-500,500)!");
        assert!(ass.events[1].text.contains("\\1c&HFF0000&"), "默认颜色为蓝色");
    }

    #[test]
    fn test_inspect_separates_paragraphs() {
        let kara = Karaoke::new(&subtitle(), KaraokeConfigOverride::default());
        let dump = kara.inspect();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "0:00:01.00 -> 0:00:03.00: wait=0.00 {\\kf100}a|<{\\kf100}b|<");
        assert_eq!(lines[2], "---");
    }

    #[test]
    fn test_kill_negative_trims_gap_before_first_syllable() {
        let sub = Subtitle::new(vec![Line::new(1000, 3000, vec![Syllable::plain(1300, "a")])]);
        let mut kara = Karaoke::new(
            &sub,
            KaraokeConfigOverride {
                furigana: Some(FuriganaMode::None),
                ..Default::default()
            },
        );
        let lead_in = LeadIn::new(LeadInOptions {
            mode: LeadInMode::DoubleChannel,
            extend: 800,
            extend2: 1000,
        });
        kara.exec(&[&lead_in, &AlignOffset::new(1100), &KillNegative]);

        let line = kara.lines().next().cloned().unwrap_or_else(|| RenderedLine::new(-1, -1, ""));
        assert_eq!((line.start, line.end, line.lead), (0, 2700, 200));
        // 音节应在 1300 - 1100 = 200ms 处开始
        let ass = kara.to_ass();
        assert_eq!(ass.events[6].text, "{\\k20}{\\kf170}a");
    }

    #[test]
    fn test_time_helpers() {
        assert_eq!(Karaoke::time(83_450), "0:01:23.45");
        assert_eq!(Karaoke::parse_time("0:01:23.45").ok(), Some(83_450));
    }
}
