//! 从歌词文件到卡拉OK ASS 文档的完整转换流程。

use std::fs;
use std::path::{Path, PathBuf};

use crate::ass::RenderedAss;
use crate::config::{KaraokeConfigOverride, LeadInOverride};
use crate::decoder::{DecoderCommand, decode_container, extract_lyric_content};
use crate::error::Result;
use crate::karaoke::{Karaoke, STYLE_K1, STYLE_K1_FURIGANA, STYLE_K2, STYLE_K2_FURIGANA};
use crate::lrc::parse_lrc;
use crate::lyric::Lyric;
use crate::passes::{AlignOffset, KillNegative, LeadIn};
use crate::qrc::{parse_qrc, to_enhanced_lrc};
use crate::settings::{FontSizes, Settings};
use crate::subtitle::{DEFAULT_CEILING_MS, LineSelection, Subtitle};

/// 转换流程使用的段落间隔，比引擎默认值宽松。
pub const DEFAULT_CONVERT_INTERVAL_MS: i64 = 1800;

/// 支持的歌词文件类型，按扩展名识别。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricSource {
    Lrc,
    Qrc,
}

impl LyricSource {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("lrc") {
            Some(Self::Lrc)
        } else if ext.eq_ignore_ascii_case("qrc") {
            Some(Self::Qrc)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertOptions {
    pub input: PathBuf,
    /// 写入 `[Aegisub Project Garbage]` 的音视频文件。
    pub media: Option<String>,
    /// 缺省时为输入文件换成 `.ass` 扩展名。
    pub output: Option<PathBuf>,
    /// 在日志中输出段落检查结果。
    pub view: bool,
    pub hidden_lines: Vec<LineSelection>,
    pub karaoke: KaraokeConfigOverride,
    /// 毫秒，正值使歌词提前。
    pub offset: i64,
    pub font_sizes: Option<FontSizes>,
    pub lead_in: LeadInOverride,
    pub decoder: Option<DecoderCommand>,
    /// 把 QRC 内容另存为增强 LRC。
    pub lrc_dump: Option<PathBuf>,
}

impl ConvertOptions {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    /// 以配置文件中的设置作为初始值。
    pub fn from_settings(input: impl Into<PathBuf>, settings: &Settings) -> Self {
        Self {
            input: input.into(),
            view: settings.inspect.unwrap_or(false),
            hidden_lines: settings.hidden_lines.clone(),
            karaoke: settings.karaoke.clone(),
            offset: settings.offset.unwrap_or(0),
            font_sizes: settings.font_sizes,
            lead_in: settings.lead_in,
            decoder: settings.decoder.clone(),
            ..Self::default()
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("ass"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertReport {
    pub output: PathBuf,
    /// 输出的卡拉OK行数（不含隐藏行）。
    pub lines: usize,
    pub paragraphs: usize,
    pub hidden: usize,
}

/// 读取 QRC 文件并得到 QRC 文本。
///
/// 有解码器时把文件当作加密容器交给解码器；否则按 UTF-8 读取，
/// 内容是 QRC XML 时取出其中的 `LyricContent`。
pub fn read_qrc_text(path: &Path, decoder: Option<&DecoderCommand>) -> Result<String> {
    let bytes = fs::read(path)?;
    if let Some(decoder) = decoder {
        return Ok(decode_container(&bytes, decoder));
    }

    let Ok(text) = String::from_utf8(bytes) else {
        log::error!(
            "[转换] {} 不是文本文件，可能是加密的 QRC，请配置解码器。",
            path.display()
        );
        return Ok(String::new());
    };
    if text.contains("LyricContent") {
        return Ok(extract_lyric_content(&text).unwrap_or_else(|| {
            log::warn!("[转换] {} 中没有找到 LyricContent。", path.display());
            String::new()
        }));
    }
    Ok(text)
}

fn load(path: &Path, decoder: Option<&DecoderCommand>, lrc_dump: Option<&Path>) -> Result<Lyric> {
    match LyricSource::from_path(path) {
        Some(LyricSource::Lrc) => {
            if lrc_dump.is_some() {
                log::warn!("[转换] 输入已经是 LRC，忽略 LRC 导出。");
            }
            Ok(parse_lrc(&fs::read_to_string(path)?))
        }
        Some(LyricSource::Qrc) => {
            let qrc = read_qrc_text(path, decoder)?;
            if let Some(dump) = lrc_dump {
                fs::write(dump, to_enhanced_lrc(&qrc)?)?;
                log::info!("[转换] 已导出增强 LRC: {}", dump.display());
            }
            Ok(parse_qrc(&qrc))
        }
        None => {
            log::warn!("[转换] 不支持的歌词文件类型: {}", path.display());
            Ok(Lyric::default())
        }
    }
}

/// 按扩展名加载歌词文件。不支持的类型返回空歌词。
pub fn load_lyric(path: &Path, decoder: Option<&DecoderCommand>) -> Result<Lyric> {
    load(path, decoder, None)
}

fn apply_font_sizes(ass: &mut RenderedAss, sizes: FontSizes) {
    let mut styles = ass.style_map_mut();
    for (name, size) in [
        (STYLE_K1, sizes.lyric),
        (STYLE_K2, sizes.lyric),
        (STYLE_K1_FURIGANA, sizes.furigana),
        (STYLE_K2_FURIGANA, sizes.furigana),
    ] {
        if let Some(style) = styles.get_mut(name) {
            style.font.size = size;
        }
    }
}

/// 转换结果与统计。
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedDocument {
    pub ass: RenderedAss,
    pub lines: usize,
    pub paragraphs: usize,
    pub hidden: usize,
}

/// 把已加载的歌词转换为 ASS 文档。
pub fn convert_lyric(lyric: &Lyric, options: &ConvertOptions) -> ConvertedDocument {
    if lyric.is_empty() {
        log::warn!("[转换] 没有可转换的歌词，输出的文档不含卡拉OK行。");
    }

    let mut subtitle = Subtitle::from_lyric(lyric, DEFAULT_CEILING_MS);
    let total = subtitle.count(true);
    for selection in &options.hidden_lines {
        match selection {
            LineSelection::Range(range) if range.end > total => log::warn!(
                "[转换] 要隐藏的行 {selection} 超出范围（共 {total} 行），超出部分已忽略。"
            ),
            LineSelection::Indices(indices) => {
                for i in indices.iter().filter(|&&i| i >= total) {
                    log::warn!("[转换] 要隐藏的行 {i} 不存在（共 {total} 行），已忽略。");
                }
            }
            LineSelection::Range(_) => {}
        }
        subtitle.hide(selection.clone());
    }
    let hidden = total - subtitle.count(false);

    let mut config = options.karaoke.clone();
    config.interval = config.interval.or(Some(DEFAULT_CONVERT_INTERVAL_MS));
    if config.title.is_none() {
        config.title = lyric
            .metadata_value("ti")
            .map(String::from)
            .or_else(|| {
                options
                    .input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
            });
    }
    let mut karaoke = Karaoke::new(&subtitle, config);

    if options.view {
        log::info!("[转换] 段落检查:\n{}", karaoke.inspect());
    }

    karaoke.register(LeadIn::from_override(options.lead_in));
    karaoke.register(AlignOffset::new(options.offset));
    karaoke.register(KillNegative);
    karaoke.exec(&[]);

    if let Some(color) = options.karaoke.color {
        karaoke.config_mut().color = color;
    }
    let mut ass = karaoke.to_ass();
    if let Some(sizes) = options.font_sizes {
        apply_font_sizes(&mut ass, sizes);
    }
    if let Some(media) = &options.media {
        ass.add_aegisub_info(media, media);
    }

    ConvertedDocument {
        ass,
        lines: karaoke.lines().count(),
        paragraphs: karaoke.paragraphs().len(),
        hidden,
    }
}

/// 读取输入、转换并写出 ASS 文件。
pub fn convert(options: &ConvertOptions) -> Result<ConvertReport> {
    log::info!("[转换] 读取歌词: {}", options.input.display());
    let lyric = load(
        &options.input,
        options.decoder.as_ref(),
        options.lrc_dump.as_deref(),
    )?;

    let ConvertedDocument {
        ass,
        lines,
        paragraphs,
        hidden,
    } = convert_lyric(&lyric, options);
    let output = options.output_path();
    fs::write(&output, ass.render()?)?;
    log::info!(
        "[转换] 已写出 {}：{lines} 行，{paragraphs} 个段落。",
        output.display()
    );

    Ok(ConvertReport {
        output,
        lines,
        paragraphs,
        hidden,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ass::EventType;
    use crate::lyric::{LyricLine, LyricPart};

    fn lyric() -> Lyric {
        let line = |start: i64, text: &str| LyricLine {
            start,
            end: Some(start + 1000),
            content: vec![LyricPart::new(start, Some(start + 1000), text)],
        };
        Lyric {
            lines: vec![line(1000, "a"), line(2500, "b"), line(9000, "c")],
            metadata: vec![("ti".to_string(), "Song".to_string())],
        }
    }

    fn karaoke_events(ass: &RenderedAss) -> Vec<&str> {
        ass.events
            .iter()
            .filter(|e| e.effect == "karaoke")
            .map(|e| e.text.as_str())
            .collect()
    }

    #[test]
    fn test_source_from_extension() {
        assert_eq!(LyricSource::from_path(Path::new("a.LRC")), Some(LyricSource::Lrc));
        assert_eq!(LyricSource::from_path(Path::new("dir/b.qrc")), Some(LyricSource::Qrc));
        assert_eq!(LyricSource::from_path(Path::new("c.txt")), None);
        assert_eq!(LyricSource::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_convert_lyric_uses_wide_interval_and_title() {
        let options = ConvertOptions::new("song.qrc");
        let ConvertedDocument {
            ass,
            lines,
            paragraphs,
            hidden,
        } = convert_lyric(&lyric(), &options);
        assert_eq!((lines, hidden), (3, 0));
        assert_eq!(paragraphs, 2, "1800ms 间隔下前两行属于同一段");
        assert_eq!(ass.title, "Song");
        assert_eq!(karaoke_events(&ass).len(), 3);
        assert!(ass.events.iter().all(|e| e.event_type == EventType::Comment));
    }

    #[test]
    fn test_convert_lyric_hides_and_resizes() {
        let mut options = ConvertOptions::new("song.qrc");
        options.hidden_lines = vec![LineSelection::Indices(vec![1, 42])];
        options.font_sizes = Some(FontSizes { lyric: 90.0, furigana: 45.0 });
        options.media = Some("song.mp4".to_string());

        let doc = convert_lyric(&lyric(), &options);
        assert_eq!((doc.lines, doc.hidden), (2, 1), "越界的行号应被忽略");
        // 两行各自成段，双通道引导为每行加上 800ms 引导
        assert_eq!(
            karaoke_events(&doc.ass),
            vec!["{\\k80}{\\kf100}a|<", "{\\k80}{\\kf100}c|<"]
        );
        let ass = doc.ass;

        let sizes: Vec<f64> = ass.styles.iter().map(|s| s.font.size).collect();
        assert_eq!(sizes, vec![90.0, 90.0, 45.0, 45.0]);
        assert!(!ass.addons.is_empty());
    }

    #[test]
    fn test_convert_lyric_hides_large_range() {
        let mut options = ConvertOptions::new("song.qrc");
        options.hidden_lines = vec![LineSelection::Range(1..50_000_001)];

        let doc = convert_lyric(&lyric(), &options);
        assert_eq!((doc.lines, doc.hidden), (1, 2), "区间被截断到实际行数");
        assert_eq!(karaoke_events(&doc.ass), vec!["{\\k80}{\\kf100}a|<"]);
    }

    #[test]
    fn test_empty_lyric_still_produces_document() {
        let doc = convert_lyric(&Lyric::default(), &ConvertOptions::new("x.lrc"));
        assert_eq!((doc.lines, doc.paragraphs), (0, 0));
        assert!(karaoke_events(&doc.ass).is_empty());
        assert_eq!(doc.ass.events.len(), 6, "模板注释行仍然输出");
        assert_eq!(doc.ass.title, "x");
    }
}
