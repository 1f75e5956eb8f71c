//! INI 配置文件。
//!
//! ```ini
//! [Karaoke]
//! Interval = 1800
//! Resolution = 1280x720
//! Title =
//! Color = 255,162,40
//! Furigana = simple
//! Offset = 0
//!
//! [LeadIn]
//! Mode = default
//! Extend = 800
//! Extend2 = 1000
//!
//! [Output]
//! FontSize = 100,50
//! Hide = 0-3
//! Inspect = true
//! Decoder = node qrc.js
//!
//! [Logging]
//! EnableFileLog = false
//! FileLogLevel = Info
//! ConsoleLogLevel = Info
//! ```
//!
//! 缺失或为空的键保留默认值；无法解析的值返回 [`ConvertError::InvalidConfig`]。

use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::ProjectDirs;
use ini::Ini;
use log::LevelFilter;

use crate::config::{FuriganaMode, KaraokeConfigOverride, LeadInMode, LeadInOverride};
use crate::decoder::DecoderCommand;
use crate::error::{ConvertError, Result};
use crate::subtitle::LineSelection;

const KARAOKE_SECTION: &str = "Karaoke";
const LEAD_IN_SECTION: &str = "LeadIn";
const OUTPUT_SECTION: &str = "Output";
const LOGGING_SECTION: &str = "Logging";

fn invalid(key: &str, value: &str) -> ConvertError {
    ConvertError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn split_pair(value: &str, separators: &[char]) -> Option<(String, String)> {
    let mut parts = value.split(separators).map(str::trim);
    let a = parts.next()?.to_string();
    let b = parts.next()?.to_string();
    if parts.next().is_some() {
        return None;
    }
    Some((a, b))
}

/// `1280x720` 或 `1280,720`。
pub fn parse_resolution(value: &str) -> Result<(u32, u32)> {
    let (w, h) = split_pair(value, &['x', 'X', ',']).ok_or_else(|| invalid("Resolution", value))?;
    match (w.parse(), h.parse()) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(invalid("Resolution", value)),
    }
}

/// `255,162,40` 或 `#FFA228`。
pub fn parse_color(value: &str) -> Result<[i32; 3]> {
    let value = value.trim();
    if let Some(hex_text) = value.strip_prefix('#') {
        let bytes = hex::decode(hex_text).map_err(|_| invalid("Color", value))?;
        return match bytes.as_slice() {
            [r, g, b] => Ok([i32::from(*r), i32::from(*g), i32::from(*b)]),
            _ => Err(invalid("Color", value)),
        };
    }

    let channels: Vec<i32> = value
        .split(',')
        .map(|c| c.trim().parse::<i32>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| invalid("Color", value))?;
    match channels.as_slice() {
        &[r, g, b] if [r, g, b].iter().all(|c| (0..=255).contains(c)) => Ok([r, g, b]),
        _ => Err(invalid("Color", value)),
    }
}

/// `歌词字号,注音字号`，例如 `100,50`。
pub fn parse_font_sizes(value: &str) -> Result<FontSizes> {
    let (lyric, furigana) = split_pair(value, &[',']).ok_or_else(|| invalid("FontSize", value))?;
    match (lyric.parse::<f64>(), furigana.parse::<f64>()) {
        (Ok(lyric), Ok(furigana)) if lyric > 0.0 && furigana > 0.0 => {
            Ok(FontSizes { lyric, furigana })
        }
        _ => Err(invalid("FontSize", value)),
    }
}

/// 逗号分隔的行号，`a-b` 表示闭区间，例如 `0-3,7`。区间保持为区间，不会展开。
pub fn parse_hide_lines(value: &str) -> Result<Vec<LineSelection>> {
    let mut selections = Vec::new();
    let mut indices = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if let Some((a, b)) = item.split_once('-') {
            let range = match (a.trim().parse::<usize>(), b.trim().parse::<usize>()) {
                (Ok(a), Ok(b)) if a <= b => b.checked_add(1).map(|end| a..end),
                _ => None,
            }
            .ok_or_else(|| invalid("Hide", item))?;
            if !indices.is_empty() {
                selections.push(LineSelection::Indices(std::mem::take(&mut indices)));
            }
            selections.push(LineSelection::Range(range));
        } else {
            indices.push(item.parse().map_err(|_| invalid("Hide", item))?);
        }
    }
    if !indices.is_empty() {
        selections.push(LineSelection::Indices(indices));
    }
    Ok(selections)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSizes {
    pub lyric: f64,
    pub furigana: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub enable_file_log: bool,
    pub file_log_level: LevelFilter,
    pub console_log_level: LevelFilter,
    /// 为空时使用默认日志路径。
    pub log_file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            enable_file_log: false,
            file_log_level: LevelFilter::Info,
            console_log_level: LevelFilter::Info,
            log_file: None,
        }
    }
}

/// 从配置文件读取的全部设置。`None` 表示未配置。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub karaoke: KaraokeConfigOverride,
    pub lead_in: LeadInOverride,
    pub offset: Option<i64>,
    pub font_sizes: Option<FontSizes>,
    pub hidden_lines: Vec<LineSelection>,
    pub inspect: Option<bool>,
    pub decoder: Option<DecoderCommand>,
    pub log: LogSettings,
}

fn get<'a>(conf: &'a Ini, section: &str, key: &str) -> Option<&'a str> {
    conf.section(Some(section))
        .and_then(|s| s.get(key))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_with<T>(
    conf: &Ini,
    section: &str,
    key: &str,
    parse: impl Fn(&str) -> Result<T>,
) -> Result<Option<T>> {
    get(conf, section, key).map(parse).transpose()
}

fn parse_from_str<T: FromStr>(conf: &Ini, section: &str, key: &str) -> Result<Option<T>> {
    parse_with(conf, section, key, |v| v.parse().map_err(|_| invalid(key, v)))
}

impl Settings {
    /// 默认配置文件路径，例如 Linux 上的 `~/.config/lyric-karaoke/lyric-karaoke.ini`。
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "LyricKaraoke", "lyric-karaoke")
            .map(|dirs| dirs.config_dir().join("lyric-karaoke.ini"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let conf = Ini::load_from_file(path)?;
        let settings = Self::from_ini(&conf)?;
        log::info!("[配置] 从 {} 加载配置成功。", path.display());
        Ok(settings)
    }

    /// 加载默认路径下的配置文件，不存在时使用默认值。
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            Some(path) => {
                log::debug!("[配置] 配置文件 {} 不存在，使用默认配置。", path.display());
                Ok(Self::default())
            }
            None => {
                log::warn!("[配置] 无法确定配置文件路径，使用默认配置。");
                Ok(Self::default())
            }
        }
    }

    pub fn from_ini(conf: &Ini) -> Result<Self> {
        let karaoke = KaraokeConfigOverride {
            interval: parse_from_str(conf, KARAOKE_SECTION, "Interval")?,
            resolution: parse_with(conf, KARAOKE_SECTION, "Resolution", parse_resolution)?,
            title: get(conf, KARAOKE_SECTION, "Title").map(String::from),
            color: parse_with(conf, KARAOKE_SECTION, "Color", parse_color)?,
            furigana: parse_from_str::<FuriganaMode>(conf, KARAOKE_SECTION, "Furigana")?,
            retime: None,
        };
        let lead_in = LeadInOverride {
            mode: parse_from_str::<LeadInMode>(conf, LEAD_IN_SECTION, "Mode")?,
            extend: parse_from_str(conf, LEAD_IN_SECTION, "Extend")?,
            extend2: parse_from_str(conf, LEAD_IN_SECTION, "Extend2")?,
        };

        let defaults = LogSettings::default();
        let log = LogSettings {
            enable_file_log: parse_from_str(conf, LOGGING_SECTION, "EnableFileLog")?
                .unwrap_or(defaults.enable_file_log),
            file_log_level: parse_from_str(conf, LOGGING_SECTION, "FileLogLevel")?
                .unwrap_or(defaults.file_log_level),
            console_log_level: parse_from_str(conf, LOGGING_SECTION, "ConsoleLogLevel")?
                .unwrap_or(defaults.console_log_level),
            log_file: get(conf, LOGGING_SECTION, "LogFile").map(PathBuf::from),
        };

        Ok(Self {
            karaoke,
            lead_in,
            offset: parse_from_str(conf, KARAOKE_SECTION, "Offset")?,
            font_sizes: parse_with(conf, OUTPUT_SECTION, "FontSize", parse_font_sizes)?,
            hidden_lines: parse_with(conf, OUTPUT_SECTION, "Hide", parse_hide_lines)?
                .unwrap_or_default(),
            inspect: parse_from_str(conf, OUTPUT_SECTION, "Inspect")?,
            decoder: get(conf, OUTPUT_SECTION, "Decoder").and_then(DecoderCommand::parse),
            log,
        })
    }

    /// 写出当前设置；未配置的项不会写入。
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut conf = Ini::new();

        {
            let mut section = conf.with_section(Some(KARAOKE_SECTION));
            if let Some(interval) = self.karaoke.interval {
                section.set("Interval", interval.to_string());
            }
            if let Some((w, h)) = self.karaoke.resolution {
                section.set("Resolution", format!("{w}x{h}"));
            }
            if let Some(title) = &self.karaoke.title {
                section.set("Title", title.as_str());
            }
            if let Some([r, g, b]) = self.karaoke.color {
                section.set("Color", format!("{r},{g},{b}"));
            }
            if let Some(furigana) = self.karaoke.furigana {
                section.set("Furigana", furigana.to_string());
            }
            if let Some(offset) = self.offset {
                section.set("Offset", offset.to_string());
            }
        }

        {
            let mut section = conf.with_section(Some(LEAD_IN_SECTION));
            if let Some(mode) = self.lead_in.mode {
                section.set("Mode", mode.to_string());
            }
            if let Some(extend) = self.lead_in.extend {
                section.set("Extend", extend.to_string());
            }
            if let Some(extend2) = self.lead_in.extend2 {
                section.set("Extend2", extend2.to_string());
            }
        }

        {
            let mut section = conf.with_section(Some(OUTPUT_SECTION));
            if let Some(sizes) = self.font_sizes {
                section.set("FontSize", format!("{},{}", sizes.lyric, sizes.furigana));
            }
            if !self.hidden_lines.is_empty() {
                let hide: Vec<String> = self
                    .hidden_lines
                    .iter()
                    .map(ToString::to_string)
                    .filter(|s| !s.is_empty())
                    .collect();
                section.set("Hide", hide.join(","));
            }
            if let Some(inspect) = self.inspect {
                section.set("Inspect", inspect.to_string());
            }
            if let Some(decoder) = &self.decoder {
                let mut words = vec![decoder.program.clone()];
                words.extend(decoder.args.iter().cloned());
                section.set("Decoder", words.join(" "));
            }
        }

        let mut section = conf.with_section(Some(LOGGING_SECTION));
        section
            .set("EnableFileLog", self.log.enable_file_log.to_string())
            .set("FileLogLevel", self.log.file_log_level.to_string())
            .set("ConsoleLogLevel", self.log.console_log_level.to_string());
        if let Some(file) = &self.log.log_file {
            section.set("LogFile", file.display().to_string());
        }

        conf.write_to_file(path)?;
        log::info!("[配置] 配置已保存到 {}。", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_helpers() {
        assert_eq!(parse_resolution("1280x720").ok(), Some((1280, 720)));
        assert_eq!(parse_resolution(" 1920 , 1080 ").ok(), Some((1920, 1080)));
        assert!(parse_resolution("1280").is_err());
        assert!(parse_resolution("1x2x3").is_err());

        assert_eq!(parse_color("255,162,40").ok(), Some([255, 162, 40]));
        assert_eq!(parse_color("#FFA228").ok(), Some([255, 162, 40]));
        assert!(parse_color("256,0,0").is_err());
        assert!(parse_color("#FFF").is_err());

        let sizes = parse_font_sizes("100,50").ok();
        assert_eq!(sizes, Some(FontSizes { lyric: 100.0, furigana: 50.0 }));
        assert!(parse_font_sizes("100").is_err());
        assert!(parse_font_sizes("0,50").is_err());
    }

    #[test]
    fn test_parse_hide_lines() {
        assert_eq!(
            parse_hide_lines("0-3, 7,9").ok(),
            Some(vec![LineSelection::Range(0..4), LineSelection::Indices(vec![7, 9])])
        );
        assert_eq!(parse_hide_lines("").ok(), Some(vec![]));
        assert!(parse_hide_lines("3-1").is_err());
        assert!(parse_hide_lines(&format!("0-{}", usize::MAX)).is_err());

        let huge = parse_hide_lines("2-50000000").unwrap_or_default();
        assert_eq!(huge, vec![LineSelection::Range(2..50_000_001)], "大区间不应展开");
        assert_eq!(huge[0].to_string(), "2-50000000");
        assert!(matches!(
            parse_hide_lines("x"),
            Err(ConvertError::InvalidConfig { key, .. }) if key == "Hide"
        ));
    }

    #[test]
    fn test_from_ini_reads_sections() {
        let conf = Ini::load_from_str(
            "[Karaoke]\nInterval=1800\nResolution=1280x720\nColor=255,162,40\nFurigana=accurate\nOffset=-150\n\
             [LeadIn]\nMode=aegisub\nExtend=600\n\
             [Output]\nFontSize=100,50\nHide=0-1\nDecoder=node qrc.js\n\
             [Logging]\nConsoleLogLevel=Debug\n",
        )
        .expect("INI 文本应能解析");
        let settings = Settings::from_ini(&conf).expect("配置应有效");

        assert_eq!(settings.karaoke.interval, Some(1800));
        assert_eq!(settings.karaoke.resolution, Some((1280, 720)));
        assert_eq!(settings.karaoke.furigana, Some(FuriganaMode::Accurate));
        assert_eq!(settings.karaoke.title, None);
        assert_eq!(settings.offset, Some(-150));
        assert_eq!(settings.lead_in.mode, Some(LeadInMode::Standard));
        assert_eq!(settings.lead_in.extend2, None);
        assert_eq!(settings.hidden_lines, vec![LineSelection::Range(0..2)]);
        assert_eq!(settings.decoder, Some(DecoderCommand::new("node").arg("qrc.js")));
        assert_eq!(settings.log.console_log_level, LevelFilter::Debug);
        assert_eq!(settings.log.file_log_level, LevelFilter::Info, "未配置的日志级别保留默认值");
    }

    #[test]
    fn test_from_ini_rejects_bad_values() {
        let conf = Ini::load_from_str("[Karaoke]\nFurigana=fancy\n").expect("INI 文本应能解析");
        assert!(matches!(
            Settings::from_ini(&conf),
            Err(ConvertError::InvalidConfig { key, value }) if key == "Furigana" && value == "fancy"
        ));

        let empty = Ini::load_from_str("").expect("INI 文本应能解析");
        assert_eq!(Settings::from_ini(&empty).ok(), Some(Settings::default()));
    }
}
