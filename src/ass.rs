//! # ASS 记录与文档
//!
//! `V4PlusStyle` 与 `EventLine` 都是定长字段的文本记录，`parse` 与 `Display`
//! 互为逆操作。`RenderedAss` 把样式、附加节和事件拼装为完整的 ASS 文档。

use std::collections::HashMap;
use std::fmt::{self, Write as _};

use strum_macros::{Display, EnumString};

use crate::error::{ConvertError, Result};

pub const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";
pub const EVENT_FORMAT: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";
pub const AEGISUB_SECTION: &str = "Aegisub Project Garbage";

const STYLE_FIELD_COUNT: usize = 23;
const EVENT_FIELD_COUNT: usize = 10;

/// 把 (r, g, b[, a]) 转换为 ASS 颜色。
///
/// 各通道先四舍五入再对 256 取模。没有 alpha（或 alpha 为 0）时输出 `&HBBGGRR&`，
/// 否则输出 `&HAABBGGRR`。
pub fn ass_color(r: f64, g: f64, b: f64, a: Option<f64>) -> String {
    let channel = |x: f64| format!("{:02X}", (x.round() as i64).rem_euclid(256));
    match a.filter(|alpha| *alpha != 0.0) {
        None => format!("&H{}{}{}&", channel(b), channel(g), channel(r)),
        Some(alpha) => format!(
            "&H{}{}{}{}",
            channel(alpha),
            channel(b),
            channel(g),
            channel(r)
        ),
    }
}

/// 将毫秒时间格式化为 `H:MM:SS.CC`，四舍五入到厘秒，负数按 0 处理。
pub fn format_time(ms: i64) -> String {
    let total_cs = (ms.max(0) + 5) / 10;
    let cs = total_cs % 100;
    let total_seconds = total_cs / 100;
    let seconds = total_seconds % 60;
    let minutes = total_seconds / 60 % 60;
    let hours = total_seconds / 3600;
    format!("{hours}:{minutes:02}:{seconds:02}.{cs:02}")
}

/// 解析 `H:M:S.xx` 形式的时间，秒可以带任意位小数。
pub fn parse_time(time_str: &str) -> Result<i64> {
    let invalid = || ConvertError::InvalidTime(time_str.to_string());
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    let [h, m, s] = parts.as_slice() else {
        return Err(invalid());
    };
    let hours: i64 = h.trim().parse().map_err(|_| invalid())?;
    let minutes: i64 = m.trim().parse().map_err(|_| invalid())?;
    let seconds: f64 = s.trim().parse().map_err(|_| invalid())?;
    let millis = (seconds * 1000.0).round();
    // 超出 i64 范围的秒数视为无效
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return Err(invalid());
    }
    hours
        .checked_mul(3_600_000)
        .and_then(|t| t.checked_add(minutes.checked_mul(60_000)?))
        .and_then(|t| t.checked_add(millis as i64))
        .ok_or_else(invalid)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleFont {
    pub name: String,
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleColors {
    pub primary: String,
    pub secondary: String,
    pub outline: String,
    pub back: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Margins {
    pub l: i32,
    pub r: i32,
    pub v: i32,
}

/// `[V4+ Styles]` 中的一条样式。
#[derive(Debug, Clone, PartialEq)]
pub struct V4PlusStyle {
    pub name: String,
    pub font: StyleFont,
    pub colors: StyleColors,
    pub scale_x: f64,
    pub scale_y: f64,
    pub spacing: f64,
    pub angle: f64,
    pub border_style: i32,
    pub outline: f64,
    pub shadow: f64,
    pub alignment: i32,
    pub margins: Margins,
    pub encoding: i32,
}

fn num<T: std::str::FromStr>(field: &str) -> Option<T> {
    field.trim().parse().ok()
}

fn flag(field: &str) -> Option<bool> {
    num::<i32>(field).map(|v| v != 0)
}

impl V4PlusStyle {
    /// 解析一条样式，`Style:` 前缀可选（不区分大小写）。字段数不是 23 或数值无效时返回 `None`。
    pub fn parse(line: &str) -> Option<Self> {
        let mut body = line.trim();
        if body
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("style:"))
        {
            body = body[6..].trim();
        }
        let f: Vec<&str> = body.split(',').collect();
        if f.len() != STYLE_FIELD_COUNT {
            return None;
        }

        Some(Self {
            name: f[0].to_string(),
            font: StyleFont {
                name: f[1].to_string(),
                size: num(f[2])?,
                bold: flag(f[7])?,
                italic: flag(f[8])?,
                underline: flag(f[9])?,
                strikeout: flag(f[10])?,
            },
            colors: StyleColors {
                primary: f[3].to_string(),
                secondary: f[4].to_string(),
                outline: f[5].to_string(),
                back: f[6].to_string(),
            },
            scale_x: num(f[11])?,
            scale_y: num(f[12])?,
            spacing: num(f[13])?,
            angle: num(f[14])?,
            border_style: num(f[15])?,
            outline: num(f[16])?,
            shadow: num(f[17])?,
            alignment: num(f[18])?,
            margins: Margins {
                l: num(f[19])?,
                r: num(f[20])?,
                v: num(f[21])?,
            },
            encoding: num(f[22])?,
        })
    }
}

impl fmt::Display for V4PlusStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = |x: bool| u8::from(x);
        write!(
            f,
            "Style: {},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.name,
            self.font.name,
            self.font.size,
            self.colors.primary,
            self.colors.secondary,
            self.colors.outline,
            self.colors.back,
            b(self.font.bold),
            b(self.font.italic),
            b(self.font.underline),
            b(self.font.strikeout),
            self.scale_x,
            self.scale_y,
            self.spacing,
            self.angle,
            self.border_style,
            self.outline,
            self.shadow,
            self.alignment,
            self.margins.l,
            self.margins.r,
            self.margins.v,
            self.encoding
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
pub enum EventType {
    #[default]
    Dialogue,
    Comment,
}

/// `[Events]` 中的一条事件，时间单位为毫秒。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLine {
    pub event_type: EventType,
    pub layer: i32,
    pub start: i64,
    pub end: i64,
    pub style: String,
    pub name: String,
    pub margins: Margins,
    pub effect: String,
    /// 文本本身可以包含逗号。
    pub text: String,
}

impl EventLine {
    /// 解析一条事件。带 `Comment:`/`Dialogue:` 前缀时以前缀为准，否则使用 `default_type`。
    pub fn parse(line: &str, default_type: EventType) -> Option<Self> {
        let line = line.trim();
        let (event_type, body) = if let Some(rest) = line.strip_prefix("Comment:") {
            (EventType::Comment, rest.trim())
        } else if let Some(rest) = line.strip_prefix("Dialogue:") {
            (EventType::Dialogue, rest.trim())
        } else {
            (default_type, line)
        };

        let f: Vec<&str> = body.splitn(EVENT_FIELD_COUNT, ',').collect();
        if f.len() != EVENT_FIELD_COUNT {
            return None;
        }

        Some(Self {
            event_type,
            layer: num(f[0])?,
            start: parse_time(f[1]).ok()?,
            end: parse_time(f[2]).ok()?,
            style: f[3].to_string(),
            name: f[4].to_string(),
            margins: Margins {
                l: num(f[5])?,
                r: num(f[6])?,
                v: num(f[7])?,
            },
            effect: f[8].to_string(),
            text: f[9].to_string(),
        })
    }
}

impl fmt::Display for EventLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {},{},{},{},{},{},{},{},{},{}",
            self.event_type,
            self.layer,
            format_time(self.start),
            format_time(self.end),
            self.style,
            self.name,
            self.margins.l,
            self.margins.r,
            self.margins.v,
            self.effect,
            self.text
        )
    }
}

/// 附加节的内容：`键: 值` 对或原样输出的行。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addon {
    Pairs(Vec<(String, String)>),
    Lines(Vec<String>),
}

impl Addon {
    /// 设置一个键值；若当前是 `Lines` 则先替换为空的 `Pairs`。
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        if let Self::Lines(_) = self {
            *self = Self::Pairs(Vec::new());
        }
        if let Self::Pairs(pairs) = self {
            let value = value.into();
            match pairs.iter_mut().find(|(k, _)| k == key) {
                Some((_, v)) => *v = value,
                None => pairs.push((key.to_string(), value)),
            }
        }
    }
}

/// 可以直接写出的 ASS 文档。
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedAss {
    pub title: String,
    pub resolution: (u32, u32),
    pub styles: Vec<V4PlusStyle>,
    pub addons: Vec<(String, Addon)>,
    pub events: Vec<EventLine>,
}

impl Default for RenderedAss {
    fn default() -> Self {
        Self::new((1920, 1080), Vec::new(), Vec::new())
    }
}

impl RenderedAss {
    pub const fn new(
        resolution: (u32, u32),
        styles: Vec<V4PlusStyle>,
        events: Vec<EventLine>,
    ) -> Self {
        Self {
            title: String::new(),
            resolution,
            styles,
            addons: Vec::new(),
            events,
        }
    }

    pub fn style_mut(&mut self, name: &str) -> Option<&mut V4PlusStyle> {
        self.styles.iter_mut().find(|s| s.name == name)
    }

    /// 按名称索引的样式表；同名样式以最后一条为准。
    pub fn style_map_mut(&mut self) -> HashMap<String, &mut V4PlusStyle> {
        self.styles
            .iter_mut()
            .map(|s| (s.name.clone(), s))
            .collect()
    }

    /// 取得指定附加节，不存在时按 `default` 创建。
    pub fn addon_mut(&mut self, key: &str, default: Addon) -> &mut Addon {
        let pos = match self.addons.iter().position(|(k, _)| k == key) {
            Some(pos) => pos,
            None => {
                self.addons.push((key.to_string(), default));
                self.addons.len() - 1
            }
        };
        &mut self.addons[pos].1
    }

    /// 写入 `[Aegisub Project Garbage]` 中的音频与视频路径。
    pub fn add_aegisub_info(&mut self, audio: &str, video: &str) {
        let section = self.addon_mut(AEGISUB_SECTION, Addon::Pairs(Vec::new()));
        section.set("Audio File", audio);
        section.set("Video File", video);
    }

    pub fn render(&self) -> Result<String> {
        let mut out = String::with_capacity(self.events.len() * 120 + 1024);
        let (res_x, res_y) = self.resolution;

        writeln!(out, "[Script Info]")?;
        writeln!(out, "; Script generated by {}.", env!("CARGO_PKG_NAME"))?;
        writeln!(out, "ScriptType: v4.00+")?;
        writeln!(out, "Title: {}", self.title)?;
        writeln!(out, "PlayResX: {res_x}")?;
        writeln!(out, "PlayResY: {res_y}")?;
        writeln!(out, "Timer: 100.0000")?;
        writeln!(out)?;

        writeln!(out, "[V4+ Styles]")?;
        writeln!(out, "{STYLE_FORMAT}")?;
        for style in &self.styles {
            writeln!(out, "{style}")?;
        }

        for (key, addon) in &self.addons {
            writeln!(out)?;
            writeln!(out, "[{key}]")?;
            match addon {
                Addon::Pairs(pairs) => {
                    for (k, v) in pairs {
                        writeln!(out, "{k}: {v}")?;
                    }
                }
                Addon::Lines(lines) => {
                    for line in lines {
                        writeln!(out, "{line}")?;
                    }
                }
            }
        }

        writeln!(out)?;
        writeln!(out, "[Events]")?;
        writeln!(out, "{EVENT_FORMAT}")?;
        for event in &self.events {
            writeln!(out, "{event}")?;
        }

        Ok(out)
    }
}
