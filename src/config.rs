//! 卡拉OK 转换与引导（lead-in）的配置。
//!
//! 每个配置都有一个对应的 `*Override`，其中的 `None` 字段在合并时保留默认值。

use strum_macros::{Display, EnumString};

/// 段落切分的默认间隔（毫秒）。
pub const DEFAULT_INTERVAL_MS: i64 = 1000;
pub const DEFAULT_EXTEND_MS: i64 = 800;
pub const DEFAULT_EXTEND2_MS: i64 = 1000;

/// 注音的渲染方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FuriganaMode {
    /// 按原始音节边界计时，每个注音音节单独带 `\kf`。
    Accurate,
    /// 按词边界计时，注音合并到词上。
    #[default]
    Simple,
    /// 不输出注音。
    None,
}

/// 引导算法。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum LeadInMode {
    /// 单通道：把行间空白并入下一行的引导时间。
    #[strum(to_string = "aegisub")]
    Standard,
    /// 双通道：奇偶行交替显示，当前行高亮时预显示下一行。
    #[default]
    #[strum(to_string = "default", serialize = "txt2ass")]
    DoubleChannel,
}

/// (提前, 延后) 毫秒对，用于模板行的 `!retime(...)!`。
pub type RetimePair = (i64, i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retime {
    pub overlay: RetimePair,
    pub base: RetimePair,
    pub nok: Option<RetimePair>,
}

impl Default for Retime {
    fn default() -> Self {
        Self {
            overlay: (0, 0),
            base: (0, 0),
            nok: Some((0, 0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KaraokeConfig {
    /// 段落切分阈值（毫秒）。
    pub interval: i64,
    pub resolution: (u32, u32),
    pub title: String,
    /// 高亮颜色 `[r, g, b]`。
    pub color: [i32; 3],
    pub furigana: FuriganaMode,
    /// 为 `None` 时模板行使用内置的回退值。
    pub retime: Option<Retime>,
}

impl Default for KaraokeConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL_MS,
            resolution: (1920, 1080),
            title: String::new(),
            color: [0, 0, 255],
            furigana: FuriganaMode::default(),
            retime: Some(Retime::default()),
        }
    }
}

/// 用户提供的部分配置。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KaraokeConfigOverride {
    pub interval: Option<i64>,
    pub resolution: Option<(u32, u32)>,
    pub title: Option<String>,
    pub color: Option<[i32; 3]>,
    pub furigana: Option<FuriganaMode>,
    /// `Some(None)` 显式清除 retime。
    pub retime: Option<Option<Retime>>,
}

impl KaraokeConfig {
    #[must_use]
    pub fn merge(self, ov: KaraokeConfigOverride) -> Self {
        Self {
            interval: ov.interval.unwrap_or(self.interval),
            resolution: ov.resolution.unwrap_or(self.resolution),
            title: ov.title.unwrap_or(self.title),
            color: ov.color.unwrap_or(self.color),
            furigana: ov.furigana.unwrap_or(self.furigana),
            retime: ov.retime.unwrap_or(self.retime),
        }
    }

    pub fn from_override(ov: KaraokeConfigOverride) -> Self {
        Self::default().merge(ov)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadInOptions {
    pub mode: LeadInMode,
    pub extend: i64,
    pub extend2: i64,
}

impl Default for LeadInOptions {
    fn default() -> Self {
        Self {
            mode: LeadInMode::default(),
            extend: DEFAULT_EXTEND_MS,
            extend2: DEFAULT_EXTEND2_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeadInOverride {
    pub mode: Option<LeadInMode>,
    pub extend: Option<i64>,
    pub extend2: Option<i64>,
}

impl LeadInOptions {
    /// 只提供了 `extend` 时，`extend2` 跟随它。
    #[must_use]
    pub fn merge(self, ov: LeadInOverride) -> Self {
        Self {
            mode: ov.mode.unwrap_or(self.mode),
            extend: ov.extend.unwrap_or(self.extend),
            extend2: ov.extend2.or(ov.extend).unwrap_or(self.extend2),
        }
    }
}
