//! 将逐字歌词（QRC / 增强 LRC）转换为带卡拉OK标签的 ASS 字幕。
//!
//! 流程：歌词 → [`Subtitle`] → 渲染并切分段落的 [`Karaoke`] → 依次执行 pass
//! （引导、偏移、负时间修正）→ [`RenderedAss`]。

pub mod ass;
pub mod config;
pub mod convert;
pub mod cursor;
pub mod decoder;
pub mod error;
pub mod kana;
pub mod karaoke;
pub mod logger;
pub mod lrc;
pub mod lyric;
pub mod passes;
pub mod qrc;
pub mod render;
pub mod settings;
pub mod subtitle;

pub use ass::{EventLine, EventType, RenderedAss, V4PlusStyle};
pub use config::{FuriganaMode, KaraokeConfig, KaraokeConfigOverride, LeadInMode, LeadInOptions};
pub use convert::{ConvertOptions, ConvertReport, convert, load_lyric};
pub use error::{ConvertError, Result};
pub use karaoke::Karaoke;
pub use lyric::{Lyric, LyricLine, LyricPart, Sup};
pub use passes::{Pass, PassEnv};
pub use render::{Paragraph, RenderedLine};
pub use settings::Settings;
pub use subtitle::{Line, Subtitle, Syllable};
