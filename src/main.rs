use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use lyric_karaoke::config::{FuriganaMode, LeadInMode};
use lyric_karaoke::convert::{ConvertOptions, convert};
use lyric_karaoke::decoder::DecoderCommand;
use lyric_karaoke::error::Result;
use lyric_karaoke::logger;
use lyric_karaoke::settings::{
    FontSizes, Settings, parse_color, parse_font_sizes, parse_hide_lines, parse_resolution,
};

/// 把 QRC / 增强 LRC 歌词转换为卡拉OK ASS 字幕。
///
/// 命令行参数优先于配置文件中的值。
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// 输入歌词文件（.qrc 或 .lrc）
    #[arg(value_name = "INPUT_PATH")]
    input: PathBuf,

    /// 输出 ASS 文件，默认与输入同名
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 写入 Aegisub 工程信息的音视频文件
    #[arg(short, long)]
    media: Option<String>,

    /// INI 配置文件，默认使用用户配置目录下的文件
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 在日志中输出段落检查结果
    #[arg(short, long)]
    view: bool,

    /// 隐藏的行，例如 `0-3,7`，可重复
    #[arg(long, value_name = "LINES")]
    hide: Vec<String>,

    /// 段落切分间隔（毫秒）
    #[arg(short, long)]
    interval: Option<i64>,

    /// 全局偏移（毫秒），正值使歌词提前
    #[arg(long, allow_negative_numbers = true)]
    offset: Option<i64>,

    /// 画布分辨率，例如 `1920x1080`
    #[arg(short, long, value_parser = parse_resolution)]
    resolution: Option<(u32, u32)>,

    /// 高亮颜色，`r,g,b` 或 `#RRGGBB`
    #[arg(long, value_parser = parse_color)]
    color: Option<[i32; 3]>,

    /// 歌词与注音字号，例如 `100,50`
    #[arg(long, value_parser = parse_font_sizes)]
    font_size: Option<FontSizes>,

    /// 文档标题，默认取歌词的 `ti` 标签
    #[arg(short, long)]
    title: Option<String>,

    /// 注音模式: accurate, simple, none
    #[arg(short, long)]
    furigana: Option<FuriganaMode>,

    /// 引导模式: aegisub, default, txt2ass
    #[arg(long)]
    lead_in: Option<LeadInMode>,

    /// 引导的延伸时间（毫秒）
    #[arg(long)]
    extend: Option<i64>,

    /// 奇数行的延伸时间（毫秒），默认跟随 `--extend`
    #[arg(long)]
    extend2: Option<i64>,

    /// 外部 QRC 解码器命令行
    #[arg(short, long)]
    decoder: Option<String>,

    /// 把 QRC 内容另存为增强 LRC
    #[arg(long, value_name = "PATH")]
    dump_lrc: Option<PathBuf>,

    /// 控制台日志级别
    #[arg(long, value_parser = parse_level)]
    log_level: Option<LevelFilter>,

    /// 同时写入日志文件
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn parse_level(value: &str) -> std::result::Result<LevelFilter, String> {
    value
        .parse()
        .map_err(|_| format!("无效的日志级别: '{value}'"))
}

impl Cli {
    fn load_settings(&self) -> Result<Settings> {
        match &self.config {
            Some(path) => Settings::load(path),
            None => Settings::load_default(),
        }
    }

    fn apply(self, options: &mut ConvertOptions) -> Result<()> {
        if !self.hide.is_empty() {
            let mut hidden = Vec::new();
            for lines in &self.hide {
                hidden.append(&mut parse_hide_lines(lines)?);
            }
            options.hidden_lines = hidden;
        }

        let karaoke = &mut options.karaoke;
        karaoke.interval = self.interval.or(karaoke.interval);
        karaoke.resolution = self.resolution.or(karaoke.resolution);
        karaoke.color = self.color.or(karaoke.color);
        karaoke.furigana = self.furigana.or(karaoke.furigana);
        if self.title.is_some() {
            karaoke.title = self.title;
        }

        let lead_in = &mut options.lead_in;
        lead_in.mode = self.lead_in.or(lead_in.mode);
        lead_in.extend = self.extend.or(lead_in.extend);
        lead_in.extend2 = self.extend2.or(lead_in.extend2);

        if let Some(offset) = self.offset {
            options.offset = offset;
        }
        if self.font_size.is_some() {
            options.font_sizes = self.font_size;
        }
        if let Some(command_line) = &self.decoder {
            options.decoder = DecoderCommand::parse(command_line);
        }
        options.view |= self.view;
        options.media = self.media;
        options.output = self.output;
        options.lrc_dump = self.dump_lrc;
        Ok(())
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = cli.load_settings()?;
    if let Some(level) = cli.log_level {
        settings.log.console_log_level = level;
    }
    if let Some(file) = &cli.log_file {
        settings.log.enable_file_log = true;
        settings.log.log_file = Some(file.clone());
    }
    logger::init_logger(&settings.log)?;

    let mut options = ConvertOptions::from_settings(cli.input.clone(), &settings);
    cli.apply(&mut options)?;

    let report = convert(&options)?;
    println!(
        "{} ({} 行，{} 个段落，隐藏 {} 行)",
        report.output.display(),
        report.lines,
        report.paragraphs,
        report.hidden
    );
    Ok(())
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("错误: {e}");
            ExitCode::FAILURE
        }
    }
}
