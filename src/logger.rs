use std::fs;
use std::path::PathBuf;

use chrono::Local;
use directories::ProjectDirs;
use fern::Dispatch;
use log::LevelFilter;

use crate::error::{ConvertError, Result};
use crate::settings::LogSettings;

/// 默认日志文件路径。无法确定数据目录时退回到当前目录。
pub fn default_log_file_path() -> Result<PathBuf> {
    let Some(proj_dirs) = ProjectDirs::from("com", "LyricKaraoke", "lyric-karaoke") else {
        let fallback = PathBuf::from("lyric-karaoke.log");
        eprintln!("无法获取项目日志目录，将尝试在当前目录创建日志: {fallback:?}");
        return Ok(fallback);
    };
    let log_dir = proj_dirs.data_local_dir();
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)?;
    }
    Ok(log_dir.join("lyric-karaoke.log"))
}

fn console_dispatch(level: LevelFilter) -> Dispatch {
    Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}] {}", record.level(), message));
        })
        .level(level)
        .chain(std::io::stderr())
}

/// 初始化全局日志记录器：控制台输出到标准错误，可选的文件日志带时间戳。
pub fn init_logger(settings: &LogSettings) -> Result<()> {
    let mut dispatch = Dispatch::new()
        .level(LevelFilter::Trace)
        .chain(console_dispatch(settings.console_log_level));

    if settings.enable_file_log {
        let path = match &settings.log_file {
            Some(path) => path.clone(),
            None => default_log_file_path()?,
        };
        let file = fern::log_file(&path)?;
        dispatch = dispatch.chain(
            Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "[{}][{}][{}] {}",
                        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
                        record.level(),
                        record.target(),
                        message
                    ));
                })
                .level(settings.file_log_level)
                .chain(file),
        );
        dispatch
            .apply()
            .map_err(|e| ConvertError::Logger(e.to_string()))?;
        log::debug!("日志记录器已初始化。日志路径: {}", path.display());
        return Ok(());
    }

    dispatch
        .apply()
        .map_err(|e| ConvertError::Logger(e.to_string()))
}
