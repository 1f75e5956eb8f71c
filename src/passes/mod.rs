//! 作用于渲染后时间轴的处理步骤（pass）。
//!
//! 每个 pass 通过 [`Pass::execute`] 获得引擎的可变引用，并原地修改段落中的行；
//! 日志只经由传入的 [`PassEnv`] 输出。

pub mod kill_negative;
pub mod lead_in;
pub mod offset;

pub use kill_negative::KillNegative;
pub use lead_in::LeadIn;
pub use offset::AlignOffset;

use crate::karaoke::Karaoke;

/// 传给 pass 的日志能力
pub trait PassEnv {
    /// 普通信息
    fn log(&self, message: &str);

    /// 可恢复的问题
    fn warn(&self, message: &str);

    /// 错误，但不会中止流程
    fn error(&self, message: &str);

    /// 调试信息
    fn debug(&self, message: &str);
}

/// 转发到 `log` 门面的默认实现。
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEnv;

impl PassEnv for LogEnv {
    fn log(&self, message: &str) {
        log::info!("{message}");
    }

    fn warn(&self, message: &str) {
        log::warn!("{message}");
    }

    fn error(&self, message: &str) {
        log::error!("{message}");
    }

    fn debug(&self, message: &str) {
        log::debug!("{message}");
    }
}

/// 一个有名字、可排序执行的时间轴变换。
pub trait Pass {
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    fn author(&self) -> Option<&str> {
        None
    }

    fn version(&self) -> Option<&str> {
        None
    }

    /// 原地修改引擎中的段落。无法处理的行应被跳过，而不是中止。
    fn execute(&self, karaoke: &mut Karaoke, env: &dyn PassEnv);
}
