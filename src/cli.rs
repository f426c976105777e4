/// cli.rs - 命令行接口定义
/// 使用 clap 派生宏定义参数和子命令

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::utils::version;

#[derive(Parser)]
#[command(author, version = version(), about, long_about = None)]
#[command(subcommand_value_name = "SUBCOMMAND")]
#[command(subcommand_help_heading = "Subcommands")]
pub struct Cli {
    /// Path to config file (default: `$XDG_CONFIG_HOME/docking/config.json`).
    ///
    /// This can also be set with the `DOCKING_CONFIG` environment variable. If both are set, the
    /// command line argument takes precedence.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub subcommand: Sub,
}

#[derive(Subcommand)]
pub enum Sub {
    /// Validate the config file.
    Validate,

    /// Print the zoom layout for a row of items.
    Layout {
        /// Number of items.
        #[arg(short = 'n', long, default_value_t = 5)]
        items: usize,

        /// Pointer position along the main axis, in window coordinates.
        ///
        /// Leave unset for a pointer outside of the dock.
        #[arg(long, allow_negative_numbers = true)]
        cursor: Option<f64>,

        /// Fraction of the zoom to apply, from 0 to 1.
        #[arg(long, default_value_t = 1.)]
        zoom_progress: f64,

        /// Window size along the main axis.
        #[arg(long, default_value_t = 1000.)]
        main_size: f64,

        /// Format output as JSON.
        #[arg(short, long)]
        json: bool,
    },

    /// Run the dock headless through a scripted pointer sequence.
    Simulate {
        /// Number of items.
        #[arg(short = 'n', long, default_value_t = 5)]
        items: usize,

        /// Force auto-hide on regardless of the config.
        #[arg(long)]
        autohide: bool,
    },

    /// Generate shell completions.
    Completions { shell: Shell },
}

/* 命令行结构示意图：

   docking [--config <PATH>] <子命令>
   |
   ├── validate       验证配置
   ├── layout         打印布局
   │   ├── -n/--items <N>
   │   ├── --cursor <X>
   │   ├── --zoom-progress <P>
   │   ├── --main-size <W>
   │   └── --json
   ├── simulate       无头模拟
   │   ├── -n/--items <N>
   │   └── --autohide
   └── completions <SHELL>

使用示例：
1. 验证配置：docking validate
2. 悬停在中间：docking layout -n 5 --cursor 500
3. 模拟自动隐藏：docking simulate --autohide
*/
