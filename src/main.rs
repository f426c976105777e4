#[macro_use]
// 启用tracing宏，允许在代码中使用如info!、warn!等日志宏
extern crate tracing;

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use calloop::timer::{TimeoutAction, Timer};
use calloop::EventLoop;
use clap::{CommandFactory, Parser};
use directories::ProjectDirs;
use docking::animation::Clock;
use docking::autohide::HideState;
use docking::cli::{Cli, Sub};
use docking::dock::{Dock, Frame};
use docking::item::{DisplayItem, SharedItems};
use docking::layout::{
    compute_layout, content_bounds, content_offset, rest_bounds, to_content_cursor, Bounds,
    LayoutItem,
};
use docking::scheduler::{CalloopScheduler, DockTimer, TimerId, TimerTarget};
use docking::utils::version;
use docking_config::Config;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

// 默认日志过滤规则
const DEFAULT_LOG_FILTER: &str = "docking=debug";

// 无头模拟使用的窗口尺寸
const SIM_MAIN_SIZE: f64 = 1000.;
const SIM_CROSS_SIZE: f64 = 100.;
// 模拟的最长运行时间，防止脚本出错时永远不退出
const SIM_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if env::var_os("RUST_BACKTRACE").is_none() {
        env::set_var("RUST_BACKTRACE", "1");
    }

    let directives = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned());
    let env_filter = EnvFilter::builder().parse_lossy(directives);
    tracing_subscriber::fmt()
        .compact()
        .with_writer(io::stderr)
        .with_env_filter(env_filter)
        .init();

    let cli = Cli::parse();
    let path = config_path(cli.config);

    match cli.subcommand {
        Sub::Validate => {
            tracy_client::Client::start();

            Config::load(&path)?;
            info!("config is valid");
        }
        Sub::Layout {
            items,
            cursor,
            zoom_progress,
            main_size,
            json,
        } => {
            let config = load_config(&path);
            print_layout(&config, items, cursor, zoom_progress, main_size, json)?;
        }
        Sub::Simulate { items, autohide } => {
            tracy_client::Client::start();
            info!("starting version {}", &version());

            let mut config = load_config(&path);
            if autohide {
                config.autohide = true;
            }
            simulate(config, items)?;
        }
        Sub::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "docking", &mut io::stdout());
        }
    }

    Ok(())
}

/// 加载配置；文件不存在时使用默认值，出错时记录警告并使用默认值
fn load_config(path: &Path) -> Config {
    if !path.exists() {
        debug!("config file {path:?} does not exist, using defaults");
        return Config::default();
    }

    Config::load(path)
        .map_err(|err| warn!("{err:?}"))
        .unwrap_or_default()
}

#[derive(Serialize)]
struct LayoutReport {
    offset: f64,
    bounds: Bounds,
    items: Vec<LayoutItem>,
}

fn print_layout(
    config: &Config,
    count: usize,
    cursor: Option<f64>,
    zoom_progress: f64,
    main_size: f64,
    json: bool,
) -> anyhow::Result<()> {
    let theme = &config.theme;
    let items = sample_items(count);

    let rest = rest_bounds(&items, config.icon_size, theme.h_padding, theme.item_padding);
    let local = cursor.map_or(-1., |cursor| to_content_cursor(cursor, main_size, rest));
    let layout = compute_layout(
        &items,
        config,
        local,
        theme.item_padding,
        theme.h_padding,
        zoom_progress,
    );
    let bounds = content_bounds(&layout, theme.h_padding, theme.item_padding);
    let offset = content_offset(main_size, bounds);

    if json {
        let report = LayoutReport {
            offset,
            bounds,
            items: layout,
        };
        let text = serde_json::to_string_pretty(&report)?;
        println!("{text}");
        return Ok(());
    }

    println!(
        "content: {:.2}..{:.2} (width {:.2}), offset {:.2}",
        bounds.left,
        bounds.right,
        bounds.width(),
        offset
    );
    for (item, li) in items.iter().zip(&layout) {
        println!(
            "{:>8}: x={:>8.2} scale={:.3}",
            item.id,
            li.x + offset,
            li.scale
        );
    }

    Ok(())
}

fn sample_items(count: usize) -> Vec<DisplayItem> {
    (0..count)
        .map(|i| {
            let item = DisplayItem::new(format!("app-{i}")).pinned();
            // 偶数项正在运行
            if i % 2 == 0 {
                item.running(1)
            } else {
                item
            }
        })
        .collect()
}

struct Headless {
    dock: Dock<CalloopScheduler<Headless>>,
    script_done: bool,
}

impl TimerTarget for Headless {
    fn on_timer(&mut self, id: TimerId, timer: DockTimer) {
        self.dock.on_timer(id, timer);
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Enter(f64),
    Move(f64),
    Click,
    Leave,
}

/// 脚本：进入 → 扫过整个 dock → 点击 → 离开
fn script() -> Vec<(Duration, Step)> {
    let mut steps = vec![(Duration::ZERO, Step::Enter(SIM_MAIN_SIZE / 2. - 120.))];

    for i in 0..=12 {
        let at = Duration::from_millis(100 + i * 40);
        let main = SIM_MAIN_SIZE / 2. - 120. + i as f64 * 20.;
        steps.push((at, Step::Move(main)));
    }

    steps.push((Duration::from_millis(700), Step::Click));
    steps.push((Duration::from_millis(1500), Step::Leave));
    steps
}

impl Headless {
    fn run_step(&mut self, step: Step, last: bool) {
        debug!(?step, "script");

        match step {
            Step::Enter(main) => self.dock.pointer_enter(main),
            Step::Move(main) => self.dock.pointer_motion(main),
            Step::Click => {
                let cursor = self.dock.cursor();
                if let Some(id) = self.dock.item_at(cursor, SIM_MAIN_SIZE) {
                    info!("clicking {id}");
                    self.dock.click(&id);
                    self.dock.launch(&id);
                }
            }
            Step::Leave => self.dock.pointer_leave(),
        }

        if last {
            self.script_done = true;
        }
    }

    fn is_finished(&self) -> bool {
        if !self.script_done || !self.dock.is_idle() {
            return false;
        }

        let target = if self.dock.config().autohide {
            HideState::Hidden
        } else {
            HideState::Visible
        };
        self.dock.autohide().state() == target
    }
}

fn simulate(config: Config, count: usize) -> anyhow::Result<()> {
    let mut event_loop: EventLoop<Headless> =
        EventLoop::try_new().map_err(|err| anyhow!("error creating event loop: {err}"))?;

    let mut clock = Clock::default();
    let items = SharedItems::new(sample_items(count));
    let scheduler = CalloopScheduler::new(event_loop.handle());
    let dock = Dock::new(config, clock.clone(), scheduler, items);

    let mut state = Headless {
        dock,
        script_done: false,
    };

    let steps = script();
    let last = steps.len() - 1;
    for (i, (at, step)) in steps.into_iter().enumerate() {
        event_loop
            .handle()
            .insert_source(Timer::from_duration(at), move |_, _, state| {
                state.run_step(step, i == last);
                TimeoutAction::Drop
            })
            .map_err(|err| anyhow!("error inserting script timer: {}", err.error))?;
    }

    let start = Instant::now();
    loop {
        event_loop.dispatch(Some(Duration::from_millis(100)), &mut state)?;
        // 每次迭代清除时钟缓存，同一轮里的所有效果看到同一个时间点
        clock.clear();

        if state.dock.take_redraw() {
            let frame = state.dock.frame(SIM_MAIN_SIZE, SIM_CROSS_SIZE);
            print_frame(&frame);
        }

        if state.is_finished() {
            info!("dock is idle, done");
            break;
        }

        if start.elapsed() > SIM_TIMEOUT {
            warn!("simulation did not settle in {SIM_TIMEOUT:?}");
            break;
        }
    }

    Ok(())
}

fn print_frame(frame: &Frame) {
    let scales: Vec<String> = frame
        .items
        .iter()
        .map(|item| format!("{:.2}", item.scale))
        .collect();

    println!(
        "#{:<4} {:<8} hide={:.3} zoom={:.3} shelf={:.1} hovered={} scales=[{}]",
        frame.serial,
        format!("{:?}", frame.state),
        frame.hide_offset,
        frame.zoom_progress,
        frame.shelf.width,
        frame
            .hovered
            .as_ref()
            .map_or_else(|| String::from("-"), |id| id.to_string()),
        scales.join(" "),
    );
}

fn env_config_path() -> Option<PathBuf> {
    env::var_os("DOCKING_CONFIG")
        .filter(|x| !x.is_empty())
        .map(PathBuf::from)
}

fn default_config_path() -> Option<PathBuf> {
    let Some(dirs) = ProjectDirs::from("", "", "docking") else {
        warn!("error retrieving home directory");
        return None;
    };

    let mut path = dirs.config_dir().to_owned();
    path.push("config.json");
    Some(path)
}

/// 配置路径：命令行参数 → `DOCKING_CONFIG` → 用户配置目录 → /etc
fn config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(explicit) = cli_path.or_else(env_config_path) {
        return explicit;
    }

    default_config_path().unwrap_or_else(|| PathBuf::from("/etc/docking/config.json"))
}
