//! GenUI - 生成式 UI 编排器
//!
//! 入口：初始化日志、加载配置、创建编排器，把状态渲染到终端；
//! 交互输入 `r` 手动重新生成，`q` 退出。

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use genui::config::{load_config, AppConfig};
use genui::core::{create_orchestrator_with_config, CycleState, OrchestratorView, RouteParams};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "genui", version, about = "Generate a UI component for a persona / design style and render it")]
struct Args {
    /// 路由路径，形如 /generated-ui/{designerId}/{personaId}
    route: Option<String>,
    /// 目标人群 id（未给出 route 时使用）
    #[arg(long)]
    persona: Option<String>,
    /// 设计风格 id（未给出 route 时使用）
    #[arg(long)]
    designer: Option<String>,
    /// 额外的配置文件
    #[arg(long)]
    config: Option<PathBuf>,
    /// 使用 Mock 生成客户端（不访问合成服务）
    #[arg(long)]
    mock: bool,
    /// 周期结束后直接退出，不进入交互
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    genui::observability::init();
    let args = Args::parse();

    let mut cfg = load_config(args.config.clone()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });
    if args.mock {
        cfg.generation.provider = "mock".to_string();
    }

    let params = match args.route.as_deref() {
        Some(path) => RouteParams::from_path(path),
        None => RouteParams::new(args.designer.as_deref(), args.persona.as_deref()),
    };
    if params.fingerprint().is_none() {
        println!("No persona / design style selected, nothing to generate.");
        println!("Usage: genui /generated-ui/<designerId>/<personaId>  (or --persona N --designer N)");
        return Ok(());
    }

    let handle = create_orchestrator_with_config(&cfg);
    handle.navigate(params);

    let mut state = handle.state();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = !args.once;
    let mut last_shown: Option<(u64, CycleState)> = None;

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = state.borrow_and_update().clone();
                if last_shown != Some((view.cycle, view.phase)) {
                    last_shown = Some((view.cycle, view.phase));
                    render(&view);
                }
                if args.once && view.phase.is_terminal() {
                    handle.quit();
                    if view.phase == CycleState::Failed {
                        anyhow::bail!(view.error_message.unwrap_or_default());
                    }
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    Some(input) => match input.trim() {
                        "r" | "regenerate" => {
                            if handle.view().can_regenerate() {
                                handle.regenerate();
                            }
                        }
                        "q" | "quit" => break,
                        "" => {}
                        other => println!("Unknown command '{}': r = regenerate, q = quit", other),
                    },
                    None => stdin_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, exiting");
                break;
            }
        }
    }

    handle.quit();
    Ok(())
}

fn render(view: &OrchestratorView) {
    match view.phase {
        CycleState::Idle => {}
        CycleState::Requesting => {
            if let Some(notice) = view.notice {
                println!("{}", notice);
            } else {
                println!("Crafting your experience...");
            }
        }
        CycleState::AwaitingRender => println!("Rendering..."),
        CycleState::RetryScheduled => {
            println!(
                "{} ({}/{})",
                view.notice.unwrap_or_default(),
                view.retry_budget,
                view.max_retries
            );
        }
        CycleState::Succeeded => {
            if let (Some(persona), Some(style)) = (view.persona_label, view.style_label) {
                println!("Persona: {}    Style: {}", persona, style);
            }
            if let Some(source) = &view.source {
                println!("\n{}\n", source);
            }
            if let Some(result) = &view.result {
                if !result.explanation.is_empty() {
                    println!("Prompt:\n{}\n", result.explanation.trim());
                }
                println!("Generated at {}", result.received_at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
            print_controls(view);
        }
        CycleState::Failed => {
            println!("Error: {}", view.error_message.as_deref().unwrap_or("unknown error"));
            print_controls(view);
        }
    }
}

fn print_controls(view: &OrchestratorView) {
    if view.can_regenerate() {
        println!("[r] regenerate  [q] quit");
    } else {
        println!("[q] quit");
    }
}
