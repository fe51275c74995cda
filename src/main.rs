use std::path::Path;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use suan_oracle::analysis::AnalysisResult;
use suan_oracle::app::{AppController, ControllerOptions, VALIDATION_MESSAGE, ViewState};
use suan_oracle::config::OracleConfig;
use suan_oracle::error::ControllerError;
use suan_oracle::llm::{Role, create_service};
use suan_oracle::profile::{InlineImage, ProfileEdit};

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing()?;

    let config = OracleConfig::from_env().context("Failed to load configuration")?;

    eprintln!("🔮 Suan Oracle v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Analysis model: {}", config.analysis_model);
    eprintln!("   Chat model: {}", config.chat_model);
    eprintln!("   Variant: {}", config.variant);
    eprintln!("   Commands: /reset to start over, /quit to exit.\n");

    let service = create_service(&config).context("Failed to create Gemini client")?;
    let controller = AppController::new(service, ControllerOptions::from_config(&config));

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match controller.view() {
            ViewState::Input => {
                if !collect_profile(&controller, &mut input).await? {
                    break;
                }
                eprintln!("\n⏳ 蒜蒜正在推演...\n");
                match controller.start_analysis().await {
                    Ok(()) => {
                        if let Some(analysis) = controller.analysis() {
                            print_analysis(&analysis);
                        }
                        for message in controller.messages() {
                            println!("蒜蒜: {}\n", message.text);
                        }
                    }
                    Err(ControllerError::Validation(_)) => eprintln!("{VALIDATION_MESSAGE}\n"),
                    Err(e) => eprintln!("推演失败: {e}\n"),
                }
            }
            ViewState::Result => {
                let Some(line) = prompt(&mut input, "> ").await? else {
                    break;
                };
                match line.as_str() {
                    "" => continue,
                    "/quit" => break,
                    "/reset" => match controller.reset() {
                        Ok(()) => eprintln!("已清空，重新开始。\n"),
                        Err(e) => eprintln!("{e}\n"),
                    },
                    text => match controller.send_chat(text).await {
                        Ok(reply) => println!("\n蒜蒜: {}\n", reply.message.text),
                        Err(e) => eprintln!("{e}\n"),
                    },
                }
            }
            // Only observable while start_analysis is awaited above
            ViewState::Loading => tokio::task::yield_now().await,
        }
    }

    let turns = controller.messages().iter().filter(|m| m.role == Role::User).count();
    tracing::info!(turns, "Exiting");
    Ok(())
}

/// Stderr logging filtered by `RUST_LOG`, plus a daily file when `SUAN_LOG_DIR` is set.
fn init_tracing() -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file, guard) = match std::env::var("SUAN_LOG_DIR") {
        Ok(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log dir {dir}"))?;
            let appender = tracing_appender::rolling::daily(&dir, "suan-oracle.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .init();
    Ok(guard)
}

async fn prompt(input: &mut Input, label: &str) -> anyhow::Result<Option<String>> {
    eprint!("{label}");
    let line = input.next_line().await.context("Failed to read stdin")?;
    Ok(line.map(|l| l.trim().to_string()))
}

/// Fill in the profile form. Returns `false` on EOF or `/quit`.
async fn collect_profile(controller: &AppController, input: &mut Input) -> anyhow::Result<bool> {
    let current = controller.profile();
    let fields = [
        ("姓名", current.name().to_string()),
        ("出生日期 (YYYY-MM-DD)", current.birth_date().to_string()),
        ("出生时间 (HH:MM，可留空)", current.birth_time().to_string()),
    ];

    let mut values = Vec::with_capacity(fields.len());
    for (label, existing) in fields {
        let shown = if existing.is_empty() {
            format!("{label}: ")
        } else {
            format!("{label} [{existing}]: ")
        };
        let Some(value) = prompt(input, &shown).await? else {
            return Ok(false);
        };
        if value == "/quit" {
            return Ok(false);
        }
        values.push(if value.is_empty() { existing } else { value });
    }

    let mut values = values.into_iter();
    let edits = [
        ProfileEdit::Name(values.next().unwrap_or_default()),
        ProfileEdit::BirthDate(values.next().unwrap_or_default()),
        ProfileEdit::BirthTime(values.next().unwrap_or_default()),
    ];
    for edit in edits {
        controller.update_profile(edit)?;
    }
    if !controller.profile().zodiac().is_empty() {
        eprintln!("   星座: {}", controller.profile().zodiac());
    }

    let face = read_image(input, "面相照片路径 (可留空): ").await?;
    controller.update_profile(ProfileEdit::FaceImage(face))?;
    let ear = read_image(input, "耳相照片路径 (可留空): ").await?;
    controller.update_profile(ProfileEdit::EarImage(ear))?;

    Ok(true)
}

async fn read_image(input: &mut Input, label: &str) -> anyhow::Result<Option<InlineImage>> {
    let Some(path) = prompt(input, label).await? else {
        return Ok(None);
    };
    if path.is_empty() {
        return Ok(None);
    }
    match InlineImage::from_path(Path::new(&path)).await {
        Ok(image) => Ok(Some(image)),
        Err(e) => {
            eprintln!("   无法读取图片，已忽略: {e}");
            Ok(None)
        }
    }
}

fn print_analysis(analysis: &AnalysisResult) {
    println!("── 流年运势 ──\n{}\n", analysis.yearly_fortune);

    if !analysis.milestones.is_empty() {
        println!("── 关键节点 ──");
        for m in &analysis.milestones {
            println!("[{}] {}\n   建议: {}", m.timeframe, m.prediction, m.advice);
        }
        println!();
    }

    if let Some(chart) = &analysis.natal_chart {
        println!("── 命盘 ──");
        println!(
            "性格: {}\n事业: {}\n感情: {}\n婚姻: {}\n财运: {}\n",
            chart.personality, chart.career, chart.love, chart.marriage, chart.wealth
        );
    }

    if let Some(five) = &analysis.five_elements {
        println!("── 五行 ──");
        println!(
            "{} ({}) 强弱: {}\n补益: {}\n忌讳: {}\n",
            five.element, five.nature, five.strength, five.supplement, five.taboos
        );
    }

    let p = &analysis.physiognomy;
    println!(
        "── 相学 ──\n面相: {}\n耳相: {}\n痣相: {}\n",
        p.face_analysis, p.ear_analysis, p.mole_analysis
    );

    if let Some(social) = &analysis.interpersonal {
        println!(
            "── 人际 ──\n风格: {}\n缘分: {}\n提醒: {}\n",
            social.style, social.connection, social.caution
        );
    }

    let color = &analysis.personality_color;
    println!("── 性格色 ──\n{} {}: {}\n", color.name, color.hex, color.meaning);

    let similar = &analysis.similar_person;
    println!("── 相似人物 ──\n{}: {}\n", similar.name, similar.description);
}
