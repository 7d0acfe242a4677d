use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mockgen::ai::{EditedImage, ImageInput};
use mockgen::app::App;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "mockgen")]
#[command(about = "Generate mock app data with a hosted generative model")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// A single user profile.
    Profile,
    /// Chat list entries for a sidebar.
    Chats {
        #[arg(short = 'n', long, default_value_t = 8)]
        count: usize,
    },
    /// Messages of one conversation.
    History {
        title: String,
        #[arg(short = 'n', long, default_value_t = 6)]
        count: usize,
    },
    /// Workspace canvases.
    Canvases {
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
    },
    /// Knowledge vault nodes.
    Vault {
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
    /// Third-party integrations.
    Integrations {
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
    },
    /// Turn an unstructured log file into structured JSON.
    ExtractLog { file: PathBuf },
    /// Describe an image file.
    Describe { image: PathBuf },
    /// Edit an image file and write the result.
    Edit {
        image: PathBuf,
        #[arg(short, long)]
        prompt: String,
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Interactive chat on stdin; an empty line ends the session.
    Chat,
}

fn print_json<T: Serialize>(value: &Option<T>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_image(path: &Path) -> Result<ImageInput> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))?;
    Ok(ImageInput::from_bytes(bytes)?)
}

/// Destination for an edited image. A missing extension is filled in from
/// the returned mime type; a conflicting one is kept but reported.
fn output_path(out: &Path, edited: &EditedImage) -> PathBuf {
    let expected = edited.extension();
    match out.extension().and_then(|ext| ext.to_str()) {
        None => out.with_extension(expected),
        Some(ext) => {
            let ext = ext.to_ascii_lowercase();
            if ext != expected && !(expected == "jpg" && ext == "jpeg") {
                warn!(
                    "Model returned {} but {} has a .{} extension",
                    edited.mime_type,
                    out.display(),
                    ext
                );
            }
            out.to_path_buf()
        }
    }
}

async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Profile => print_json(&app.generate_profile().await?),
        Command::Chats { count } => print_json(&app.generate_chat_list(count).await?),
        Command::History { title, count } => {
            print_json(&app.generate_chat_history(&title, count).await?)
        }
        Command::Canvases { count } => print_json(&app.generate_canvases(count).await?),
        Command::Vault { count } => print_json(&app.generate_vault_nodes(count).await?),
        Command::Integrations { count } => print_json(&app.generate_integrations(count).await?),
        Command::ExtractLog { file } => {
            let log = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read log {}", file.display()))?;
            print_json(&app.extract_log(&log).await?)
        }
        Command::Describe { image } => {
            let description = app.describe_image(read_image(&image)?).await?;
            print_json(&description)
        }
        Command::Edit { image, prompt, out } => {
            match app.edit_image(read_image(&image)?, &prompt).await? {
                Some(edited) => {
                    let out = output_path(&out, &edited);
                    std::fs::write(&out, &edited.bytes)
                        .with_context(|| format!("Failed to write {}", out.display()))?;
                    info!(
                        "Wrote {} ({}, {} bytes)",
                        out.display(),
                        edited.mime_type,
                        edited.bytes.len()
                    );
                }
                None => println!("null"),
            }
            Ok(())
        }
        Command::Chat => chat_loop(app, BufReader::new(tokio::io::stdin())).await,
    }
}

async fn chat_loop<R: AsyncBufRead + Unpin>(app: &App, input: R) -> Result<()> {
    let mut session = app.new_chat_session();
    let mut lines = input.lines();
    let mut stdout = std::io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let line = match lines.next_line().await? {
            Some(line) if !line.trim().is_empty() => line,
            _ => return Ok(()),
        };

        match app.send_chat(&mut session, line.trim_end()).await? {
            Some(reply) => println!("{}", reply),
            None => println!("(no reply)"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mockgen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let app = match App::new() {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&app, args.command).await {
        error!("Generation failed: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
