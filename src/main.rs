use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use codeconsole::core::config::{self, CliOverrides};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "codeconsole", about = "Terminal chat console that runs its code blocks")]
struct Args {
    /// Directory checked by "New Project" / "Open Project" (default: current directory)
    #[arg(long)]
    project_dir: Option<PathBuf>,

    /// Run every code block as soon as it arrives
    #[arg(long)]
    always_run: bool,

    /// Log level written to codeconsole.log (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Open a saved chat by id
    #[arg(long)]
    chat: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = config::load_config();
    let cli = CliOverrides {
        always_execute_code: args.always_run,
        project_dir: args.project_dir,
        log_level: args.log_level,
    };
    let resolved = config::resolve(file_config.as_ref().unwrap_or(&Default::default()), &cli);

    // Initialize file logger - writes to codeconsole.log in current directory
    let level = resolved.log_level.parse().unwrap_or(LevelFilter::Debug);
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("codeconsole.log") {
        let _ = WriteLogger::init(level, log_config, log_file);
    }

    if let Err(e) = &file_config {
        log::warn!("Ignoring config file: {}", e);
    }
    log::info!(
        "codeconsole starting up (project dir {}, always run {}, {} interpreters)",
        resolved.project_dir.display(),
        resolved.always_execute_code,
        resolved.interpreters.len()
    );

    codeconsole::tui::run(resolved, args.chat)
}
