//! Track a server-side job from the terminal
//!
//! Polls the given status URL and draws a text progress bar until the job
//! finishes. Ctrl-C stops polling.
//!
//! ```text
//! cargo run --example terminal_progress -- https://example.com/jobs/7/status 2
//! ```

use std::io::Write;
use std::time::Duration;

use progress_poller::{
    DialogOptions, HttpStatusFetcher, PollController, PollOutcome, PollerConfig, PollerError,
    PresentationSurface, Url,
};
use tracing_subscriber::EnvFilter;

const BAR_WIDTH: usize = 40;

/// Draws the dialog as a single terminal line
#[derive(Default)]
struct TerminalSurface {
    title: String,
    content: String,
    visible: bool,
}

impl PresentationSurface for TerminalSurface {
    fn mount(&mut self, dialog: &DialogOptions) {
        self.title = dialog.title.clone();
        self.content = dialog.content.clone();
    }

    fn show_dialog(&mut self) {
        if !self.visible {
            self.visible = true;
            println!("== {} ==", self.title);
            println!("{}", self.content);
        }
    }

    fn hide_dialog(&mut self) {
        if self.visible {
            self.visible = false;
            println!();
        }
    }

    fn render_progress(&mut self, value: f64, max: f64) {
        let fraction = if max > 0.0 { (value / max).clamp(0.0, 1.0) } else { 0.0 };
        let filled = (fraction * BAR_WIDTH as f64).round() as usize;

        print!(
            "\r[{}{}] {:>5.1}% ({}/{})",
            "#".repeat(filled),
            "-".repeat(BAR_WIDTH - filled),
            fraction * 100.0,
            value,
            max
        );
        let _ = std::io::stdout().flush();
    }

    fn report_error(&mut self, error: &PollerError) {
        eprintln!("\n⚠️  {}", error);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let endpoint = match args.next() {
        Some(url) => Url::parse(&url)?,
        None => {
            eprintln!("usage: terminal_progress <status-url> [interval-seconds]");
            return Ok(());
        }
    };
    let interval = args
        .next()
        .map(|secs| secs.parse::<f64>())
        .transpose()?
        .unwrap_or(3.0);

    let config = PollerConfig::new()
        .with_endpoint(endpoint)
        .with_poll_interval(Duration::try_from_secs_f64(interval)?)
        .with_title("Job progress");

    let controller = PollController::new(config, HttpStatusFetcher::new()?, TerminalSurface::default())?;
    let handle = controller.spawn();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    // Wait for the job to end on its own or for Ctrl-C
    while handle.is_running() {
        tokio::select! {
            _ = &mut ctrl_c => {
                println!("\nStopping...");
                break;
            }
            _ = tokio::time::sleep(Duration::from_millis(200)) => {}
        }
    }

    // Returns the natural outcome if the controller already finished
    let outcome = handle.shutdown().await?;

    match outcome {
        PollOutcome::Completed => println!("✅ Job finished"),
        PollOutcome::ReloadRequired => println!("🔄 Job finished a while ago; restart to resynchronize"),
        PollOutcome::Failed(e) => println!("❌ {}", e),
        PollOutcome::Stopped => println!("🛑 Stopped"),
        PollOutcome::Idle => println!("No endpoint configured"),
    }

    Ok(())
}
