use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod board;
mod discover;
mod fixtures;
mod html;
mod server;
mod types;

use board::ClassFilter;
use fixtures::Fixtures;
use types::LessonStatus;

#[derive(Parser, Debug)]
#[command(name = "lavagna")]
#[command(about = "Teacher dashboard backend with a lesson kanban board")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// JSON fixtures file (built-in mock data when omitted)
    #[arg(short, long, global = true)]
    fixtures: Option<PathBuf>,

    /// Output directory for generated files
    #[arg(short, long, default_value = ".", global = true)]
    output: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Render the board to a static HTML file (no server)
    Build,

    /// Print the lessons of the board, one column at a time
    Board {
        /// Only show this column (scheduled, in-progress, completed)
        #[arg(long)]
        status: Option<LessonStatus>,

        /// Class to show (all classes when omitted)
        #[arg(long)]
        class: Option<String>,
    },
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level))
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("tower_http=warn".parse().unwrap());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_max_level(Level::TRACE)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level);

    match args.command {
        None => {
            server::serve(8080, args.fixtures).await?;
        }
        Some(Commands::Serve { port }) => {
            server::serve(port, args.fixtures).await?;
        }
        Some(Commands::Build) => {
            let board = Fixtures::load(args.fixtures.as_deref())?.lesson_board();
            let html_path = args.output.join("board.html");
            html::generate_html(&board, &html_path)?;
            info!(path = %html_path.display(), lessons = board.len(), "HTML saved");
        }
        Some(Commands::Board { status, class }) => {
            let board = Fixtures::load(args.fixtures.as_deref())?.lesson_board();
            let filter = ClassFilter::from_query(class.as_deref());
            let columns = match status {
                Some(status) => vec![status],
                None => LessonStatus::ALL.to_vec(),
            };
            for status in columns {
                let lessons = board.view_by_class(&filter, status);
                info!(column = status.label(), count = lessons.len(), "Column");
                for lesson in &lessons {
                    info!(
                        id = lesson.id,
                        date = %lesson.date,
                        title = %lesson.title,
                        duration = %lesson.duration,
                        "Lesson"
                    );
                }
            }
        }
    }

    Ok(())
}
