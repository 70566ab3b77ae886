use anyhow::Result;
use clap::{Parser, Subcommand};
use explorer_client::{ClientConfig, ExplorerClient, FeedSession, LoadOutcome, DEFAULT_BASE_URL};
use explorer_core::constants::LIST_VISIBLE_THRESHOLD;
use explorer_core::{BlockEntity, BlockRecord};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

mod format;

#[derive(Parser, Debug)]
#[command(name = "explorer")]
#[command(about = "Browse block history from an Esplora indexer")]
struct Cli {
    /// Indexer base URL (e.g. https://blockstream.info/api/)
    #[arg(short, long, default_value = DEFAULT_BASE_URL)]
    node: String,

    /// Load more once this many blocks or fewer are left below the last visible one
    #[arg(long, default_value_t = LIST_VISIBLE_THRESHOLD)]
    threshold: usize,

    /// Print Esplora JSON records instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Newest page of blocks
    Recent,
    /// Page of blocks at and below a height
    Older {
        #[arg(long, allow_negative_numbers = true)]
        from: i64,
    },
    /// A single block, by height or by hash
    Block {
        #[arg(long, allow_negative_numbers = true, conflicts_with = "hash", required_unless_present = "hash")]
        height: Option<i64>,
        #[arg(long)]
        hash: Option<String>,
    },
    /// Load the newest page, then keep scrolling to the bottom of the feed
    Browse {
        /// Number of times to scroll to the bottom
        #[arg(long, default_value_t = 3)]
        pages: usize,
        /// Rows on screen
        #[arg(long, default_value_t = 10)]
        visible: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = ExplorerClient::new(&ClientConfig::with_base_url(&cli.node))?;

    match cli.cmd {
        Command::Recent => print_rows(&client.list_blocks(None).await?, cli.json)?,
        Command::Older { from } => print_rows(&client.list_blocks(Some(from)).await?, cli.json)?,
        Command::Block { height, hash } => {
            let blocks = match (height, hash) {
                (Some(height), _) => client.get_block_by_height(height).await?,
                (None, hash) => client.get_block(hash.as_deref().unwrap_or_default()).await?,
            };
            if cli.json {
                print_json(&blocks)?;
            } else {
                for block in &blocks {
                    println!("{}", format::detail(block));
                }
            }
        }
        Command::Browse { pages, visible } => {
            browse(client, cli.threshold, pages, visible, cli.json).await?
        }
    }
    Ok(())
}

/// Drive a feed session the way a reader would: show the newest page, then
/// repeatedly scroll to the last row.
async fn browse(
    client: ExplorerClient,
    threshold: usize,
    pages: usize,
    visible: usize,
    json: bool,
) -> Result<()> {
    let session = FeedSession::new(client, threshold);
    session.refresh().await?;
    print_rows(&session.snapshot().await, json)?;

    for _ in 0..pages {
        let total = session.len().await;
        let outcomes = session
            .position_changed(visible.min(total), total, total.saturating_sub(1))
            .await;
        for outcome in outcomes {
            match outcome {
                Ok(LoadOutcome::Appended { count, oldest }) => info!(count, oldest, "page loaded"),
                Ok(LoadOutcome::EndOfHistory) => info!("reached the genesis block"),
                Ok(other) => info!(?other, "nothing loaded"),
                Err(e) => warn!(error = %e, "loading older blocks failed"),
            }
        }

        let feed = session.snapshot().await;
        if feed.len() == total {
            break;
        }
        print_rows(&feed[total..], json)?;
    }
    Ok(())
}

fn print_rows(blocks: &[BlockEntity], json: bool) -> Result<()> {
    if json {
        return print_json(blocks);
    }
    println!("{}", format::row_header());
    for block in blocks {
        println!("{}", format::row(block));
    }
    Ok(())
}

fn print_json(blocks: &[BlockEntity]) -> Result<()> {
    let records: Vec<BlockRecord> = blocks.iter().map(BlockRecord::from).collect();
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
