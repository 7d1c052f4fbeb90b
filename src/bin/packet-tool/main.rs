//! CLI tool for editing exhibit packet page lists and converting them to
//! Automerge binary format.
//!
//! Usage:
//!   packet-tool [--file packet.json] <command>
//!
//!   init | add [--hint H] [--description D] | delete <id> | describe <id> <text>
//!   set-page-number <id> <n> | move <dragged> <target> | list [--json]
//!   export [--output packet.automerge] [--title T] [--validate] [--stats]
//!   import <packet.automerge>

mod input;
mod transform;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use input::InputPacket;
use packet_sequencer::{layout, total_printed_pages, PacketManager, UuidIds};

#[derive(Parser, Debug)]
#[command(
    name = "packet-tool",
    about = "Edit exhibit packet page lists and convert them to Automerge",
    version
)]
struct Args {
    /// Page list JSON file (the browser app's saved pages)
    #[arg(short, long, env = "PACKET_FILE", default_value = "packet.json", global = true)]
    file: PathBuf,

    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty page list
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Append a page after the current last page
    Add {
        /// Extraction hint stored with the page
        #[arg(long)]
        hint: Option<String>,

        /// Initial description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a page and close the gap
    Delete { id: String },

    /// Set a page description
    Describe { id: String, text: String },

    /// Change a page's printed page number; later pages shift with it
    SetPageNumber { id: String, page_number: i64 },

    /// Move a page onto another page's slot
    Move { dragged: String, target: String },

    /// Print the exhibit list
    List {
        /// Print layout rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert the page list to an Automerge document
    Export {
        /// Output file path (defaults to the page list path with .automerge extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Packet title stored in the document
        #[arg(long)]
        title: Option<String>,

        /// Validate output by hydrating back to structs
        #[arg(long)]
        validate: bool,

        /// Print statistics about the conversion
        #[arg(long)]
        stats: bool,
    },

    /// Replace the page list with the pages of an Automerge document
    Import { input: PathBuf },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    debug!(?args, "parsed arguments");

    let path = args.file.as_path();
    match args.command {
        Command::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            std::fs::write(path, "[]\n").context("Failed to write page list")?;
            println!("Created {}", path.display());
        }
        Command::Add { hint, description } => {
            let (mut manager, _) = load_packet(path)?;
            let page = manager.add_page_with_hint(hint.as_deref())?;
            if let Some(description) = description {
                manager.set_description(&page.id, &description)?;
            }
            save_packet(&mut manager, path)?;
            println!(
                "Added {} at position {} (page {})",
                page.id, page.position, page.page_number
            );
        }
        Command::Delete { id } => {
            let (mut manager, _) = load_packet(path)?;
            require_page(&mut manager, &id)?;
            manager.delete_page(&id)?;
            save_packet(&mut manager, path)?;
        }
        Command::Describe { id, text } => {
            let (mut manager, _) = load_packet(path)?;
            manager.set_description(&id, &text)?;
            save_packet(&mut manager, path)?;
        }
        Command::SetPageNumber { id, page_number } => {
            if page_number < 1 {
                anyhow::bail!("Page numbers start at 1 (got {})", page_number);
            }
            let (mut manager, _) = load_packet(path)?;
            require_page(&mut manager, &id)?;
            manager.set_page_number(&id, page_number)?;
            save_packet(&mut manager, path)?;
        }
        Command::Move { dragged, target } => {
            let (mut manager, _) = load_packet(path)?;
            require_page(&mut manager, &dragged)?;
            require_page(&mut manager, &target)?;
            manager.reorder(&dragged, &target)?;
            save_packet(&mut manager, path)?;
        }
        Command::List { json } => {
            let (mut manager, _) = load_packet(path)?;
            print_list(&mut manager, json)?;
        }
        Command::Export {
            output,
            title,
            validate,
            stats,
        } => export(path, output, title, validate, stats)?,
        Command::Import { input } => {
            let bytes = std::fs::read(&input).context("Failed to read Automerge file")?;
            let mut manager =
                PacketManager::from_bytes(&bytes).context("Failed to load Automerge document")?;
            manager.normalize()?;
            save_packet(&mut manager, path)?;
            println!("Imported {} → {}", input.display(), path.display());
        }
    }

    Ok(())
}

/// Reads and repairs the page list, returning the manager and the raw JSON.
fn load_packet(path: &Path) -> Result<(PacketManager, String)> {
    if !path.exists() {
        anyhow::bail!(
            "Page list does not exist: {} (run `packet-tool init`)",
            path.display()
        );
    }

    let json = std::fs::read_to_string(path).context("Failed to read page list")?;
    let packet: InputPacket = serde_json::from_str(&json).context("Failed to parse JSON")?;
    let (title, input_pages) = packet.into_parts();

    let (pages, report) = transform::normalize_pages(input_pages, &mut UuidIds);
    if !report.is_clean() {
        info!(
            generated_ids = report.generated_ids,
            filled_positions = report.filled_positions,
            filled_page_numbers = report.filled_page_numbers,
            compacted = report.compacted,
            "page list needed repairs"
        );
    }

    let mut manager = PacketManager::new();
    manager.replace_pages(pages)?;
    if let Some(title) = title {
        manager.set_title(&title)?;
    }
    Ok((manager, json))
}

fn save_packet(manager: &mut PacketManager, path: &Path) -> Result<()> {
    let json = manager.to_json()?;
    std::fs::write(path, json + "\n").context("Failed to write page list")?;
    Ok(())
}

fn require_page(manager: &mut PacketManager, id: &str) -> Result<()> {
    if manager.get_page(id)?.is_none() {
        anyhow::bail!("No page with id {}", id);
    }
    Ok(())
}

fn print_list(manager: &mut PacketManager, json: bool) -> Result<()> {
    let pages = manager.pages()?;
    let rows = layout(&pages);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("(no pages)");
        return Ok(());
    }

    println!("{:>4}  {:>9}  {:<36}  DESCRIPTION", "POS", "PAGES", "ID");
    for row in &rows {
        let pages = if row.span == 1 {
            row.page_number.to_string()
        } else {
            format!("{}-{}", row.page_number, row.last_page)
        };
        println!(
            "{:>4}  {:>9}  {:<36}  {}",
            row.position, pages, row.id, row.description
        );
    }
    println!();
    println!("{} exhibits, {} printed pages", rows.len(), total_printed_pages(&pages));
    Ok(())
}

fn export(
    path: &Path,
    output: Option<PathBuf>,
    title: Option<String>,
    validate: bool,
    stats: bool,
) -> Result<()> {
    let (mut manager, json) = load_packet(path)?;
    if let Some(title) = title {
        manager.set_title(&title)?;
    }
    let num_pages = manager.pages()?.len();

    let binary = manager.save();

    let output_path = output.unwrap_or_else(|| {
        let mut p = path.to_path_buf();
        p.set_extension("automerge");
        p
    });
    std::fs::write(&output_path, &binary).context("Failed to write output file")?;

    if validate {
        let mut loaded = PacketManager::from_bytes(&binary)
            .context("Failed to load binary for validation")?;
        let hydrated = loaded.pages().context("Failed to hydrate for validation")?;

        if hydrated.len() != num_pages {
            anyhow::bail!(
                "Validation failed: page count mismatch (expected {}, got {})",
                num_pages,
                hydrated.len()
            );
        }
        if hydrated != manager.pages()? {
            anyhow::bail!("Validation failed: hydrated pages differ from input");
        }

        println!("✓ Validation passed!");
    }

    if stats {
        let title = manager.get_state()?.title;
        println!();
        println!("Conversion statistics:");
        println!("  Title:         {}", if title.is_empty() { "-" } else { title.as_str() });
        println!("  Pages:         {:>10}", num_pages);
        println!("  Input JSON:    {:>10} bytes", json.len());
        println!("  Output binary: {:>10} bytes", binary.len());
        println!(
            "  Compression:   {:>10.2}x",
            json.len() as f64 / binary.len().max(1) as f64
        );
    }

    println!(
        "Successfully converted {} → {}",
        path.display(),
        output_path.display()
    );
    Ok(())
}
