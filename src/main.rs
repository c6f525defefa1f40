use clap::{Parser, Subcommand, ValueEnum};
use folio::engine::Engine;
use folio::locate::Kind;
use folio::types::Metadata;
use folio::watch::WatchHandle;
use folio::{config, frontmatter, listing, output};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Resolve a content directory into a navigable tree")]
#[command(long_about = "\
Resolve a content directory into a navigable tree

Folders are sections, files are pages. A folder request shows the first
convention file it finds:

  content/
  ├── config.toml                  # Optional, overrides stock defaults
  ├── index.mdx                    # Root page
  ├── 01-getting-started/          # Numbered = ordered first in listings
  │   └── README.md                # Shown for /01-getting-started
  ├── talks/
  │   └── SLIDES.mdx               # Slide deck for /talks
  ├── intro.slides.mdx             # Standalone deck
  └── demo.tsx                     # Script page with `export const frontmatter`

Lookup order for a folder (first match wins):
  Document:  index.* → README.* → <folder>.*
  Slides:    SLIDES.* → index.slides.*
  Script:    index.* → <folder>.*

Run 'folio gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the content tree
    Tree {
        /// Emit the tree as JSON
        #[arg(long)]
        json: bool,
    },
    /// Navigate a logical path to its directory and file
    Resolve { path: String },
    /// Find the file a path stands for under the lookup conventions
    Locate {
        path: String,
        #[arg(long, value_enum, default_value_t = KindArg::Document)]
        kind: KindArg,
    },
    /// Print the frontmatter of a single file
    Frontmatter { file: PathBuf },
    /// List the posts of a directory in listing order
    Posts {
        #[arg(default_value = "")]
        path: String,
    },
    /// Rebuild on every change until interrupted
    Watch,
    /// Validate the content directory and config
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Document,
    Slides,
    Script,
}

impl From<KindArg> for Kind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Document => Kind::Document,
            KindArg::Slides => Kind::Slides,
            KindArg::Script => Kind::Script,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Tree { json } => {
            let engine = Engine::open(&cli.source)?;
            let tree = engine.get_tree();
            if json {
                println!("{}", serde_json::to_string_pretty(&*tree)?);
            } else {
                output::print_tree(&tree);
            }
        }
        Command::Resolve { path } => {
            let engine = Engine::open(&cli.source)?;
            let resolved = engine.navigate(&path)?;
            output::print_resolution(&resolved.directory, resolved.file.as_ref());
        }
        Command::Locate { path, kind } => {
            let engine = Engine::open(&cli.source)?;
            let kind = Kind::from(kind);
            let ticket = engine.begin_request();
            match engine.load(ticket, &path, kind) {
                Ok(Some(loaded)) => {
                    output::print_locate(&path, kind, Some(loaded.relative.as_str()));
                    let metadata = Metadata {
                        title: Some(loaded.title()),
                        ..loaded.metadata.clone()
                    };
                    if kind == Kind::Slides {
                        let slides = frontmatter::count_slides(&loaded.contents);
                        output::print_slides(&loaded.relative, slides, &metadata);
                    } else {
                        output::print_metadata(&metadata);
                    }
                }
                Ok(None) | Err(folio::engine::EngineError::Navigate(_)) => {
                    output::print_locate(&path, kind, None);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Frontmatter { file } => {
            let metadata = frontmatter::extract_file(&file)?;
            output::print_metadata(&metadata);
        }
        Command::Posts { path } => {
            let engine = Engine::open(&cli.source)?;
            let resolved = engine.navigate(&path)?;
            let posts = listing::listing(&resolved.directory, engine.config().posts.sort);
            output::print_posts(&posts);
        }
        Command::Watch => {
            let engine = Arc::new(Engine::open(&cli.source)?);
            let changes = engine.subscribe();
            let _handle = WatchHandle::spawn(Arc::clone(&engine))?;
            println!("==> Watching {}", engine.root().display());
            for _ in changes {
                let generation = engine.snapshot();
                println!(
                    "==> Content changed (generation {}, {} files)",
                    generation.number,
                    generation.file_count()
                );
            }
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let engine = Engine::open(&cli.source)?;
            output::print_tree(&engine.get_tree());
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool) {
    let default = if verbose { "folio=debug" } else { "folio=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
