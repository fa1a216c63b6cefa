//! Print a windowed, flattened directory listing
//!
//! Usage:
//!   fs-tree [path] [--open-all] [--height ROWS] [--scroll ROW]
//!
//! If no path is provided, uses the current directory.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use env_logger::Env;
use flat_tree::prelude::*;
use fs_tree::{FileRenderer, FsTree};
use log::{debug, info};

#[derive(Debug)]
struct Args {
    path: PathBuf,
    open_all: bool,
    height: usize,
    scroll: Option<usize>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut parsed = Args {
            path: PathBuf::from("."),
            open_all: false,
            height: 20,
            scroll: None,
        };
        let mut path_seen = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--open-all" => parsed.open_all = true,
                "--height" => {
                    let value = args.next().context("--height needs a value")?;
                    parsed.height = value
                        .parse()
                        .with_context(|| format!("Invalid height: {}", value))?;
                }
                "--scroll" => {
                    let value = args.next().context("--scroll needs a value")?;
                    parsed.scroll = Some(
                        value
                            .parse()
                            .with_context(|| format!("Invalid row: {}", value))?,
                    );
                }
                flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
                path if !path_seen => {
                    parsed.path = PathBuf::from(path);
                    path_seen = true;
                }
                extra => bail!("Unexpected argument: {}", extra),
            }
        }

        Ok(parsed)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args = Args::parse(env::args().skip(1))?;
    debug!("{:?}", args);

    let tree = FsTree::new(&args.path)?;
    let window = ListWindow::new(
        WindowOptions::new()
            .viewport_size(args.height as f32)
            .overscan_count(0),
    )?;
    let options = TreeOptions::new().row_size(1.0);
    let renderer = FileRenderer::new(options.markers.clone());

    let mut view = TreeView::new(tree, window, renderer, options)?;
    view.on_items_rendered(|range| {
        debug!(
            "Rendered rows {}..{} (visible {}..{})",
            range.overscan_start, range.overscan_end, range.visible_start, range.visible_end
        );
    });
    view.recompute_tree(true, true)?;

    if args.open_all {
        // Each pass registers one more level of directories
        loop {
            let before = view.row_count();
            view.open_all()?;
            if view.row_count() == before {
                break;
            }
        }
        info!("Opened every directory: {} rows", view.row_count());
    }

    if let Some(row) = args.scroll {
        view.scroll_to_item(row, ScrollAlign::Start);
    }

    println!("Directory: {}", view.flattener().source().root_path().display());
    println!("═══════════════════════════════");
    for line in view.render() {
        println!("{}", line);
    }
    println!("═══════════════════════════════");
    println!(
        "  Rows: {} (registered {}, discovered {})",
        view.row_count(),
        view.flattener().registry().len(),
        view.flattener().source().node_count()
    );
    println!(
        "  Offset: {} of {}",
        view.surface().scroll_offset(),
        view.surface().total_size()
    );

    Ok(())
}
