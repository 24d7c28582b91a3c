//! hexnode: inspect template annotation trees dumped by a binary template builder.
#![allow(clippy::multiple_crate_versions)]

use clap::Parser;
use hexnode::{config, manifest, outline, TemplateNode, TemplateTree};
use log::info;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hexnode")]
#[command(about = "Template annotation trees for hex viewers", long_about = None)]
struct Args {
    /// Manifest JSON describing the tree
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Load preferences from this file instead of hexnode.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Keep ranges exactly as the builder reported them
    #[arg(long)]
    no_merge: bool,

    /// Print the normalised manifest as JSON instead of an outline
    #[arg(long)]
    json: bool,

    /// Report the field covering this byte (decimal or 0x-prefixed hex)
    #[arg(long, value_name = "OFFSET", value_parser = parse_offset, conflicts_with = "json")]
    offset: Option<u64>,
}

fn parse_offset(text: &str) -> Result<u64, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid offset {text:?}: {e}"))
}

fn main() -> io::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let cfg = match &args.config {
        Some(path) => config::Config::load_from(path),
        None => config::Config::load(),
    };

    let file_content = std::fs::read_to_string(&args.path)?;
    let mut tree = manifest::load_tree_json(&file_content)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    info!("loaded {} nodes from {}", tree.len(), args.path.display());

    if cfg.merge_ranges && !args.no_merge {
        tree.merge_all_ranges();
    }

    if let Some(offset) = args.offset {
        println!("{}", describe_offset(&tree, offset));
    } else if args.json {
        let manifests = tree
            .to_manifests()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let json = serde_json::to_string_pretty(&manifests).map_err(io::Error::other)?;
        println!("{json}");
    } else {
        for line in outline::render_outline(&tree, cfg.outline_options()) {
            println!("{line}");
        }
    }

    Ok(())
}

/// Label path from the root down to the deepest node covering `offset`.
fn describe_offset(tree: &TemplateTree, offset: u64) -> String {
    let Some(id) = tree.node_at_offset(offset) else {
        return format!("No field covers {offset:#x}");
    };

    let mut path: Vec<&str> = std::iter::once(id)
        .chain(tree.ancestors(id))
        .filter_map(|node| tree.get(node))
        .map(|node| node.label().unwrap_or("(unlabelled)"))
        .collect();
    path.reverse();

    let value = tree.get(id).and_then(TemplateNode::value);
    match value {
        Some(value) => format!("{offset:#x}: {} = {value}", path.join(" > ")),
        None => format!("{offset:#x}: {}", path.join(" > ")),
    }
}

#[cfg(test)]
#[path = "tests/cli.rs"]
mod tests;
