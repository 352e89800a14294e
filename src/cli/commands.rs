//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands, ViewArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{
    layout, Layout, MindmapLayout, Perspective, RawCatalogRecord, ReconcileStats, TreeDisplay,
    ViewTree,
};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::{InMemorySurface, InfraError};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `catmap --help`".to_string(),
        ));
    };

    match command {
        Commands::Completion { shell } => {
            completion(*shell);
            Ok(())
        }
        Commands::Config { command } => config(command, cli.config.as_deref()),
        Commands::Tree { view, collapse } => tree(&container(cli)?, view, collapse),
        Commands::Layout {
            view,
            collapse,
            json,
        } => layout_cmd(&container(cli)?, view, collapse, *json),
        Commands::Render { view, toggle } => render(&container(cli)?, view, toggle),
        Commands::Find { view, query } => find(&container(cli)?, view, query),
    }
}

fn container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = Settings::load(cli.config.as_deref())?;
    Ok(ServiceContainer::new(settings))
}

fn fetch_records(
    container: &ServiceContainer,
    view: &ViewArgs,
) -> CliResult<(Perspective, Vec<RawCatalogRecord>)> {
    let perspective = view
        .perspective
        .unwrap_or(container.settings.default_perspective);
    let source = container.json_source(&view.source)?;
    let records = container
        .catalog_service(source)
        .fetch_all_catalog_records(perspective)?;
    debug!("{} records for {}", records.len(), perspective);
    Ok((perspective, records))
}

fn build_view_tree(
    container: &ServiceContainer,
    view: &ViewArgs,
    collapse: &[String],
) -> CliResult<ViewTree> {
    let (perspective, records) = fetch_records(container, view)?;
    let mut tree = container.settings.tree_builder().build(&records, perspective);
    for id in collapse {
        tree.set_collapsed(id, true)
            .map_err(|_| CliError::InvalidArgs(format!("cannot collapse unknown node {id}")))?;
    }
    Ok(tree)
}

#[instrument(skip(container))]
fn tree(container: &ServiceContainer, view: &ViewArgs, collapse: &[String]) -> CliResult<()> {
    let tree = build_view_tree(container, view, collapse)?;
    output::info(&tree.to_tree_string());
    output::header(&format!(
        "{} nodes, depth {}, {} leaves",
        tree.len(),
        tree.depth(),
        tree.leaf_ids().len()
    ));
    Ok(())
}

#[instrument(skip(container))]
fn layout_cmd(
    container: &ServiceContainer,
    view: &ViewArgs,
    collapse: &[String],
    json: bool,
) -> CliResult<()> {
    let tree = build_view_tree(container, view, collapse)?;
    let laid = layout(&tree, &container.settings.layout, &MindmapLayout);

    if json {
        let text = serde_json::to_string_pretty(&laid).map_err(|e| InfraError::Encode {
            what: "layout".to_string(),
            source: e,
        })?;
        output::info(&text);
    } else {
        print_layout(&laid);
    }
    Ok(())
}

fn print_layout(laid: &Layout) {
    output::header(&format!("nodes ({})", laid.nodes.len()));
    for node in &laid.nodes {
        output::detail(&format!(
            "{:<28} {:>8.1} {:>8.1} {:>5.0}x{:<4.0} {:<15} {}{}",
            node.id,
            node.x,
            node.y,
            node.width,
            node.height,
            node.kind.as_str(),
            node.path_labels.iter().join(" / "),
            if node.collapsed {
                format!("  [+{}]", node.catalog_count)
            } else {
                String::new()
            }
        ));
    }
    output::header(&format!("edges ({})", laid.edges.len()));
    for edge in &laid.edges {
        output::detail(&edge.id());
    }
}

#[instrument(skip(container))]
fn render(container: &ServiceContainer, view: &ViewArgs, toggles: &[String]) -> CliResult<()> {
    let source = container.json_source(&view.source)?;
    let catalog = container.catalog_service(source);
    let mut service = container.mount_view(InMemorySurface::new(), view.perspective);

    let stats = service.refresh(&catalog)?;
    print_stats("load", &stats);

    for id in toggles {
        let stats = service.toggle(id)?;
        print_stats(&format!("toggle {id}"), &stats);
    }

    if let Some(surface) = service.surface() {
        let ops = surface.ops();
        output::header("surface");
        output::detail(&format!(
            "{} nodes, {} edges ({} adds, {} updates, {} removes)",
            surface.node_count(),
            surface.edge_count(),
            ops.node_adds,
            ops.node_updates,
            ops.node_removes
        ));
    }
    service.unmount()?;
    Ok(())
}

fn print_stats(label: &str, stats: &ReconcileStats) {
    output::action(
        label,
        &format!(
            "+{} ~{} -{} nodes, {} edges",
            stats.added, stats.updated, stats.removed, stats.edges
        ),
    );
    if stats.dropped_edges > 0 {
        output::warning(&format!("{} edges dropped", stats.dropped_edges));
    }
}

#[instrument(skip(container))]
fn find(container: &ServiceContainer, view: &ViewArgs, query: &str) -> CliResult<()> {
    let tree = build_view_tree(container, view, &[])?;
    let hits = tree.find_by_name(query);
    if hits.is_empty() {
        output::warning(&format!("no node matches '{query}'"));
        return Ok(());
    }
    for id in hits {
        if let Some(node) = tree.get(id) {
            output::action(id, &node.data.path_labels.iter().join(" / "));
        }
    }
    Ok(())
}

fn config(command: &ConfigCommands, config_file: Option<&Path>) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(config_file)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) if path.exists() => output::success(&path.display()),
                Some(path) => output::failure(&format!("{} (not found)", path.display())),
                None => output::warning("no config directory for this platform"),
            }
            if let Some(path) = config_file {
                output::action("explicit", &path.display());
            }
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

fn completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
