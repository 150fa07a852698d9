use anyhow::Result;
use clap::Parser;
use context_slicer::cli::{Cli, Commands};
use context_slicer::config::SliceConfig;
use context_slicer::program::loader::load_program;
use context_slicer::program::{MethodRef, ProgramModel};
use context_slicer::{call_graph, extractor, points_to};
use log::info;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Slice {
            program,
            target,
            depth,
            format,
            output,
            extended,
            entry_points,
            config,
        } => {
            let config = SliceConfig::load(config.as_deref())?;
            let program = load_model(&program, &entry_points, &config)?;
            let target: MethodRef = target.parse()?;
            let depth = depth.unwrap_or(config.depth);
            let extended = extended || config.extended;

            let (graph, _) = build_graph(&program);
            let slice = extractor::extract(&graph, &program, &target, depth)?;
            info!(
                "slice for {}: {} caller(s) within {} hop(s)",
                slice.target,
                slice.callers.len(),
                depth
            );

            let writer: Box<dyn Write> = match output {
                Some(path) => Box::new(File::create(path)?),
                None => Box::new(std::io::stdout()),
            };
            let mut slice_writer = context_slicer::create_writer(format.into(), writer, extended);
            slice_writer.write_slice(&slice)
        }
        Commands::Graph {
            program,
            entry_points,
            config,
        } => {
            let config = SliceConfig::load(config.as_deref())?;
            let program = load_model(&program, &entry_points, &config)?;
            let (graph, stats) = build_graph(&program);
            let report = serde_json::json!({
                "methods": program.method_count(),
                "nodes": graph.node_count(),
                "edges": graph.edge_count(),
                "phantom_targets": stats.phantom_targets,
                "empty_receiver_sites": stats.empty_receiver_sites,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Loads the JSON-IR model and applies entry points from flags or config.
fn load_model(
    path: &PathBuf,
    flag_entries: &[String],
    config: &SliceConfig,
) -> Result<ProgramModel> {
    let program = load_program(path)?;
    let entries = if flag_entries.is_empty() {
        &config.entry_points
    } else {
        flag_entries
    };
    if entries.is_empty() {
        return Ok(program);
    }
    let parsed: Result<Vec<MethodRef>, _> = entries.iter().map(|e| e.parse()).collect();
    Ok(program.with_entry_points(parsed?)?)
}

fn build_graph(
    program: &ProgramModel,
) -> (context_slicer::CallGraph, context_slicer::BuildStats) {
    info!(
        "solving points-to constraints over {} method(s)",
        program.method_count()
    );
    let analysis = points_to::solve(program);
    info!(
        "points-to fixpoint reached: {} site(s), {} variable(s)",
        analysis.site_count(),
        analysis.var_count()
    );
    let (graph, stats) = call_graph::build(program, &analysis);
    info!(
        "call graph built: {} node(s), {} edge(s), {} phantom target(s), {} empty receiver site(s)",
        graph.node_count(),
        stats.edges,
        stats.phantom_targets,
        stats.empty_receiver_sites
    );
    (graph, stats)
}
