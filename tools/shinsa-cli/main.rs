//! Command-line checker for stored process definitions.
//!
//! Loads a definition JSON file (either a `graph_v1` object or a legacy
//! step-list array), repairs its boundaries, validates it and prints the
//! report. With `--layout` the node positions are recomputed; with
//! `--output` the repaired definition is written back out.

use std::fs;
use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use serde_json::Value;

use shinsa::definition::{GraphDefinition, WorkflowStep, ensure_boundary_nodes, steps_to_definition};
use shinsa::layout::layout_nodes_by_flow;
use shinsa::validate::validate_definition;

#[derive(Parser, Debug)]
#[command(name = "shinsa-cli", about = "Validate and repair process definitions")]
struct Args {
    /// Definition file: a graph_v1 object or a legacy step-list array.
    input: PathBuf,

    /// Recompute node positions from the flow structure.
    #[arg(long)]
    layout: bool,

    /// Write the repaired definition to this path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the written definition.
    #[arg(long)]
    pretty: bool,
}

fn main() {
    let args = Args::parse();

    let raw = match fs::read_to_string(&args.input) {
        Ok(raw) => raw,
        Err(error) => exit_with_error(&format!("cannot read {}: {error}", args.input.display())),
    };
    let value: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(error) => exit_with_error(&format!("invalid JSON: {error}")),
    };

    let definition = match &value {
        Value::Array(_) => {
            let steps: Vec<WorkflowStep> = match serde_json::from_value(value.clone()) {
                Ok(steps) => steps,
                Err(error) => exit_with_error(&format!("invalid step list: {error}")),
            };
            println!("Loaded {} legacy steps", steps.len());
            steps_to_definition(&steps)
        }
        _ => GraphDefinition::from_value(&value),
    };

    let mut repaired = ensure_boundary_nodes(&definition);
    println!(
        "Definition: {} nodes, {} edges",
        repaired.nodes.len(),
        repaired.edges.len()
    );

    if args.layout {
        let positions = layout_nodes_by_flow(&repaired);
        for node in &mut repaired.nodes {
            if let Some(position) = positions.get(node.id.as_str()) {
                node.position = Some(*position);
            }
        }
        println!("Recomputed layout for {} nodes", positions.len());
    }

    let report = validate_definition(&repaired);
    for issue in &report.errors {
        println!("error[{:?}]: {}", issue.code, issue.message);
    }
    for issue in &report.warnings {
        println!("warning[{:?}]: {}", issue.code, issue.message);
    }

    if let Some(output) = &args.output {
        let serialized = if args.pretty {
            serde_json::to_string_pretty(&repaired)
        } else {
            serde_json::to_string(&repaired)
        };
        let serialized = match serialized {
            Ok(serialized) => serialized,
            Err(error) => exit_with_error(&format!("cannot serialize definition: {error}")),
        };
        if let Err(error) = fs::write(output, serialized) {
            exit_with_error(&format!("cannot write {}: {error}", output.display()));
        }
        println!("Wrote {}", output.display());
    }

    if report.valid {
        println!("Definition is valid");
    } else {
        println!(
            "Definition is invalid ({} errors, {} warnings)",
            report.errors.len(),
            report.warnings.len()
        );
        exit(1);
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("shinsa-cli: {message}");
    exit(1)
}
