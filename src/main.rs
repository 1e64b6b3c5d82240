//! labnode CLI
//!
//! Usage:
//!   labnode --topology <FILE> [OPTIONS]
//!   labnode --install-templates [--templates <DIR>]
//!
//! Options:
//!   -t, --topology <FILE>   Topology file (TOML format)
//!   -l, --lab-root <DIR>    Directory lab directories are created in
//!       --templates <DIR>   Templates root
//!   -n, --node <NAME>       Only provision the named node (repeatable)
//!       --dry-run           Resolve only and print the nodes
//!       --install-templates Write the built-in templates and exit
//!   -v                      Raise log verbosity (repeatable)

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use labnode::template::{self, DEFAULT_TEMPLATES_ROOT};
use labnode::{
    logging, provision_node, resolve_node, Lab, Setting, TemplateRegistry, Topology,
    TopologyError, TopologySource,
};

#[derive(Parser)]
#[command(name = "labnode")]
#[command(about = "Provision containerized routing daemon lab nodes")]
struct Cli {
    /// Topology file (TOML format)
    #[arg(short, long, required_unless_present = "install_templates")]
    topology: Option<PathBuf>,

    /// Directory lab directories are created in (defaults to the topology's directory)
    #[arg(short, long)]
    lab_root: Option<PathBuf>,

    /// Templates root holding one directory per node kind
    #[arg(long, default_value = DEFAULT_TEMPLATES_ROOT)]
    templates: PathBuf,

    /// Only provision these nodes
    #[arg(short, long = "node")]
    nodes: Vec<String>,

    /// Resolve nodes without touching the filesystem and print them
    #[arg(long)]
    dry_run: bool,

    /// Write the built-in templates into the templates root
    #[arg(long)]
    install_templates: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Error setting up logging: {}", e);
    }

    if cli.install_templates {
        return match template::install(&cli.templates) {
            Ok(written) => {
                for path in written {
                    println!("{}", path.display());
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let Some(topology_path) = cli.topology.as_deref() else {
        eprintln!("Error: --topology is required");
        return ExitCode::FAILURE;
    };
    let topology = match load_topology(topology_path) {
        Ok(t) => t,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::FAILURE;
        }
    };

    let lab_root = cli
        .lab_root
        .clone()
        .unwrap_or_else(|| topology.base_dir.clone());
    let lab = Lab::new(topology, lab_root);
    let registry = TemplateRegistry::builtin(&cli.templates);
    let mut source = TopologySource::new(lab.topology(), &registry);
    if let Some(home) = std::env::var_os("HOME").filter(|h| !h.is_empty()) {
        source = source.with_home(home);
    }

    let names: Vec<String> = if cli.nodes.is_empty() {
        lab.node_names().map(String::from).collect()
    } else {
        cli.nodes.clone()
    };

    let mut failed = 0;
    for name in &names {
        let ok = if cli.dry_run {
            dry_run(&lab, &source, name)
        } else {
            provision(&lab, &registry, &source, name)
        };
        if !ok {
            failed += 1;
        }
    }

    if failed > 0 {
        eprintln!("{} of {} nodes failed", failed, names.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Read and parse the topology, rendering parse errors with source context
fn load_topology(path: &Path) -> Result<Topology, String> {
    match Topology::from_file(path) {
        Ok(t) => Ok(t),
        Err(e @ TopologyError::Parse { .. }) => {
            let filename = path.display().to_string();
            let source = fs::read_to_string(path).unwrap_or_default();
            Err(e.format(&source, &filename))
        }
        Err(e) => Err(format!("Error: {}", e)),
    }
}

fn provision(lab: &Lab, registry: &TemplateRegistry, source: &TopologySource, name: &str) -> bool {
    match provision_node(lab, registry, source, name) {
        Ok((node, report)) => {
            println!(
                "{}: {}",
                node.long_name,
                node.lab_dir
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            );
            for warning in report.warnings() {
                eprintln!("Warning [{}]: {}", node.short_name, warning);
            }
            true
        }
        Err(e) => {
            eprintln!("Error [{}]: {}", name, e);
            false
        }
    }
}

fn dry_run(lab: &Lab, source: &TopologySource, name: &str) -> bool {
    let Some((cfg, mut node)) = lab.allocate(name) else {
        eprintln!("Error: node {} is not declared in the topology", name);
        return false;
    };
    let topology = lab.topology();
    let user = topology.setting(cfg, Setting::User).unwrap_or_default();
    let env = topology.env(cfg);

    if let Err(e) = resolve_node(source, cfg, &mut node, user, &env) {
        eprintln!("Error [{}]: {}", name, e);
        return false;
    }
    match toml::to_string_pretty(&node) {
        Ok(text) => {
            println!("# {}\n{}", node.long_name, text);
            true
        }
        Err(e) => {
            eprintln!("Error [{}]: failed to print node: {}", name, e);
            false
        }
    }
}
