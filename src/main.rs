// ABOUTME: Entry point for the zen-docker CLI application.
// ABOUTME: Parses arguments, loads the build file and dispatches to target scripts.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use zen_docker::config::BuildFile;
use zen_docker::error::Result;
use zen_docker::output::Output;
use zen_docker::registry;
use zen_docker::target::{Target, run_script};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("zen_docker=debug")
    } else if cli.quiet || cli.json {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("zen_docker=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut output = Output::new(cli.output_mode());
    output.start_timer();

    if let Err(e) = run(cli, &output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

#[derive(Serialize)]
struct TargetSummary<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    scripts: Vec<&'a str>,
}

#[derive(Serialize)]
struct TargetDetail<'a> {
    name: &'a str,
    cwd: String,
    srcs: &'a BTreeMap<String, Vec<String>>,
    outs: &'a [String],
    tools: &'a BTreeMap<String, String>,
    labels: &'a [String],
    scripts: BTreeMap<&'a str, ScriptDetail<'a>>,
}

#[derive(Serialize)]
struct ScriptDetail<'a> {
    deps: &'a [String],
    alias: &'a [String],
}

fn build_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => Ok(env::current_dir()?),
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    match cli.command {
        Commands::Types => {
            for kind in registry::known_types() {
                output.item(kind, &serde_json::json!({ "type": kind }));
            }
            Ok(())
        }
        Commands::List => {
            let dir = build_dir(cli.dir)?;
            let targets = BuildFile::discover(&dir)?.targets(&dir)?;
            for t in &targets {
                let summary = TargetSummary {
                    name: t.name.as_str(),
                    description: t.description.as_deref(),
                    scripts: t.scripts.keys().map(String::as_str).collect(),
                };
                let human = match t.description {
                    Some(ref d) => format!("{}  {d}", t.name),
                    None => t.name.to_string(),
                };
                output.item(&human, &summary);
            }
            Ok(())
        }
        Commands::Show { target } => {
            let dir = build_dir(cli.dir)?;
            let t = BuildFile::discover(&dir)?.target(&dir, &target)?;
            show(&t, output);
            Ok(())
        }
        Commands::Run { target, script } => {
            let dir = build_dir(cli.dir)?;
            let mut t = BuildFile::discover(&dir)?.target(&dir, &target)?;
            output.progress(&format!("Running {}:{script}", t.name));
            run_script(&mut t, &script).await?;
            output.success(&format!("{}:{script} done", t.name));
            Ok(())
        }
    }
}

fn show(t: &Target, output: &Output) {
    let detail = TargetDetail {
        name: t.name.as_str(),
        cwd: t.cwd.display().to_string(),
        srcs: &t.srcs,
        outs: &t.outs,
        tools: &t.tools,
        labels: &t.labels,
        scripts: t
            .scripts
            .iter()
            .map(|(name, s)| {
                (
                    name.as_str(),
                    ScriptDetail {
                        deps: &s.deps,
                        alias: &s.alias,
                    },
                )
            })
            .collect(),
    };

    let mut human = vec![format!("{}", t.name)];
    for (group, files) in &t.srcs {
        human.push(format!("  src {group}: {}", files.join(" ")));
    }
    for out in &t.outs {
        human.push(format!("  out {out}"));
    }
    for (tool, path) in &t.tools {
        human.push(format!("  tool {tool}: {path}"));
    }
    for (name, s) in &t.scripts {
        let mut line = format!("  script {name}");
        if !s.alias.is_empty() {
            line.push_str(&format!(" (alias {})", s.alias.join(", ")));
        }
        if !s.deps.is_empty() {
            line.push_str(&format!(" deps {}", s.deps.join(" ")));
        }
        human.push(line);
    }

    output.item(&human.join("\n"), &detail);
}
