//! workshop-stack: declare, plan and preview the Azure workshop topology
//!
//! Nothing here talks to Azure. `plan` and `preview` work entirely offline,
//! `export` writes the desired state for an external engine, and `provision`
//! runs the nginx install over SSH against hosts the operator names.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;
use workshop_common::ResourceKind;
use workshop_common::defaults::DEFAULT_PROVISION_TIMEOUT;
use workshop_stack::config::{
    Credentials, ENV_ADMIN_PASSWORD, ENV_ADMIN_USERNAME, Overrides, PasswordPolicy, StackConfig,
    StackSettings,
};
use workshop_stack::deploy::{Deployment, LogReporter, SimulatedProvider};
use workshop_stack::export::ExportDocument;
use workshop_stack::graph::DependencyGraph;
use workshop_stack::provision::{self, CommandConfig, DryRunTransport, SshTransport};
use workshop_stack::{Stack, render};

#[derive(Parser, Debug)]
#[command(name = "workshop-stack")]
#[command(about = "Azure workshop topology: plan, preview, export and provision")]
#[command(version)]
struct Args {
    #[command(flatten)]
    stack: StackArgs,

    #[command(subcommand)]
    command: Command,
}

/// Flags shared by every subcommand
#[derive(clap::Args, Debug)]
struct StackArgs {
    /// Stack config file (default: <config dir>/workshop-stack/stack.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Managed disk size in GB (overrides diskSize)
    #[arg(long, global = true)]
    disk_size: Option<u32>,

    /// Attach each managed disk to its VM (overrides attachDisks); use
    /// `--attach-disks=false` to force detached disks
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    attach_disks: Option<bool>,

    /// Azure region (overrides location)
    #[arg(long, global = true)]
    location: Option<String>,

    /// Fall back to the placeholder admin password when none is set
    #[arg(long, global = true)]
    allow_default_password: bool,

    /// VM admin username
    #[arg(long, global = true, env = ENV_ADMIN_USERNAME)]
    admin_username: Option<String>,

    /// VM admin password
    #[arg(long, global = true, env = ENV_ADMIN_PASSWORD, hide_env_values = true)]
    admin_password: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the create (or destroy) order
    Plan {
        /// Print the destroy order instead
        #[arg(long)]
        destroy: bool,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Simulate a full deployment and print resolved resources and outputs
    Preview {
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Write the desired-state document as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the provisioning commands over SSH
    Provision {
        /// VM address, as NAME=HOST (e.g. vm1=203.0.113.7); repeat per VM
        #[arg(long = "host", value_parser = parse_host, required = true)]
        hosts: Vec<(String, String)>,

        /// Per-command timeout in seconds
        #[arg(long, default_value_t = DEFAULT_PROVISION_TIMEOUT)]
        timeout: u64,
    },
}

fn parse_host(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, host)) if !name.is_empty() && !host.is_empty() => {
            Ok((name.to_string(), host.to_string()))
        }
        _ => Err(format!("expected NAME=HOST, got '{s}'")),
    }
}

impl StackArgs {
    fn load(self) -> Result<StackConfig> {
        let policy = if self.allow_default_password {
            PasswordPolicy::AllowPlaceholder
        } else {
            PasswordPolicy::RequireExplicit
        };
        let credentials = Credentials::resolve(self.admin_username, self.admin_password, policy)?;

        let settings = match self.config {
            Some(path) => StackSettings::load(&path)?,
            None => match StackSettings::default_path() {
                Some(path) => StackSettings::load_or_default(&path)?,
                None => StackSettings::default(),
            },
        };

        let overrides = Overrides {
            disk_size: self.disk_size,
            attach_disks: self.attach_disks,
            location: self.location,
        };
        Ok(StackConfig::from_parts(credentials, settings, overrides)?)
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = args.stack.load()?;
    let stack = Stack::declare(&config);
    info!(
        deployment_id = %stack.deployment_id(),
        resources = stack.resources().len(),
        disk_size_gb = config.disk_size_gb(),
        attach_disks = config.attach_disks(),
        location = %config.azure.location,
        "Declared stack"
    );

    match args.command {
        Command::Plan { destroy, format } => handle_plan(&stack, destroy, format)?,
        Command::Preview { format } => handle_preview(&stack, &config, format).await?,
        Command::Export { output } => handle_export(&stack, output)?,
        Command::Provision { hosts, timeout } => handle_provision(&stack, hosts, timeout).await?,
    }

    Ok(())
}

fn handle_plan(stack: &Stack, destroy: bool, format: OutputFormat) -> Result<()> {
    stack.log_lint_warnings();

    let graph = DependencyGraph::build(stack.resources())?;
    let plan = if destroy {
        graph.destroy_plan()?
    } else {
        graph.plan()?
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Table => {
            println!("{}", render::plan_table(&plan));
            println!(
                "\n{} {} steps in {} waves",
                plan.len(),
                plan.action,
                plan.wave_count()
            );
        }
    }
    Ok(())
}

async fn handle_preview(stack: &Stack, config: &StackConfig, format: OutputFormat) -> Result<()> {
    stack.log_lint_warnings();

    let deployment = Deployment::new(stack)?;
    let mut provider = SimulatedProvider::new(&config.azure.subscription_id, stack.deployment_id());
    let transport = DryRunTransport::new();
    let result = deployment
        .apply(&mut provider, &transport, &LogReporter)
        .await
        .context("Simulated deployment failed")?;

    match format {
        OutputFormat::Json => {
            let doc = serde_json::json!({
                "deploymentId": stack.deployment_id(),
                "resources": result.live,
                "outputs": result.outputs,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Table => {
            println!("{}", render::live_table(&result.live));
            println!("\n{}", render::outputs_table(&result.outputs));
            for cmd in transport.recorded() {
                println!("would run on {} as {}: {}", cmd.host, cmd.user, cmd.command);
            }
        }
    }
    Ok(())
}

fn handle_export(stack: &Stack, output: Option<PathBuf>) -> Result<()> {
    let json = ExportDocument::build(stack)?.to_json()?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Wrote desired-state document");
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn handle_provision(stack: &Stack, hosts: Vec<(String, String)>, timeout: u64) -> Result<()> {
    let hosts: BTreeMap<String, String> = hosts.into_iter().collect();
    for name in hosts.keys() {
        if stack.get(name).is_none_or(|r| r.kind() != ResourceKind::VirtualMachine) {
            bail!("Unknown VM '{name}'");
        }
    }

    let transport = SshTransport::new(CommandConfig::with_timeout_secs(timeout));

    let results = provision::run_on_hosts(stack, &hosts, &transport).await?;
    for (name, output) in &results {
        println!("{name}: ok ({} lines of output)", output.stdout.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_disks_before_subcommand() {
        let args = Args::try_parse_from(["workshop-stack", "--attach-disks", "plan"]).unwrap();
        assert_eq!(args.stack.attach_disks, Some(true));
        assert!(matches!(args.command, Command::Plan { destroy: false, .. }));
    }

    #[test]
    fn test_attach_disks_after_subcommand() {
        let args = Args::try_parse_from(["workshop-stack", "plan", "--attach-disks"]).unwrap();
        assert_eq!(args.stack.attach_disks, Some(true));
    }

    #[test]
    fn test_attach_disks_explicit_value() {
        let args =
            Args::try_parse_from(["workshop-stack", "--attach-disks=false", "preview"]).unwrap();
        assert_eq!(args.stack.attach_disks, Some(false));

        let args = Args::try_parse_from(["workshop-stack", "export"]).unwrap();
        assert_eq!(args.stack.attach_disks, None);
    }

    #[test]
    fn test_host_pairs() {
        let args = Args::try_parse_from([
            "workshop-stack",
            "provision",
            "--host",
            "vm1=203.0.113.7",
            "--host",
            "vm2=203.0.113.8",
        ])
        .unwrap();
        let Command::Provision { hosts, timeout } = args.command else {
            panic!("expected provision");
        };
        assert_eq!(hosts[1], ("vm2".to_string(), "203.0.113.8".to_string()));
        assert_eq!(timeout, DEFAULT_PROVISION_TIMEOUT);
        assert!(parse_host("vm1").is_err());
    }
}
