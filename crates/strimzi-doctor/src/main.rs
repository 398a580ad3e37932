//! strimzi-doctor command line interface
//!
//! Thin dispatch over the library: health checks, rebalance lifecycle
//! operations, certificate evaluation and the annotation-driven actions.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kube::Client;
use std::sync::Arc;
use strimzi_doctor::certs::{CertVerdict, CertificateExpiryEvaluator, DEFAULT_WARNING_DAYS};
use strimzi_doctor::crd::{clients_ca_cert_secret, cluster_ca_cert_secret, KafkaRebalanceSpec};
use strimzi_doctor::health::{run_health_check, HealthCheckContext};
use strimzi_doctor::rebalance::{RebalanceRequest, RebalanceStateMachine};
use strimzi_doctor::store::{KubeStore, ResourceStore};
use strimzi_doctor::{annotations, error};
use tracing::Level;

/// Health, rebalance and certificate tooling for Strimzi Kafka fleets
#[derive(Parser, Debug)]
#[command(name = "strimzi-doctor")]
#[command(about = "Inspect and operate Strimzi-managed Kafka resources")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: Level,

    /// Enable JSON log format
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run all health checkers and print the aggregated report
    Health {
        /// Restrict the scan to one namespace
        #[arg(long, env = "NAMESPACE")]
        namespace: Option<String>,

        /// Restrict the scan to one Kafka cluster
        #[arg(long)]
        cluster: Option<String>,

        /// Certificate expiry warning threshold in days
        #[arg(long, default_value_t = DEFAULT_WARNING_DAYS)]
        warning_days: i64,

        /// Print findings as JSON instead of the text report
        #[arg(long)]
        json: bool,
    },

    /// Operate the rebalance lifecycle
    Rebalance {
        #[command(subcommand)]
        command: RebalanceCommand,
    },

    /// Evaluate a cluster's CA certificates
    Certs {
        /// Namespace of the Kafka cluster
        #[arg(long, env = "NAMESPACE")]
        namespace: String,

        /// Kafka cluster name
        #[arg(long)]
        cluster: String,

        /// Expiry warning threshold in days
        #[arg(long, default_value_t = DEFAULT_WARNING_DAYS)]
        warning_days: i64,
    },

    /// Ask the operator to restart a connector
    RestartConnector {
        #[arg(long, env = "NAMESPACE")]
        namespace: String,
        /// Connector name
        name: String,
        /// Restart only this task
        #[arg(long)]
        task: Option<i32>,
    },

    /// Ask the operator to regenerate a user's password secret
    RenewPassword {
        #[arg(long, env = "NAMESPACE")]
        namespace: String,
        /// KafkaUser name
        name: String,
    },

    /// Trigger a manual rolling update of a cluster
    RollingUpdate {
        #[arg(long, env = "NAMESPACE")]
        namespace: String,
        /// Kafka cluster name
        cluster: String,
    },
}

#[derive(Subcommand, Debug)]
enum RebalanceCommand {
    /// Show the observed rebalance phase
    Status {
        #[arg(long, env = "NAMESPACE")]
        namespace: String,
        name: String,
    },
    /// Create a rebalance resource from a YAML spec file
    Create {
        #[arg(long, env = "NAMESPACE")]
        namespace: String,
        name: String,
        /// Kafka cluster the rebalance targets
        #[arg(long)]
        cluster: String,
        /// Path to a KafkaRebalance spec in YAML; empty spec when omitted
        #[arg(long)]
        spec: Option<std::path::PathBuf>,
    },
    /// Approve the computed proposal
    Approve {
        #[arg(long, env = "NAMESPACE")]
        namespace: String,
        name: String,
    },
    /// Recompute the proposal
    Refresh {
        #[arg(long, env = "NAMESPACE")]
        namespace: String,
        name: String,
    },
    /// Stop an in-flight rebalance
    Stop {
        #[arg(long, env = "NAMESPACE")]
        namespace: String,
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let store: Arc<dyn ResourceStore> = Arc::new(KubeStore::new(client));

    match args.command {
        Command::Health {
            namespace,
            cluster,
            warning_days,
            json,
        } => {
            let mut ctx = HealthCheckContext::new(store);
            if let Some(namespace) = namespace {
                ctx = ctx.with_namespace(namespace);
            }
            if let Some(cluster) = cluster {
                ctx = ctx.with_cluster(cluster);
            }
            let result = run_health_check(&ctx, warning_days).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", result.format());
            }
            if result.has_issues() {
                std::process::exit(1);
            }
        }

        Command::Rebalance { command } => {
            let fsm = RebalanceStateMachine::new(store);
            run_rebalance(&fsm, command).await?;
        }

        Command::Certs {
            namespace,
            cluster,
            warning_days,
        } => {
            let evaluator = CertificateExpiryEvaluator::new(warning_days);
            let mut found_any = false;
            for secret_name in [
                cluster_ca_cert_secret(&cluster),
                clients_ca_cert_secret(&cluster),
            ] {
                let Some(secret) = store.get_secret(&namespace, &secret_name).await? else {
                    println!("{secret_name}: not found");
                    continue;
                };
                found_any = true;

                for (key, bytes) in secret
                    .data
                    .unwrap_or_default()
                    .iter()
                    .filter(|(k, _)| k.ends_with(".crt"))
                {
                    match evaluator.evaluate(&bytes.0) {
                        CertVerdict::Ok {
                            info,
                            days_remaining,
                        } => println!(
                            "{secret_name}/{key}: OK — {} valid for {days_remaining} more day(s)",
                            info.subject
                        ),
                        CertVerdict::ExpiringSoon {
                            info,
                            days_remaining,
                        } => println!(
                            "{secret_name}/{key}: WARNING — {} expires in {days_remaining} day(s)",
                            info.subject
                        ),
                        CertVerdict::Expired { info } => println!(
                            "{secret_name}/{key}: EXPIRED — {} expired at {}",
                            info.subject,
                            info.not_after.to_rfc3339()
                        ),
                        CertVerdict::Unreadable { reason } => {
                            println!("{secret_name}/{key}: UNREADABLE — {reason}")
                        }
                    }
                }
            }
            // Both secrets absent means the cluster name is wrong.
            if !found_any {
                return Err(error::Error::not_found(
                    "Secret",
                    &namespace,
                    &cluster_ca_cert_secret(&cluster),
                )
                .into());
            }
        }

        Command::RestartConnector {
            namespace,
            name,
            task,
        } => {
            match task {
                Some(task) => {
                    annotations::restart_connector_task(store.as_ref(), &namespace, &name, task)
                        .await?
                }
                None => annotations::restart_connector(store.as_ref(), &namespace, &name).await?,
            };
            println!("restart requested for connector '{namespace}/{name}'");
        }

        Command::RenewPassword { namespace, name } => {
            annotations::renew_user_password(store.as_ref(), &namespace, &name).await?;
            println!("password renewal requested for user '{namespace}/{name}'");
        }

        Command::RollingUpdate { namespace, cluster } => {
            annotations::trigger_rolling_update(store.as_ref(), &namespace, &cluster).await?;
            println!("rolling update requested for cluster '{namespace}/{cluster}'");
        }
    }

    Ok(())
}

async fn run_rebalance(fsm: &RebalanceStateMachine, command: RebalanceCommand) -> Result<()> {
    match command {
        RebalanceCommand::Status { namespace, name } => {
            let obs = fsm.observe(&namespace, &name).await?;
            match obs.detail {
                Some(detail) => println!("{} ({detail})", obs.state),
                None => println!("{}", obs.state),
            }
            if let Some(session) = obs.session_id {
                println!("session: {session}");
            }
        }
        RebalanceCommand::Create {
            namespace,
            name,
            cluster,
            spec,
        } => {
            let spec: KafkaRebalanceSpec = match spec {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    serde_yaml::from_str(&raw)
                        .with_context(|| format!("Failed to parse {}", path.display()))?
                }
                None => KafkaRebalanceSpec::default(),
            };
            fsm.create(&namespace, &name, &cluster, spec).await?;
            println!("rebalance '{namespace}/{name}' created");
        }
        RebalanceCommand::Approve { namespace, name } => {
            fsm.request(&namespace, &name, RebalanceRequest::Approve)
                .await?;
            println!("rebalance '{namespace}/{name}' approved");
        }
        RebalanceCommand::Refresh { namespace, name } => {
            fsm.request(&namespace, &name, RebalanceRequest::Refresh)
                .await?;
            println!("proposal refresh requested for '{namespace}/{name}'");
        }
        RebalanceCommand::Stop { namespace, name } => {
            fsm.request(&namespace, &name, RebalanceRequest::Stop)
                .await?;
            println!("stop requested for '{namespace}/{name}'");
        }
    }
    Ok(())
}

/// Initialize logging subsystem
fn init_logging(args: &Args) {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if args.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
