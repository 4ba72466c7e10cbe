use std::{path::PathBuf, time::Duration};

use a2a_taskflow::{
    agents::{self, AgentsConfig, DEFAULT_APPLY_AGENT_URL, DEFAULT_SEARCH_AGENT_URL},
    client::{ClientConfig, StreamingAggregator},
    protocol::Message,
    server::{A2AServer, ServerConfig},
};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "a2a-taskflow",
    about = "Run the job search and apply agents, or talk to any A2A agent",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve one of the job agents
    Serve {
        #[arg(value_enum)]
        agent: AgentKind,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Defaults to 10001 for search and 10002 for apply
        #[arg(long)]
        port: Option<u16>,

        /// URL advertised in the agent card
        #[arg(long)]
        public_url: Option<String>,

        /// Holds the `jobs/` and `resumes/` directories
        #[arg(long, env = "A2A_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,

        /// Search agent the apply agent asks for job details
        #[arg(long, env = "SEARCH_AGENT_URL")]
        search_agent_url: Option<String>,

        #[arg(long, env = "APPLY_AGENT_URL")]
        apply_agent_url: Option<String>,
    },

    /// Send one text message to an agent and print the result
    Send {
        /// Base URL of the agent, where its card is discovered
        url: String,

        text: String,

        /// Continue an existing task, e.g. one waiting for input
        #[arg(long)]
        task: Option<String>,

        /// Context of `--task`; the agent looks it up when omitted
        #[arg(long, requires = "task")]
        context: Option<String>,

        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AgentKind {
    Search,
    Apply,
}

impl AgentKind {
    fn default_port(self) -> u16 {
        match self {
            AgentKind::Search => 10001,
            AgentKind::Apply => 10002,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Serve {
            agent,
            host,
            port,
            public_url,
            data_dir,
            search_agent_url,
            apply_agent_url,
        } => {
            let config = AgentsConfig::new(data_dir).with_search_agent_url(Some(
                search_agent_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SEARCH_AGENT_URL.to_string()),
            ));
            let port = port.unwrap_or_else(|| agent.default_port());

            // An explicit flag wins over the agent's own address variable
            let public_url = public_url.or(match agent {
                AgentKind::Search => search_agent_url,
                AgentKind::Apply => apply_agent_url,
            });

            let (card, skill) = match agent {
                AgentKind::Search => (
                    agents::search_card(DEFAULT_SEARCH_AGENT_URL),
                    config.search_skill(),
                ),
                AgentKind::Apply => (
                    agents::apply_card(DEFAULT_APPLY_AGENT_URL),
                    config.apply_skill(),
                ),
            };

            let mut server_config = ServerConfig::new(host, port);
            if let Some(url) = public_url {
                server_config = server_config.with_public_url(url);
            }

            let server = A2AServer::new(server_config, card, skill)
                .bind()
                .await
                .context("failed to start agent")?;
            info!(url = %server.url(), data_dir = %config.data_dir.display(), "agent ready");

            server
                .run_until(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!(error = %e, "failed to listen for ctrl-c");
                        std::future::pending::<()>().await;
                    }
                    info!("shutting down");
                })
                .await?;
        }
        Command::Send {
            url,
            text,
            task,
            context,
            timeout_secs,
        } => {
            let aggregator = StreamingAggregator::with_config(
                ClientConfig::default().with_timeout(Duration::from_secs(timeout_secs)),
            );

            let mut message = Message::user(text);
            message.task_id = task;
            message.context_id = context;

            let result = aggregator
                .run_message(&url, message)
                .await
                .with_context(|| format!("request to {} failed", url))?;

            println!("{}", result.text);
            if let (Some(task_id), Some(state)) = (&result.task_id, result.state) {
                eprintln!("task {} ended in state {}", task_id, state);
            }
        }
    }

    Ok(())
}
