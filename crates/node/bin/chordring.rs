use std::sync::Arc;

use chordring_core::dht::Chord;
use chordring_core::dht::Id;
use chordring_core::dht::IdSpace;
use chordring_core::dht::PeerRing;
use chordring_core::dht::Stabilizer;
use chordring_node::config;
use chordring_node::discovery::Discovery;
use chordring_node::discovery::FixedDiscovery;
use chordring_node::discovery::StaticDiscovery;
use chordring_node::endpoint::run_http_api;
use chordring_node::logging::init_logging;
use chordring_node::logging::LogLevel;
use chordring_node::rpc::Client;
use chordring_node::server::RpcMeta;
use chordring_node::transport::HttpTransport;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(about, version, author)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(long, default_value_t = LogLevel::Info, value_enum, env)]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Command {
    #[command(about = "Initializes a node with the given configuration.")]
    Init(InitCommand),
    #[command(about = "Starts a long-running node daemon.")]
    Run(RunCommand),
    #[command(about = "Shows successor, predecessor, finger table and stored information.")]
    Inspect(ClientArgs),
    #[command(about = "Shows lookup, stabilization and finger fix counters.")]
    Stats(ClientArgs),
    #[command(about = "Runs stabilize and fix_fingers once, now.")]
    Stabilize(ClientArgs),
    #[command(about = "Finds the node responsible for a key.")]
    Lookup(KeyCommand),
    #[command(about = "Stores a value at the node responsible for its key.")]
    Create(CreateCommand),
    #[command(about = "Fetches the value of a key.")]
    Get(KeyCommand),
    #[command(about = "Removes the value of a key.")]
    Remove(KeyCommand),
    #[command(about = "Leaves the ring gracefully and stops the node.")]
    Leave(ClientArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[arg(
        long,
        short = 'c',
        env,
        default_value = config::DEFAULT_CONFIG_PATH,
        help = "Config file location"
    )]
    pub config: String,
}

#[derive(Args, Debug)]
struct InitCommand {
    #[arg(
        long,
        default_value = config::DEFAULT_CONFIG_PATH,
        help = "The location of config file"
    )]
    pub location: String,

    #[arg(long, help = "Id of the node. If not provided, it is read from POD_NAME at start")]
    pub node_id: Option<u64>,

    #[arg(long, help = "Bits of the identifier space", default_value_t = chordring_core::consts::DEFAULT_ID_BITS)]
    pub id_bits: u8,

    #[arg(
        long = "peer",
        short = 'p',
        value_parser = parse_peer,
        help = "A peer of the static table, as <id>=<endpoint url>. May be repeated"
    )]
    pub peers: Vec<(u64, String)>,
}

#[derive(Args, Debug)]
struct RunCommand {
    #[arg(
        long,
        short = 'b',
        help = "Node listen address. If not provided, use bind_addr in config file or 127.0.0.1:50000",
        env
    )]
    pub bind_addr: Option<String>,

    #[arg(
        long,
        help = "Id of the node. If not provided, use node_id in config file or POD_NAME",
        env
    )]
    pub node_id: Option<u64>,

    #[arg(
        long,
        help = "Join through this peer instead of probing the peer table",
        env
    )]
    pub bootstrap: Option<u64>,

    #[arg(
        long,
        help = "Seconds between two stabilizations. If not provided, use stabilize_interval in config file or 5",
        env
    )]
    pub stabilize_interval: Option<u64>,

    #[command(flatten)]
    config_args: ConfigArgs,
}

#[derive(Args, Debug)]
struct ClientArgs {
    #[arg(
        long,
        short = 'u',
        help = "chordring node endpoint url. If not provided, use endpoint_url in config file or http://127.0.0.1:50000",
        env
    )]
    endpoint_url: Option<String>,

    #[command(flatten)]
    config_args: ConfigArgs,
}

impl ClientArgs {
    fn new_client(&self) -> anyhow::Result<Client> {
        if let Some(endpoint_url) = &self.endpoint_url {
            return Ok(Client::new(endpoint_url));
        }
        let c = config::Config::read_fs(self.config_args.config.as_str())?;
        Ok(Client::new(c.endpoint_url.as_str()))
    }
}

#[derive(Args, Debug)]
struct KeyCommand {
    #[command(flatten)]
    client_args: ClientArgs,

    pub key: u64,
}

#[derive(Args, Debug)]
struct CreateCommand {
    #[command(flatten)]
    client_args: ClientArgs,

    pub key: u64,

    pub value: String,
}

fn parse_peer(s: &str) -> Result<(u64, String), String> {
    let (id, url) = s
        .split_once('=')
        .ok_or_else(|| format!("expect <id>=<url>, got {s}"))?;
    let id = id.trim().parse().map_err(|e| format!("bad peer id {id}: {e}"))?;
    Ok((id, url.trim().to_string()))
}

/// Check `key` against the identifier space of the node `client` talks to.
async fn ring_key(client: &Client, key: u64) -> anyhow::Result<Id> {
    let info = client.node_info().await?;
    Ok(IdSpace::new(info.id_bits)?.id(key)?)
}

fn get_value<V>(value: Option<V>, default_value: V) -> V {
    value.unwrap_or(default_value)
}

async fn terminate_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::signal;
        use tokio::signal::unix::SignalKind;
        if let Ok(mut s) = signal(SignalKind::terminate()) {
            s.recv().await;
            return;
        }
    }
    std::future::pending::<()>().await
}

async fn daemon_run(args: RunCommand) -> anyhow::Result<()> {
    let mut c = config::Config::read_fs(args.config_args.config)?;
    c.node_id = args.node_id.or(c.node_id);
    c.bootstrap = args.bootstrap.or(c.bootstrap);
    c.bind_addr = get_value(args.bind_addr, c.bind_addr);
    c.stabilize_interval = get_value(args.stabilize_interval, c.stabilize_interval);

    let node_config = c.node_config()?;
    let space = IdSpace::new(c.id_bits)?;
    let peers = c.peer_table()?;
    let transport = Arc::new(HttpTransport::new_with_peers(&peers, c.rpc_timeout()));
    let node = Arc::new(PeerRing::new(node_config, transport.clone())?);
    println!("Node: {}", node.id);

    let shutdown = CancellationToken::new();
    let server_stop = CancellationToken::new();
    let meta = RpcMeta::new(node.clone(), shutdown.clone());
    let bind_addr = c.bind_addr.clone();
    let stop = server_stop.clone();
    let server = tokio::spawn(async move {
        run_http_api(&bind_addr, meta, async move { stop.cancelled().await }).await
    });

    let discovery: Box<dyn Discovery + Send + Sync> = match c.bootstrap {
        Some(id) => Box::new(FixedDiscovery(Some(space.id(id)?))),
        None => Box::new(StaticDiscovery::new(
            node.id,
            peers.keys().copied().collect::<Vec<Id>>(),
            transport,
            c.rpc_timeout(),
        )),
    };
    let bootstrap = discovery.bootstrap().await;
    node.join(bootstrap).await?;
    tracing::info!("node {} joined through {:?}", node.id, bootstrap);

    let maintenance = CancellationToken::new();
    let stabilizer = Arc::new(Stabilizer::new(node.clone()));
    let stabilizing = tokio::spawn(stabilizer.wait(c.stabilize_interval(), maintenance.clone()));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("received ctrl-c"),
        _ = terminate_signal() => tracing::info!("received terminate signal"),
        _ = shutdown.cancelled() => {},
    }

    maintenance.cancel();
    stabilizing.await?;
    if let Err(e) = node.leave().await {
        tracing::error!("failed to leave the ring: {}", e);
    }
    server_stop.cancel();
    server.await??;
    println!("Node {} left the ring", node.id);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match cli.command {
        Command::Init(args) => {
            let mut config = config::Config {
                node_id: args.node_id,
                id_bits: args.id_bits,
                ..Default::default()
            };
            config.peers.extend(args.peers);
            let p = config.write_fs(args.location.as_str())?;
            println!("Your config file has saved to: {}", p);
            Ok(())
        }
        Command::Run(args) => daemon_run(args).await,
        Command::Inspect(args) => {
            let info = args.new_client()?.node_info().await?;
            print!("{}", info);
            Ok(())
        }
        Command::Stats(args) => {
            let stats = args.new_client()?.node_stats().await?;
            print!("{}", stats);
            Ok(())
        }
        Command::Stabilize(args) => {
            let info = args.new_client()?.stabilize().await?;
            print!("{}", info);
            Ok(())
        }
        Command::Lookup(args) => {
            let client = args.client_args.new_client()?;
            let node = client.lookup(ring_key(&client, args.key).await?).await?;
            println!("Key {} is owned by node {}", args.key, node);
            Ok(())
        }
        Command::Create(args) => {
            let client = args.client_args.new_client()?;
            let key = ring_key(&client, args.key).await?;
            let created = client.create_info(key, args.value).await?;
            if created {
                println!("Key {} created", args.key);
            } else {
                println!("Key {} already exists", args.key);
            }
            Ok(())
        }
        Command::Get(args) => {
            let client = args.client_args.new_client()?;
            let value = client.get_info(ring_key(&client, args.key).await?).await?;
            match value {
                Some(v) => println!("{}", v),
                None => println!("Key {} not found", args.key),
            }
            Ok(())
        }
        Command::Remove(args) => {
            let client = args.client_args.new_client()?;
            let removed = client.remove_info(ring_key(&client, args.key).await?).await?;
            if removed {
                println!("Key {} removed", args.key);
            } else {
                println!("Key {} not found", args.key);
            }
            Ok(())
        }
        Command::Leave(args) => {
            args.new_client()?.leave().await?;
            println!("Leave requested");
            Ok(())
        }
    }
}
