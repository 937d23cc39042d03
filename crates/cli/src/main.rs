use std::io::{self, Write};

use clap::Parser;
use tokio::time::Duration;
use tracing::warn;

use memvault_client::{ClientConfig, ConnectOptions, DistributedClient, NodeAddr};
use memvault_common::{
    ClientResult, DEFAULT_HOST, DEFAULT_MAX_RETRIES, DEFAULT_PORT, DEFAULT_REPLICATION_FACTOR,
    DEFAULT_RETRY_DELAY_MS, DEFAULT_VIRTUAL_NODES,
};

#[derive(Parser, Debug)]
#[command(name = "memvault-cli", about = "MemVault CLI client")]
struct Args {
    /// Nó de cache (host:port). Pode ser repetido.
    #[arg(long = "node", value_name = "HOST:PORT")]
    nodes: Vec<NodeAddr>,
    /// Total de cópias por escrita.
    #[arg(long, default_value_t = DEFAULT_REPLICATION_FACTOR)]
    replicas: usize,
    #[arg(long, default_value_t = DEFAULT_VIRTUAL_NODES)]
    vnodes: usize,
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    retries: u32,
    #[arg(long, default_value_t = DEFAULT_RETRY_DELAY_MS)]
    retry_delay_ms: u64,

    /// Comando para executar diretamente (modo não interativo)
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memvault_cli=info,memvault_client=warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = ClientConfig::default()
        .with_replication_factor(args.replicas)
        .with_virtual_nodes(args.vnodes)
        .with_max_retries(args.retries)
        .with_retry_delay(Duration::from_millis(args.retry_delay_ms));
    let options: ConnectOptions = config.connect_options();
    let client = DistributedClient::new(config);

    let nodes = if args.nodes.is_empty() {
        vec![NodeAddr::new(DEFAULT_HOST, DEFAULT_PORT)]
    } else {
        args.nodes
    };
    for node in &nodes {
        if let Err(e) = client.connect_with(node.host(), node.port(), options).await {
            warn!("{e}");
        }
    }
    let connected = client.nodes().await;
    if connected.is_empty() {
        anyhow::bail!("nenhum nó de cache disponível");
    }

    // Modo comando único (via argumentos)
    if !args.command.is_empty() {
        let line = args.command.join(" ");
        let cmd = parse_line(&line).map_err(|e| anyhow::anyhow!(e))?;
        println!("{}", execute(&client, cmd).await?);
        return Ok(());
    }

    let joined: Vec<String> = connected.iter().map(ToString::to_string).collect();
    println!("Conectado a {}", joined.join(", "));

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("memvault> ");
        io::stdout().flush()?;

        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break; // EOF
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Ok(ReplCommand::Quit) => break,
            Ok(cmd) => match execute(&client, cmd).await {
                Ok(output) => println!("{output}"),
                Err(e) => println!("(error) {e}"),
            },
            Err(e) => println!("(error) {e}"),
        }
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Get(String),
    Set {
        key: String,
        value: String,
        ttl_secs: Option<u64>,
    },
    Del(String),
    Nodes,
    Help,
    Quit,
}

const HELP: &str = "comandos: GET <key> | SET <key> <value> [EX <secs>] | DEL <key> | NODES | QUIT";

fn parse_line(line: &str) -> Result<ReplCommand, String> {
    let tokens = tokenize(line);
    let Some((name, rest)) = tokens.split_first() else {
        return Err("comando vazio".into());
    };

    let cmd = match (name.to_ascii_uppercase().as_str(), rest) {
        ("GET", [key]) => ReplCommand::Get(key.clone()),
        ("DEL", [key]) => ReplCommand::Del(key.clone()),
        ("SET", [key, value]) => ReplCommand::Set {
            key: key.clone(),
            value: value.clone(),
            ttl_secs: None,
        },
        ("SET", [key, value, ex, ttl]) if ex.eq_ignore_ascii_case("EX") => ReplCommand::Set {
            key: key.clone(),
            value: value.clone(),
            ttl_secs: Some(ttl.parse().map_err(|_| format!("TTL inválido: {ttl}"))?),
        },
        ("NODES", []) => ReplCommand::Nodes,
        ("HELP", []) => ReplCommand::Help,
        ("QUIT" | "EXIT", []) => ReplCommand::Quit,
        _ => return Err(format!("sintaxe inválida: {line}\n{HELP}")),
    };
    Ok(cmd)
}

async fn execute(client: &DistributedClient, cmd: ReplCommand) -> ClientResult<String> {
    let output = match cmd {
        ReplCommand::Get(key) => format_value(client.get(&key).await?.as_deref()),
        ReplCommand::Set {
            key,
            value,
            ttl_secs,
        } => {
            client.set(&key, &value, ttl_secs).await?;
            "OK".to_string()
        }
        ReplCommand::Del(key) => {
            client.delete(&key).await?;
            "OK".to_string()
        }
        ReplCommand::Nodes => format_nodes(&client.nodes().await, client.vnode_count().await),
        ReplCommand::Help => HELP.to_string(),
        ReplCommand::Quit => String::new(),
    };
    Ok(output)
}

/// Tokeniza a linha de input com suporte a strings quoted.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // Distingue `""` (token vazio) de nenhum token.
    let mut has_token = false;
    let mut in_quote = false;
    let mut quote_char = '"';
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quote {
            if c == quote_char {
                in_quote = false;
            } else if c == '\\' {
                match chars.peek() {
                    Some(&next) if next == '\\' || next == '"' || next == '\'' => {
                        current.push(next);
                        chars.next();
                    }
                    _ => current.push(c),
                }
            } else {
                current.push(c);
            }
        } else if c == '"' || c == '\'' {
            in_quote = true;
            has_token = true;
            quote_char = c;
        } else if c.is_whitespace() {
            if has_token {
                tokens.push(std::mem::take(&mut current));
                has_token = false;
            }
        } else {
            current.push(c);
            has_token = true;
        }
    }

    if has_token {
        tokens.push(current);
    }

    tokens
}

fn format_value(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("\"{v}\""),
        None => "(nil)".to_string(),
    }
}

fn format_nodes(nodes: &[NodeAddr], vnodes: usize) -> String {
    if nodes.is_empty() {
        return "(nenhum nó)".to_string();
    }
    let mut lines: Vec<String> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| format!("{}) {node}", i + 1))
        .collect();
    lines.push(format!("({vnodes} nós virtuais)"));
    lines.join("\n")
}
