//! Cedar CLI Tool
//!
//! Command line interface for checking Cedar configuration and dispatching requests

use anyhow::{Context, Result};
use cedar_core::config::loader::{get_config_path, load_config, load_config_from_path};
use cedar_core::{Config, NamedContexts, Request, RequestOptions};
use cedar_loadbalance::{
    InstanceSelector, LoadBalancerClient, LoadBalancerLifecycle, RequestData, SelectionRequest,
    StatsLifecycle,
};
use cedar_relay::Dispatcher;
use clap::{Parser, Subcommand};
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cedar-cli")]
#[command(about = "A CLI tool for Cedar load-balanced dispatch")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate configuration file
    ValidateConfig {
        /// Path to configuration file, defaults to `CONFIG_PATH` or config.toml
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Show which instances a service resolves to
    Resolve {
        /// Path to configuration file, defaults to `CONFIG_PATH` or config.toml
        #[arg(short, long)]
        config: Option<String>,
        /// Logical service name
        #[arg(short, long)]
        service: String,
        /// Routing hint, defaults to the configured hint for the service
        #[arg(long)]
        hint: Option<String>,
        /// Number of selections to perform
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Dispatch a request to a logical service
    Call {
        /// Path to configuration file, defaults to `CONFIG_PATH` or config.toml
        #[arg(short, long)]
        config: Option<String>,
        /// Request URL whose host is the logical service name
        url: String,
        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        /// Request header in `Name: value` form, may be repeated
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Request body
        #[arg(short, long)]
        data: Option<String>,
        /// Read timeout in seconds, overrides the transport settings
        #[arg(long)]
        timeout: Option<u64>,
        /// Print lifecycle statistics after the call
        #[arg(long)]
        stats: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_file(true)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ValidateConfig { config } => {
            let path = config.clone().unwrap_or_else(get_config_path);
            println!("Validating configuration file: {}", path);
            match read_config(config) {
                Ok(cfg) => print_config_summary(&cfg),
                Err(e) => {
                    eprintln!("❌ Configuration validation failed: {:#}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Resolve {
            config,
            service,
            hint,
            count,
        } => {
            let cfg = read_config(config)?;
            resolve_service(&cfg, &service, hint, count);
        }
        Commands::Call {
            config,
            url,
            method,
            headers,
            data,
            timeout,
            stats,
        } => {
            let cfg = read_config(config)?;
            let request = build_request(&url, &method, &headers, data)?;
            let mut options = RequestOptions::from(&cfg.transport);
            if let Some(seconds) = timeout {
                options.read_timeout = Duration::from_secs(seconds);
            }
            call_service(&cfg, &request, &options, stats).await?;
        }
    }

    Ok(())
}

/// 未指定路径时按 `CONFIG_PATH` 环境变量加载
fn read_config(path: Option<String>) -> Result<Config> {
    match path {
        Some(path) => load_config_from_path(&path),
        None => load_config(),
    }
}

fn print_config_summary(config: &Config) {
    let instance_count: usize = config.services.values().map(|s| s.instances.len()).sum();
    println!("✅ Configuration is valid");
    println!("  - {} services configured", config.services.len());
    println!("  - {} instances configured", instance_count);
    println!("  - default strategy: {:?}", config.loadbalancer.strategy);
    println!("  - hint header: {}", config.loadbalancer.hint_header_name);

    let mut names: Vec<&String> = config.services.keys().collect();
    names.sort();
    for name in names {
        println!(
            "  - {}: {:?}, hint '{}'",
            name,
            config.strategy_for(name),
            config.loadbalancer.hint_for(name)
        );
    }
}

/// 按配置执行若干次实例选择并打印结果
fn resolve_service(config: &Config, service: &str, hint: Option<String>, count: usize) {
    let (client, _registry) = LoadBalancerClient::from_config(config);
    let hint = hint.unwrap_or_else(|| config.loadbalancer.hint_for(service));
    let request = Request::get(format!("http://{}/", service)).build();
    let lb_request = SelectionRequest::new(RequestData::from(&request), hint);

    println!(
        "Resolving service '{}' (strategy={}, hint={})",
        service,
        client.strategy_for(service).name(),
        lb_request.hint()
    );
    for attempt in 1..=count {
        match client.choose(service, &lb_request) {
            Some(instance) => println!(
                "  #{} {} -> {}",
                attempt,
                instance.instance_id,
                instance.base_url()
            ),
            None => println!("  #{} no instance available", attempt),
        }
    }
}

/// 解析命令行参数为请求
fn build_request(
    url: &str,
    method: &str,
    headers: &[String],
    data: Option<String>,
) -> Result<Request> {
    let method = Method::from_bytes(method.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method '{}'", method))?;

    let mut builder = Request::builder(method, url);
    for header in headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("Invalid header '{}', expected 'Name: value'", header))?;
        builder = builder.header(name.trim(), value.trim());
    }
    if let Some(body) = data {
        builder = builder.body(body);
    }
    Ok(builder.build())
}

async fn call_service(
    config: &Config,
    request: &Request,
    options: &RequestOptions,
    show_stats: bool,
) -> Result<()> {
    let stats = Arc::new(StatsLifecycle::new());
    let contexts = Arc::new(NamedContexts::new());
    contexts.register_default::<Arc<dyn LoadBalancerLifecycle>>("stats", stats.clone());

    let (dispatcher, _registry) = Dispatcher::from_config(config, contexts)?;

    println!("🔍 {} {}", request.method(), request.url());
    let response = dispatcher.execute(request, options).await?;

    let status = response.status;
    println!(
        "Status: {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    );
    println!("URL: {}", response.request_url);
    for (name, value) in &response.headers {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    println!();
    println!("{}", response.text());

    if show_stats {
        println!();
        println!("📊 Lifecycle Statistics");
        println!("{}", serde_json::to_string_pretty(&stats.snapshot())?);
    }

    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
