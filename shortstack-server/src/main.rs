#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use clap::Parser;
use shortstack_http::serve;

#[derive(Parser)]
#[command(name = "shortstack")]
struct Cli {
    #[arg(long, env = "SHORTSTACK_DATA_DIR", default_value = "./data")]
    data_dir: String,
    #[arg(long, env = "SHORTSTACK_BIND_ADDR")]
    bind_addr: Option<String>,
    #[arg(long, env = "SHORTSTACK_PORT")]
    port: Option<u16>,

    /// Base URL of the durable corpus store; in-process store when unset.
    #[arg(long, env = "SHORTSTACK_CORPUS_URL")]
    corpus_url: Option<String>,
    /// Base URL of the vector index; in-process index when unset.
    #[arg(long, env = "SHORTSTACK_VECTOR_URL")]
    vector_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let bind_addr = resolve_bind_addr(&cli);
    std::env::set_var("SHORTSTACK_DATA_DIR", &cli.data_dir);
    std::env::set_var("SHORTSTACK_BIND_ADDR", &bind_addr);
    if let Some(url) = &cli.corpus_url {
        std::env::set_var("SHORTSTACK_CORPUS_URL", url);
    }
    if let Some(url) = &cli.vector_url {
        std::env::set_var("SHORTSTACK_VECTOR_URL", url);
    }

    serve().await
}

/// Explicit --bind-addr wins; --port binds loopback; otherwise the default.
fn resolve_bind_addr(cli: &Cli) -> String {
    if let Some(bind_addr) = &cli.bind_addr {
        return bind_addr.clone();
    }
    if let Some(port) = cli.port {
        return format!("127.0.0.1:{port}");
    }
    "127.0.0.1:7700".to_string()
}
