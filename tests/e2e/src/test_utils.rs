use anyhow::{Context, Result};
use repository::CaseRepository;
use server::pipeline::Pipeline;
use server::state::AppState;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;
use transport::{HttpTransport, TransportConfig};

/// Write a dump file of `content` named `name` into `dir`
pub fn create_dump(dir: &Path, name: &str, content: &[u8]) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, content).with_context(|| format!("Failed to create dump: {:?}", path))?;
    Ok(path)
}

pub fn repository_for(url: &str) -> Result<Arc<CaseRepository>> {
    let transport = HttpTransport::new(TransportConfig::new(url).with_timeout(Duration::from_secs(30)))
        .context("Failed to build HTTP transport")?;
    Ok(Arc::new(CaseRepository::new(Arc::new(transport))))
}

pub async fn wait_for_server(url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let health_url = format!("{}/health", url);

    println!("Waiting for server to be ready...");
    for i in 0..30 {
        match client.get(&health_url).send().await {
            Ok(response) if response.status().is_success() => {
                println!("Server is ready!");
                return Ok(());
            }
            _ => {
                if i < 29 {
                    sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    anyhow::bail!("Server did not become ready within 30 seconds");
}

/// Case service running inside the test process on a free port
pub struct TestServer {
    pub url: String,
    pub state: actix_web::web::Data<AppState>,
    _data_dir: TempDir,
}

impl TestServer {
    /// Must be called from within an actix runtime (`#[actix_web::test]`)
    pub async fn start(pipeline: Pipeline) -> Result<Self> {
        let data_dir = tempfile::tempdir().context("Failed to create server data dir")?;
        let state = actix_web::web::Data::new(AppState::new(data_dir.path(), pipeline));
        let (server, addresses) = server::bind(state.clone(), ("127.0.0.1", 0))?;
        let address = addresses.first().context("Server is not listening")?;
        let url = format!("http://{}", address);

        actix_web::rt::spawn(server);
        wait_for_server(&url).await?;

        Ok(Self {
            url,
            state,
            _data_dir: data_dir,
        })
    }

    pub fn data_dir(&self) -> &Path {
        self.state.data_dir()
    }
}
