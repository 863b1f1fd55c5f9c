use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::client::{ClientRegistry, handle_client};
use crate::config::{ServerConfig, StartupConfig, StoreBackend};
use crate::error::StoreError;
use crate::project::ProjectDirectory;
use crate::protocol::responses::{TOO_MANY_CLIENTS, error_response};
use crate::service::StructureStore;
use crate::store::{DocumentStore, FileDocumentStore, MemoryDocumentStore};

pub struct Server {
    client_registry: Arc<Mutex<ClientRegistry>>,
    store: Arc<StructureStore>,
    listener: TcpListener,
    config: Arc<StartupConfig>,
}

impl Server {
    /// Binds the listener for an already assembled structure store.
    pub async fn bind(config: StartupConfig, store: Arc<StructureStore>) -> io::Result<Self> {
        let socket = config.listen_socket();
        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", listener.local_addr()?);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e);
            }
        };

        Ok(Self {
            client_registry: Arc::new(Mutex::new(ClientRegistry::new(config.max_clients))),
            store,
            listener,
            config: Arc::new(config),
        })
    }

    /// Builds the document store backend, project directory and structure
    /// store described by `config`, then binds.
    pub async fn from_config(config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store = build_store(&config).await?;
        Ok(Self::bind(config.server, Arc::new(store)).await?)
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn start(&self) {
        info!(
            "Starting tree server on {} (max {} clients)",
            self.config.listen_socket(),
            self.config.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let client_registry = Arc::clone(&self.client_registry);
                    let store = Arc::clone(&self.store);
                    let max_command_length = self.config.max_command_length;

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_new_client(stream, addr, client_registry, store, max_command_length)
                                .await
                        {
                            warn!("Failed to handle client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Assembles the structure store for `config`.
pub async fn build_store(config: &ServerConfig) -> Result<StructureStore, StoreError> {
    let documents: Arc<dyn DocumentStore> = match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory document store");
            Arc::new(MemoryDocumentStore::new())
        }
        StoreBackend::File => {
            let store = FileDocumentStore::open(config.store.root_path())
                .await?
                .with_lock_timeout(config.store.timeout());
            info!("Using file document store at {}", store.root().display());
            Arc::new(store)
        }
    };
    let directory = ProjectDirectory::from_config(&config.projects);
    info!("{} registered projects", directory.len());

    Ok(StructureStore::new(
        documents,
        Arc::new(directory),
        config.store.clone(),
    ))
}

/// Registers a new client, rejecting it when the server is full.
async fn handle_new_client(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    client_registry: Arc<Mutex<ClientRegistry>>,
    store: Arc<StructureStore>,
    max_command_length: usize,
) -> Result<(), io::Error> {
    {
        let mut clients = client_registry.lock().await;
        if !clients.try_register(client_addr) {
            warn!(
                "Rejecting {}: {} clients connected",
                client_addr,
                clients.len()
            );
            drop(clients);
            let reply = error_response(TOO_MANY_CLIENTS, "Too many connections. Try again later.");
            stream.write_all(reply.as_bytes()).await?;
            stream.shutdown().await?;
            return Ok(());
        }

        info!(
            "Accepted client: {} ({}/{} clients)",
            client_addr,
            clients.len(),
            clients.max_clients()
        );
    }

    handle_client(
        stream,
        client_registry,
        client_addr,
        store,
        max_command_length,
    )
    .await;

    Ok(())
}
