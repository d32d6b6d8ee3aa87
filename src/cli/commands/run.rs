//! `kais-operator run`: wires the configured adapters together and drives
//! the Cell/Formation/Mission reconcile loops until the process is killed.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::info;

use crate::adapters::kube::KubeClusterGateway;
use crate::adapters::memory::{InMemoryClusterGateway, InMemoryMessageBus};
use crate::adapters::nats::NatsMessageBus;
use crate::adapters::sqlite::DatabaseConnection;
use crate::domain::errors::GatewayError;
use crate::domain::ports::{ClusterGateway, MessageBus};
use crate::infrastructure::{ConfigLoader, LoggerImpl};
use crate::services::controller::{self, ReconcileKey};
use crate::services::work_queue::WorkQueue;
use crate::services::{CellReconciler, FormationReconciler, MissionReconciler};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Run against in-memory adapters instead of a real cluster, NATS
    /// server, and sqlite database. Overrides `cluster.local` in config.
    #[arg(long)]
    pub local: bool,
}

pub async fn handle(config_path: Option<&std::path::Path>, args: &RunArgs) -> Result<()> {
    let mut config = match config_path {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    if args.local {
        config.cluster.local = true;
    }

    let _logger = LoggerImpl::init(&config.logging)?;
    info!(local = config.cluster.local, "starting kais-operator");

    let gateway: Arc<dyn ClusterGateway> = if config.cluster.local {
        Arc::new(InMemoryClusterGateway::new())
    } else {
        let client = kube::Client::try_default().await?;
        Arc::new(KubeClusterGateway::new(client))
    };

    let bus: Arc<dyn MessageBus> = if config.cluster.local {
        Arc::new(InMemoryMessageBus::new())
    } else {
        Arc::new(NatsMessageBus::connect(&config.message_bus.url).await?)
    };

    if !config.cluster.local {
        let db = DatabaseConnection::connect(&config.ledger.database_path, config.ledger.max_connections).await?;
        db.migrate().await?;
    }

    let namespace = config.cluster.namespace.clone();

    let cell_reconciler = Arc::new(CellReconciler::new(gateway.clone()));
    let formation_reconciler = Arc::new(FormationReconciler::new(gateway.clone()));
    let mission_reconciler = Arc::new(MissionReconciler::new(gateway.clone(), bus.clone()));

    let cell_queue = Arc::new(WorkQueue::<ReconcileKey>::new());
    let formation_queue = Arc::new(WorkQueue::<ReconcileKey>::new());
    let mission_queue = Arc::new(WorkQueue::<ReconcileKey>::new());

    let cell_watch: BoxStream<'static, Result<ReconcileKey, GatewayError>> =
        Box::pin(gateway.watch_cells(&namespace).map(|event| {
            event.map(|e| {
                let cell = e.into_inner();
                (cell.metadata.namespace, cell.metadata.name)
            })
        }));
    let formation_watch: BoxStream<'static, Result<ReconcileKey, GatewayError>> =
        Box::pin(gateway.watch_formations(&namespace).map(|event| {
            event.map(|e| {
                let formation = e.into_inner();
                (formation.metadata.namespace, formation.metadata.name)
            })
        }));
    let mission_watch: BoxStream<'static, Result<ReconcileKey, GatewayError>> =
        Box::pin(gateway.watch_missions(&namespace).map(|event| {
            event.map(|e| {
                let mission = e.into_inner();
                (mission.metadata.namespace, mission.metadata.name)
            })
        }));

    let cell_loop = {
        let gateway = gateway.clone();
        let reconciler = cell_reconciler.clone();
        controller::run(
            "Cell",
            cell_queue,
            cell_watch,
            config.reconciler.cell_workers as usize,
            move |(namespace, name)| {
                let gateway = gateway.clone();
                let reconciler = reconciler.clone();
                async move {
                    let cell = gateway.get_cell(&namespace, &name).await?;
                    reconciler.reconcile(&cell).await.map_err(domain_to_gateway_error)
                }
            },
        )
    };

    let formation_loop = {
        let gateway = gateway.clone();
        let reconciler = formation_reconciler.clone();
        controller::run(
            "Formation",
            formation_queue,
            formation_watch,
            config.reconciler.formation_workers as usize,
            move |(namespace, name)| {
                let gateway = gateway.clone();
                let reconciler = reconciler.clone();
                async move {
                    let formation = gateway.get_formation(&namespace, &name).await?;
                    reconciler.reconcile(&formation).await.map_err(domain_to_gateway_error)
                }
            },
        )
    };

    let mission_loop = {
        let gateway = gateway.clone();
        let reconciler = mission_reconciler.clone();
        controller::run(
            "Mission",
            mission_queue,
            mission_watch,
            config.reconciler.mission_workers as usize,
            move |(namespace, name)| {
                let gateway = gateway.clone();
                let reconciler = reconciler.clone();
                async move {
                    let mission = gateway.get_mission(&namespace, &name).await?;
                    reconciler.reconcile(&mission).await.map_err(domain_to_gateway_error)
                }
            },
        )
    };

    tokio::join!(cell_loop, formation_loop, mission_loop);
    Ok(())
}

/// Unwraps a [`DomainError`](crate::domain::errors::DomainError) back down
/// to the [`GatewayError`] the reconcile driver dispatches on; non-gateway
/// domain errors (budget, protocol, validation) have no retry semantics of
/// their own, so they are reported as fatal.
fn domain_to_gateway_error(err: crate::domain::errors::DomainError) -> GatewayError {
    match err {
        crate::domain::errors::DomainError::Gateway(gateway_err) => gateway_err,
        other => GatewayError::Fatal(other.to_string()),
    }
}
