use fleet_dispatch::adapters::inbound::InMemoryEventStore;
use fleet_dispatch::adapters::outbound::{
    init_combined_logger, ChannelCommandSink, LoopbackVehicleAdapter,
};
use fleet_dispatch::application::{DispatcherHandle, KernelExecutor};
use fleet_dispatch::domains::fleet::*;
use fleet_dispatch::Config;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "fleet.toml".to_string());
    let config = Config::load(&config_path)?;
    info!(
        "Starting fleet {} with {:?} assignment",
        config.executor.fleet_id, config.dispatcher.assignment_strategy
    );

    let logger = init_combined_logger(&config.logging, &config.executor.fleet_id);
    let (sink, commands) = ChannelCommandSink::channel();
    let (executor, handle) = KernelExecutor::new(
        config,
        Box::new(sink),
        Arc::new(InMemoryEventStore::new()),
        logger,
    );
    let executor_task = executor.spawn();
    let adapter_task = tokio::spawn(
        LoopbackVehicleAdapter::new(commands, handle.clone(), Duration::from_millis(500)).run(),
    );

    if let Err(e) = load_demo_plant(&handle).await {
        error!("Demo plant rejected: {}", e);
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    handle.shutdown().await?;
    let fleet = executor_task.await?;
    let handled = adapter_task.await?;
    info!(
        "Fleet {} stopped at version {}; loopback handled {} commands",
        fleet.id, fleet.version, handled
    );
    Ok(())
}

/// A small plant: three stations, two parking spots, one charger, two
/// vehicles and a handful of orders.
async fn load_demo_plant(handle: &DispatcherHandle) -> Result<(), Box<dyn Error>> {
    let locations = [
        Location::station("Source", Position2D::new(0.0, 0.0)),
        Location::station("Sink", Position2D::new(20.0, 0.0)),
        Location::station("Buffer", Position2D::new(10.0, 10.0)),
        Location::parking("Park-1", Position2D::new(0.0, 10.0), Some(1)),
        Location::parking("Park-2", Position2D::new(20.0, 10.0), None),
        Location::charging("Charger", Position2D::new(10.0, -10.0)),
    ];
    for location in locations {
        handle.register_location(location).await?;
    }

    handle
        .register_vehicle(Vehicle::new("AGV-1").at("Source", Position2D::new(0.0, 0.0)))
        .await?;
    handle
        .register_vehicle(
            Vehicle::new("AGV-2")
                .at("Sink", Position2D::new(20.0, 0.0))
                .with_energy(25),
        )
        .await?;

    handle
        .create_order(TransportOrder::new(
            "T-1",
            vec![DriveStep::new("Source", "Load"), DriveStep::new("Sink", "Unload")],
        ))
        .await?;
    handle
        .create_order(
            TransportOrder::new("T-2", vec![DriveStep::new("Buffer", "Load")])
                .with_dependencies(["T-1"]),
        )
        .await?;
    Ok(())
}
