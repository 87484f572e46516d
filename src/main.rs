use lodestone::common::Result;
use lodestone::{logger, Dimension, WorldConfig};
use log::{info, LevelFilter};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    logger::init(LevelFilter::Info);

    let config = match std::env::args().nth(1) {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };
    info!("Lodestone init, world at {}", config.world_dir.display());

    let dimension = Dimension::new(config)?;
    // the spawn region is always ticking
    dimension.region(0, 0)?;
    dimension.start_ticking(tokio::runtime::Handle::current(), CancellationToken::new());

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    dimension.stop_ticking().await;
    dimension.save_all()
}
