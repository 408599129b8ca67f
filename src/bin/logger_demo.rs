use tollgate::logger::*;

fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    debug!("hidden by the bootstrap filter");
    info!("bootstrap info log");

    logger.reload_from_config(&LogConfig {
        filter: "info,tollgate=debug".to_string(),
    })?;
    debug!(target: "tollgate::gate", "visible after reload");
    debug!(target: "other_crate", "still hidden");

    let rejected = logger.reload_from_config(&LogConfig {
        filter: "tollgate=loud".to_string(),
    });
    warn!(rejected = rejected.is_err(), "bad directives keep the previous filter");
    Ok(())
}
