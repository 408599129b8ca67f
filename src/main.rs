use std::fs;
use std::sync::Arc;
use tokio::signal;
use tollgate::api;
use tollgate::logger::*;
use tollgate::server::*;
use tollgate::settings::*;
use warp::Filter;

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "could not register SIGINT handler");
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    let address: std::net::SocketAddr = project_settings.http.address.parse()?;
    let server = Arc::new(Server::try_new(&project_settings).await?);

    let api_v1 = warp::path("api")
        .and(warp::path("v1"))
        .and(api::v1::routes(server.clone()))
        .recover(api::v1::recover_error)
        .with(warp::trace::request());

    if project_settings.http.tls {
        for path in [&project_settings.http.cert_path, &project_settings.http.key_path] {
            if !fs::metadata(path)?.is_file() {
                return Err(anyhow::anyhow!("TLS file is not a regular file: {:?}", path));
            }
        }
        let (bound, serving) = warp::serve(api_v1)
            .tls()
            .cert_path(&project_settings.http.cert_path)
            .key_path(&project_settings.http.key_path)
            .bind_with_graceful_shutdown(address, shutdown_signal());
        info!(%bound, "listening with TLS");
        serving.await;
    } else {
        let (bound, serving) =
            warp::serve(api_v1).try_bind_with_graceful_shutdown(address, shutdown_signal())?;
        info!(%bound, "listening");
        serving.await;
    }

    info!("server stopped");
    Ok(())
}
