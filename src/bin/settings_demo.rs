use tollgate::settings::*;

// $ cargo run --bin settings_demo -- --settings=settings/release.toml
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let project_settings = parse_settings(cli.settings.as_deref())?;

    println!("backend: {}", project_settings.auth.backend);
    println!("ledger store: {}", project_settings.ledger.store);
    println!("listen: {} (tls: {})", project_settings.http.address, project_settings.http.tls);
    println!("{:#?}", project_settings);

    let is_err = parse_settings(Some("")).is_err();
    println!("error on empty path: {}", is_err);
    Ok(())
}
