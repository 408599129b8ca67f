use super::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Bearer-token gate with one-time refresh rotation")]
pub struct Cli {
    /// Path to a TOML settings profile.
    #[arg(long)]
    pub settings: Option<String>,
}
