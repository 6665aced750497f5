use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use humantime::parse_duration;
use overlay_notify::Edge;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless overlay notification demo", long_about = None)]
pub struct Cli {
    /// Chemin du fichier de configuration TOML.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Force le bord d'affichage (left, top, right, bottom).
    #[arg(long, value_name = "EDGE")]
    pub edge: Option<Edge>,

    /// Durée totale de la démo avant arrêt (ex. "5s").
    #[arg(long, value_parser = parse_duration, default_value = "5s")]
    pub duration: Duration,

    /// Période du minuteur d'expiration (ex. "250ms").
    #[arg(long, value_parser = parse_duration, default_value = "500ms")]
    pub tick: Duration,

    /// Utilise un layer JSON pour les logs (`--features json-logs`).
    #[arg(long, action = ArgAction::SetTrue)]
    pub json_logs: bool,

    /// Filtre de logs explicite (ex. "overlay_notify=debug").
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
