use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "mock-bridge",
    version = env!("APP_VERSION_DISPLAY"),
    about = "🤖 Inspect mocked API responses and sync them with an Android device over ADB"
)]
pub struct Args {
    /// adb binary to invoke (requires Android Platform Tools)
    #[arg(long, global = true, env = "MOCK_BRIDGE_ADB", default_value = "adb")]
    pub adb: String,

    /// Configuration document holding the save path (default: <app dir>/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List connected devices (offline devices are skipped)
    Devices,
    /// List third-party apps installed on a device
    Apps { device: String },
    /// Pull recorded responses from the device into the save directory
    Pull {
        device: String,
        package: String,
        /// Local base name, stored as <name>.json
        name: String,
        /// Also pull the storage records as <name>-storage.json
        #[arg(long)]
        storage: bool,
    },
    /// Push a response file (and its storage sibling) to the device
    Push {
        device: String,
        package: String,
        file: String,
        /// Do not restart the app afterwards
        #[arg(long)]
        no_restart: bool,
    },
    /// Delete the pushed mock files from the device
    Clean { device: String, package: String },
    /// Force-stop and relaunch an app
    Restart { device: String, package: String },
    /// List response files in the save directory with their storage attachments
    Files,
    /// Print one response file
    Show { file: String },
    /// Replace a response file with JSON read from a file (or stdin with '-')
    Save { file: String, input: PathBuf },
    /// Print or replace the storage attachment of a response file
    Storage {
        file: String,
        /// JSON input (or '-' for stdin); prints the current storage when omitted
        input: Option<PathBuf>,
    },
    /// Edit single endpoints of a response file
    #[command(subcommand)]
    Endpoint(EndpointCommand),
    /// Print the save directory, or change it when a path is given
    SavePath { path: Option<PathBuf> },
}

#[derive(Debug, Subcommand)]
pub enum EndpointCommand {
    /// Add or replace an endpoint
    Set {
        file: String,
        method: String,
        path: String,
        #[arg(long, default_value_t = 200)]
        status: u16,
        /// Header as Name:Value, repeatable
        #[arg(long = "header", value_name = "NAME:VALUE")]
        headers: Vec<String>,
        /// JSON body
        #[arg(long, default_value = "{}")]
        body: String,
    },
    /// Remove an endpoint
    Remove {
        file: String,
        method: String,
        path: String,
    },
}
