mod args;

use args::{Args, Command, EndpointCommand};
use clap::Parser;
use mock_bridge::adb::BridgeConfig;
use mock_bridge::store::{AppPaths, EndpointKey, JsonConfigFile, MockStore, ResponseEntry};
use mock_bridge::sync::MockSync;
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

async fn run(args: Args) -> CliResult<()> {
    let paths = AppPaths::discover()?;
    let config_path = args.config.clone().unwrap_or_else(|| paths.config_file());
    let store = MockStore::new(JsonConfigFile::new(config_path), paths.default_save_path());
    let bridge_config = BridgeConfig {
        adb_path: args.adb.clone(),
        ..BridgeConfig::default()
    };
    let sync = MockSync::from_config(bridge_config, store);

    match args.command {
        Command::Devices => print_json(&sync.list_connected_devices().await?),
        Command::Apps { device } => print_json(&sync.list_installed_apps(&device).await),
        Command::Pull {
            device,
            package,
            name,
            storage,
        } => {
            let pulled = sync
                .pull_mock_files(&device, &package, &name, storage)
                .await?;
            if pulled.is_empty() {
                println!("⚠️ No response file found on {device} for {package}");
            }
            for file in &pulled {
                println!("✅ Pulled {}", file.filename);
            }
            Ok(())
        }
        Command::Push {
            device,
            package,
            file,
            no_restart,
        } => {
            if no_restart {
                sync.push_mock_file(&device, &package, &file).await?;
            } else {
                sync.push_and_restart(&device, &package, &file).await?;
            }
            println!("✅ Pushed {file} to {device}");
            Ok(())
        }
        Command::Clean { device, package } => {
            sync.clean_device_files(&device, &package).await?;
            println!("✅ Cleaned mock files of {package} on {device}");
            Ok(())
        }
        Command::Restart { device, package } => {
            sync.restart_app(&device, &package).await?;
            println!("✅ Restarted {package} on {device}");
            Ok(())
        }
        Command::Files => print_json(&sync.store().list_mock_sets()?),
        Command::Show { file } => match sync.store().response_file(&file)? {
            Some(found) => print_json(&found),
            None => Err(format!("{file} not found in {}", sync.store().save_path()?.display()).into()),
        },
        Command::Save { file, input } => {
            let data = read_json_input(&input)?;
            sync.store().save_response_file(&file, &data)?;
            println!("✅ Saved {file}");
            Ok(())
        }
        Command::Storage { file, input: None } => match sync.store().storage_file(&file)? {
            Some(storage) => print_json(&storage),
            None => {
                println!("⚠️ {file} has no storage attachment");
                Ok(())
            }
        },
        Command::Storage {
            file,
            input: Some(input),
        } => {
            let data = read_json_input(&input)?;
            sync.store().save_storage_file(&file, &data)?;
            println!("✅ Saved storage for {file}");
            Ok(())
        }
        Command::Endpoint(EndpointCommand::Set {
            file,
            method,
            path,
            status,
            headers,
            body,
        }) => {
            let key = EndpointKey::new(&method, &path);
            let mut entry = ResponseEntry::new(status, serde_json::from_str(&body)?);
            for header in headers {
                let (name, value) = header
                    .split_once(':')
                    .ok_or_else(|| format!("header '{header}' must be NAME:VALUE"))?;
                entry
                    .headers
                    .insert(name.trim().to_string(), value.trim().to_string());
            }
            sync.store().upsert_endpoint(&file, &key, &entry)?;
            println!("✅ {key} set in {file}");
            Ok(())
        }
        Command::Endpoint(EndpointCommand::Remove { file, method, path }) => {
            let key = EndpointKey::new(&method, &path);
            if sync.store().remove_endpoint(&file, &key)? {
                println!("✅ {key} removed from {file}");
            } else {
                println!("⚠️ {key} not present in {file}");
            }
            Ok(())
        }
        Command::SavePath { path: None } => {
            println!("{}", sync.store().save_path()?.display());
            Ok(())
        }
        Command::SavePath { path: Some(path) } => {
            sync.store().set_save_path(&path)?;
            println!("✅ Save path set to {}", path.display());
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_json_input(input: &Path) -> CliResult<Value> {
    let contents = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input)?
    };
    Ok(serde_json::from_str(&contents)?)
}
