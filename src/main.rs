// filepath: src/main.rs

use log::info;
use std::path::Path;
use std::process::ExitCode;
use stu_signature::{
    device::backend_from_config,
    render_recording,
    status::{check_database, check_device, version_label},
    store::FileRecordStore,
    AppError, Rasterizer, RecordingOutcome, SignatureConfig, SigningApp, SigningOutcome,
};

const USAGE: &str = "usage: stu-signature <status | sign <id> | render <recording.toml> <out.png>>";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting stu-signature {}", version_label());

    match run(std::env::args().skip(1).collect()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the command reached its goal
fn run(args: Vec<String>) -> Result<bool, Box<dyn std::error::Error>> {
    let config = SignatureConfig::load_from_file()?;
    info!("Configuration loaded");

    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        ["status"] => {
            let backend = backend_from_config(&config.device)?;
            let store = FileRecordStore::new(config.database.path_resolved());
            let device = check_device(backend.as_ref());
            let database = check_database(&store);
            println!("{}\n{}", device, database);
            Ok(device.is_ok() && database.is_ok())
        }
        ["sign", id] => {
            let backend = backend_from_config(&config.device)?;
            let store = FileRecordStore::new(config.database.path_resolved());
            let mut app = SigningApp::new(config, backend, store);
            sign(&mut app, id)
        }
        ["render", recording, out] => {
            let rasterizer = Rasterizer::new(config.ink.style());
            match render_recording(Path::new(recording), Path::new(out), &rasterizer)? {
                RecordingOutcome::Saved => {
                    println!("Signature saved at:\n{}", out);
                    Ok(true)
                }
                RecordingOutcome::NoSignature => {
                    eprintln!("No signature data in {}", recording);
                    Ok(false)
                }
                RecordingOutcome::Cancelled => {
                    eprintln!("Capture in {} was cancelled", recording);
                    Ok(false)
                }
            }
        }
        _ => {
            eprintln!("{}", USAGE);
            Ok(false)
        }
    }
}

fn sign(
    app: &mut SigningApp<FileRecordStore>,
    id: &str,
) -> Result<bool, Box<dyn std::error::Error>> {
    match app.sign(id) {
        Ok(SigningOutcome::Saved {
            name,
            path,
            sample_count,
            rows_affected,
        }) => {
            println!("Pen data count: {}", sample_count);
            println!("Signature for {} saved at:\n{}", name, path.display());
            println!("Record updated ({} row(s))", rows_affected);
            Ok(true)
        }
        Ok(SigningOutcome::NoSignature { sample_count }) => {
            println!("Pen data count: {}", sample_count);
            eprintln!("No signature data captured, nothing was saved");
            Ok(false)
        }
        Ok(SigningOutcome::Cancelled) => {
            eprintln!("Capture cancelled");
            Ok(false)
        }
        Err(AppError::Database {
            source,
            image: Some(path),
        }) => {
            eprintln!("Signature saved at {} but the record was not updated", path.display());
            Err(Box::new(source))
        }
        Err(e) => Err(Box::new(e)),
    }
}
