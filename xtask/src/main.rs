use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command};

use clap::{Parser, Subcommand};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const RELAY_PACKAGE: &str = "cloud_relay_aws";
const RELAY_BIN: &str = "queue_relay_lambda";
/// Entry name the custom Lambda runtime executes.
const LAMBDA_ENTRYPOINT: &str = "bootstrap";

type TaskResult = Result<(), String>;

#[derive(Parser)]
#[command(name = "xtask", about = "Task runner for the cloud relay workspace")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Formatting, clippy with warnings denied, and every crate's tests
    Ci {
        /// Also build the relay Lambda for the host target
        #[arg(long)]
        with_lambda: bool,
    },
    /// Build the relay Lambda and zip it for deployment
    LambdaPackage {
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Package an unoptimized build
        #[arg(long)]
        debug: bool,
        #[arg(long, env = "RELAY_DIST_DIR", default_value = "dist")]
        dist_dir: PathBuf,
    },
}

fn cargo(args: &[&str]) -> TaskResult {
    eprintln!("+ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .map_err(|error| format!("could not start cargo: {error}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("`cargo {}` exited with {status}", args.join(" ")))
    }
}

fn ci(with_lambda: bool) -> TaskResult {
    cargo(&["fmt", "--all", "--", "--check"])?;
    cargo(&["clippy", "--workspace", "--all-targets", "--all-features", "--", "-D", "warnings"])?;
    cargo(&["test", "--workspace", "--all-features"])?;
    if with_lambda {
        cargo(&["build", "-p", RELAY_PACKAGE, "--bin", RELAY_BIN])?;
    }
    Ok(())
}

fn require_target(target: &str) -> TaskResult {
    let Ok(output) = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    else {
        eprintln!("rustup unavailable; assuming `{target}` is installed");
        return Ok(());
    };

    let installed = String::from_utf8_lossy(&output.stdout);
    if installed.lines().any(|line| line.trim() == target) {
        Ok(())
    } else {
        Err(format!("target `{target}` is missing; run `rustup target add {target}`"))
    }
}

fn lambda_package(target: &str, debug: bool, dist_dir: &Path) -> TaskResult {
    require_target(target)?;

    let mut build = vec!["build", "-p", RELAY_PACKAGE, "--bin", RELAY_BIN, "--target", target];
    if !debug {
        build.push("--release");
    }
    cargo(&build)?;

    let binary = Path::new("target")
        .join(target)
        .join(if debug { "debug" } else { "release" })
        .join(RELAY_BIN);
    fs::create_dir_all(dist_dir)
        .map_err(|error| format!("cannot create {}: {error}", dist_dir.display()))?;
    let archive = dist_dir.join(format!("{RELAY_BIN}.zip"));
    write_bootstrap_zip(&binary, &archive)?;

    eprintln!("packaged {}", archive.display());
    Ok(())
}

fn write_bootstrap_zip(binary: &Path, archive: &Path) -> TaskResult {
    let bytes = fs::read(binary)
        .map_err(|error| format!("cannot read lambda binary {}: {error}", binary.display()))?;
    let file = File::create(archive)
        .map_err(|error| format!("cannot create {}: {error}", archive.display()))?;

    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file(LAMBDA_ENTRYPOINT, options)
        .map_err(|error| format!("zip entry: {error}"))?;
    zip.write_all(&bytes)
        .map_err(|error| format!("zip write: {error}"))?;
    zip.finish().map_err(|error| format!("zip finish: {error}"))?;
    Ok(())
}

fn main() {
    let result = match Cli::parse().command {
        Task::Ci { with_lambda } => ci(with_lambda),
        Task::LambdaPackage {
            target,
            debug,
            dist_dir,
        } => lambda_package(&target, debug, &dist_dir),
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        exit(1);
    }
}
