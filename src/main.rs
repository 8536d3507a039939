use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use lumina::cli::{Cli, Command};
use lumina::worker::minutes_to_delay;
use lumina::{Brightness, Color, Config, Controller, DeviceAddress, Dispatcher, Error};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    // The worker outlives whoever reads its output, so its writes are
    // best-effort and never abort the timer.
    if let Some(spec) = cli.worker_spec() {
        let spec = match spec {
            Ok(spec) => spec,
            Err(e) => {
                let _ = writeln!(io::stderr(), "invalid timer configuration: {e}");
                return ExitCode::FAILURE;
            }
        };
        let _ = writeln!(
            io::stdout(),
            "sleep timer: {}m -> {} (off={})",
            spec.minutes,
            spec.address,
            !spec.power.is_on()
        );
        return match spec.run(&Dispatcher::new()).await {
            Ok(()) => {
                let _ = writeln!(io::stdout(), "timer command sent");
                ExitCode::SUCCESS
            }
            Err(e) => {
                let _ = writeln!(io::stderr(), "timer command failed: {e}");
                ExitCode::FAILURE
            }
        };
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let Some(command) = cli.command.as_ref() else {
        println!("Nothing to do; see `lumina --help`.");
        return Ok(());
    };
    let mut controller = Controller::new();

    match command {
        Command::Discover { timeout } => {
            println!("Discovering WiZ lights (timeout: {timeout}s)...");
            let devices = controller.discover(Duration::from_secs(*timeout)).await?;
            if devices.is_empty() {
                println!("No lights found on the network.");
            } else {
                println!("\nFound {} light(s):", devices.len());
                for device in devices {
                    println!(
                        "  {:10} {:22} MAC: {}",
                        device.name,
                        device.address.to_string(),
                        device.mac
                    );
                }
            }
        }

        Command::SaveConfig => {
            let ip = cli.ip.as_deref().unwrap_or("");
            let port = DeviceAddress::DEFAULT_PORT.to_string();
            let address = DeviceAddress::parse(ip, cli.port.as_deref().unwrap_or(&port))?;
            let path = Config::new(&address).save()?;
            println!("Saved {address} to {}", path.display());
        }

        Command::On => {
            let address = target(&cli)?;
            controller.set_power(&address, true).await?;
            println!("Light at {address} turned ON");
        }

        Command::Off => {
            let address = target(&cli)?;
            controller.set_power(&address, false).await?;
            println!("Light at {address} turned OFF");
        }

        Command::Color { hex, dimming } => {
            let address = target(&cli)?;
            let color = Color::from_hex(hex)?;
            controller
                .set_color(&address, &color, &Brightness::saturating(*dimming))
                .await?;
            println!("Light at {address} set to {color} at {dimming}%");
        }

        Command::Brightness { level } => {
            let address = target(&cli)?;
            controller
                .set_brightness(&address, &Brightness::saturating(*level))
                .await?;
            println!("Light at {address} set to {level}%");
        }

        Command::Sleep { minutes, inline } => {
            let address = target(&cli)?;
            let delay = minutes_to_delay(*minutes);
            controller.schedule_off(&address, delay, !inline)?;
            if *inline {
                println!("Sleep in {minutes}m; keep this process running...");
                if let Some(res) = controller.wait_timer().await {
                    res?;
                }
                println!("Timer finished. Power off.");
            } else {
                println!("Sleep in {minutes}m (handled in background)");
            }
        }
    }

    Ok(())
}

/// The device to command: `--ip`/`--port` if given, otherwise the saved config.
fn target(cli: &Cli) -> Result<DeviceAddress, Error> {
    match cli.ip.as_deref() {
        Some(ip) => {
            let port = DeviceAddress::DEFAULT_PORT.to_string();
            DeviceAddress::parse(ip, cli.port.as_deref().unwrap_or(&port))
        }
        None => Config::load()?.address(),
    }
}
