//! Audio output device listing.

use clap::{Args, Subcommand};
use herakoi_io::{AudioBackend, CpalBackend};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List all output devices
    List,

    /// Show the default output device
    Info,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let backend = CpalBackend::new();

    match args.command.unwrap_or(DevicesCommand::List) {
        DevicesCommand::List => {
            let devices = backend.list_devices()?;

            if devices.is_empty() {
                println!("No audio output devices found.");
                return Ok(());
            }

            println!("Available Output Devices ({})", backend.name());
            println!("========================\n");
            for (idx, device) in devices.iter().enumerate() {
                let default = if device.is_default { " (default)" } else { "" };
                println!(
                    "  [{}] {} ({} Hz){}",
                    idx, device.name, device.default_sample_rate, default
                );
            }
            println!();
            println!("Tip: Use a partial name with --device:");
            println!("  herakoi play image.png --device \"USB\"");
        }

        DevicesCommand::Info => {
            println!("Default Output Device");
            println!("=====================\n");

            match backend.default_output_device()? {
                Some(device) => {
                    println!("  Name: {}", device.name);
                    println!("  Sample Rate: {} Hz", device.default_sample_rate);
                }
                None => println!("  None"),
            }
        }
    }

    Ok(())
}
