//! Greeter Demo
//!
//! A host with two plugins showing the three ways a plugin reaches services:
//!
//! ```text
//! global registry: GreetingService, EventBus, ConfigService
//! ├── scope "greeting"  GreetingPlugin (ServiceRegistryAware)
//! │                     └── PrefixGreeter extension (#[inject] PluginConfig)
//! └── scope "welcome"   WelcomePlugin (#[inject] GreetingService)
//!                       └── WelcomeGreeter extension
//! ```
//!
//! The greeting plugin counts its starts in `config/greeting.properties`;
//! run the demo twice to see the count go up.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package greeter
//! cargo run --package greeter -- --config-dir /tmp/greeter --shout
//! ```

mod plugins;
mod services;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rivet::prelude::*;
use tracing::info;

use plugins::greeting::{self, GreetingPlugin, PrefixGreeter};
use plugins::welcome::{self, WelcomeGreeter, WelcomePlugin};
use services::{DefaultGreetingService, Greeter, GreetingService};

#[derive(Parser, Debug)]
#[command(name = "greeter", about = "Rivet greeting demo")]
struct Args {
    /// Host configuration file (default: search for rivet.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for per-plugin `.properties` files.
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Shadow GreetingService in the welcome plugin's scope with a louder one.
    #[arg(long)]
    shout: bool,
}

struct ShoutingGreetingService;

impl GreetingService for ShoutingGreetingService {
    fn greet(&self, name: &str) -> String {
        format!("HELLO, {}!", name.to_uppercase())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let mut config = loader.load()?;
    if let Some(dir) = args.config_dir {
        config.plugins.config_dir = dir;
    }
    logging::init_from_config(&config.logging);

    info!("1. Building host");
    let host = Host::builder(config)
        .with_default_services()
        .services(|registry| {
            registry.register::<dyn GreetingService>(Arc::new(DefaultGreetingService));
        })
        .build()?;

    if let Some(events) = host.event_bus() {
        events.on(|e: &PluginStateChanged| {
            info!(plugin = %e.plugin_id, from = ?e.old_state, to = ?e.new_state, "Plugin state changed");
            Ok(())
        });
    }

    info!("2. Loading and starting plugins");
    host.load(
        PluginInfo::new(greeting::ID)
            .with_version("1.0.0")
            .with_description("Greets through its registry and counts its starts"),
        GreetingPlugin::default,
    )?;
    host.load(PluginInfo::new(welcome::ID).with_version("1.0.0"), WelcomePlugin::default)?;
    if args.shout
        && let Some(scope) = host.plugins().wiring().scopes().get(welcome::ID)
    {
        scope.register::<dyn GreetingService>(Arc::new(ShoutingGreetingService));
    }
    let started = host.start();
    info!(started, loaded = host.plugins().plugin_count(), "Plugins started");

    info!("3. Running Greeter extensions");
    let wiring = host.plugins().wiring();
    let mut greeters: Vec<Box<dyn Greeter>> = Vec::new();
    greeters.push(Box::new(
        wiring.create_extension(&Origin::plugin(greeting::ID), PrefixGreeter::default)?,
    ));
    greeters.push(Box::new(
        wiring.create_extension(&Origin::plugin(welcome::ID), WelcomeGreeter::default)?,
    ));
    for greeter in &greeters {
        info!("{}", greeter.greet());
    }

    info!("4. Stopping plugins");
    host.shutdown();
    Ok(())
}
