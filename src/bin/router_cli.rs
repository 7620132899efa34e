//! CLI surface for `omnirouter` (SPEC_FULL.md §10): a `clap`-derived binary
//! mirroring the `Parser`/`Subcommand` shape of the teacher crate's
//! `cli/commands.rs`. Useful for smoke-testing a set of route definitions
//! without wiring a real transport.

use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use omnirouter::{Callable, DispatchOutcome, Error, Result};
use omnirouter::{HandlerSpec, RouteDefinition, Router};

#[derive(Parser)]
#[command(name = "router-cli", about = "Inspect an omnirouter route table")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dump the compiled route table as JSON.
    List,
}

struct Noop;

#[async_trait]
impl Callable for Noop {
    async fn call(&self, _event: &dyn omnirouter::IncomingEvent) -> Result<DispatchOutcome> {
        Ok(DispatchOutcome::Value(serde_json::Value::Null))
    }
}

/// A small fixture table, standing in for whatever definitions an embedding
/// application would normally register at startup.
fn demo_router() -> Router {
    let router = Router::new();
    router.get(RouteDefinition::new("/health").name("health").callable(Arc::new(Noop)));
    router.get(
        RouteDefinition::new("/users/:id")
            .name("users.show")
            .handler(HandlerSpec::Callable(Arc::new(Noop))),
    );
    router.post(
        RouteDefinition::new("/users")
            .name("users.create")
            .handler(HandlerSpec::Callable(Arc::new(Noop))),
    );
    router
}

fn main() -> std::result::Result<(), Error> {
    omnirouter::logging::init(None);
    let cli = Cli::parse();

    match cli.command {
        Command::List => {
            let router = demo_router();
            let dump = router.dump_routes();
            println!("{}", serde_json::to_string_pretty(&dump).unwrap_or_default());
        }
    }

    Ok(())
}
