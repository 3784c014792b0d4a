//! Nearest facility lookup

use anyhow::{bail, Result};
use clap::Args;

use qroute_core::NodeId;
use qroute_planner::{Config, PlannerHandle, PlannerService};

#[derive(Args)]
pub struct NearestArgs {
    /// Origin node id
    #[arg(long)]
    pub from: NodeId,

    /// Candidate facility id (repeatable); defaults to data.facilities
    #[arg(long = "facility")]
    pub facilities: Vec<NodeId>,
}

pub async fn run(args: NearestArgs, config: &Config) -> Result<()> {
    let facilities = if args.facilities.is_empty() {
        config.data.facilities.clone()
    } else {
        args.facilities
    };
    if facilities.is_empty() {
        bail!("no candidate facilities: pass --facility or set data.facilities");
    }

    let (handle, _events) = PlannerHandle::new(PlannerService::from_config(config)?);
    let nearest = handle.find_nearest_facility(args.from, &facilities).await?;

    let service = handle.service();
    let service = service.read().await;
    match service.node_coordinate(nearest) {
        Some(at) => println!("{nearest} ({}, {})", at.x, at.y),
        None => println!("{nearest}"),
    }
    Ok(())
}
