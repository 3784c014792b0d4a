//! Route planning command

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use qroute_core::{Coordinate, NodeId};
use qroute_planner::{Config, PlanEvent, PlannedRoute, PlannerHandle, PlannerService};

#[derive(Args)]
pub struct PlanArgs {
    /// Start node id
    #[arg(long)]
    pub start: NodeId,

    /// Destination node id
    #[arg(long)]
    pub end: NodeId,

    /// Obstacle area as `x,y,radius` (repeatable)
    #[arg(long = "obstacle", value_parser = parse_area)]
    pub obstacles: Vec<AreaArg>,

    /// Bad-weather area as `x,y,radius` (repeatable)
    #[arg(long = "weather", value_parser = parse_area)]
    pub weather: Vec<AreaArg>,

    /// Print the route as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: PlanArgs, config: &Config) -> Result<()> {
    let (handle, mut events) = PlannerHandle::new(PlannerService::from_config(config)?);

    let areas = args
        .obstacles
        .iter()
        .map(|a| config.penalty.obstacle(a.center, a.radius))
        .chain(
            args.weather
                .iter()
                .map(|a| config.penalty.weather(a.center, a.radius)),
        );
    for area in areas {
        let touched = handle.apply_penalty_area(area).await?;
        info!(
            "Penalty x{} at ({}, {}) r={} touched {} edges",
            area.factor, area.center.x, area.center.y, area.radius, touched
        );
    }

    let _worker = handle.request_path(args.start, args.end).await?;
    let event = events
        .recv()
        .await
        .context("planner worker stopped without reporting")?;

    match event {
        PlanEvent::PathCalculated(route) => print_route(&route, args.json),
        PlanEvent::CalculationFailed { error, .. } => Err(error.into()),
    }
}

fn print_route(route: &PlannedRoute, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(route)?);
        return Ok(());
    }

    let status = if route.is_complete() {
        "complete".to_string()
    } else {
        format!("partial ({:?})", route.termination)
    };
    println!("Route {} -> {}: {}", route.start, route.goal, status);
    println!("Total length: {:.2}", route.total_cost);
    for (id, at) in route.nodes.iter().zip(&route.coordinates) {
        println!("  {id:>8}  {:.6}  {:.6}", at.x, at.y);
    }
    Ok(())
}

/// Circle given on the command line; the factor comes from the config
#[derive(Debug, Clone, Copy)]
pub struct AreaArg {
    pub center: Coordinate,
    pub radius: f64,
}

/// Parse `x,y,radius`
fn parse_area(value: &str) -> std::result::Result<AreaArg, String> {
    let fields: Vec<&str> = value.split(',').map(str::trim).collect();
    let [x, y, radius] = fields.as_slice() else {
        return Err(format!("expected x,y,radius, got '{value}'"));
    };

    let parse = |field: &str| {
        field
            .parse::<f64>()
            .map_err(|e| format!("invalid number '{field}': {e}"))
    };
    let center = Coordinate::new(parse(*x)?, parse(*y)?);
    let radius = parse(*radius)?;

    if !center.is_finite() || !radius.is_finite() || radius < 0.0 {
        return Err(format!("invalid penalty area '{value}'"));
    }
    Ok(AreaArg { center, radius })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_area() {
        let area = parse_area("116.39, 39.9,0.05").unwrap();
        assert_eq!(area.center, Coordinate::new(116.39, 39.9));
        assert_eq!(area.radius, 0.05);
    }

    #[test]
    fn test_parse_area_rejects_malformed_input() {
        assert!(parse_area("1,2").is_err());
        assert!(parse_area("1,2,3,4").is_err());
        assert!(parse_area("a,2,3").is_err());
        assert!(parse_area("1,2,-3").is_err());
        assert!(parse_area("1,inf,3").is_err());
    }
}
