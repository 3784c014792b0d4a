//! Road graph summary

use anyhow::Result;

use qroute_core::RoadGraph;
use qroute_planner::Config;

pub fn run(config: &Config) -> Result<()> {
    let graph = RoadGraph::from_files(
        &config.data.nodes,
        &config.data.edges,
        config.data.weight_mode(),
    )?;

    let total_length: f64 = graph.edges().map(|edge| edge.weight).sum();
    let isolated = graph
        .node_ids()
        .filter(|&id| graph.neighbors(id).is_empty())
        .count();

    println!("Road Graph");
    println!("==========");
    println!("Nodes:        {}", config.data.nodes.display());
    println!("Edges:        {}", config.data.edges.display());
    println!("Weight mode:  {:?}", config.data.weight_mode());
    println!();
    println!("Node count:   {}", graph.node_count());
    println!("Edge count:   {}", graph.edge_count());
    println!("Isolated:     {isolated}");
    println!("Total length: {total_length:.2}");
    if !config.data.facilities.is_empty() {
        let facilities: Vec<String> = config
            .data
            .facilities
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("Facilities:   {}", facilities.join(", "));
    }

    Ok(())
}
