// BIT* path planning demo

use batch_informed_trees::common::{AreaBounds, PathLengthObjective, Point2D};
use batch_informed_trees::path_planning::bit_star::{
    BitStarConfig, BitStarPlanner, PlannerStatus, TerminationCondition,
};
use batch_informed_trees::utils::visualization::{colors, PathStyle, PointStyle, Visualizer};
use batch_informed_trees::utils::{Obstacle, PlanarSpace};

fn main() {
    println!("BIT* path planning start!!");

    let obstacles = vec![
        Obstacle::circle(5.0, 5.0, 0.5),
        Obstacle::circle(9.0, 6.0, 1.0),
        Obstacle::circle(7.0, 5.0, 1.0),
        Obstacle::circle(1.0, 5.0, 1.0),
        Obstacle::circle(3.0, 6.0, 1.0),
        Obstacle::circle(7.0, 9.0, 1.0),
        Obstacle::rectangle(3.0, 1.0, 5.0, 3.0),
    ];
    let space = PlanarSpace::new(AreaBounds::new([-2.0, 15.0, -2.0, 15.0]), obstacles.clone());

    let config = BitStarConfig {
        samples_per_batch: 200,
        rewire_factor: 1.1,
        rng_seed: Some(1),
        verbose: true,
        ..Default::default()
    };

    let start = Point2D::new(0.0, 0.0);
    let goal = Point2D::new(5.0, 10.0);

    let mut planner = BitStarPlanner::new(space, PathLengthObjective, config)
        .expect("valid planner configuration");
    let solution = planner
        .solve(start, goal, TerminationCondition::Batches(8))
        .expect("valid problem definition");

    let stats = planner.stats();
    println!(
        "Finished after {} iterations, {} batches, {} rewirings",
        stats.iterations, stats.batches, stats.rewirings
    );
    println!(
        "Collision checks: {} states, {} edges; {} nearest-neighbor queries",
        stats.state_collision_checks, stats.edge_collision_checks, stats.nearest_neighbor_queries
    );

    match solution.status {
        PlannerStatus::ExactSolution => {
            println!(
                "Found path with {} points and cost {:.3}",
                solution.path.len(),
                solution.cost.value()
            );
        }
        PlannerStatus::ApproximateSolution => {
            println!(
                "No exact path; closest approach is {:.3} from the goal",
                solution.approximate_diff
            );
        }
        PlannerStatus::Timeout => {
            println!("No path found");
        }
    }

    let mut vis = Visualizer::new("BIT* Path Planning");
    vis.plot_obstacles(&obstacles);
    vis.plot_tree(&planner.planner_data());
    if !solution.path.is_empty() {
        vis.plot_path(&solution.path, &PathStyle::new(colors::PATH, "BIT* Path"));
    }
    vis.plot_point(start, &PointStyle::new(colors::START, "Start"));
    vis.plot_point(goal, &PointStyle::new(colors::GOAL, "Goal"));

    let output_path = "img/path_planning/bit_star_result.png";
    match vis.save(output_path, 800, 600) {
        Ok(()) => println!("Plot saved to: {}", output_path),
        Err(e) => eprintln!("Failed to save image: {}", e),
    }

    println!("BIT* path planning finish!!");
}
