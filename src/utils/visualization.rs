//! Visualization utilities for batch_informed_trees
//!
//! Provides a unified interface for plotting using gnuplot. Draw calls
//! are buffered and rendered into a single axes when the figure is saved
//! or shown.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::{Path2D, PlannerError, PlannerResult, Point2D};
use crate::utils::planar_space::Obstacle;

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00FF00";
    pub const BLUE: &str = "#0000FF";
    pub const GRAY: &str = "#808080";
    pub const LIGHT_BLUE: &str = "#87CEEB";

    // Semantic colors
    pub const OBSTACLE: &str = BLACK;
    pub const START: &str = GREEN;
    pub const GOAL: &str = BLUE;
    pub const PATH: &str = RED;
    pub const TREE: &str = LIGHT_BLUE;
    pub const SAMPLE: &str = GRAY;
}

/// Style of a polyline; uncaptioned lines stay out of the legend
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: Option<String>,
}

impl PathStyle {
    /// A captioned line for the legend (solution paths, mostly)
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: Some(caption.to_string()),
        }
    }

    /// An uncaptioned line (tree edges, obstacle outlines)
    pub fn plain(color: &str, line_width: f64) -> Self {
        Self {
            color: color.to_string(),
            line_width,
            caption: None,
        }
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        PathStyle::new(colors::PATH, "Path")
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        PointStyle::marker(color, caption, 'O', 1.5)
    }

    pub fn marker(color: &str, caption: &str, symbol: char, size: f64) -> Self {
        Self {
            color: color.to_string(),
            size,
            symbol,
            caption: caption.to_string(),
        }
    }
}

enum DrawCommand {
    Lines {
        x: Vec<f64>,
        y: Vec<f64>,
        style: PathStyle,
    },
    Points {
        x: Vec<f64>,
        y: Vec<f64>,
        style: PointStyle,
    },
}

/// Buffering visualizer rendering into one gnuplot axes
pub struct Visualizer {
    figure: Figure,
    title: String,
    commands: Vec<DrawCommand>,
}

impl Visualizer {
    pub fn new(title: &str) -> Self {
        Self {
            figure: Figure::new(),
            title: title.to_string(),
            commands: Vec::new(),
        }
    }

    /// Plot a path
    pub fn plot_path(&mut self, path: &Path2D, style: &PathStyle) -> &mut Self {
        self.commands.push(DrawCommand::Lines {
            x: path.points.iter().map(|p| p.x).collect(),
            y: path.points.iter().map(|p| p.y).collect(),
            style: style.clone(),
        });
        self
    }

    /// Plot a single point (start, goal, etc.)
    pub fn plot_point(&mut self, point: Point2D, style: &PointStyle) -> &mut Self {
        self.commands.push(DrawCommand::Points {
            x: vec![point.x],
            y: vec![point.y],
            style: style.clone(),
        });
        self
    }

    /// Plot multiple points
    pub fn plot_points(&mut self, points: &[Point2D], style: &PointStyle) -> &mut Self {
        self.commands.push(DrawCommand::Points {
            x: points.iter().map(|p| p.x).collect(),
            y: points.iter().map(|p| p.y).collect(),
            style: style.clone(),
        });
        self
    }

    /// Plot the obstacle set; circles as sampled outlines, rectangles as
    /// closed polylines
    pub fn plot_obstacles(&mut self, obstacles: &[Obstacle]) -> &mut Self {
        for obstacle in obstacles {
            let (x, y) = match *obstacle {
                Obstacle::Circle { x, y, radius } => {
                    let n = 64;
                    let xs: Vec<f64> = (0..=n)
                        .map(|i| x + radius * (2.0 * std::f64::consts::PI * i as f64 / n as f64).cos())
                        .collect();
                    let ys: Vec<f64> = (0..=n)
                        .map(|i| y + radius * (2.0 * std::f64::consts::PI * i as f64 / n as f64).sin())
                        .collect();
                    (xs, ys)
                }
                Obstacle::Rectangle { xmin, ymin, xmax, ymax } => (
                    vec![xmin, xmax, xmax, xmin, xmin],
                    vec![ymin, ymin, ymax, ymax, ymin],
                ),
            };
            self.commands.push(DrawCommand::Lines {
                x,
                y,
                style: PathStyle::plain(colors::OBSTACLE, 1.5),
            });
        }
        self
    }

    /// Plot a search tree given as (state, parent index) records
    pub fn plot_tree(&mut self, tree: &[(Point2D, Option<usize>)]) -> &mut Self {
        for &(state, parent) in tree {
            if let Some(parent_index) = parent {
                let parent_state = tree[parent_index].0;
                self.commands.push(DrawCommand::Lines {
                    x: vec![parent_state.x, state.x],
                    y: vec![parent_state.y, state.y],
                    style: PathStyle::plain(colors::TREE, 0.5),
                });
            }
        }
        self
    }

    fn render(&mut self) {
        self.figure.clear_axes();
        let axes = self.figure.axes2d();
        axes.set_title(&self.title, &[])
            .set_x_label("X [m]", &[])
            .set_y_label("Y [m]", &[])
            .set_aspect_ratio(AutoOption::Fix(1.0));

        for command in &self.commands {
            match command {
                DrawCommand::Lines { x, y, style } => match &style.caption {
                    Some(caption) => {
                        axes.lines(
                            x,
                            y,
                            &[
                                Caption(caption),
                                Color(&style.color),
                                LineWidth(style.line_width),
                            ],
                        );
                    }
                    None => {
                        axes.lines(x, y, &[Color(&style.color), LineWidth(style.line_width)]);
                    }
                },
                DrawCommand::Points { x, y, style } => {
                    axes.points(
                        x,
                        y,
                        &[
                            Caption(&style.caption),
                            Color(&style.color),
                            PointSymbol(style.symbol),
                            PointSize(style.size),
                        ],
                    );
                }
            }
        }
    }

    /// Save the figure as a PNG
    pub fn save(&mut self, path: &str, width: u32, height: u32) -> PlannerResult<()> {
        self.render();
        self.figure
            .save_to_png(path, width, height)
            .map_err(|e| PlannerError::VisualizationError(format!("{}", e)))
    }

    /// Show the figure in an interactive window
    pub fn show(&mut self) {
        self.render();
        let _ = self.figure.show();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_are_buffered() {
        let mut vis = Visualizer::new("test");
        vis.plot_point(Point2D::origin(), &PointStyle::new(colors::START, "Start"));
        vis.plot_path(
            &Path2D::from_states(vec![Point2D::origin(), Point2D::new(1.0, 1.0)]),
            &PathStyle::default(),
        );
        vis.plot_obstacles(&[Obstacle::circle(0.5, 0.5, 0.1)]);
        assert_eq!(vis.commands.len(), 3);
    }

    #[test]
    fn test_tree_and_obstacle_lines_carry_no_caption() {
        let mut vis = Visualizer::new("test");
        let tree = vec![
            (Point2D::origin(), None),
            (Point2D::new(1.0, 0.0), Some(0)),
            (Point2D::new(1.0, 1.0), Some(1)),
        ];
        vis.plot_tree(&tree);
        assert_eq!(vis.commands.len(), 2);
        for command in &vis.commands {
            match command {
                DrawCommand::Lines { style, .. } => assert!(style.caption.is_none()),
                DrawCommand::Points { .. } => panic!("tree edges are lines"),
            }
        }
    }
}
