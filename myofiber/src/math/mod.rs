//! Small geometry and linear-algebra helpers.

mod bbox;
mod hull;
mod linear_solver;

pub use bbox::Aabb;
pub use hull::{convex_hull, point_in_convex_polygon};
pub use linear_solver::solve_linear_system;
