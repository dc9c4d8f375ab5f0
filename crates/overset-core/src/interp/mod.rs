mod lagrange;
mod least_squares;
mod verify;
mod weight_calculator;

pub use lagrange::{contains_point, inverse_distance_weights, inverse_map, lagrange_weights, InverseMapResult};
pub use least_squares::{least_squares_interpolate, least_squares_weights};
pub use verify::verify_weights;
pub use weight_calculator::WeightCalculator;
