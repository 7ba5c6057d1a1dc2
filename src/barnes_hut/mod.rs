mod center_of_mass;
mod force;
mod particle;
mod quadtree;

pub use center_of_mass::*;
pub use force::*;
pub use particle::*;
pub use quadtree::*;
