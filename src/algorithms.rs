pub mod dijkstra;

pub use dijkstra::min_distances;
