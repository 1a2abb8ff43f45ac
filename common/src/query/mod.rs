// Query resolution: request filter → parameterized statement → rows

pub mod resolver;
pub mod router;

pub use resolver::{filtered_query, resolve, unfiltered_query, ParameterizedQuery};
pub use router::QueryRouter;
