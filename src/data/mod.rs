/// Data layer: core types, loading, preparation, filtering and grouping.
///
/// Architecture:
/// ```text
///  dataset_olympics.csv   noc_region.csv
///        │                     │
///        ▼                     ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ prepare   │  fill medals, left-join regions, indicators → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  season / type / year / country predicates → rows
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ aggregate │  group-by + count → AggTable
///   └──────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod prepare;
