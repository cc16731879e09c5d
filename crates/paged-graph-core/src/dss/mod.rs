//! Union-find over huge and paged long storage

/// Dense-to-original id mappings consumed by result streaming
pub mod id_mapping;

/// The disjoint-set forest
pub mod disjoint_set;


pub use disjoint_set::{
    DisjointSetResult, DisjointSetResults, DisjointSetStruct, HugeDisjointSetStruct, LongStore,
    PagedDisjointSetStruct,
};
pub use id_mapping::{DirectIdMapping, HugeIdMap, IdMapping};
