//! Domain model: particles, predicates, the behaviour tree and its settings.

pub mod behaviour;
pub mod particles;
pub mod predicate;
pub mod settings;

pub use behaviour::{Behaviour, BehaviourNode, BehaviourTree, NodeId};
pub use particles::{MetaMap, ParticleStore};
pub use predicate::{Predicate, PredicateOp};
pub use settings::EngineSettings;
