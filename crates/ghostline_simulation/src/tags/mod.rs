//! Gameplay tags + arbitration core
//!
//! - `gameplay_tag`: каталог тегов, `TagSet`
//! - `relationship_map`: rule table (pure data → block/cancel)
//! - `state`: `GameplayTagState` component (active/block tags, cancel dispatch)

pub mod gameplay_tag;
pub mod relationship_map;
pub mod state;


pub use gameplay_tag::{GameplayTag, TagSet};
pub use relationship_map::{MatchMode, TagEvaluation, TagRelationshipMap, TagRelationshipRule};
pub use state::{CancelAction, CancelSink, CancelTable, GameplayTagState, StateNotice};
